//! Per-species behaviour hooks.
//!
//! The predator and prey state machines are shared; these are the override
//! points where species differ, all driven by the constant parameter table.

use crate::draws::Draws;
use crate::organism::Animal;
use ecosim_core::{Location, Role, Species, Time};

pub trait Capabilities {
    /// Whether `other` is food for this species
    fn is_prey(&self, other: &Animal) -> bool;

    /// Old enough, and the breeding roll passes
    fn breed_success(&self, age: u32, draws: &mut dyn Draws) -> bool;

    /// Litter size, uniform in `[1, max_litter_size]`
    fn birth_number(&self, draws: &mut dyn Draws) -> u32;

    /// A newborn of this species at `location`
    fn offspring(&self, location: Location, birth_infection_probability: f64, draws: &mut dyn Draws) -> Animal;

    /// Prey movement gate. Always true by day.
    fn can_move(&self, time: Time, draws: &mut dyn Draws) -> bool;

    /// Predator hunt roll. Always true by day.
    fn hunt_success(&self, time: Time, draws: &mut dyn Draws) -> bool;
}

impl Capabilities for Species {
    fn is_prey(&self, other: &Animal) -> bool {
        other.is_alive() && self.hunts(other.species())
    }

    fn breed_success(&self, age: u32, draws: &mut dyn Draws) -> bool {
        let params = self.params();
        age >= params.breeding_age && draws.chance(params.breeding_probability)
    }

    fn birth_number(&self, draws: &mut dyn Draws) -> u32 {
        draws.below(self.params().max_litter_size) + 1
    }

    fn offspring(&self, location: Location, birth_infection_probability: f64, draws: &mut dyn Draws) -> Animal {
        Animal::newborn(*self, location, birth_infection_probability, draws)
    }

    fn can_move(&self, time: Time, draws: &mut dyn Draws) -> bool {
        match (self.params().role, time) {
            (_, Time::Day) => true,
            (Role::Prey { night_move_probability, .. }, Time::Night) => {
                draws.chance(night_move_probability)
            }
            (Role::Predator { .. }, Time::Night) => true,
        }
    }

    fn hunt_success(&self, time: Time, draws: &mut dyn Draws) -> bool {
        match (self.params().role, time) {
            (_, Time::Day) => true,
            (Role::Predator { night_hunt_success, .. }, Time::Night) => {
                draws.chance(night_hunt_success)
            }
            (Role::Prey { .. }, Time::Night) => false,
        }
    }
}
