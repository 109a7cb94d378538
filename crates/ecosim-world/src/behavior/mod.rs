//! Per-organism state machines for one step.
//!
//! Every behaviour reads the current field and writes the next one through a
//! [`StepContext`]. The context also keeps the step's ledger: which
//! current-field occupants were eaten or died, and where each animal that
//! already acted ended up, so that a late kill can pull its victim back out of
//! the next field.

pub mod breeding;
pub mod plant;
pub mod predator;
pub mod prey;

use crate::draws::Draws;
use crate::environment;
use crate::field::{Field, Placement};
use crate::organism::{Animal, Plant, PlantArena};
use ecosim_core::{DeathCause, EngineConfig, Location, Result, Role, StepStats, Time, Weather};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// Everything one step's `act` calls share
pub struct StepContext<'a> {
    pub current: &'a Field,
    pub next: &'a mut Field,
    pub plants: &'a mut PlantArena,
    pub draws: &'a mut dyn Draws,
    pub config: &'a EngineConfig,
    pub time: Time,
    pub weather: Weather,
    stats: StepStats,
    /// Current-field locations whose occupant was eaten this step
    eaten: HashSet<Location>,
    /// Current-field locations whose occupant died of any other cause this step
    dead: HashSet<Location>,
    /// Current-field location -> next-field location, for animals already committed
    committed: HashMap<Location, Location>,
    /// Reverse of `committed`
    origin_of: HashMap<Location, Location>,
}

impl<'a> StepContext<'a> {
    pub fn new(
        current: &'a Field,
        next: &'a mut Field,
        plants: &'a mut PlantArena,
        draws: &'a mut dyn Draws,
        config: &'a EngineConfig,
        time: Time,
        weather: Weather,
    ) -> Self {
        Self {
            current,
            next,
            plants,
            draws,
            config,
            time,
            weather,
            stats: StepStats::new(),
            eaten: HashSet::new(),
            dead: HashSet::new(),
            committed: HashMap::new(),
            origin_of: HashMap::new(),
        }
    }

    pub fn stats(&self) -> &StepStats {
        &self.stats
    }

    pub fn into_stats(self) -> StepStats {
        self.stats
    }

    /// Whether the current-field occupant at `location` was eaten this step
    pub fn was_eaten(&self, location: Location) -> bool {
        self.eaten.contains(&location)
    }

    /// Whether the current-field occupant at `location` is no longer alive:
    /// eaten, or dead of another cause earlier in this step
    pub fn is_gone(&self, location: Location) -> bool {
        self.eaten.contains(&location) || self.dead.contains(&location)
    }

    /// Weather gate for this step
    pub fn can_act(&mut self) -> bool {
        environment::can_act(self.weather, &self.config.weather, self.draws)
    }

    /// Commit an acting animal to `destination` in the next field
    pub fn commit(&mut self, animal: Animal, origin: Location, destination: Location) -> Result<()> {
        let species = animal.species();
        match self.next.place_animal(animal, destination)? {
            Placement::Placed => {}
            Placement::Replaced(displaced) => {
                self.stats.collisions += 1;
                self.forget_commit(destination);
                debug!(
                    event = "collision",
                    winner = %species,
                    loser = %displaced.species(),
                    location = %destination,
                    "Animal displaced from next-field cell"
                );
                self.stats.record_death(DeathCause::Collision);
            }
            Placement::Rejected(rejected) => {
                self.stats.collisions += 1;
                self.dead.insert(origin);
                debug!(
                    event = "collision",
                    loser = %rejected.species(),
                    location = %destination,
                    "Animal turned away from occupied next-field cell"
                );
                self.stats.record_death(DeathCause::Collision);
                return Ok(());
            }
        }
        self.committed.insert(origin, destination);
        self.origin_of.insert(destination, origin);
        trace!(species = %species, from = %origin, to = %destination, "Animal committed");
        Ok(())
    }

    /// Place a newborn; newborns have no current-field origin
    pub fn place_newborn(&mut self, young: Animal, location: Location) -> Result<bool> {
        let species = young.species();
        match self.next.place_animal(young, location)? {
            Placement::Placed => {
                self.stats.births += 1;
                trace!(species = %species, location = %location, "Animal born");
                Ok(true)
            }
            Placement::Replaced(displaced) => {
                self.stats.collisions += 1;
                self.forget_commit(location);
                self.stats.record_death(DeathCause::Collision);
                self.stats.births += 1;
                debug!(
                    event = "collision",
                    winner = %species,
                    loser = %displaced.species(),
                    location = %location,
                    "Animal displaced by a newborn"
                );
                Ok(true)
            }
            Placement::Rejected(_) => {
                self.stats.collisions += 1;
                self.stats.record_death(DeathCause::Collision);
                Ok(false)
            }
        }
    }

    /// Record an acting animal's death; it is simply not carried forward
    pub fn bury(&mut self, mut animal: Animal, cause: DeathCause) -> Result<()> {
        animal.set_dead();
        self.dead.insert(animal.location());
        self.stats.record_death(cause);
        debug!(
            event = "animal_death",
            species = %animal.species(),
            age = animal.age(),
            infected = animal.is_infected(),
            cause = ?cause,
            location = %animal.location(),
            "Animal died"
        );
        Ok(())
    }

    /// Kill the current-field occupant at `location`.
    ///
    /// If it already committed itself to the next field it is taken back out.
    pub fn kill(&mut self, location: Location) {
        if !self.eaten.insert(location) {
            return;
        }
        if let Some(destination) = self.committed.remove(&location) {
            self.origin_of.remove(&destination);
            self.next.remove_animal(destination);
        }
        self.stats.kills += 1;
        self.stats.record_death(DeathCause::Eaten);
    }

    /// Drop the ledger entry of an animal displaced from `destination`; it
    /// counts as dead from here on
    fn forget_commit(&mut self, destination: Location) {
        if let Some(origin) = self.origin_of.remove(&destination) {
            self.committed.remove(&origin);
            self.dead.insert(origin);
        }
    }

    /// Consume the leaf at `location` if it is still alive.
    ///
    /// The leaf deregisters from its core, so it is not carried forward when
    /// plants act after the animals.
    pub fn eat_leaf(&mut self, location: Location) -> bool {
        let Some(Plant::Leaf(leaf)) = self.current.plant_at(location).copied() else {
            return false;
        };
        let Some(core) = self.plants.get_mut(leaf.core) else {
            return false;
        };
        if !core.remove_leaf(location) {
            return false;
        }
        self.stats.leaves_eaten += 1;
        true
    }

    pub(crate) fn record_plant_collision(&mut self) {
        self.stats.collisions += 1;
    }

    pub(crate) fn record_leaf_spawned(&mut self) {
        self.stats.leaves_spawned += 1;
    }
}

/// Run one animal's step
pub fn act_animal(animal: Animal, ctx: &mut StepContext<'_>) -> Result<()> {
    if !animal.is_alive() {
        return Err(ecosim_core::Error::InvariantViolation(format!(
            "dead {} asked to act at {}",
            animal.species(),
            animal.location()
        )));
    }
    match animal.species().params().role {
        Role::Predator { .. } => predator::act(animal, ctx),
        Role::Prey { .. } => prey::act(animal, ctx),
    }
}

/// Age and hunger bookkeeping at the start of an animal's turn
pub(crate) fn advance_clock(animal: &mut Animal) -> Option<DeathCause> {
    if !animal.increment_age() {
        return Some(DeathCause::OldAge);
    }
    if !animal.increment_hunger() {
        return Some(DeathCause::Starvation);
    }
    None
}

/// Catch infection from any live infected neighbour in the current field
pub(crate) fn catch_infection(animal: &mut Animal, ctx: &StepContext<'_>) {
    if animal.is_infected() {
        return;
    }
    let exposed = ctx
        .current
        .adjacent_locations(animal.location())
        .into_iter()
        .filter(|loc| !ctx.is_gone(*loc))
        .filter_map(|loc| ctx.current.animal_at(loc))
        .any(|neighbour| neighbour.is_alive() && neighbour.is_infected());
    if exposed {
        animal.infect();
        trace!(species = %animal.species(), location = %animal.location(), "Animal infected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draws::AlwaysSucceed;
    use ecosim_core::Species;

    fn fixture() -> (Field, Field, PlantArena, EngineConfig) {
        let current = Field::new(5, 5);
        let next = Field::empty_like(&current);
        (current, next, PlantArena::new(), EngineConfig::default())
    }

    #[test]
    fn test_kill_evicts_committed_prey() {
        let (mut current, mut next, mut plants, config) = fixture();
        let origin = Location::new(1, 1);
        let deer = Animal::new(Species::Deer, origin, true);
        current.place_animal(deer.clone(), origin).unwrap();

        let mut draws = AlwaysSucceed;
        let mut ctx = StepContext::new(
            &current, &mut next, &mut plants, &mut draws, &config, Time::Day, Weather::Clear,
        );
        ctx.commit(deer, origin, Location::new(1, 2)).unwrap();
        assert!(ctx.next.animal_at(Location::new(1, 2)).is_some());

        ctx.kill(origin);
        ctx.kill(origin);
        assert!(ctx.next.animal_at(Location::new(1, 2)).is_none());
        assert!(ctx.was_eaten(origin));
        assert_eq!(ctx.stats().kills, 1);
        assert_eq!(ctx.stats().deaths_by(DeathCause::Eaten), 1);
    }

    #[test]
    fn test_rejected_commit_counts_collision() {
        let (current, mut next, mut plants, config) = fixture();
        let target = Location::new(2, 2);
        let mut draws = AlwaysSucceed;
        let mut ctx = StepContext::new(
            &current, &mut next, &mut plants, &mut draws, &config, Time::Day, Weather::Clear,
        );

        let fox = Animal::new(Species::Fox, Location::new(2, 1), true);
        let wolf = Animal::new(Species::Wolf, Location::new(2, 3), true);
        ctx.commit(fox, Location::new(2, 1), target).unwrap();
        ctx.commit(wolf, Location::new(2, 3), target).unwrap();

        assert_eq!(ctx.next.animal_at(target).unwrap().species(), Species::Fox);
        assert_eq!(ctx.stats().collisions, 1);
        assert_eq!(ctx.stats().deaths_by(DeathCause::Collision), 1);
    }

    #[test]
    fn test_catch_infection_from_neighbour() {
        let (mut current, mut next, mut plants, config) = fixture();
        let sick = Animal::new(Species::Rabbit, Location::new(0, 0), true).with_infection(true);
        current.place_animal(sick, Location::new(0, 0)).unwrap();

        let mut healthy = Animal::new(Species::Fox, Location::new(1, 1), false);
        let mut distant = Animal::new(Species::Fox, Location::new(3, 3), false);

        let mut draws = AlwaysSucceed;
        let ctx = StepContext::new(
            &current, &mut next, &mut plants, &mut draws, &config, Time::Day, Weather::Clear,
        );
        catch_infection(&mut healthy, &ctx);
        catch_infection(&mut distant, &ctx);

        assert!(healthy.is_infected());
        assert!(!distant.is_infected());
    }

    #[test]
    fn test_buried_neighbour_is_gone() {
        let (mut current, mut next, mut plants, config) = fixture();
        let origin = Location::new(0, 0);
        let sick = Animal::new(Species::Rabbit, origin, true).with_infection(true);
        current.place_animal(sick.clone(), origin).unwrap();

        let mut draws = AlwaysSucceed;
        let mut ctx = StepContext::new(
            &current, &mut next, &mut plants, &mut draws, &config, Time::Day, Weather::Clear,
        );
        ctx.bury(sick, DeathCause::OldAge).unwrap();
        assert!(ctx.is_gone(origin));
        assert!(!ctx.was_eaten(origin));

        let mut healthy = Animal::new(Species::Fox, Location::new(1, 1), false);
        catch_infection(&mut healthy, &ctx);
        assert!(!healthy.is_infected());
    }

    #[test]
    fn test_turned_away_animal_is_gone() {
        let (current, mut next, mut plants, config) = fixture();
        let target = Location::new(2, 2);
        let mut draws = AlwaysSucceed;
        let mut ctx = StepContext::new(
            &current, &mut next, &mut plants, &mut draws, &config, Time::Day, Weather::Clear,
        );

        let fox = Animal::new(Species::Fox, Location::new(2, 1), true);
        let wolf = Animal::new(Species::Wolf, Location::new(2, 3), true);
        ctx.commit(fox, Location::new(2, 1), target).unwrap();
        ctx.commit(wolf, Location::new(2, 3), target).unwrap();

        assert!(!ctx.is_gone(Location::new(2, 1)));
        assert!(ctx.is_gone(Location::new(2, 3)));
    }

    #[test]
    fn test_dead_animal_cannot_act() {
        let (current, mut next, mut plants, config) = fixture();
        let mut draws = AlwaysSucceed;
        let mut ctx = StepContext::new(
            &current, &mut next, &mut plants, &mut draws, &config, Time::Day, Weather::Clear,
        );
        let mut deer = Animal::new(Species::Deer, Location::new(0, 0), true);
        deer.set_dead();
        assert!(act_animal(deer, &mut ctx).is_err());
    }
}
