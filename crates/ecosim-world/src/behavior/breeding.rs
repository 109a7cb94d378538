//! Breeding protocol shared by predators and prey.

use super::StepContext;
use crate::capabilities::Capabilities;
use crate::draws::Draws;
use crate::field::Field;
use crate::organism::Animal;
use ecosim_core::{Location, Result};

/// Whether a live animal of the same species and opposite sex sits next to
/// `animal` in `field`
pub fn has_compatible_mate(field: &Field, animal: &Animal) -> bool {
    field
        .adjacent_locations(animal.location())
        .into_iter()
        .filter_map(|loc| field.animal_at(loc))
        .any(|other| {
            other.is_alive()
                && other.species() == animal.species()
                && other.is_female() != animal.is_female()
        })
}

/// Litter size for this step; zero when the breeding roll fails
pub fn breed(animal: &Animal, draws: &mut dyn Draws) -> u32 {
    let species = animal.species();
    if species.breed_success(animal.age(), draws) {
        species.birth_number(draws)
    } else {
        0
    }
}

/// Place newborns into `free`, consuming one cell per newborn.
///
/// Requires a mate next to the parent in the next field. Births beyond the
/// free cells available are dropped. Returns the number placed.
pub fn give_birth(parent: &Animal, free: &mut Vec<Location>, ctx: &mut StepContext<'_>) -> Result<u32> {
    if free.is_empty() || !has_compatible_mate(ctx.next, parent) {
        return Ok(0);
    }

    let births = breed(parent, ctx.draws);
    let birth_infection = ctx.config.infection.birth_infection_probability;
    let species = parent.species();
    let mut placed = 0;

    for _ in 0..births {
        if free.is_empty() {
            break;
        }
        let location = free.remove(0);
        let young = species.offspring(location, birth_infection, ctx.draws);
        if ctx.place_newborn(young, location)? {
            placed += 1;
        }
    }

    Ok(placed)
}
