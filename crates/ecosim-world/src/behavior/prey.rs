//! Prey step: age, hunger, infection, then breed, graze and move.

use super::{advance_clock, breeding, catch_infection, StepContext};
use crate::capabilities::Capabilities;
use crate::organism::Animal;
use ecosim_core::{DeathCause, Location, Result};
use tracing::trace;

pub fn act(mut animal: Animal, ctx: &mut StepContext<'_>) -> Result<()> {
    let origin = animal.location();

    if let Some(cause) = advance_clock(&mut animal) {
        return ctx.bury(animal, cause);
    }

    catch_infection(&mut animal, ctx);
    if animal.is_infected() && ctx.draws.chance(ctx.config.infection.prey_death_probability) {
        return ctx.bury(animal, DeathCause::Infection);
    }

    if !ctx.can_act() {
        return ctx.commit(animal, origin, origin);
    }

    let mut free = ctx.next.free_adjacent_locations(origin);
    breeding::give_birth(&animal, &mut free, ctx)?;

    let food = if animal.hunger().is_full() {
        None
    } else {
        graze(&mut animal, ctx)
    };

    let destination = if let Some(food) = food {
        Some(food)
    } else if free.is_empty() {
        None
    } else if animal.species().can_move(ctx.time, ctx.draws) {
        Some(free.remove(0))
    } else {
        Some(origin)
    };

    match destination {
        Some(location) => ctx.commit(animal, origin, location),
        None => ctx.bury(animal, DeathCause::Overcrowding),
    }
}

/// Eat the first live leaf cell next to the animal in the current field
fn graze(animal: &mut Animal, ctx: &mut StepContext<'_>) -> Option<Location> {
    for location in ctx.current.adjacent_locations(animal.location()) {
        if ctx.eat_leaf(location) {
            animal.feed();
            trace!(species = %animal.species(), location = %location, "Leaf eaten");
            return Some(location);
        }
    }
    None
}
