//! Predator step: age, hunger, infection, then breed, hunt and move.

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
    if animal.is_infected() && ctx.draws.chance(ctx.config.infection.predator_death_probability) {
        return ctx.bury(animal, DeathCause::Infection);
    }

    if !ctx.can_act() {
        return ctx.commit(animal, origin, origin);
    }

    let mut free = ctx.next.free_adjacent_locations(origin);
    breeding::give_birth(&animal, &mut free, ctx)?;

    let destination = match hunt(&mut animal, ctx) {
        Some(food) => Some(food),
        None if !free.is_empty() => Some(free.remove(0)),
        None => None,
    };

    match destination {
        Some(location) => ctx.commit(animal, origin, location),
        None => ctx.bury(animal, DeathCause::Overcrowding),
    }
}

/// Eat the first adjacent prey (current field, fixed order) whose hunt roll passes
fn hunt(animal: &mut Animal, ctx: &mut StepContext<'_>) -> Option<Location> {
    let species = animal.species();

    for location in ctx.current.adjacent_locations(animal.location()) {
        if ctx.is_gone(location) {
            continue;
        }
        let Some(target) = ctx.current.animal_at(location) else {
            continue;
        };
        if !species.is_prey(target) {
            continue;
        }
        if species.hunt_success(ctx.time, ctx.draws) {
            let victim = target.species();
            ctx.kill(location);
            animal.feed();
            trace!(predator = %species, prey = %victim, location = %location, "Prey eaten");
            return Some(location);
        }
    }

    None
}
