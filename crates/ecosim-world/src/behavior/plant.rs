//! Core plant growth and leaf cell persistence.
//!
//! Cores act before leaves within a step so that a ring regrown this step is
//! already in the next field when the old leaves take their turn.

use super::StepContext;
use crate::field::Placement;
use crate::organism::{CoreId, LeafCell, Plant};
use ecosim_core::{Error, Location, Phase, Result, RingOffsets};
use tracing::trace;

pub fn act_core(id: CoreId, ctx: &mut StepContext<'_>) -> Result<()> {
    let phase_two_age = ctx.config.plants.phase_two_age;
    let phase_three_age = ctx.config.plants.phase_three_age;

    let core = ctx
        .plants
        .get_mut(id)
        .ok_or_else(|| Error::InvariantViolation(format!("unknown core plant {}", id.0)))?;

    // Fully grazed: start over as a seedling
    if core.age() >= phase_two_age && core.leaves().is_empty() {
        core.reset();
    }
    core.increment_age();
    let location = core.location();

    if core.age() == phase_two_age {
        core.set_phase(Phase::Leafing);
        let ring = ctx.config.plants.phase_two_ring;
        grow(id, location, ring, ctx)?;
    } else if core.age() == phase_three_age {
        core.set_phase(Phase::Mature);
        core.clear_leaves();
        let ring = ctx.config.plants.phase_three_ring;
        grow(id, location, ring, ctx)?;
    }

    place(Plant::Core(id), location, ctx)
}

/// A leaf carries itself forward while its core still claims it
pub fn act_leaf(leaf: LeafCell, location: Location, ctx: &mut StepContext<'_>) -> Result<()> {
    if !ctx.plants.is_leaf_alive(leaf, location) {
        return Ok(());
    }
    // Already regrown by its core this step
    if matches!(ctx.next.plant_at(location), Some(Plant::Leaf(l)) if l.core == leaf.core) {
        return Ok(());
    }
    place(Plant::Leaf(leaf), location, ctx)
}

/// Spawn leaves on every in-bounds ring cell with no foreign plant
fn grow(id: CoreId, centre: Location, ring: RingOffsets, ctx: &mut StepContext<'_>) -> Result<()> {
    let (depth, width) = (ctx.next.depth(), ctx.next.width());

    for (dr, dc) in ring.offsets() {
        let location = centre.offset(dr, dc);
        if !location.in_bounds(depth, width) || !spawnable(id, location, ctx) {
            continue;
        }
        if let Placement::Placed = ctx.next.place_plant(Plant::Leaf(LeafCell { core: id }), location)? {
            if let Some(core) = ctx.plants.get_mut(id) {
                core.register_leaf(location);
            }
            ctx.record_leaf_spawned();
            trace!(core = id.0, location = %location, "Leaf spawned");
        }
    }

    Ok(())
}

fn spawnable(id: CoreId, location: Location, ctx: &StepContext<'_>) -> bool {
    if ctx.next.plant_at(location).is_some() {
        return false;
    }
    match ctx.current.plant_at(location) {
        None => true,
        Some(Plant::Leaf(leaf)) => leaf.core == id,
        Some(Plant::Core(_)) => false,
    }
}

fn place(plant: Plant, location: Location, ctx: &mut StepContext<'_>) -> Result<()> {
    match ctx.next.place_plant(plant, location)? {
        Placement::Placed => {}
        Placement::Replaced(lost) | Placement::Rejected(lost) => {
            ctx.record_plant_collision();
            // A leaf that loses its cell is no longer part of its plant
            if let Plant::Leaf(leaf) = lost {
                if let Some(core) = ctx.plants.get_mut(leaf.core) {
                    core.remove_leaf(location);
                }
            }
        }
    }
    Ok(())
}
