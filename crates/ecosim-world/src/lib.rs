//! Predator/prey/plant simulation engine.
//!
//! This crate implements the double-buffered 2D field where animals and
//! plants live, the per-organism step state machines, and the [`Engine`]
//! that advances the field under a day/night cycle and caller-supplied
//! weather.

pub mod behavior;
pub mod capabilities;
pub mod draws;
pub mod environment;
pub mod field;
pub mod organism;
pub mod simulation;

pub use capabilities::Capabilities;
pub use draws::{AlwaysFail, AlwaysSucceed, Draws};
pub use environment::Environment;
pub use field::{Field, Placement};
pub use organism::{Animal, CoreId, CorePlant, Hunger, LeafCell, Plant, PlantArena};
pub use simulation::{Engine, FieldSnapshot};
