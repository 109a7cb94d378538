//! Error types for the simulation.

use crate::types::Location;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Engine failures.
///
/// Stochastic outcomes (a failed hunt, a missed breeding roll) are ordinary
/// control flow and never show up here. Everything below means the
/// double-buffer discipline was broken or the input was unusable.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Location {location} is outside the {depth}x{width} field")]
    OutOfBounds {
        location: Location,
        depth: i32,
        width: i32,
    },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
