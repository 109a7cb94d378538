//! Core type definitions for the simulation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A cell coordinate on the field.
///
/// Ordering is row-major, which is the order the engine visits organisms in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    pub row: i32,
    pub col: i32,
}

impl Location {
    pub fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    pub fn offset(&self, drow: i32, dcol: i32) -> Self {
        Self {
            row: self.row + drow,
            col: self.col + dcol,
        }
    }

    /// Whether this location lies inside a `depth` x `width` field
    pub fn in_bounds(&self, depth: i32, width: i32) -> bool {
        self.row >= 0 && self.row < depth && self.col >= 0 && self.col < width
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Neighbour offsets `(drow, dcol)` in row-major order, centre excluded.
pub const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Time {
    Day,
    Night,
}

impl Time {
    pub fn toggled(self) -> Self {
        match self {
            Time::Day => Time::Night,
            Time::Night => Time::Day,
        }
    }

    pub fn is_night(self) -> bool {
        self == Time::Night
    }
}

impl Default for Time {
    fn default() -> Self {
        Time::Day
    }
}

/// Weather for a single step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weather {
    Clear,
    Rain,
    Cloudy,
    Storm,
}

impl Weather {
    pub fn all() -> [Weather; 4] {
        [Weather::Clear, Weather::Rain, Weather::Cloudy, Weather::Storm]
    }
}

impl Default for Weather {
    fn default() -> Self {
        Weather::Clear
    }
}

/// Tag used for counting and seeding. Covers every organism kind, plants included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SpeciesTag {
    Rabbit,
    Deer,
    Armadillo,
    Fox,
    Wolf,
    Jaguar,
    Ocelot,
    Snake,
    CorePlant,
    LeafCell,
}

impl SpeciesTag {
    pub fn all() -> [SpeciesTag; 10] {
        [
            SpeciesTag::Rabbit,
            SpeciesTag::Deer,
            SpeciesTag::Armadillo,
            SpeciesTag::Fox,
            SpeciesTag::Wolf,
            SpeciesTag::Jaguar,
            SpeciesTag::Ocelot,
            SpeciesTag::Snake,
            SpeciesTag::CorePlant,
            SpeciesTag::LeafCell,
        ]
    }

    /// The animal species behind this tag, if it names one
    pub fn species(self) -> Option<Species> {
        match self {
            SpeciesTag::Rabbit => Some(Species::Rabbit),
            SpeciesTag::Deer => Some(Species::Deer),
            SpeciesTag::Armadillo => Some(Species::Armadillo),
            SpeciesTag::Fox => Some(Species::Fox),
            SpeciesTag::Wolf => Some(Species::Wolf),
            SpeciesTag::Jaguar => Some(Species::Jaguar),
            SpeciesTag::Ocelot => Some(Species::Ocelot),
            SpeciesTag::Snake => Some(Species::Snake),
            SpeciesTag::CorePlant | SpeciesTag::LeafCell => None,
        }
    }
}

impl fmt::Display for SpeciesTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Concrete animal species
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Species {
    Rabbit,
    Deer,
    Armadillo,
    Fox,
    Wolf,
    Jaguar,
    Ocelot,
    Snake,
}

impl Species {
    pub fn all() -> [Species; 8] {
        [
            Species::Rabbit,
            Species::Deer,
            Species::Armadillo,
            Species::Fox,
            Species::Wolf,
            Species::Jaguar,
            Species::Ocelot,
            Species::Snake,
        ]
    }

    pub fn tag(self) -> SpeciesTag {
        match self {
            Species::Rabbit => SpeciesTag::Rabbit,
            Species::Deer => SpeciesTag::Deer,
            Species::Armadillo => SpeciesTag::Armadillo,
            Species::Fox => SpeciesTag::Fox,
            Species::Wolf => SpeciesTag::Wolf,
            Species::Jaguar => SpeciesTag::Jaguar,
            Species::Ocelot => SpeciesTag::Ocelot,
            Species::Snake => SpeciesTag::Snake,
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Why an organism left the field during a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DeathCause {
    OldAge,
    Starvation,
    Infection,
    Overcrowding,
    Eaten,
    /// Lost a next-field cell to another organism
    Collision,
}

impl DeathCause {
    pub fn all() -> [DeathCause; 6] {
        [
            DeathCause::OldAge,
            DeathCause::Starvation,
            DeathCause::Infection,
            DeathCause::Overcrowding,
            DeathCause::Eaten,
            DeathCause::Collision,
        ]
    }
}

/// Growth phase of a core plant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Seedling,
    Leafing,
    Mature,
}

impl Phase {
    /// Phase number as 1, 2 or 3
    pub fn number(self) -> u8 {
        match self {
            Phase::Seedling => 1,
            Phase::Leafing => 2,
            Phase::Mature => 3,
        }
    }
}
