//! Per-species parameter table.
//!
//! Every concrete animal species carries a fixed record of breeding and
//! lifespan constants plus a role. Behaviour differences between species are
//! expressed entirely through this table; there is no per-species code.

use crate::types::Species;
use serde::{Deserialize, Serialize};

/// Steps a predator stays full after eating
pub const PREDATOR_FULL_STEPS: u32 = 5;
/// Steps a prey stays full after eating
pub const PREY_FULL_STEPS: u32 = 5;
/// Steps a prey survives while hungry
pub const PREY_HUNGRY_STEPS: u32 = 25;

/// What an animal eats and how the time of day gates it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Role {
    Predator {
        /// The one species this predator hunts
        prey: Species,
        /// Probability a hunt succeeds at night; daytime hunts always succeed
        night_hunt_success: f64,
    },
    Prey {
        /// Probability of moving at night; daytime movement is unconditional
        night_move_probability: f64,
        /// Upper bound of the starvation window this prey grants a predator
        /// that hunts it
        sustains_steps: u32,
    },
}

/// Fixed constants for one species
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeciesParams {
    pub species: Species,
    pub role: Role,
    pub breeding_age: u32,
    pub max_age: u32,
    pub breeding_probability: f64,
    pub max_litter_size: u32,
}

const RABBIT: SpeciesParams = SpeciesParams {
    species: Species::Rabbit,
    role: Role::Prey {
        night_move_probability: 0.3,
        sustains_steps: 20,
    },
    breeding_age: 10,
    max_age: 30,
    breeding_probability: 0.35,
    max_litter_size: 5,
};

const DEER: SpeciesParams = SpeciesParams {
    species: Species::Deer,
    role: Role::Prey {
        night_move_probability: 0.5,
        sustains_steps: 50,
    },
    breeding_age: 15,
    max_age: 175,
    breeding_probability: 0.35,
    max_litter_size: 3,
};

const ARMADILLO: SpeciesParams = SpeciesParams {
    species: Species::Armadillo,
    role: Role::Prey {
        night_move_probability: 0.8,
        sustains_steps: 10,
    },
    breeding_age: 10,
    max_age: 30,
    breeding_probability: 0.35,
    max_litter_size: 5,
};

const FOX: SpeciesParams = SpeciesParams {
    species: Species::Fox,
    role: Role::Predator {
        prey: Species::Rabbit,
        night_hunt_success: 1.0,
    },
    breeding_age: 15,
    max_age: 180,
    breeding_probability: 0.1,
    max_litter_size: 4,
};

const WOLF: SpeciesParams = SpeciesParams {
    species: Species::Wolf,
    role: Role::Predator {
        prey: Species::Deer,
        night_hunt_success: 1.0,
    },
    breeding_age: 15,
    max_age: 150,
    breeding_probability: 0.07,
    max_litter_size: 3,
};

const JAGUAR: SpeciesParams = SpeciesParams {
    species: Species::Jaguar,
    role: Role::Predator {
        prey: Species::Deer,
        night_hunt_success: 0.5,
    },
    breeding_age: 15,
    max_age: 150,
    breeding_probability: 0.075,
    max_litter_size: 2,
};

const OCELOT: SpeciesParams = SpeciesParams {
    species: Species::Ocelot,
    role: Role::Predator {
        prey: Species::Armadillo,
        night_hunt_success: 0.75,
    },
    breeding_age: 15,
    max_age: 180,
    breeding_probability: 0.15,
    max_litter_size: 5,
};

const SNAKE: SpeciesParams = SpeciesParams {
    species: Species::Snake,
    role: Role::Predator {
        prey: Species::Armadillo,
        night_hunt_success: 0.75,
    },
    breeding_age: 15,
    max_age: 200,
    breeding_probability: 0.1,
    max_litter_size: 25,
};

impl Species {
    /// The constant parameter record for this species
    pub fn params(self) -> &'static SpeciesParams {
        match self {
            Species::Rabbit => &RABBIT,
            Species::Deer => &DEER,
            Species::Armadillo => &ARMADILLO,
            Species::Fox => &FOX,
            Species::Wolf => &WOLF,
            Species::Jaguar => &JAGUAR,
            Species::Ocelot => &OCELOT,
            Species::Snake => &SNAKE,
        }
    }

    pub fn is_predator(self) -> bool {
        matches!(self.params().role, Role::Predator { .. })
    }

    pub fn is_prey_species(self) -> bool {
        matches!(self.params().role, Role::Prey { .. })
    }

    /// Whether `other` is what this species hunts
    pub fn hunts(self, other: Species) -> bool {
        match self.params().role {
            Role::Predator { prey, .. } => prey == other,
            Role::Prey { .. } => false,
        }
    }

    /// Upper bound of a newborn predator's starvation window, taken from its prey
    pub fn hungry_steps_bound(self) -> Option<u32> {
        match self.params().role {
            Role::Predator { prey, .. } => match prey.params().role {
                Role::Prey { sustains_steps, .. } => Some(sustains_steps),
                Role::Predator { .. } => None,
            },
            Role::Prey { .. } => None,
        }
    }
}
