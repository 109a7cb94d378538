//! Configuration types for the simulation.

use crate::error::{Error, Result};
use crate::types::SpeciesTag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Depth used when the requested dimensions are unusable
pub const DEFAULT_DEPTH: i32 = 100;
/// Width used when the requested dimensions are unusable
pub const DEFAULT_WIDTH: i32 = 150;

/// Field dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Number of rows
    pub depth: i32,
    /// Number of columns
    pub width: i32,
}

impl WorldConfig {
    /// Build dimensions, falling back to the defaults when either is non-positive
    pub fn sanitized(depth: i32, width: i32) -> Self {
        if depth <= 0 || width <= 0 {
            warn!(
                depth,
                width,
                default_depth = DEFAULT_DEPTH,
                default_width = DEFAULT_WIDTH,
                "Field dimensions must be positive, using defaults"
            );
            return Self::default();
        }
        Self { depth, width }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            width: DEFAULT_WIDTH,
        }
    }
}

/// Who keeps a next-field cell when two organisms write it in the same step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollisionPolicy {
    /// The organism already in the cell stays; the newcomer is dropped
    FirstWriterWins,
    /// The newcomer replaces the organism already in the cell
    LastWriterWins,
}

impl Default for CollisionPolicy {
    fn default() -> Self {
        CollisionPolicy::FirstWriterWins
    }
}

/// Infection probabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfectionConfig {
    /// Chance a newborn animal starts out infected
    pub birth_infection_probability: f64,
    /// Per-step death chance of an infected predator
    pub predator_death_probability: f64,
    /// Per-step death chance of an infected prey
    pub prey_death_probability: f64,
}

impl Default for InfectionConfig {
    fn default() -> Self {
        Self {
            birth_infection_probability: 0.01,
            predator_death_probability: 0.2,
            prey_death_probability: 0.5,
        }
    }
}

/// Chance an animal acts at all under each weather. Clear weather always acts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    pub rain_act: f64,
    pub cloudy_act: f64,
    pub storm_act: f64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            rain_act: 0.6,
            cloudy_act: 0.8,
            storm_act: 0.4,
        }
    }
}

/// Inclusive row/column offset range of a leaf ring around its core
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RingOffsets {
    pub min: i32,
    pub max: i32,
}

impl RingOffsets {
    pub fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// All `(drow, dcol)` pairs in the ring, row-major, centre excluded
    pub fn offsets(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (self.min..=self.max).flat_map(move |dr| {
            (self.min..=self.max)
                .filter(move |&dc| dr != 0 || dc != 0)
                .map(move |dc| (dr, dc))
        })
    }
}

/// Plant growth parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantConfig {
    /// Age at which a core enters phase 2 and grows its first ring
    pub phase_two_age: u32,
    /// Age at which a core enters phase 3 and regrows its ring
    pub phase_three_age: u32,
    /// `0..=1`: the three cells below and to the right of the core
    pub phase_two_ring: RingOffsets,
    /// The full 8-neighbourhood. Phase 3 is meant to reach further than this;
    /// widen it once the intended radius is confirmed.
    pub phase_three_ring: RingOffsets,
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            phase_two_age: 10,
            phase_three_age: 30,
            phase_two_ring: RingOffsets::new(0, 1),
            phase_three_ring: RingOffsets::new(-1, 1),
        }
    }
}

/// Per-cell creation probabilities used when seeding a field.
///
/// Animal tags are tried in order (first success wins the cell); the
/// `CorePlant` entry is rolled independently since plants occupy their own
/// layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    pub creation_probabilities: BTreeMap<SpeciesTag, f64>,
}

impl PopulationConfig {
    /// Probabilities must be within [0, 1] and leaf cells cannot be seeded
    pub fn validate(&self) -> Result<()> {
        validate_creation_probabilities(&self.creation_probabilities)
    }
}

pub fn validate_creation_probabilities(probabilities: &BTreeMap<SpeciesTag, f64>) -> Result<()> {
    for (tag, p) in probabilities {
        check_probability(&tag.to_string(), *p)?;
    }
    if probabilities.contains_key(&SpeciesTag::LeafCell) {
        return Err(Error::Config(
            "leaf cells are grown by core plants and cannot be seeded".to_string(),
        ));
    }
    Ok(())
}

impl Default for PopulationConfig {
    fn default() -> Self {
        let creation_probabilities = [
            (SpeciesTag::Rabbit, 0.08),
            (SpeciesTag::Deer, 0.2),
            (SpeciesTag::Armadillo, 0.2),
            (SpeciesTag::Fox, 0.02),
            (SpeciesTag::Wolf, 0.02),
            (SpeciesTag::Jaguar, 0.02),
            (SpeciesTag::Ocelot, 0.02),
            (SpeciesTag::Snake, 0.02),
            (SpeciesTag::CorePlant, 0.05),
        ]
        .into_iter()
        .collect();

        Self {
            creation_probabilities,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub world: WorldConfig,
    /// Random seed for reproducibility
    pub seed: u64,
    /// Steps between day/night toggles
    pub day_length: u64,
    /// Steps between population snapshot logs
    pub log_interval: u64,
    pub collision_policy: CollisionPolicy,
    pub infection: InfectionConfig,
    pub weather: WeatherConfig,
    pub plants: PlantConfig,
    pub population: PopulationConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            seed: 0,
            day_length: 20,
            log_interval: 100,
            collision_policy: CollisionPolicy::default(),
            infection: InfectionConfig::default(),
            weather: WeatherConfig::default(),
            plants: PlantConfig::default(),
            population: PopulationConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the engine meaningless.
    ///
    /// Non-positive dimensions are not rejected here; the engine replaces
    /// them with the defaults.
    pub fn validate(&self) -> Result<()> {
        if self.day_length == 0 {
            return Err(Error::Config("day_length must be at least 1".to_string()));
        }
        if self.plants.phase_two_age >= self.plants.phase_three_age {
            return Err(Error::Config(format!(
                "phase_two_age ({}) must be below phase_three_age ({})",
                self.plants.phase_two_age, self.plants.phase_three_age
            )));
        }
        for ring in [&self.plants.phase_two_ring, &self.plants.phase_three_ring] {
            if ring.min > ring.max {
                return Err(Error::Config(format!(
                    "ring offsets {}..={} are empty",
                    ring.min, ring.max
                )));
            }
        }

        let probabilities = [
            ("birth_infection_probability", self.infection.birth_infection_probability),
            ("predator_death_probability", self.infection.predator_death_probability),
            ("prey_death_probability", self.infection.prey_death_probability),
            ("rain_act", self.weather.rain_act),
            ("cloudy_act", self.weather.cloudy_act),
            ("storm_act", self.weather.storm_act),
        ];
        for (name, p) in probabilities {
            check_probability(name, p)?;
        }
        self.population.validate()
    }
}

fn check_probability(name: &str, p: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&p) {
        return Err(Error::Config(format!(
            "{name} must be within [0, 1], got {p}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let config = EngineConfig::default();
        assert_eq!(config.world.depth, 100);
        assert_eq!(config.world.width, 150);
        assert_eq!(config.day_length, 20);
        assert_eq!(config.collision_policy, CollisionPolicy::FirstWriterWins);
        assert_eq!(config.infection.predator_death_probability, 0.2);
        assert_eq!(config.infection.prey_death_probability, 0.5);
        assert_eq!(config.plants.phase_two_ring.offsets().count(), 3);
        assert_eq!(config.plants.phase_three_ring.offsets().count(), 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sanitized_dimensions_fall_back() {
        assert_eq!(WorldConfig::sanitized(0, 10), WorldConfig::default());
        assert_eq!(WorldConfig::sanitized(10, -3), WorldConfig::default());
        assert_eq!(
            WorldConfig::sanitized(4, 7),
            WorldConfig { depth: 4, width: 7 }
        );
    }

    #[test]
    fn test_ring_offsets() {
        let ring: Vec<_> = RingOffsets::new(-1, 1).offsets().collect();
        assert_eq!(ring.len(), 8);
        assert!(!ring.contains(&(0, 0)));

        let half: Vec<_> = RingOffsets::new(0, 1).offsets().collect();
        assert_eq!(half, vec![(0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_config_json_round_trip() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed = EngineConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed.seed, config.seed);
        assert_eq!(parsed.plants.phase_three_ring, config.plants.phase_three_ring);
        assert_eq!(
            parsed.population.creation_probabilities,
            config.population.creation_probabilities
        );
    }

    #[test]
    fn test_validation_rejects_bad_probability() {
        let mut config = EngineConfig::default();
        config.weather.storm_act = 1.5;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validation_rejects_seeded_leaves() {
        let mut config = EngineConfig::default();
        config
            .population
            .creation_probabilities
            .insert(SpeciesTag::LeafCell, 0.1);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            EngineConfig::from_json_str("{ not json"),
            Err(Error::Serialization(_))
        ));
    }
}
