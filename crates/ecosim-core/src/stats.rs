//! Per-step event counters.

use crate::types::DeathCause;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What happened during one step (or, accumulated, during a run)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepStats {
    /// Newborns placed into the next field
    pub births: u64,
    /// Animals removed, by cause
    pub deaths: BTreeMap<DeathCause, u64>,
    /// Prey taken by predators
    pub kills: u64,
    /// Leaf cells consumed by prey
    pub leaves_eaten: u64,
    /// Leaf cells grown by core plants
    pub leaves_spawned: u64,
    /// Next-field writes that hit an occupied cell
    pub collisions: u64,
}

impl StepStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_death(&mut self, cause: DeathCause) {
        *self.deaths.entry(cause).or_insert(0) += 1;
    }

    pub fn deaths_by(&self, cause: DeathCause) -> u64 {
        self.deaths.get(&cause).copied().unwrap_or(0)
    }

    pub fn total_deaths(&self) -> u64 {
        self.deaths.values().sum()
    }

    /// Fold another step's counters into this one
    pub fn accumulate(&mut self, other: &StepStats) {
        self.births += other.births;
        for (cause, count) in &other.deaths {
            *self.deaths.entry(*cause).or_insert(0) += count;
        }
        self.kills += other.kills;
        self.leaves_eaten += other.leaves_eaten;
        self.leaves_spawned += other.leaves_spawned;
        self.collisions += other.collisions;
    }
}
