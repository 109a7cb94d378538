//! Organism state: animals, core plants and their leaf cells.

use crate::draws::Draws;
use ecosim_core::{
    Location, Phase, Species, PREDATOR_FULL_STEPS, PREY_FULL_STEPS, PREY_HUNGRY_STEPS,
};
use serde::{Deserialize, Serialize};

/// Hunger timer shared by predators and prey.
///
/// An animal alternates between full and hungry. While full the timer counts
/// toward `full_steps`, after which the animal turns hungry; while hungry it
/// counts toward `hungry_steps`, after which the animal starves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunger {
    timer: u32,
    full: bool,
    full_steps: u32,
    hungry_steps: u32,
}

impl Hunger {
    pub fn new(full_steps: u32, hungry_steps: u32) -> Self {
        Self {
            timer: 0,
            full: false,
            full_steps,
            hungry_steps,
        }
    }

    /// Hunger for a newborn of `species`. Predators draw their starvation
    /// window from the prey they hunt.
    fn for_species(species: Species, draws: &mut dyn Draws) -> Self {
        match species.hungry_steps_bound() {
            Some(bound) => Self::new(PREDATOR_FULL_STEPS, 1 + draws.below(bound)),
            None => Self::new(PREY_FULL_STEPS, PREY_HUNGRY_STEPS),
        }
    }

    /// Advance one step. Returns `false` when the animal starves.
    pub fn tick(&mut self) -> bool {
        self.timer += 1;
        if self.full {
            if self.timer >= self.full_steps {
                self.full = false;
                self.timer = 0;
            }
            true
        } else {
            self.timer < self.hungry_steps
        }
    }

    pub fn feed(&mut self) {
        self.full = true;
        self.timer = 0;
    }

    pub fn is_full(&self) -> bool {
        self.full
    }

    pub fn timer(&self) -> u32 {
        self.timer
    }

    pub fn hungry_steps(&self) -> u32 {
        self.hungry_steps
    }
}

/// A predator or prey animal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Animal {
    species: Species,
    location: Location,
    alive: bool,
    female: bool,
    infected: bool,
    age: u32,
    hunger: Hunger,
}

impl Animal {
    /// A healthy, hungry animal of age zero with the species' widest starvation window
    pub fn new(species: Species, location: Location, female: bool) -> Self {
        let hunger = match species.hungry_steps_bound() {
            Some(bound) => Hunger::new(PREDATOR_FULL_STEPS, bound),
            None => Hunger::new(PREY_FULL_STEPS, PREY_HUNGRY_STEPS),
        };

        Self {
            species,
            location,
            alive: true,
            female,
            infected: false,
            age: 0,
            hunger,
        }
    }

    /// A newborn: random sex, small chance of being born infected
    pub fn newborn(
        species: Species,
        location: Location,
        birth_infection_probability: f64,
        draws: &mut dyn Draws,
    ) -> Self {
        let female = draws.coin();
        let infected = draws.chance(birth_infection_probability);
        let hunger = Hunger::for_species(species, draws);

        Self {
            species,
            location,
            alive: true,
            female,
            infected,
            age: 0,
            hunger,
        }
    }

    /// An animal for the initial population, with a random age below its maximum
    pub fn seeded(
        species: Species,
        location: Location,
        birth_infection_probability: f64,
        draws: &mut dyn Draws,
    ) -> Self {
        let mut animal = Self::newborn(species, location, birth_infection_probability, draws);
        animal.age = draws.below(species.params().max_age);
        animal
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.age = age;
        self
    }

    pub fn with_infection(mut self, infected: bool) -> Self {
        self.infected = infected;
        self
    }

    pub fn with_hunger(mut self, hunger: Hunger) -> Self {
        self.hunger = hunger;
        self
    }

    pub fn species(&self) -> Species {
        self.species
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub(crate) fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub(crate) fn set_dead(&mut self) {
        self.alive = false;
    }

    pub fn is_female(&self) -> bool {
        self.female
    }

    pub fn is_infected(&self) -> bool {
        self.infected
    }

    /// Infection is one-way
    pub(crate) fn infect(&mut self) {
        self.infected = true;
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn hunger(&self) -> &Hunger {
        &self.hunger
    }

    /// Age by one step. Returns `false` once past the species' max age.
    pub(crate) fn increment_age(&mut self) -> bool {
        self.age += 1;
        self.age <= self.species.params().max_age
    }

    /// Returns `false` when the animal starves
    pub(crate) fn increment_hunger(&mut self) -> bool {
        self.hunger.tick()
    }

    pub(crate) fn feed(&mut self) {
        self.hunger.feed();
    }
}

/// Handle of a core plant inside the [`PlantArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CoreId(pub usize);

/// A consumable satellite cell of a core plant.
///
/// The leaf holds only a handle to its core; the core decides whether the leaf
/// is still part of the plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafCell {
    pub core: CoreId,
}

/// What a field cell's plant layer holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Plant {
    Core(CoreId),
    Leaf(LeafCell),
}

impl Plant {
    pub fn core_id(&self) -> CoreId {
        match self {
            Plant::Core(id) => *id,
            Plant::Leaf(leaf) => leaf.core,
        }
    }
}

/// The central growth node of a plant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorePlant {
    location: Location,
    age: u32,
    phase: Phase,
    leaves: Vec<Location>,
}

impl CorePlant {
    pub fn new(location: Location) -> Self {
        Self {
            location,
            age: 0,
            phase: Phase::Seedling,
            leaves: Vec::new(),
        }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Locations of the live leaf cells this core owns
    pub fn leaves(&self) -> &[Location] {
        &self.leaves
    }

    pub fn has_leaf(&self, location: Location) -> bool {
        self.leaves.contains(&location)
    }

    pub(crate) fn set_age(&mut self, age: u32) {
        self.age = age;
    }

    pub(crate) fn increment_age(&mut self) {
        self.age += 1;
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    /// Back to a seedling; starts the regrowth cycle
    pub(crate) fn reset(&mut self) {
        self.age = 0;
        self.phase = Phase::Seedling;
    }

    pub(crate) fn register_leaf(&mut self, location: Location) {
        if !self.leaves.contains(&location) {
            self.leaves.push(location);
        }
    }

    /// Returns whether the leaf was registered
    pub(crate) fn remove_leaf(&mut self, location: Location) -> bool {
        let before = self.leaves.len();
        self.leaves.retain(|l| *l != location);
        self.leaves.len() != before
    }

    pub(crate) fn clear_leaves(&mut self) {
        self.leaves.clear();
    }
}

/// Owner of every core plant. Cores are never destroyed, so handles stay valid
/// for the lifetime of the arena.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlantArena {
    cores: Vec<CorePlant>,
}

impl PlantArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sprout(&mut self, core: CorePlant) -> CoreId {
        self.cores.push(core);
        CoreId(self.cores.len() - 1)
    }

    pub fn get(&self, id: CoreId) -> Option<&CorePlant> {
        self.cores.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: CoreId) -> Option<&mut CorePlant> {
        self.cores.get_mut(id.0)
    }

    /// Whether the leaf at `location` is still a live dependent of its core
    pub fn is_leaf_alive(&self, leaf: LeafCell, location: Location) -> bool {
        self.get(leaf.core)
            .map(|core| core.has_leaf(location))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.cores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CoreId, &CorePlant)> + '_ {
        self.cores
            .iter()
            .enumerate()
            .map(|(i, core)| (CoreId(i), core))
    }

    pub fn clear(&mut self) {
        self.cores.clear();
    }
}
