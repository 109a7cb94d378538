//! The 2D field: one step's worth of animal and plant placements.

use crate::organism::{Animal, Plant};
use ecosim_core::{
    CollisionPolicy, Error, Location, Result, Species, SpeciesTag, WorldConfig,
    NEIGHBOR_OFFSETS,
};
use std::collections::BTreeMap;

/// Outcome of writing into an occupied-or-not cell
#[derive(Debug, Clone, PartialEq)]
pub enum Placement<T> {
    /// The cell was empty
    Placed,
    /// The cell held something which the newcomer displaced
    Replaced(T),
    /// The cell was taken and the newcomer was turned away
    Rejected(T),
}

/// A bounded (non-wrapping) grid with at most one animal and, independently,
/// at most one plant per cell.
///
/// Maps are ordered by location so iteration is row-major and deterministic.
#[derive(Debug, Clone)]
pub struct Field {
    depth: i32,
    width: i32,
    policy: CollisionPolicy,
    animals: BTreeMap<Location, Animal>,
    plants: BTreeMap<Location, Plant>,
}

impl Field {
    /// Non-positive dimensions fall back to the defaults
    pub fn new(depth: i32, width: i32) -> Self {
        Self::with_policy(depth, width, CollisionPolicy::default())
    }

    pub fn with_policy(depth: i32, width: i32, policy: CollisionPolicy) -> Self {
        let world = WorldConfig::sanitized(depth, width);
        Self {
            depth: world.depth,
            width: world.width,
            policy,
            animals: BTreeMap::new(),
            plants: BTreeMap::new(),
        }
    }

    /// An empty field with the same shape and policy
    pub fn empty_like(other: &Field) -> Self {
        Self {
            depth: other.depth,
            width: other.width,
            policy: other.policy,
            animals: BTreeMap::new(),
            plants: BTreeMap::new(),
        }
    }

    pub fn depth(&self) -> i32 {
        self.depth
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    fn check_bounds(&self, location: Location) -> Result<()> {
        if location.in_bounds(self.depth, self.width) {
            Ok(())
        } else {
            Err(Error::OutOfBounds {
                location,
                depth: self.depth,
                width: self.width,
            })
        }
    }

    /// Put `animal` at `location`, updating its own location to match.
    ///
    /// An occupied cell is resolved by the field's collision policy. Dead
    /// animals and out-of-bounds locations are rejected as errors.
    pub fn place_animal(&mut self, mut animal: Animal, location: Location) -> Result<Placement<Animal>> {
        self.check_bounds(location)?;
        if !animal.is_alive() {
            return Err(Error::InvariantViolation(format!(
                "dead {} placed at {}",
                animal.species(),
                location
            )));
        }
        animal.set_location(location);

        match self.animals.get(&location) {
            None => {
                self.animals.insert(location, animal);
                Ok(Placement::Placed)
            }
            Some(_) => match self.policy {
                CollisionPolicy::FirstWriterWins => Ok(Placement::Rejected(animal)),
                CollisionPolicy::LastWriterWins => {
                    let displaced = self.animals.insert(location, animal);
                    Ok(displaced.map_or(Placement::Placed, Placement::Replaced))
                }
            },
        }
    }

    /// Put `plant` at `location`; occupied cells follow the collision policy
    pub fn place_plant(&mut self, plant: Plant, location: Location) -> Result<Placement<Plant>> {
        self.check_bounds(location)?;

        match self.plants.get(&location) {
            None => {
                self.plants.insert(location, plant);
                Ok(Placement::Placed)
            }
            Some(_) => match self.policy {
                CollisionPolicy::FirstWriterWins => Ok(Placement::Rejected(plant)),
                CollisionPolicy::LastWriterWins => {
                    let displaced = self.plants.insert(location, plant);
                    Ok(displaced.map_or(Placement::Placed, Placement::Replaced))
                }
            },
        }
    }

    /// Take an animal back out of a field under construction
    pub(crate) fn remove_animal(&mut self, location: Location) -> Option<Animal> {
        self.animals.remove(&location)
    }

    pub(crate) fn remove_plant(&mut self, location: Location) -> Option<Plant> {
        self.plants.remove(&location)
    }

    pub fn animal_at(&self, location: Location) -> Option<&Animal> {
        self.animals.get(&location)
    }

    pub fn plant_at(&self, location: Location) -> Option<&Plant> {
        self.plants.get(&location)
    }

    /// The up-to-8 in-bounds neighbours of `location`, row-major
    pub fn adjacent_locations(&self, location: Location) -> Vec<Location> {
        NEIGHBOR_OFFSETS
            .iter()
            .map(|&(dr, dc)| location.offset(dr, dc))
            .filter(|l| l.in_bounds(self.depth, self.width))
            .collect()
    }

    /// Neighbours of `location` holding no animal in this field
    pub fn free_adjacent_locations(&self, location: Location) -> Vec<Location> {
        self.adjacent_locations(location)
            .into_iter()
            .filter(|l| !self.animals.contains_key(l))
            .collect()
    }

    /// Whether at least one predator and one prey are alive
    pub fn is_viable(&self) -> bool {
        let mut predator = false;
        let mut prey = false;
        for animal in self.animals.values() {
            if animal.species().is_predator() {
                predator = true;
            } else {
                prey = true;
            }
            if predator && prey {
                return true;
            }
        }
        false
    }

    pub fn animals(&self) -> impl Iterator<Item = (Location, &Animal)> + '_ {
        self.animals.iter().map(|(loc, animal)| (*loc, animal))
    }

    pub fn plants(&self) -> impl Iterator<Item = (Location, &Plant)> + '_ {
        self.plants.iter().map(|(loc, plant)| (*loc, plant))
    }

    pub fn animal_count(&self) -> usize {
        self.animals.len()
    }

    pub fn plant_count(&self) -> usize {
        self.plants.len()
    }

    pub fn count_species(&self, species: Species) -> usize {
        self.animals
            .values()
            .filter(|a| a.species() == species)
            .count()
    }

    /// Organisms per tag. Every tag is present, zero counts included.
    pub fn species_counts(&self) -> BTreeMap<SpeciesTag, usize> {
        let mut counts: BTreeMap<SpeciesTag, usize> =
            SpeciesTag::all().into_iter().map(|tag| (tag, 0)).collect();

        for animal in self.animals.values() {
            *counts.entry(animal.species().tag()).or_insert(0) += 1;
        }
        for plant in self.plants.values() {
            let tag = match plant {
                Plant::Core(_) => SpeciesTag::CorePlant,
                Plant::Leaf(_) => SpeciesTag::LeafCell,
            };
            *counts.entry(tag).or_insert(0) += 1;
        }

        counts
    }

    pub fn clear(&mut self) {
        self.animals.clear();
        self.plants.clear();
    }

    /// Check that every stored animal is alive and sits under its own location
    pub fn check_invariants(&self) -> Result<()> {
        for (key, animal) in &self.animals {
            if animal.location() != *key {
                return Err(Error::InvariantViolation(format!(
                    "{} stored at {} believes it is at {}",
                    animal.species(),
                    key,
                    animal.location()
                )));
            }
            if !animal.is_alive() {
                return Err(Error::InvariantViolation(format!(
                    "dead {} stored at {}",
                    animal.species(),
                    key
                )));
            }
        }
        Ok(())
    }
}
