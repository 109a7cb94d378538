//! Simulation engine: owns the current field and advances it one step at a time.

use crate::behavior::{act_animal, plant, StepContext};
use crate::draws::Draws;
use crate::environment::Environment;
use crate::field::Field;
use crate::organism::{Animal, CoreId, CorePlant, Plant, PlantArena};
use ecosim_core::{
    validate_creation_probabilities, EngineConfig, Error, Location, Phase, Result, SpeciesTag,
    StepStats, Time, Weather, WorldConfig,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, event, info, instrument, Level};

/// Read-only view of the field after a step
#[derive(Debug, Clone, Copy)]
pub struct FieldSnapshot<'a> {
    pub step: u64,
    /// Time of day for the step that comes next
    pub time: Time,
    /// Weather the step ran under
    pub weather: Weather,
    pub stats: &'a StepStats,
    pub field: &'a Field,
    pub plants: &'a PlantArena,
}

impl FieldSnapshot<'_> {
    pub fn species_counts(&self) -> BTreeMap<SpeciesTag, usize> {
        self.field.species_counts()
    }

    pub fn is_viable(&self) -> bool {
        self.field.is_viable()
    }

    /// Serialize for an external view: occupied cells as `[location, occupant]` pairs
    pub fn to_json(&self) -> Result<String> {
        let record = SnapshotRecord {
            step: self.step,
            time: self.time,
            weather: self.weather,
            depth: self.field.depth(),
            width: self.field.width(),
            stats: self.stats,
            animals: self.field.animals().collect(),
            plants: self.field.plants().collect(),
        };
        Ok(serde_json::to_string(&record)?)
    }
}

#[derive(Serialize)]
struct SnapshotRecord<'a> {
    step: u64,
    time: Time,
    weather: Weather,
    depth: i32,
    width: i32,
    stats: &'a StepStats,
    animals: Vec<(Location, &'a Animal)>,
    plants: Vec<(Location, &'a Plant)>,
}

pub struct Engine<D: Draws = ChaCha8Rng> {
    config: EngineConfig,
    field: Field,
    plants: PlantArena,
    draws: D,
    environment: Environment,
    totals: StepStats,
    last_stats: StepStats,
    last_weather: Weather,
}

impl Engine<ChaCha8Rng> {
    /// An empty engine with default parameters. Non-positive dimensions fall
    /// back to the defaults.
    pub fn new(depth: i32, width: i32, seed: u64) -> Self {
        let config = EngineConfig {
            world: WorldConfig::sanitized(depth, width),
            seed,
            ..Default::default()
        };
        let draws = ChaCha8Rng::seed_from_u64(seed);
        Self::build(config, draws)
    }

    pub fn from_config(config: EngineConfig) -> Result<Self> {
        let draws = ChaCha8Rng::seed_from_u64(config.seed);
        Self::with_draws(config, draws)
    }
}

impl<D: Draws> Engine<D> {
    /// An engine driven by an arbitrary random source
    pub fn with_draws(mut config: EngineConfig, draws: D) -> Result<Self> {
        config.validate()?;
        config.world = WorldConfig::sanitized(config.world.depth, config.world.width);
        Ok(Self::build(config, draws))
    }

    fn build(config: EngineConfig, draws: D) -> Self {
        let field = Field::with_policy(
            config.world.depth,
            config.world.width,
            config.collision_policy,
        );
        let environment = Environment::new(config.day_length);

        info!(
            event = "engine_created",
            depth = field.depth(),
            width = field.width(),
            seed = config.seed,
            collision_policy = ?config.collision_policy,
            "Simulation engine created"
        );

        Self {
            config,
            field,
            plants: PlantArena::new(),
            draws,
            environment,
            totals: StepStats::new(),
            last_stats: StepStats::new(),
            last_weather: Weather::Clear,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Seed the field from the current random source.
    ///
    /// Each cell tries the animal tags in order and takes the first whose roll
    /// passes; the core plant roll is independent.
    pub fn populate_with(&mut self, probabilities: &BTreeMap<SpeciesTag, f64>) -> Result<()> {
        validate_creation_probabilities(probabilities)?;
        self.clear();

        let birth_infection = self.config.infection.birth_infection_probability;
        let core_probability = probabilities.get(&SpeciesTag::CorePlant).copied();

        for row in 0..self.field.depth() {
            for col in 0..self.field.width() {
                let location = Location::new(row, col);

                for (tag, p) in probabilities {
                    let Some(species) = tag.species() else {
                        continue;
                    };
                    if self.draws.chance(*p) {
                        let animal =
                            Animal::seeded(species, location, birth_infection, &mut self.draws);
                        self.field.place_animal(animal, location)?;
                        break;
                    }
                }

                if let Some(p) = core_probability {
                    if self.draws.chance(p) {
                        self.insert_core_plant(location, 0)?;
                    }
                }
            }
        }

        info!(
            event = "populated",
            animals = self.field.animal_count(),
            core_plants = self.plants.len(),
            "Field populated"
        );
        Ok(())
    }

    /// Place a hand-built animal into the current field
    pub fn insert_animal(&mut self, animal: Animal) -> Result<()> {
        let location = animal.location();
        if let Some(existing) = self.field.animal_at(location) {
            return Err(Error::InvariantViolation(format!(
                "{} cannot be placed at {}: occupied by {}",
                animal.species(),
                location,
                existing.species()
            )));
        }
        self.field.place_animal(animal, location)?;
        Ok(())
    }

    /// Plant a core at `location` with the given age. Leaves are grown by the
    /// core itself once it reaches the leafing age.
    pub fn insert_core_plant(&mut self, location: Location, age: u32) -> Result<CoreId> {
        if self.field.plant_at(location).is_some() {
            return Err(Error::InvariantViolation(format!(
                "core plant cannot be placed at {location}: cell already holds a plant"
            )));
        }
        if !location.in_bounds(self.field.depth(), self.field.width()) {
            return Err(Error::OutOfBounds {
                location,
                depth: self.field.depth(),
                width: self.field.width(),
            });
        }

        let mut core = CorePlant::new(location);
        core.set_age(age);
        let plants = &self.config.plants;
        if age >= plants.phase_three_age {
            core.set_phase(Phase::Mature);
        } else if age >= plants.phase_two_age {
            core.set_phase(Phase::Leafing);
        }

        let id = self.plants.sprout(core);
        self.field.place_plant(Plant::Core(id), location)?;
        Ok(id)
    }

    /// Advance one step under `weather`.
    ///
    /// Every organism reads the current field and writes the next one; the
    /// next field replaces the current one when all have acted. Animals go
    /// first, then core plants, then leaf cells, each in row-major order.
    pub fn simulate_one_step(&mut self, weather: Weather) -> Result<FieldSnapshot<'_>> {
        let time = self.environment.time();
        let mut next = Field::empty_like(&self.field);

        let stats = {
            let mut ctx = StepContext::new(
                &self.field,
                &mut next,
                &mut self.plants,
                &mut self.draws,
                &self.config,
                time,
                weather,
            );

            for (location, animal) in self.field.animals() {
                if ctx.is_gone(location) {
                    continue;
                }
                act_animal(animal.clone(), &mut ctx)?;
            }
            for (_, occupant) in self.field.plants() {
                if let Plant::Core(id) = occupant {
                    plant::act_core(*id, &mut ctx)?;
                }
            }
            for (location, occupant) in self.field.plants() {
                if let Plant::Leaf(leaf) = occupant {
                    plant::act_leaf(*leaf, location, &mut ctx)?;
                }
            }

            ctx.into_stats()
        };

        next.check_invariants()?;
        self.field = next;
        let next_time = self.environment.advance();
        let step = self.environment.step();

        debug!(
            event = "step_summary",
            step = step,
            time = ?time,
            weather = ?weather,
            animals = self.field.animal_count(),
            plants = self.field.plant_count(),
            births = stats.births,
            deaths = stats.total_deaths(),
            kills = stats.kills,
            leaves_eaten = stats.leaves_eaten,
            collisions = stats.collisions,
            "Step complete"
        );
        if next_time != time {
            debug!(event = "time_changed", step = step, time = ?next_time, "Time of day changed");
        }

        self.totals.accumulate(&stats);
        self.last_stats = stats;
        self.last_weather = weather;

        if self.config.log_interval > 0 && step % self.config.log_interval == 0 {
            self.emit_population_snapshot();
        }

        Ok(self.snapshot())
    }

    /// Step until `steps` have run or the field stops being viable. Returns
    /// the number of steps taken.
    pub fn simulate(&mut self, steps: u64, mut weather: impl FnMut(u64) -> Weather) -> Result<u64> {
        info!("Starting simulation for up to {} steps", steps);

        let mut taken = 0;
        while taken < steps && self.field.is_viable() {
            let current = weather(self.environment.step());
            self.simulate_one_step(current)?;
            taken += 1;
        }

        info!(
            event = "simulation_finished",
            steps = taken,
            viable = self.field.is_viable(),
            births = self.totals.births,
            deaths = self.totals.total_deaths(),
            "Simulation finished"
        );
        Ok(taken)
    }

    fn emit_population_snapshot(&self) {
        let step = self.environment.step();
        let counts = self.field.species_counts();

        info!(
            event = "population_snapshot",
            step = step,
            time = ?self.environment.time(),
            animals = self.field.animal_count(),
            plants = self.field.plant_count(),
            total_births = self.totals.births,
            total_deaths = self.totals.total_deaths(),
            total_kills = self.totals.kills,
            "Population snapshot"
        );

        for (tag, count) in counts {
            event!(
                Level::INFO,
                gauge_name = "population",
                species = %tag,
                gauge_value = count,
                step = step,
                "Population gauge"
            );
        }
    }

    pub fn snapshot(&self) -> FieldSnapshot<'_> {
        FieldSnapshot {
            step: self.environment.step(),
            time: self.environment.time(),
            weather: self.last_weather,
            stats: &self.last_stats,
            field: &self.field,
            plants: &self.plants,
        }
    }

    pub fn is_viable(&self) -> bool {
        self.field.is_viable()
    }

    pub fn species_counts(&self) -> BTreeMap<SpeciesTag, usize> {
        self.field.species_counts()
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn plants(&self) -> &PlantArena {
        &self.plants
    }

    pub fn time(&self) -> Time {
        self.environment.time()
    }

    pub fn step_count(&self) -> u64 {
        self.environment.step()
    }

    /// Counters accumulated over every step since the last reset
    pub fn totals(&self) -> &StepStats {
        &self.totals
    }

    /// Empty the field and rewind the clock. The random source is left as is;
    /// `populate` reseeds it.
    pub fn reset(&mut self) {
        self.clear();
        info!(event = "engine_reset", "Simulation engine reset");
    }

    fn clear(&mut self) {
        self.field.clear();
        self.plants.clear();
        self.environment.reset();
        self.totals = StepStats::new();
        self.last_stats = StepStats::new();
        self.last_weather = Weather::Clear;
    }
}

impl<D: Draws + SeedableRng> Engine<D> {
    /// Reseed the random source and seed the field
    #[instrument(skip(self, probabilities))]
    pub fn populate(&mut self, seed: u64, probabilities: &BTreeMap<SpeciesTag, f64>) -> Result<()> {
        self.draws = D::seed_from_u64(seed);
        self.config.seed = seed;
        self.populate_with(probabilities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draws::AlwaysFail;
    use ecosim_core::{Species, DEFAULT_DEPTH, DEFAULT_WIDTH};
    use proptest::prelude::*;

    fn populated(size: i32, seed: u64) -> Engine {
        let mut engine = Engine::new(size, size, seed);
        let probabilities = engine.config().population.creation_probabilities.clone();
        engine.populate(seed, &probabilities).unwrap();
        engine
    }

    /// The only animal of `species` in the field
    fn lone(engine: &Engine<impl Draws>, species: Species) -> Option<Animal> {
        let mut found = engine
            .field()
            .animals()
            .filter(|(_, a)| a.species() == species)
            .map(|(_, a)| a.clone());
        let first = found.next();
        assert!(found.next().is_none());
        first
    }

    #[test]
    fn test_engine_creation() {
        let engine = Engine::new(20, 30, 1);
        assert_eq!(engine.field().depth(), 20);
        assert_eq!(engine.field().width(), 30);
        assert_eq!(engine.step_count(), 0);
        assert_eq!(engine.time(), Time::Day);
        assert!(!engine.is_viable());
    }

    #[test]
    fn test_invalid_dimensions_fall_back() {
        let engine = Engine::new(0, -5, 1);
        assert_eq!(engine.field().depth(), DEFAULT_DEPTH);
        assert_eq!(engine.field().width(), DEFAULT_WIDTH);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = EngineConfig {
            day_length: 0,
            ..Default::default()
        };
        assert!(matches!(Engine::from_config(config), Err(Error::Config(_))));
    }

    #[test]
    fn test_populate_is_deterministic() {
        let a = populated(25, 11);
        let b = populated(25, 11);
        let c = populated(25, 12);

        assert!(a.field().animal_count() > 0);
        assert_eq!(a.species_counts(), b.species_counts());
        assert_ne!(
            a.field().animals().map(|(l, _)| l).collect::<Vec<_>>(),
            c.field().animals().map(|(l, _)| l).collect::<Vec<_>>()
        );
        for (_, animal) in a.field().animals() {
            assert!(animal.age() < animal.species().params().max_age);
        }
        assert_eq!(a.field().count_species(Species::Rabbit), a.species_counts()[&SpeciesTag::Rabbit]);
    }

    #[test]
    fn test_populate_rejects_leaf_cells() {
        let mut engine = Engine::new(5, 5, 1);
        let probabilities = [(SpeciesTag::LeafCell, 0.5)].into_iter().collect();
        assert!(engine.populate(1, &probabilities).is_err());
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let mut a = populated(20, 5);
        let mut b = populated(20, 5);
        for _ in 0..15 {
            a.simulate_one_step(Weather::Rain).unwrap();
            b.simulate_one_step(Weather::Rain).unwrap();
        }
        assert_eq!(a.species_counts(), b.species_counts());
        assert_eq!(a.totals(), b.totals());
    }

    #[test]
    fn test_day_night_cycle() {
        let config = EngineConfig {
            world: WorldConfig { depth: 4, width: 4 },
            day_length: 3,
            ..Default::default()
        };
        let mut engine = Engine::from_config(config).unwrap();

        let mut times = Vec::new();
        for _ in 0..6 {
            times.push(engine.simulate_one_step(Weather::Clear).unwrap().time);
        }
        assert_eq!(
            times,
            vec![Time::Day, Time::Day, Time::Night, Time::Night, Time::Night, Time::Day]
        );
        assert_eq!(engine.step_count(), 6);
    }

    #[test]
    fn test_snapshot_reports_step() {
        let mut engine = populated(15, 3);
        let snapshot = engine.simulate_one_step(Weather::Storm).unwrap();
        assert_eq!(snapshot.step, 1);
        assert_eq!(snapshot.weather, Weather::Storm);
        let stats = snapshot.stats.clone();
        assert_eq!(&stats, engine.totals());
    }

    #[test]
    fn test_snapshot_json() {
        let mut engine = Engine::with_draws(EngineConfig::default(), AlwaysFail).unwrap();
        engine
            .insert_animal(Animal::new(Species::Fox, Location::new(3, 3), true))
            .unwrap();
        engine.insert_core_plant(Location::new(7, 7), 0).unwrap();

        let json = engine.simulate_one_step(Weather::Cloudy).unwrap().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["step"], 1);
        assert_eq!(value["weather"], "Cloudy");
        assert_eq!(value["animals"].as_array().unwrap().len(), 1);
        assert_eq!(value["animals"][0][1]["species"], "Fox");
        assert_eq!(value["plants"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_lone_animal_ages_one_per_step() {
        let mut engine = Engine::with_draws(EngineConfig::default(), AlwaysFail).unwrap();
        let deer = Animal::new(Species::Deer, Location::new(10, 10), true).with_age(3);
        engine.insert_animal(deer).unwrap();

        for step in 1..=10 {
            engine.simulate_one_step(Weather::Clear).unwrap();
            let deer = lone(&engine, Species::Deer).unwrap();
            assert_eq!(deer.age(), 3 + step);
        }
    }

    #[test]
    fn test_animal_absent_after_max_age() {
        let mut engine = Engine::with_draws(EngineConfig::default(), AlwaysFail).unwrap();
        let max_age = Species::Rabbit.params().max_age;
        let rabbit = Animal::new(Species::Rabbit, Location::new(5, 5), true).with_age(max_age - 1);
        engine.insert_animal(rabbit).unwrap();

        engine.simulate_one_step(Weather::Clear).unwrap();
        assert_eq!(lone(&engine, Species::Rabbit).unwrap().age(), max_age);

        let snapshot = engine.simulate_one_step(Weather::Clear).unwrap();
        assert_eq!(snapshot.stats.deaths_by(ecosim_core::DeathCause::OldAge), 1);
        assert_eq!(engine.field().animal_count(), 0);
    }

    #[test]
    fn test_infection_is_kept() {
        let mut engine = Engine::with_draws(EngineConfig::default(), AlwaysFail).unwrap();
        let wolf = Animal::new(Species::Wolf, Location::new(5, 5), true).with_infection(true);
        let deer = Animal::new(Species::Deer, Location::new(5, 7), false);
        engine.insert_animal(wolf).unwrap();
        engine.insert_animal(deer).unwrap();

        for _ in 0..5 {
            engine.simulate_one_step(Weather::Clear).unwrap();
            assert!(lone(&engine, Species::Wolf).unwrap().is_infected());
        }
    }

    #[test]
    fn test_prey_dead_of_old_age_is_not_eaten() {
        use ecosim_core::DeathCause;

        let mut engine = Engine::with_draws(EngineConfig::default(), AlwaysFail).unwrap();
        let max_age = Species::Rabbit.params().max_age;
        let rabbit = Animal::new(Species::Rabbit, Location::new(5, 5), true).with_age(max_age);
        let fox = Animal::new(Species::Fox, Location::new(6, 6), true);
        engine.insert_animal(rabbit).unwrap();
        engine.insert_animal(fox).unwrap();

        let stats = engine.simulate_one_step(Weather::Clear).unwrap().stats.clone();

        assert_eq!(stats.deaths_by(DeathCause::OldAge), 1);
        assert_eq!(stats.deaths_by(DeathCause::Eaten), 0);
        assert_eq!(stats.kills, 0);
        assert_eq!(stats.total_deaths(), 1);
        assert!(lone(&engine, Species::Rabbit).is_none());
        assert!(lone(&engine, Species::Fox).is_some());
    }

    #[test]
    fn test_dead_neighbour_does_not_infect() {
        let mut engine = Engine::with_draws(EngineConfig::default(), AlwaysFail).unwrap();
        let max_age = Species::Deer.params().max_age;
        let deer = Animal::new(Species::Deer, Location::new(5, 5), true)
            .with_age(max_age)
            .with_infection(true);
        let wolf = Animal::new(Species::Wolf, Location::new(6, 6), false);
        engine.insert_animal(deer).unwrap();
        engine.insert_animal(wolf).unwrap();

        engine.simulate_one_step(Weather::Clear).unwrap();

        assert!(lone(&engine, Species::Deer).is_none());
        assert!(!lone(&engine, Species::Wolf).unwrap().is_infected());
    }

    #[test]
    fn test_core_plant_grows_leaves() {
        let mut engine = Engine::with_draws(EngineConfig::default(), AlwaysFail).unwrap();
        let id = engine.insert_core_plant(Location::new(0, 5), 9).unwrap();
        assert!(engine.insert_core_plant(Location::new(0, 5), 0).is_err());

        engine.simulate_one_step(Weather::Clear).unwrap();

        let core = engine.plants().get(id).unwrap();
        assert_eq!(core.phase(), Phase::Leafing);
        assert_eq!(
            core.leaves(),
            &[Location::new(0, 6), Location::new(1, 5), Location::new(1, 6)]
        );
        assert_eq!(engine.species_counts()[&SpeciesTag::LeafCell], 3);

        // Leaves persist on the following step
        engine.simulate_one_step(Weather::Clear).unwrap();
        assert_eq!(engine.species_counts()[&SpeciesTag::LeafCell], 3);
    }

    #[test]
    fn test_reset() {
        let mut engine = populated(15, 9);
        engine.simulate_one_step(Weather::Clear).unwrap();
        engine.reset();

        assert_eq!(engine.step_count(), 0);
        assert_eq!(engine.field().animal_count(), 0);
        assert_eq!(engine.field().plant_count(), 0);
        assert!(engine.plants().is_empty());
        assert_eq!(engine.totals(), &StepStats::new());
    }

    #[test]
    fn test_simulate_stops_when_not_viable() {
        let mut engine = Engine::new(10, 10, 1);
        engine
            .insert_animal(Animal::new(Species::Deer, Location::new(1, 1), true))
            .unwrap();
        assert_eq!(engine.simulate(50, |_| Weather::Clear).unwrap(), 0);

        let mut engine = populated(30, 21);
        let taken = engine.simulate(40, |step| Weather::all()[(step % 4) as usize]).unwrap();
        assert!(taken <= 40);
        assert_eq!(engine.step_count(), taken);
    }

    #[test]
    fn test_insert_animal_rejects_occupied_cell() {
        let mut engine = Engine::new(5, 5, 1);
        let loc = Location::new(2, 2);
        engine.insert_animal(Animal::new(Species::Fox, loc, true)).unwrap();
        assert!(engine.insert_animal(Animal::new(Species::Wolf, loc, true)).is_err());
        assert!(engine
            .insert_animal(Animal::new(Species::Wolf, Location::new(9, 9), true))
            .is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_population_bound(seed in any::<u64>()) {
            let mut engine = populated(12, seed);
            let cells = 12 * 12;
            for _ in 0..12 {
                let snapshot = engine.simulate_one_step(Weather::Clear).unwrap();
                prop_assert!(snapshot.field.check_invariants().is_ok());
                prop_assert!(snapshot.field.animal_count() <= cells);
                prop_assert!(snapshot.field.plant_count() <= cells);
                let counted: usize = snapshot.species_counts().values().sum();
                prop_assert_eq!(
                    counted,
                    snapshot.field.animal_count() + snapshot.field.plant_count()
                );
                for (_, animal) in snapshot.field.animals() {
                    prop_assert!(animal.age() <= animal.species().params().max_age);
                }
            }
        }

        #[test]
        fn prop_lone_infected_animal_stays_infected(seed in any::<u64>()) {
            let mut engine = Engine::new(8, 8, seed);
            let snake = Animal::new(Species::Snake, Location::new(4, 4), true).with_infection(true);
            engine.insert_animal(snake).unwrap();

            for _ in 0..10 {
                engine.simulate_one_step(Weather::Clear).unwrap();
                match lone(&engine, Species::Snake) {
                    Some(snake) => prop_assert!(snake.is_infected()),
                    None => break,
                }
            }
        }
    }
}
