//! Day/night cycle and the weather gate on acting.

use crate::draws::Draws;
use ecosim_core::{Time, Weather, WeatherConfig};
use serde::{Deserialize, Serialize};

/// Step counter and time of day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Environment {
    step: u64,
    time: Time,
    day_length: u64,
}

impl Environment {
    pub fn new(day_length: u64) -> Self {
        Self {
            step: 0,
            time: Time::Day,
            day_length: day_length.max(1),
        }
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn time(&self) -> Time {
        self.time
    }

    /// Count a finished step; the time of day flips every `day_length` steps
    pub fn advance(&mut self) -> Time {
        self.step += 1;
        if self.step % self.day_length == 0 {
            self.time = self.time.toggled();
        }
        self.time
    }

    pub fn reset(&mut self) {
        self.step = 0;
        self.time = Time::Day;
    }
}

/// Probability an organism performs its full behaviour under `weather`
pub fn act_probability(weather: Weather, config: &WeatherConfig) -> f64 {
    match weather {
        Weather::Clear => 1.0,
        Weather::Rain => config.rain_act,
        Weather::Cloudy => config.cloudy_act,
        Weather::Storm => config.storm_act,
    }
}

/// Weather gate. Clear weather never draws.
pub fn can_act(weather: Weather, config: &WeatherConfig, draws: &mut dyn Draws) -> bool {
    match weather {
        Weather::Clear => true,
        _ => draws.chance(act_probability(weather, config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draws::AlwaysFail;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_day_night_cycle() {
        let mut env = Environment::new(20);
        for _ in 0..19 {
            assert_eq!(env.advance(), Time::Day);
        }
        assert_eq!(env.advance(), Time::Night);
        assert_eq!(env.step(), 20);

        for _ in 0..19 {
            env.advance();
        }
        assert_eq!(env.time(), Time::Night);
        assert_eq!(env.advance(), Time::Day);
    }

    #[test]
    fn test_reset() {
        let mut env = Environment::new(1);
        env.advance();
        assert_eq!(env.time(), Time::Night);
        env.reset();
        assert_eq!(env.step(), 0);
        assert_eq!(env.time(), Time::Day);
    }

    #[test]
    fn test_clear_weather_always_acts() {
        let config = WeatherConfig::default();
        assert!(can_act(Weather::Clear, &config, &mut AlwaysFail));
        assert!(!can_act(Weather::Storm, &config, &mut AlwaysFail));
    }

    #[test]
    fn test_act_probabilities() {
        let config = WeatherConfig::default();
        assert_eq!(act_probability(Weather::Clear, &config), 1.0);
        assert_eq!(act_probability(Weather::Rain, &config), 0.6);
        assert_eq!(act_probability(Weather::Cloudy, &config), 0.8);
        assert_eq!(act_probability(Weather::Storm, &config), 0.4);
    }

    #[test]
    fn test_storm_gate_rate() {
        let config = WeatherConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let acted = (0..10_000)
            .filter(|_| can_act(Weather::Storm, &config, &mut rng))
            .count();
        assert!((3_700..4_300).contains(&acted), "acted = {acted}");
    }
}
