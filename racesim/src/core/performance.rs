use crate::core::car::ConstructorProfile;
use crate::core::track::{CircuitType, TrackProfile};
use crate::core::weather::Weather;
use crate::pre::sim_config::SimConfig;
use rand::Rng;
use serde::Serialize;

/// Draws uniform noise from [-bound, bound). A non-positive bound yields no noise (and consumes
/// no random number).
pub fn bounded_noise<R: Rng>(rng: &mut R, bound: f64) -> f64 {
    if bound > 0.0 {
        rng.gen_range(-bound..bound)
    } else {
        0.0
    }
}

/// Components of the composite performance of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceBreakdown {
    pub track_adjusted: f64,
    pub weather_factor: f64,
    pub track_bonus: f64,
    pub composite: f64,
}

/// PerformanceModel combines driver skill, car rating, track profile and weather into one
/// unitless score. Qualifying and race use the same model such that both phases stay consistent.
#[derive(Debug, Clone, Copy)]
pub struct PerformanceModel<'a> {
    cfg: &'a SimConfig,
}

impl<'a> PerformanceModel<'a> {
    pub fn new(cfg: &'a SimConfig) -> PerformanceModel<'a> {
        PerformanceModel { cfg }
    }

    /// Multiplicative weather penalty. Higher skill dampens the loss in bad conditions.
    pub fn weather_factor(&self, skill: f64, weather: Weather) -> f64 {
        let skill_frac = skill / 100.0;
        match weather {
            Weather::Dry => 1.0,
            Weather::Wet => self.cfg.wet_factor_base + skill_frac * self.cfg.wet_factor_skill_gain,
            Weather::Mixed => {
                self.cfg.mixed_factor_base + skill_frac * self.cfg.mixed_factor_skill_gain
            }
        }
    }

    /// Additive bonus if the circuit type matches a performance archetype.
    pub fn track_bonus(&self, skill: f64, car: &ConstructorProfile, track: &TrackProfile) -> f64 {
        match track.circuit_type {
            CircuitType::Technical if skill > self.cfg.technical_skill_threshold => {
                self.cfg.technical_bonus
            }
            CircuitType::Power if car.speed_rating >= self.cfg.power_speed_threshold => {
                self.cfg.power_bonus
            }
            CircuitType::Street if skill > self.cfg.street_skill_threshold => {
                self.cfg.street_bonus
            }
            _ => 0.0,
        }
    }

    pub fn breakdown(
        &self,
        skill: f64,
        car: &ConstructorProfile,
        track: &TrackProfile,
        weather: Weather,
    ) -> PerformanceBreakdown {
        // the two importance values are independent weights, not a probability split
        let track_adjusted = skill * track.driver_skill_importance
            + car.overall_performance * track.car_performance_importance;
        let weather_factor = self.weather_factor(skill, weather);
        let track_bonus = self.track_bonus(skill, car, track);

        PerformanceBreakdown {
            track_adjusted,
            weather_factor,
            track_bonus,
            composite: track_adjusted * weather_factor + track_bonus,
        }
    }

    pub fn composite_performance(
        &self,
        skill: f64,
        car: &ConstructorProfile,
        track: &TrackProfile,
        weather: Weather,
    ) -> f64 {
        self.breakdown(skill, car, track, weather).composite
    }

    /// Per-lap survival probability of a car.
    pub fn reliability_factor(&self, car: &ConstructorProfile) -> f64 {
        let failure_prob =
            (1.0 - car.reliability_rating / 100.0).clamp(0.0, 1.0) * self.cfg.failure_rate_scale;
        (1.0 - failure_prob).clamp(0.0, 1.0)
    }
}
