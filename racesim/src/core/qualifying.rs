use crate::core::car::ConstructorProfile;
use crate::core::driver::DriverEntry;
use crate::core::performance::{bounded_noise, PerformanceModel};
use crate::core::track::TrackProfile;
use crate::core::weather::Weather;
use crate::error::{MissingDataError, SimError};
use crate::interfaces::reference_data::ReferenceProvider;
use crate::pre::sim_config::SimConfig;
use helpers::general::{argsort, format_lap_time, SortOrder};
use rand::Rng;
use serde::Serialize;
use tracing::debug;

/// * `position` - Qualifying position, equals the grid position of the entry
/// * `time` - (s) Qualifying lap time
/// * `time_formatted` - Qualifying lap time in M:SS.mmm format
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualifyingResult {
    pub position: usize,
    pub driver: String,
    pub constructor: String,
    pub time: f64,
    pub time_formatted: String,
    pub skill_rating: f64,
}

/// QualifyingSimulator runs a single timed lap per entry and derives the starting order.
pub struct QualifyingSimulator<'a> {
    cfg: &'a SimConfig,
    model: PerformanceModel<'a>,
    track: &'a TrackProfile,
    weather: Weather,
}

impl<'a> QualifyingSimulator<'a> {
    pub fn new(
        cfg: &'a SimConfig,
        track: &'a TrackProfile,
        weather: Weather,
    ) -> QualifyingSimulator<'a> {
        QualifyingSimulator {
            cfg,
            model: PerformanceModel::new(cfg),
            track,
            weather,
        }
    }

    /// Qualifying lap time of a single entry.
    pub fn lap_time<R: Rng>(&self, skill: f64, car: &ConstructorProfile, rng: &mut R) -> f64 {
        let skill_penalty = (100.0 - skill) / 100.0 * self.cfg.quali_skill_scale;
        let car_penalty = (100.0 - car.speed_rating) / 100.0 * self.cfg.quali_car_scale;

        let weather_penalty = match self.weather {
            Weather::Dry => 0.0,
            Weather::Wet => self.wet_penalty(skill, rng),
            Weather::Mixed => 0.5 * self.wet_penalty(skill, rng),
        };

        let bonus = self.model.track_bonus(skill, car, self.track) * self.cfg.bonus_time_scale;

        self.cfg.quali_base_time + skill_penalty + car_penalty + weather_penalty - bonus
            + bounded_noise(rng, self.cfg.quali_noise)
    }

    fn wet_penalty<R: Rng>(&self, skill: f64, rng: &mut R) -> f64 {
        let random_loss = if self.cfg.quali_wet_penalty_max > 0.0 {
            rng.gen_range(0.0..self.cfg.quali_wet_penalty_max)
        } else {
            0.0
        };
        random_loss - skill / 100.0 * self.cfg.quali_wet_skill_gain
    }

    /// Runs qualifying for the grid in submission order. Returns the grid sorted by qualifying
    /// time (with updated grid positions) and the qualifying classification. Equal times keep
    /// the submission order.
    pub fn run<R: Rng>(
        &self,
        grid: Vec<DriverEntry>,
        reference: &dyn ReferenceProvider,
        rng: &mut R,
    ) -> Result<(Vec<DriverEntry>, Vec<QualifyingResult>), SimError> {
        let mut times = Vec::with_capacity(grid.len());

        for entry in grid.iter() {
            let car = reference
                .car_profile(&entry.constructor_id)
                .ok_or_else(|| MissingDataError::Constructor(entry.constructor_id.to_owned()))?;
            times.push(self.lap_time(entry.skill_rating, car, rng));
        }

        let order = argsort(&times, SortOrder::Ascending);
        let mut sorted_grid = Vec::with_capacity(grid.len());
        let mut results = Vec::with_capacity(grid.len());

        for (rank, &idx) in order.iter().enumerate() {
            let mut entry = grid[idx].clone();
            entry.grid_position = rank + 1;

            debug!(
                "Qualifying P{}: {} {}",
                entry.grid_position,
                entry.driver_id,
                format_lap_time(times[idx])
            );

            results.push(QualifyingResult {
                position: entry.grid_position,
                driver: entry.driver_id.to_owned(),
                constructor: entry.constructor_id.to_owned(),
                time: times[idx],
                time_formatted: format_lap_time(times[idx]),
                skill_rating: entry.skill_rating,
            });
            sorted_grid.push(entry);
        }

        Ok((sorted_grid, results))
    }
}
