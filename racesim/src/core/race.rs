use crate::core::car::RetirementCause;
use crate::core::driver::DriverEntry;
use crate::core::performance::{bounded_noise, PerformanceModel};
use crate::core::state_handler::RaceEntryState;
use crate::core::track::TrackProfile;
use crate::core::weather::Weather;
use crate::error::{MissingDataError, SimError};
use crate::interfaces::reference_data::ReferenceProvider;
use crate::pre::sim_config::SimConfig;
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use tracing::debug;

/// Returns the laps of the mandatory pit stops for the given race fractions. The laps are clamped
/// into [1, tot_no_laps], sorted and deduplicated.
pub fn pit_laps(tot_no_laps: u32, pit_windows: &[f64]) -> Vec<u32> {
    if tot_no_laps == 0 {
        return Vec::new();
    }

    let mut laps: Vec<u32> = pit_windows
        .iter()
        .map(|frac| ((frac * tot_no_laps as f64).round() as u32).clamp(1, tot_no_laps))
        .collect();
    laps.sort_unstable();
    laps.dedup();
    laps
}

/// Race advances all entries lap by lap. Entries are stored in grid order, which is also the
/// order in which they are processed within a lap.
#[derive(Debug)]
pub struct Race<'a> {
    cfg: &'a SimConfig,
    pub track: &'a TrackProfile,
    pub weather: Weather,
    pub tot_no_laps: u32,
    pub cur_lap: u32,
    pit_laps: Vec<u32>,
    weather_penalty: Option<Uniform<f64>>,
    entries: Vec<RaceEntryState>,
    lap_chart: Vec<Vec<String>>,
}

impl<'a> Race<'a> {
    /// Creates the race for a qualified grid. The grid must be sorted by grid position.
    pub fn new(
        cfg: &'a SimConfig,
        track: &'a TrackProfile,
        weather: Weather,
        tot_no_laps: u32,
        grid: &[DriverEntry],
        reference: &dyn ReferenceProvider,
    ) -> Result<Race<'a>, SimError> {
        let model = PerformanceModel::new(cfg);
        let mut entries = Vec::with_capacity(grid.len());

        for entry in grid.iter() {
            let car = reference
                .car_profile(&entry.constructor_id)
                .ok_or_else(|| MissingDataError::Constructor(entry.constructor_id.to_owned()))?;

            entries.push(RaceEntryState::new(
                &entry.driver_id,
                &entry.constructor_id,
                entry.grid_position,
                entry.skill_rating,
                model.composite_performance(entry.skill_rating, car, track, weather),
                model.reliability_factor(car),
            ));
        }

        let weather_penalty = match weather {
            Weather::Dry => None,
            Weather::Wet => Some(Uniform::new_inclusive(
                cfg.wet_lap_penalty[0],
                cfg.wet_lap_penalty[1],
            )),
            Weather::Mixed => Some(Uniform::new_inclusive(
                cfg.mixed_lap_penalty[0],
                cfg.mixed_lap_penalty[1],
            )),
        };

        Ok(Race {
            cfg,
            track,
            weather,
            tot_no_laps,
            cur_lap: 0,
            pit_laps: pit_laps(tot_no_laps, &cfg.pit_windows),
            weather_penalty,
            entries,
            lap_chart: Vec::with_capacity(tot_no_laps as usize),
        })
    }

    // ---------------------------------------------------------------------------------------------
    // MAIN METHOD ---------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// Simulates the next lap for all running entries and updates the running order afterwards.
    /// Does nothing once the race is finished.
    pub fn simulate_lap<R: Rng>(&mut self, rng: &mut R) {
        if self.get_finished() {
            return;
        }

        let lap = self.cur_lap + 1;
        let pit_this_lap = self.pit_laps.contains(&lap);

        for idx in 0..self.entries.len() {
            if !self.entries[idx].is_running() {
                continue;
            }

            // reliability check, skipped during the warm-up laps
            if lap > self.cfg.warmup_laps
                && rng.gen::<f64>() >= self.entries[idx].reliability_factor
            {
                let cause = RetirementCause::draw(rng);
                let entry = &mut self.entries[idx];
                entry.retire(cause, lap);
                debug!(
                    "Lap {}: {} retired ({}) after {} laps",
                    lap,
                    entry.driver_id,
                    cause,
                    entry.laps_completed()
                );
                continue;
            }

            let t_lap = self.calc_laptime(idx, lap, rng);
            let t_pit = if pit_this_lap { self.cfg.pit_loss } else { 0.0 };

            self.entries[idx].complete_lap(t_lap, t_pit);
        }

        self.update_positions();

        if lap >= self.tot_no_laps {
            for entry in self.entries.iter_mut() {
                entry.finish();
            }
        }

        let running_order = self.get_running_order();
        self.lap_chart.push(running_order);
        self.cur_lap = lap;
    }

    /// Simulates all remaining laps.
    pub fn simulate_remaining_laps<R: Rng>(&mut self, rng: &mut R) {
        while !self.get_finished() {
            self.simulate_lap(rng);
        }
    }

    // ---------------------------------------------------------------------------------------------
    // RACE SIMULATOR PARTS ------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// Calculates the racing lap time of an entry (without pit loss).
    fn calc_laptime<R: Rng>(&self, idx: usize, lap: u32, rng: &mut R) -> f64 {
        let entry = &self.entries[idx];

        let t_perf = (100.0 - entry.performance) / 100.0 * self.cfg.performance_time_scale;

        let t_weather = match &self.weather_penalty {
            Some(dist) => dist.sample(rng) * self.track.weather_scale(),
            None => 0.0,
        };

        let t_tires = lap as f64 / self.tot_no_laps as f64 * self.cfg.tyre_degradation_max;

        let t_traffic = (entry.position.max(1) - 1) as f64
            * self.cfg.traffic_per_position
            * self.track.traffic_scale();

        let t_lap = self.cfg.base_lap_time
            + t_perf
            + t_weather
            + t_tires
            + t_traffic
            + bounded_noise(rng, self.cfg.lap_noise);

        t_lap.max(self.cfg.min_lap_time)
    }

    /// Recalculates the positions of all entries: more laps first, then less total time. Ties
    /// (in particular entries without a completed lap) keep their previous order.
    fn update_positions(&mut self) {
        let mut order: Vec<usize> = (0..self.entries.len()).collect();
        order.sort_by_key(|&idx| self.entries[idx].position);
        order.sort_by(|&a, &b| {
            let (ea, eb) = (&self.entries[a], &self.entries[b]);
            eb.laps_completed()
                .cmp(&ea.laps_completed())
                .then(ea.total_time().total_cmp(&eb.total_time()))
        });

        for (rank, idx) in order.into_iter().enumerate() {
            self.entries[idx].position = rank + 1;
        }
    }

    // ---------------------------------------------------------------------------------------------
    // METHODS (HELPERS) ---------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    pub fn get_finished(&self) -> bool {
        self.cur_lap >= self.tot_no_laps
    }

    pub fn get_pit_laps(&self) -> &[u32] {
        &self.pit_laps
    }

    pub fn get_entries(&self) -> &[RaceEntryState] {
        &self.entries
    }

    /// Driver identifiers in running order after each simulated lap.
    pub fn get_lap_chart(&self) -> &[Vec<String>] {
        &self.lap_chart
    }

    fn get_running_order(&self) -> Vec<String> {
        let mut order: Vec<&RaceEntryState> = self.entries.iter().collect();
        order.sort_by_key(|e| e.position);
        order.iter().map(|e| e.driver_id.to_owned()).collect()
    }

    /// Checks that the positions form a permutation of 1..N in which all entries with completed
    /// laps come before the entries without.
    pub fn positions_are_consistent(&self) -> bool {
        let no_entries = self.entries.len();
        let mut seen = vec![false; no_entries];

        for entry in self.entries.iter() {
            if entry.position == 0 || entry.position > no_entries || seen[entry.position - 1] {
                return false;
            }
            seen[entry.position - 1] = true;
        }

        let no_with_laps = self
            .entries
            .iter()
            .filter(|e| e.laps_completed() > 0)
            .count();

        self.entries
            .iter()
            .all(|e| (e.laps_completed() > 0) == (e.position <= no_with_laps))
    }
}
