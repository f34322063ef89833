use crate::core::car::{EntryStatus, RetirementCause};

/// Maximum number of pit stops an entry performs.
pub const MAX_PIT_STOPS: u32 = 2;

/// RaceEntryState tracks the progress of one entry during the race. Lap count and total time are
/// only changed through the state transition methods, which keeps them frozen once the entry is
/// no longer running.
#[derive(Debug, Clone)]
pub struct RaceEntryState {
    // static parameters
    pub driver_id: String,
    pub constructor_id: String,
    pub grid_position: usize,
    pub skill_rating: f64,
    pub performance: f64,
    pub reliability_factor: f64,

    // race progress
    laps_completed: u32,
    total_time: f64,
    status: EntryStatus,
    fastest_lap: Option<f64>,
    pit_stops: u32,
    retired_on_lap: Option<u32>,
    pub position: usize,

    // history
    lap_times: Vec<f64>,
    race_times: Vec<f64>,
}

impl RaceEntryState {
    pub fn new(
        driver_id: &str,
        constructor_id: &str,
        grid_position: usize,
        skill_rating: f64,
        performance: f64,
        reliability_factor: f64,
    ) -> RaceEntryState {
        RaceEntryState {
            driver_id: driver_id.to_owned(),
            constructor_id: constructor_id.to_owned(),
            grid_position,
            skill_rating,
            performance,
            reliability_factor,
            laps_completed: 0,
            total_time: 0.0,
            status: EntryStatus::Running,
            fastest_lap: None,
            pit_stops: 0,
            retired_on_lap: None,
            position: grid_position,
            lap_times: Vec::new(),
            race_times: Vec::new(),
        }
    }

    // ---------------------------------------------------------------------------------------------
    // STATE TRANSITIONS ---------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// Adds a completed lap. `lap_time` is the racing lap time, `pit_loss` the additional time
    /// spent in the pits on this lap (0.0 if no stop). Ignored unless the entry is running.
    pub fn complete_lap(&mut self, lap_time: f64, pit_loss: f64) {
        if !self.is_running() {
            return;
        }

        if pit_loss > 0.0 && self.pit_stops < MAX_PIT_STOPS {
            self.pit_stops += 1;
        }

        let t_lap = lap_time + pit_loss.max(0.0);
        self.total_time += t_lap;
        self.laps_completed += 1;
        self.lap_times.push(t_lap);
        self.race_times.push(self.total_time);

        self.fastest_lap = match self.fastest_lap {
            Some(t) if t <= lap_time => Some(t),
            _ => Some(lap_time),
        };
    }

    /// Retires the entry on the given lap. Ignored unless the entry is running.
    pub fn retire(&mut self, cause: RetirementCause, lap: u32) {
        if self.is_running() {
            self.status = EntryStatus::Retired(cause);
            self.retired_on_lap = Some(lap);
        }
    }

    /// Marks a running entry as finished.
    pub fn finish(&mut self) {
        if self.is_running() {
            self.status = EntryStatus::Finished;
        }
    }

    // ---------------------------------------------------------------------------------------------
    // GETTERS -------------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    pub fn is_running(&self) -> bool {
        self.status == EntryStatus::Running
    }

    pub fn status(&self) -> EntryStatus {
        self.status
    }

    pub fn laps_completed(&self) -> u32 {
        self.laps_completed
    }

    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    pub fn fastest_lap(&self) -> Option<f64> {
        self.fastest_lap
    }

    pub fn pit_stops(&self) -> u32 {
        self.pit_stops
    }

    pub fn retired_on_lap(&self) -> Option<u32> {
        self.retired_on_lap
    }

    /// Lap times including pit losses, index 0 is lap 1.
    pub fn lap_times(&self) -> &[f64] {
        &self.lap_times
    }

    /// Cumulative race time at the end of each lap.
    pub fn race_times(&self) -> &[f64] {
        &self.race_times
    }
}
