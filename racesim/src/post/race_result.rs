use crate::core::car::{EntryStatus, RetirementCause};
use crate::core::state_handler::RaceEntryState;
use anyhow::Context;
use helpers::general::{format_gap, format_lap_time, format_race_time};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::io::Write as IoWrite;
use std::path::Path;

/// Points awarded for the classification positions 1 to 10.
pub const POINTS_TABLE: [u32; 10] = [25, 18, 15, 12, 10, 8, 6, 4, 2, 1];

/// Returns the points for a (1-based) classification position.
pub fn points_for_rank(position: usize) -> u32 {
    if position == 0 {
        return 0;
    }
    POINTS_TABLE.get(position - 1).copied().unwrap_or(0)
}

/// Classification of entries that retired before completing a single lap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroLapPolicy {
    /// Not part of the classification, only listed under the retirements.
    Exclude,
    /// Appended to the classification in grid order, without points.
    ClassifyLast,
}

impl Default for ZeroLapPolicy {
    fn default() -> Self {
        ZeroLapPolicy::Exclude
    }
}

/// One row of the final classification.
/// * `time_display` - Race time of the winner, gap to the winner or lapped count for the others
/// * `total_time` - (s) Raw cumulative race time
/// * `status` - Finished or the retirement cause
/// * `fastest_lap` - Fastest racing lap in M:SS.mmm format, "-" if no lap was completed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceResult {
    pub position: usize,
    pub driver: String,
    pub constructor: String,
    pub grid_position: usize,
    pub time_display: String,
    pub total_time: f64,
    pub laps_completed: u32,
    pub status: String,
    pub pit_stops: u32,
    pub fastest_lap: String,
    pub has_fastest_lap: bool,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Retirement {
    pub driver: String,
    pub cause: RetirementCause,
    pub lap: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceStatistics {
    pub winner: Option<String>,
    pub pole_sitter: Option<String>,
    pub fastest_lap_driver: Option<String>,
    pub fastest_lap_time: Option<f64>,
    pub fastest_lap_formatted: Option<String>,
    pub finishers: usize,
    pub dnfs: usize,
    pub completion_rate: f64,
    pub total_laps: u32,
    pub retirements: Vec<Retirement>,
}

/// Builds the final classification and the race statistics from the final entry states.
pub fn aggregate(
    entries: &[RaceEntryState],
    total_laps: u32,
    zero_lap_policy: ZeroLapPolicy,
) -> (Vec<RaceResult>, RaceStatistics) {
    // classification order: more laps first, then less time, ties in grid order
    let mut classified: Vec<&RaceEntryState> = entries
        .iter()
        .filter(|e| e.laps_completed() > 0)
        .collect();
    classified.sort_by_key(|e| e.grid_position);
    classified.sort_by(|a, b| {
        b.laps_completed()
            .cmp(&a.laps_completed())
            .then(a.total_time().total_cmp(&b.total_time()))
    });

    let mut zero_lap: Vec<&RaceEntryState> = entries
        .iter()
        .filter(|e| e.laps_completed() == 0)
        .collect();
    zero_lap.sort_by_key(|e| e.grid_position);

    // fastest lap of the race, the first in classification order wins a tie
    let mut fastest: Option<(&RaceEntryState, f64)> = None;
    for &entry in classified.iter() {
        if let Some(t) = entry.fastest_lap() {
            if fastest.map_or(true, |(_, t_best)| t < t_best) {
                fastest = Some((entry, t));
            }
        }
    }
    let fastest_driver = fastest.map(|(e, _)| e.driver_id.to_owned());

    let mut results = Vec::with_capacity(entries.len());
    let leader = classified.first().map(|e| (e.laps_completed(), e.total_time()));

    for (i, entry) in classified.iter().enumerate() {
        let position = i + 1;
        let time_display = match leader {
            Some(_) if position == 1 => format_race_time(entry.total_time()),
            Some((leader_laps, leader_time)) => {
                gap_display(leader_laps, leader_time, entry.laps_completed(), entry.total_time())
            }
            None => String::new(),
        };

        results.push(result_row(
            entry,
            position,
            time_display,
            fastest_driver.as_deref() == Some(entry.driver_id.as_str()),
            points_for_rank(position),
        ));
    }

    if zero_lap_policy == ZeroLapPolicy::ClassifyLast {
        for entry in zero_lap.iter() {
            let position = results.len() + 1;
            results.push(result_row(entry, position, "DNF".to_owned(), false, 0));
        }
    }

    // statistics
    let finishers = entries
        .iter()
        .filter(|e| e.status() == EntryStatus::Finished)
        .count();

    let mut retirements: Vec<(usize, Retirement)> = entries
        .iter()
        .filter_map(|e| match (e.status(), e.retired_on_lap()) {
            (EntryStatus::Retired(cause), Some(lap)) => Some((
                e.grid_position,
                Retirement {
                    driver: e.driver_id.to_owned(),
                    cause,
                    lap,
                },
            )),
            _ => None,
        })
        .collect();
    retirements.sort_by_key(|(grid_position, r)| (r.lap, *grid_position));

    let statistics = RaceStatistics {
        winner: classified.first().map(|e| e.driver_id.to_owned()),
        pole_sitter: entries
            .iter()
            .find(|e| e.grid_position == 1)
            .map(|e| e.driver_id.to_owned()),
        fastest_lap_driver: fastest_driver,
        fastest_lap_time: fastest.map(|(_, t)| t),
        fastest_lap_formatted: fastest.map(|(_, t)| format_lap_time(t)),
        finishers,
        dnfs: entries.len() - finishers,
        completion_rate: if entries.is_empty() {
            0.0
        } else {
            finishers as f64 / entries.len() as f64
        },
        total_laps,
        retirements: retirements.into_iter().map(|(_, r)| r).collect(),
    };

    (results, statistics)
}

fn gap_display(leader_laps: u32, leader_time: f64, laps: u32, time: f64) -> String {
    if laps >= leader_laps {
        format!("+{}", format_gap((time - leader_time).max(0.0)))
    } else {
        let laps_down = leader_laps - laps;
        if laps_down == 1 {
            "+1 lap".to_owned()
        } else {
            format!("+{} laps", laps_down)
        }
    }
}

fn result_row(
    entry: &RaceEntryState,
    position: usize,
    time_display: String,
    has_fastest_lap: bool,
    points: u32,
) -> RaceResult {
    RaceResult {
        position,
        driver: entry.driver_id.to_owned(),
        constructor: entry.constructor_id.to_owned(),
        grid_position: entry.grid_position,
        time_display,
        total_time: entry.total_time(),
        laps_completed: entry.laps_completed(),
        status: entry.status().label(),
        pit_stops: entry.pit_stops(),
        fastest_lap: entry
            .fastest_lap()
            .map_or_else(|| "-".to_owned(), format_lap_time),
        has_fastest_lap,
        points,
    }
}

// LAP HISTORY -----------------------------------------------------------------------------------

/// LapHistory contains the lap and race times of all entries in grid order. Retired entries have
/// shorter histories.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LapHistory {
    pub tot_no_laps: u32,
    pub drivers: Vec<String>,
    pub laptimes: Vec<Vec<f64>>,
    pub racetimes: Vec<Vec<f64>>,
}

impl LapHistory {
    pub fn from_entries(entries: &[RaceEntryState], tot_no_laps: u32) -> LapHistory {
        let mut sorted: Vec<&RaceEntryState> = entries.iter().collect();
        sorted.sort_by_key(|e| e.grid_position);

        LapHistory {
            tot_no_laps,
            drivers: sorted.iter().map(|e| e.driver_id.to_owned()).collect(),
            laptimes: sorted.iter().map(|e| e.lap_times().to_vec()).collect(),
            racetimes: sorted.iter().map(|e| e.race_times().to_vec()).collect(),
        }
    }

    /// format_lap_and_race_times returns the lap and race times as comma separated text tables,
    /// one row per lap and one column per entry.
    pub fn format_lap_and_race_times(&self) -> Result<String, std::fmt::Error> {
        let mut tmp_string_laptime = String::new();
        let mut tmp_string_racetime = String::new();

        for lap in 1..self.tot_no_laps as usize + 1 {
            write!(&mut tmp_string_laptime, "{:3}", lap)?;
            write!(&mut tmp_string_racetime, "{:3}", lap)?;

            for i in 0..self.drivers.len() {
                write_cell(&mut tmp_string_laptime, self.laptimes[i].get(lap - 1))?;
                write_cell(&mut tmp_string_racetime, self.racetimes[i].get(lap - 1))?;
            }

            writeln!(&mut tmp_string_laptime)?;
            writeln!(&mut tmp_string_racetime)?;
        }

        let tmp_string_driver_info = format!("lap, {}", self.drivers.join(", "));

        let mut content = String::new();
        writeln!(&mut content, "RESULT: Lap times")?;
        writeln!(&mut content, "{}", tmp_string_driver_info)?;
        writeln!(&mut content, "{}", tmp_string_laptime)?;
        writeln!(&mut content, "RESULT: Race times")?;
        writeln!(&mut content, "{}", tmp_string_driver_info)?;
        write!(&mut content, "{}", tmp_string_racetime)?;

        Ok(content)
    }

    /// write_lap_and_race_times_to_file writes the lap and race times to a text file, creating
    /// the parent directory if required.
    pub fn write_lap_and_race_times_to_file(&self, path: &Path) -> anyhow::Result<()> {
        let content = self
            .format_lap_and_race_times()
            .context("Failed to format lap and race times!")?;

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .context(format!("Failed to create directory {}!", dir.display()))?;
        }

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(path)
            .context(format!("Failed to open output file {}!", path.display()))?;
        file.write_all(content.as_bytes())
            .context(format!("Failed to write output file {}!", path.display()))?;
        file.flush()?;

        Ok(())
    }
}

fn write_cell(out: &mut String, value: Option<&f64>) -> std::fmt::Result {
    match value {
        Some(t) => write!(out, ", {:8.3}s", t),
        None => write!(out, ", {:>9}", "-"),
    }
}
