use serde::{Deserialize, Serialize};

/// One season of driver history.
/// * `season` - Season year, e.g. 2021
/// * `constructor_id` - Constructor the driver raced for in that season
/// * `skill_rating` - (0-100) Historical skill rating
/// * `championship_position` - Final championship position
/// * `points` - Championship points
/// * `wins` - Number of race wins
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DriverRecord {
    pub season: u32,
    #[serde(default)]
    pub constructor_id: String,
    pub skill_rating: f64,
    #[serde(default = "default_championship_position")]
    pub championship_position: u32,
    #[serde(default)]
    pub points: f64,
    #[serde(default)]
    pub wins: u32,
}

fn default_championship_position() -> u32 {
    20
}

/// Origin of the skill rating of a grid entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillSource {
    /// Predicted from the record of the requested season.
    Season,
    /// Predicted from the most recent season before the requested one.
    PriorSeason,
    /// The predictor failed and the fallback rating was used.
    Fallback,
    /// No history available, generated default rating.
    Generated,
}

/// A grid entry, immutable once qualifying is completed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverEntry {
    pub driver_id: String,
    pub constructor_id: String,
    pub skill_rating: f64,
    pub skill_source: SkillSource,
    pub grid_position: usize,
}

/// Picks the most relevant record for a season: the exact season if available, otherwise the
/// most recent season before it.
pub fn select_record(
    records: &[DriverRecord],
    season: u32,
) -> Option<(&DriverRecord, SkillSource)> {
    if let Some(rec) = records.iter().find(|r| r.season == season) {
        return Some((rec, SkillSource::Season));
    }

    records
        .iter()
        .filter(|r| r.season < season)
        .max_by_key(|r| r.season)
        .map(|rec| (rec, SkillSource::PriorSeason))
}
