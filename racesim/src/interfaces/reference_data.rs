use crate::core::car::ConstructorProfile;
use crate::core::driver::DriverRecord;
use crate::core::track::{CircuitType, TrackProfile};
use serde::{Deserialize, Serialize};

/// ReferenceProvider gives read-only access to the static reference data. Lookups are
/// case-insensitive. Listing methods return identifiers in catalogue order, which determines
/// round-robin constructor assignment and grid filling.
pub trait ReferenceProvider: Send + Sync {
    fn track_profile(&self, track_id: &str) -> Option<&TrackProfile>;
    fn car_profile(&self, constructor_id: &str) -> Option<&ConstructorProfile>;
    /// All known seasons of a driver, empty if the driver is unknown.
    fn driver_history(&self, driver_id: &str) -> &[DriverRecord];
    fn constructor_ids(&self) -> Vec<String>;
    fn driver_ids(&self) -> Vec<String>;
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DriverHistory {
    pub driver_id: String,
    pub records: Vec<DriverRecord>,
}

/// In-memory reference data tables.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct ReferenceData {
    #[serde(default)]
    pub tracks: Vec<TrackProfile>,
    #[serde(default)]
    pub constructors: Vec<ConstructorProfile>,
    #[serde(default)]
    pub drivers: Vec<DriverHistory>,
}

/// Normalizes a driver name or identifier, e.g. "Max Verstappen" -> "max_verstappen".
pub fn normalize_id(id: &str) -> String {
    id.trim().to_lowercase().replace(' ', "_")
}

impl ReferenceData {
    /// Adds a driver record, creating the driver if necessary. An existing record of the same
    /// season is replaced.
    pub fn insert_record(&mut self, driver_id: &str, record: DriverRecord) {
        let key = normalize_id(driver_id);
        match self
            .drivers
            .iter_mut()
            .find(|d| normalize_id(&d.driver_id) == key)
        {
            Some(history) => {
                history.records.retain(|r| r.season != record.season);
                history.records.push(record);
            }
            None => self.drivers.push(DriverHistory {
                driver_id: key,
                records: vec![record],
            }),
        }
    }

    /// Merges another data set into this one, entries of `other` take precedence. Identifiers of
    /// merged entries are normalized.
    pub fn merge(&mut self, other: ReferenceData) {
        for mut track in other.tracks {
            track.track_id = normalize_id(&track.track_id);
            self.tracks
                .retain(|t| normalize_id(&t.track_id) != track.track_id);
            self.tracks.push(track);
        }
        for mut car in other.constructors {
            car.constructor_id = normalize_id(&car.constructor_id);
            self.constructors
                .retain(|c| normalize_id(&c.constructor_id) != car.constructor_id);
            self.constructors.push(car);
        }
        for history in other.drivers {
            for record in history.records {
                self.insert_record(&history.driver_id, record);
            }
        }
    }

    /// Rebuilds the tables with normalized identifiers. Entries that refer to the same track,
    /// constructor or driver are merged, later entries take precedence.
    pub fn normalized(self) -> ReferenceData {
        let mut data = ReferenceData::default();
        data.merge(self);
        data
    }

    /// Built-in reference tables covering a selection of circuits, the 2025 constructors and
    /// driver histories of champions and current drivers.
    pub fn builtin() -> ReferenceData {
        let mut data = ReferenceData {
            tracks: builtin_tracks(),
            constructors: builtin_constructors(),
            drivers: Vec::new(),
        };

        for &(name, first_season, constructor_id, positions) in CAREER_TABLE.iter() {
            for (i, &champ_pos) in positions.iter().enumerate() {
                let season = first_season + i as u32;
                data.insert_record(name, career_record(season, constructor_id, champ_pos));
            }
        }

        for &(name, season, constructor_id, skill, champ_pos, points, wins) in MODERN_TABLE.iter()
        {
            data.insert_record(
                name,
                DriverRecord {
                    season,
                    constructor_id: constructor_id.to_owned(),
                    skill_rating: skill,
                    championship_position: champ_pos,
                    points,
                    wins,
                },
            );
        }

        data
    }
}

impl ReferenceProvider for ReferenceData {
    fn track_profile(&self, track_id: &str) -> Option<&TrackProfile> {
        let key = normalize_id(track_id);
        self.tracks.iter().find(|t| normalize_id(&t.track_id) == key)
    }

    fn car_profile(&self, constructor_id: &str) -> Option<&ConstructorProfile> {
        let key = normalize_id(constructor_id);
        self.constructors
            .iter()
            .find(|c| normalize_id(&c.constructor_id) == key)
    }

    fn driver_history(&self, driver_id: &str) -> &[DriverRecord] {
        let key = normalize_id(driver_id);
        self.drivers
            .iter()
            .find(|d| normalize_id(&d.driver_id) == key)
            .map(|d| d.records.as_slice())
            .unwrap_or(&[])
    }

    fn constructor_ids(&self) -> Vec<String> {
        self.constructors
            .iter()
            .map(|c| c.constructor_id.to_owned())
            .collect()
    }

    fn driver_ids(&self) -> Vec<String> {
        self.drivers
            .iter()
            .map(|d| normalize_id(&d.driver_id))
            .collect()
    }
}

// BUILT-IN TABLES -------------------------------------------------------------------------------

/// Derives a season record from a championship position, with an era bonus for the skill.
fn career_record(season: u32, constructor_id: &str, champ_pos: u32) -> DriverRecord {
    let base_skill = (105.0 - champ_pos as f64 * 3.5).max(45.0);
    let era_bonus = if season < 1990 {
        5.0
    } else if season < 2010 {
        8.0
    } else {
        10.0
    };

    DriverRecord {
        season,
        constructor_id: constructor_id.to_owned(),
        skill_rating: (base_skill + era_bonus).min(100.0),
        championship_position: champ_pos,
        points: (400.0 - champ_pos as f64 * 25.0).max(0.0),
        wins: if champ_pos <= 3 { 12 - champ_pos } else { 0 },
    }
}

type CareerRow = (&'static str, u32, &'static str, &'static [u32]);

const CAREER_TABLE: [CareerRow; 14] = [
    ("lewis_hamilton", 2008, "mercedes", &[1, 2, 2, 1, 1, 1, 1, 2, 2, 1, 2, 1]),
    ("max_verstappen", 2015, "red_bull", &[12, 5, 3, 3]),
    ("sebastian_vettel", 2008, "red_bull", &[8, 2, 1, 1, 1, 1, 3, 2, 5, 4, 5, 2, 2, 4, 5]),
    ("fernando_alonso", 2001, "ferrari", &[15, 2, 1, 1, 2, 4, 2, 2, 2, 6, 5, 5, 6, 11, 7, 4, 3]),
    ("ayrton_senna", 1984, "mclaren", &[9, 4, 2, 1, 2, 1, 1, 2, 4, 6, 1]),
    ("michael_schumacher", 1991, "ferrari", &[12, 3, 4, 3, 2, 1, 1, 1, 1, 1, 1, 5, 8, 6, 9]),
    ("alain_prost", 1980, "mclaren", &[15, 5, 4, 2, 3, 1, 4, 1, 2, 1, 1, 2, 2, 2]),
    ("kimi_raikkonen", 2001, "ferrari", &[10, 6, 2, 3, 5, 1, 3, 3, 6, 8, 12, 3, 4, 6, 8, 4]),
    ("daniel_ricciardo", 2011, "red_bull", &[18, 13, 3, 3, 3, 5, 7, 9, 8, 5, 8, 14, 8]),
    ("valtteri_bottas", 2013, "williams", &[17, 4, 5, 8, 3, 5, 2, 2, 3, 10, 15]),
    ("pierre_gasly", 2018, "rb", &[15, 7, 10, 9, 14, 11, 10]),
    ("esteban_ocon", 2017, "alpine", &[8, 12, 12, 11, 8, 12, 14]),
    ("yuki_tsunoda", 2021, "rb", &[14, 17, 14, 12]),
    ("alexander_albon", 2019, "williams", &[8, 7, 19, 13, 16]),
];

type ModernRow = (&'static str, u32, &'static str, f64, u32, f64, u32);

const MODERN_TABLE: [ModernRow; 27] = [
    ("lewis_hamilton", 2020, "mercedes", 93.1, 1, 347.0, 11),
    ("lewis_hamilton", 2021, "mercedes", 92.8, 2, 387.0, 8),
    ("lewis_hamilton", 2022, "mercedes", 89.2, 3, 240.0, 0),
    ("lewis_hamilton", 2023, "mercedes", 87.8, 3, 234.0, 0),
    ("lewis_hamilton", 2024, "mercedes", 88.5, 4, 223.0, 2),
    ("max_verstappen", 2019, "red_bull", 88.2, 3, 278.0, 3),
    ("max_verstappen", 2020, "red_bull", 89.7, 3, 214.0, 2),
    ("max_verstappen", 2021, "red_bull", 91.5, 1, 395.0, 10),
    ("max_verstappen", 2022, "red_bull", 96.2, 1, 454.0, 15),
    ("max_verstappen", 2023, "red_bull", 97.1, 1, 575.0, 19),
    ("max_verstappen", 2024, "red_bull", 95.8, 1, 437.0, 9),
    ("charles_leclerc", 2019, "ferrari", 83.4, 4, 264.0, 2),
    ("charles_leclerc", 2022, "ferrari", 88.3, 2, 308.0, 3),
    ("charles_leclerc", 2024, "ferrari", 87.9, 3, 356.0, 2),
    ("lando_norris", 2021, "mclaren", 82.1, 6, 160.0, 0),
    ("lando_norris", 2023, "mclaren", 83.2, 6, 205.0, 0),
    ("lando_norris", 2024, "mclaren", 86.8, 2, 374.0, 3),
    ("george_russell", 2022, "mercedes", 84.1, 4, 275.0, 1),
    ("george_russell", 2024, "mercedes", 84.5, 6, 245.0, 2),
    ("carlos_sainz_jr", 2022, "ferrari", 85.6, 5, 246.0, 1),
    ("carlos_sainz_jr", 2024, "ferrari", 83.2, 5, 290.0, 2),
    ("sergio_perez", 2021, "red_bull", 82.8, 4, 190.0, 1),
    ("sergio_perez", 2022, "red_bull", 82.3, 3, 305.0, 2),
    ("oscar_piastri", 2023, "mclaren", 79.2, 9, 97.0, 0),
    ("oscar_piastri", 2024, "mclaren", 82.6, 4, 292.0, 2),
    ("nico_hulkenberg", 2023, "haas", 72.4, 16, 9.0, 0),
    ("lance_stroll", 2023, "aston_martin", 73.8, 10, 74.0, 0),
];

#[allow(clippy::too_many_arguments)]
fn track(
    track_id: &str,
    name: &str,
    country: &str,
    length_km: f64,
    difficulty: f64,
    overtaking_difficulty: f64,
    weather_sensitivity: f64,
    driver_skill_importance: f64,
    car_performance_importance: f64,
    circuit_type: CircuitType,
) -> TrackProfile {
    TrackProfile {
        track_id: track_id.to_owned(),
        name: name.to_owned(),
        country: country.to_owned(),
        length_km,
        difficulty,
        overtaking_difficulty,
        weather_sensitivity,
        driver_skill_importance,
        car_performance_importance,
        circuit_type,
    }
}

fn builtin_tracks() -> Vec<TrackProfile> {
    use crate::core::track::CircuitType::*;

    vec![
        track(
            "monaco",
            "Circuit de Monaco",
            "Monaco",
            3.337,
            95.0,
            95.0,
            85.0,
            0.90,
            0.70,
            Street,
        ),
        track(
            "silverstone",
            "Silverstone Circuit",
            "United Kingdom",
            5.891,
            75.0,
            50.0,
            95.0,
            0.75,
            0.80,
            Traditional,
        ),
        track(
            "monza",
            "Autodromo Nazionale Monza",
            "Italy",
            5.793,
            45.0,
            30.0,
            50.0,
            0.60,
            0.90,
            Power,
        ),
        track(
            "spa",
            "Circuit de Spa-Francorchamps",
            "Belgium",
            7.004,
            80.0,
            40.0,
            95.0,
            0.85,
            0.85,
            Mixed,
        ),
        track(
            "suzuka",
            "Suzuka International Racing Course",
            "Japan",
            5.807,
            85.0,
            65.0,
            80.0,
            0.80,
            0.80,
            Technical,
        ),
        track(
            "interlagos",
            "Autodromo Jose Carlos Pace",
            "Brazil",
            4.309,
            82.0,
            45.0,
            90.0,
            0.80,
            0.75,
            Mixed,
        ),
        track(
            "bahrain",
            "Bahrain International Circuit",
            "Bahrain",
            5.412,
            70.0,
            35.0,
            40.0,
            0.70,
            0.85,
            Other,
        ),
        track(
            "melbourne",
            "Melbourne Grand Prix Circuit",
            "Australia",
            5.278,
            72.0,
            55.0,
            70.0,
            0.75,
            0.78,
            Street,
        ),
        track(
            "imola",
            "Autodromo Enzo e Dino Ferrari",
            "Italy",
            4.909,
            78.0,
            80.0,
            75.0,
            0.85,
            0.75,
            Technical,
        ),
        track(
            "miami",
            "Miami International Autodrome",
            "United States",
            5.412,
            74.0,
            45.0,
            85.0,
            0.72,
            0.82,
            Street,
        ),
    ]
}

fn constructor(
    id: &str,
    name: &str,
    overall: f64,
    speed: f64,
    cornering: f64,
    reliability: f64,
) -> ConstructorProfile {
    ConstructorProfile {
        constructor_id: id.to_owned(),
        name: name.to_owned(),
        overall_performance: overall,
        speed_rating: speed,
        cornering_rating: cornering,
        reliability_rating: reliability,
    }
}

fn builtin_constructors() -> Vec<ConstructorProfile> {
    vec![
        constructor("red_bull", "Red Bull Racing", 98.5, 99.2, 97.8, 96.3),
        constructor("ferrari", "Scuderia Ferrari", 94.2, 96.1, 93.5, 89.8),
        constructor("mercedes", "Mercedes-AMG Petronas F1 Team", 92.1, 91.3, 94.2, 97.1),
        constructor("mclaren", "McLaren F1 Team", 90.3, 92.1, 89.7, 93.2),
        constructor("aston_martin", "Aston Martin Aramco F1 Team", 85.7, 87.2, 84.8, 88.3),
        constructor("alpine", "BWT Alpine F1 Team", 82.4, 83.1, 81.2, 85.3),
        constructor("rb", "RB F1 Team", 80.1, 81.5, 79.4, 86.0),
        constructor("williams", "Williams Racing", 78.2, 82.0, 75.1, 92.0),
        constructor("haas", "Haas F1 Team", 75.3, 78.4, 73.0, 78.0),
        constructor("kick_sauber", "Kick Sauber", 73.1, 74.8, 72.2, 81.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_a_full_grid_of_drivers() {
        let data = ReferenceData::builtin();
        assert_eq!(data.tracks.len(), 10);
        assert_eq!(data.constructors.len(), 10);
        assert!(data.driver_ids().len() >= 20);
    }

    #[test]
    fn lookups_are_case_insensitive() {
        let data = ReferenceData::builtin();
        assert_eq!(data.track_profile("Silverstone").unwrap().track_id, "silverstone");
        assert!(data.car_profile("RED_BULL").is_some());
        assert!(!data.driver_history("Max Verstappen").is_empty());
        assert!(data.track_profile("nowhere").is_none());
        assert!(data.driver_history("nobody").is_empty());
    }

    #[test]
    fn modern_records_override_career_records() {
        let data = ReferenceData::builtin();
        let rec = data
            .driver_history("max_verstappen")
            .iter()
            .find(|r| r.season == 2021)
            .unwrap();
        assert_eq!(rec.skill_rating, 91.5);
        assert_eq!(rec.wins, 10);
    }

    #[test]
    fn merge_replaces_tracks() {
        let mut data = ReferenceData::builtin();
        let mut other = ReferenceData::default();
        let mut monza = data.track_profile("monza").unwrap().clone();
        monza.difficulty = 10.0;
        other.tracks.push(monza);
        data.merge(other);
        assert_eq!(data.tracks.len(), 10);
        assert_eq!(data.track_profile("monza").unwrap().difficulty, 10.0);
    }

    #[test]
    fn normalized_merges_spellings_of_one_driver() {
        let rec = |season: u32, skill: f64| DriverRecord {
            season,
            constructor_id: "red_bull".to_owned(),
            skill_rating: skill,
            championship_position: 1,
            points: 400.0,
            wins: 10,
        };
        let raw = ReferenceData {
            tracks: Vec::new(),
            constructors: Vec::new(),
            drivers: vec![
                DriverHistory {
                    driver_id: "Max Verstappen".to_owned(),
                    records: vec![rec(2022, 96.0)],
                },
                DriverHistory {
                    driver_id: "max_verstappen".to_owned(),
                    records: vec![rec(2023, 97.0)],
                },
            ],
        };
        assert_eq!(raw.driver_ids(), vec!["max_verstappen", "max_verstappen"]);
        assert_eq!(raw.driver_history("MAX VERSTAPPEN").len(), 1);

        let data = raw.normalized();
        assert_eq!(data.driver_ids(), vec!["max_verstappen"]);
        assert_eq!(data.drivers[0].driver_id, "max_verstappen");
        assert_eq!(data.driver_history("Max Verstappen").len(), 2);
    }
}
