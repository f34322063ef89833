use crate::core::driver::DriverRecord;
use crate::interfaces::reference_data::ReferenceData;
use crate::interfaces::skill_predictor::FeatureVector;
use crate::pre::sim_config::SimConfig;
use anyhow::Context;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Read;
use std::path::Path;

/// read_sim_config reads the JSON file and decodes it into the simulation calibration. Missing
/// keys keep their default values.
pub fn read_sim_config(filepath: &Path) -> anyhow::Result<SimConfig> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!(
            "Failed to open simulation config file {}!",
            filepath.display()
        ))?;
    let cfg: SimConfig = serde_json::from_reader(&fh).context(format!(
        "Failed to parse simulation config file {}!",
        filepath.display()
    ))?;
    cfg.validate().map_err(|e| {
        anyhow::anyhow!("Invalid simulation config file {}: {}", filepath.display(), e)
    })?;
    Ok(cfg)
}

/// read_reference_data reads tracks, constructors and driver histories from a JSON file. The
/// identifiers are normalized, entries listed twice are merged.
pub fn read_reference_data(filepath: &Path) -> anyhow::Result<ReferenceData> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!(
            "Failed to open reference data file {}!",
            filepath.display()
        ))?;
    let data: ReferenceData = serde_json::from_reader(&fh).context(format!(
        "Failed to parse reference data file {}!",
        filepath.display()
    ))?;
    Ok(data.normalized())
}

/// One row of a driver history CSV file.
#[derive(Debug, Deserialize)]
struct DriverHistoryRow {
    driver_id: String,
    season: u32,
    #[serde(default)]
    constructor_id: String,
    skill_rating: f64,
    championship_position: Option<u32>,
    points: Option<f64>,
    wins: Option<u32>,
}

impl DriverHistoryRow {
    fn into_record(self) -> (String, DriverRecord) {
        let record = DriverRecord {
            season: self.season,
            constructor_id: self.constructor_id,
            skill_rating: self.skill_rating,
            championship_position: self.championship_position.unwrap_or(20),
            points: self.points.unwrap_or(0.0),
            wins: self.wins.unwrap_or(0),
        };
        (self.driver_id, record)
    }
}

/// parse_driver_history_csv decodes driver history rows (header: driver_id, season,
/// constructor_id, skill_rating, championship_position, points, wins) into reference data that
/// only contains drivers.
pub fn parse_driver_history_csv<R: Read>(rdr: R) -> anyhow::Result<ReferenceData> {
    let mut csv_rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut data = ReferenceData::default();

    for (i, row) in csv_rdr.deserialize::<DriverHistoryRow>().enumerate() {
        let row = row.context(format!("Failed to parse driver history row {}!", i + 1))?;
        let (driver_id, record) = row.into_record();
        data.insert_record(&driver_id, record);
    }

    Ok(data)
}

/// read_driver_history_csv reads a driver history CSV file, see parse_driver_history_csv.
pub fn read_driver_history_csv(filepath: &Path) -> anyhow::Result<ReferenceData> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!(
            "Failed to open driver history file {}!",
            filepath.display()
        ))?;
    parse_driver_history_csv(fh).context(format!(
        "Failed to read driver history file {}!",
        filepath.display()
    ))
}

/// read_feature_file reads a JSON object of feature names and values and validates it into a
/// feature vector.
pub fn read_feature_file(filepath: &Path) -> anyhow::Result<FeatureVector> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!("Failed to open feature file {}!", filepath.display()))?;
    let named: BTreeMap<String, f64> = serde_json::from_reader(&fh).context(format!(
        "Failed to parse feature file {}!",
        filepath.display()
    ))?;
    let features = FeatureVector::from_named(named.iter().map(|(k, v)| (k.as_str(), *v)))
        .context(format!("Invalid feature file {}!", filepath.display()))?;
    Ok(features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::reference_data::ReferenceProvider;
    use crate::interfaces::skill_predictor::FEATURE_NAMES;
    use std::io::Write;
    use std::path::PathBuf;

    fn tmp_file(name: &str, content: &str) -> PathBuf {
        let path =
            std::env::temp_dir().join(format!("racesim_{}_{}", std::process::id(), name));
        let mut fh = std::fs::File::create(&path).unwrap();
        fh.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_history_rows() {
        let csv_text = "\
            driver_id,season,constructor_id,skill_rating,championship_position,points,wins\n\
            Oliver Bearman, 2024, haas, 68.5, 18, 7, 0\n\
            oliver_bearman,2025,haas,71.0,14,20,0\n\
            kimi_antonelli,2025,mercedes,74.2,7,88,0\n";
        let data = parse_driver_history_csv(csv_text.as_bytes()).unwrap();
        assert_eq!(data.driver_ids(), vec!["oliver_bearman", "kimi_antonelli"]);
        assert_eq!(data.driver_history("oliver_bearman").len(), 2);
        assert_eq!(data.driver_history("kimi_antonelli")[0].points, 88.0);
    }

    #[test]
    fn csv_history_bad_row() {
        let csv_text = "driver_id,season,skill_rating\nx,not_a_year,70\n";
        assert!(parse_driver_history_csv(csv_text.as_bytes()).is_err());
    }

    #[test]
    fn config_file_is_validated() {
        let ok = tmp_file("cfg_ok.json", r#"{"pit_loss": 21.5}"#);
        assert_eq!(read_sim_config(&ok).unwrap().pit_loss, 21.5);

        let bad = tmp_file("cfg_bad.json", r#"{"min_lap_time": 0.0}"#);
        assert!(read_sim_config(&bad).is_err());

        assert!(read_sim_config(Path::new("does/not/exist.json")).is_err());
    }

    #[test]
    fn reference_file_ids_are_normalized() {
        let path = tmp_file(
            "reference.json",
            r#"{
                "constructors": [{"constructor_id": "Red Bull", "name": "Red Bull Racing",
                    "overall_performance": 98.5, "speed_rating": 99.2, "reliability_rating": 96.3}],
                "drivers": [
                    {"driver_id": "Max Verstappen",
                     "records": [{"season": 2023, "skill_rating": 97.1}]},
                    {"driver_id": "max_verstappen",
                     "records": [{"season": 2024, "skill_rating": 95.8}]}
                ]
            }"#,
        );
        let data = read_reference_data(&path).unwrap();
        assert_eq!(data.driver_ids(), vec!["max_verstappen"]);
        assert_eq!(data.driver_history("Max Verstappen").len(), 2);
        assert_eq!(data.constructor_ids(), vec!["red_bull"]);
        assert!(data.car_profile("red_bull").is_some());
    }

    #[test]
    fn feature_file() {
        let body: Vec<String> = FEATURE_NAMES
            .iter()
            .map(|n| format!("\"{}\": 1.5", n))
            .collect();
        let ok = tmp_file("features_ok.json", &format!("{{{}}}", body.join(",")));
        assert_eq!(read_feature_file(&ok).unwrap().get("wins"), Some(1.5));

        let bad = tmp_file("features_bad.json", r#"{"skill_rating": 80.0}"#);
        assert!(read_feature_file(&bad).is_err());
    }
}
