use serde::{Deserialize, Serialize};
use std::fmt;

/// Circuit archetype used for the track-type performance bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitType {
    Technical,
    Power,
    Street,
    Traditional,
    Mixed,
    #[serde(other)]
    Other,
}

impl fmt::Display for CircuitType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            CircuitType::Technical => "technical",
            CircuitType::Power => "power",
            CircuitType::Street => "street",
            CircuitType::Traditional => "traditional",
            CircuitType::Mixed => "mixed",
            CircuitType::Other => "other",
        };
        write!(f, "{}", name)
    }
}

/// * `track_id` - Lookup key, e.g. silverstone
/// * `name` - Track name, e.g. Silverstone Circuit
/// * `country` - Country the track is located in
/// * `length_km` - (km) Length of the track
/// * `difficulty` - (0-100) General difficulty of the track
/// * `overtaking_difficulty` - (0-100) Difficulty of overtaking, scales the traffic penalty
/// * `weather_sensitivity` - (0-100) Sensitivity of lap times to bad weather
/// * `driver_skill_importance` - Contribution weight of the driver skill to the composite
/// performance (fraction, need not sum up to 1 with the car weight)
/// * `car_performance_importance` - Contribution weight of the car rating to the composite
/// performance (fraction)
/// * `circuit_type` - Circuit archetype
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TrackProfile {
    pub track_id: String,
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub length_km: f64,
    pub difficulty: f64,
    pub overtaking_difficulty: f64,
    pub weather_sensitivity: f64,
    pub driver_skill_importance: f64,
    pub car_performance_importance: f64,
    pub circuit_type: CircuitType,
}

impl TrackProfile {
    /// Overtaking difficulty as a traffic scaling factor, 1.0 for a track of medium difficulty.
    pub fn traffic_scale(&self) -> f64 {
        0.5 + self.overtaking_difficulty.clamp(0.0, 100.0) / 100.0
    }

    /// Weather sensitivity as a fraction.
    pub fn weather_scale(&self) -> f64 {
        self.weather_sensitivity.clamp(0.0, 100.0) / 100.0
    }
}
