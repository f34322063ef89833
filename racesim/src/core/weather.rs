use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    #[serde(alias = "sunny", alias = "cloudy")]
    Dry,
    #[serde(alias = "heavy_rain", alias = "rain")]
    Wet,
    #[serde(alias = "light_rain")]
    Mixed,
}

impl Default for Weather {
    fn default() -> Self {
        Weather::Dry
    }
}

impl FromStr for Weather {
    type Err = String;

    /// Besides the canonical names the descriptive conditions used by the race setup are
    /// accepted, e.g. sunny or light_rain.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(' ', "_").as_str() {
            "dry" | "sunny" | "cloudy" => Ok(Weather::Dry),
            "wet" | "heavy_rain" | "rain" => Ok(Weather::Wet),
            "mixed" | "light_rain" => Ok(Weather::Mixed),
            other => Err(format!("unknown weather condition: {}", other)),
        }
    }
}

impl fmt::Display for Weather {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Weather::Dry => "dry",
            Weather::Wet => "wet",
            Weather::Mixed => "mixed",
        };
        write!(f, "{}", name)
    }
}
