use crate::core::car::ConstructorProfile;
use crate::core::driver::DriverRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::warn;

/// Ordered feature names the skill predictor expects.
pub const FEATURE_NAMES: [&str; 20] = [
    "skill_rating",
    "championship_position",
    "points",
    "wins",
    "race_performance_score",
    "championship_performance_score",
    "consistency_score",
    "experience_factor",
    "races_entered",
    "finish_rate",
    "avg_finish_position",
    "podium_rate",
    "win_rate",
    "constructor_competitiveness",
    "avg_qualifying_position",
    "career_year",
    "era_numeric",
    "competitiveness_level",
    "experience_adjusted_skill",
    "era_normalized_skill",
];

pub const FEATURE_COUNT: usize = FEATURE_NAMES.len();

/// Races per season assumed when deriving rates from season totals.
const RACES_PER_SEASON: f64 = 20.0;

pub const FALLBACK_SKILL_RATING: f64 = 65.0;
pub const FALLBACK_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureError {
    #[error("unknown feature: {0}")]
    Unknown(String),
    #[error("missing feature: {0}")]
    Missing(String),
    #[error("feature given more than once: {0}")]
    Duplicate(String),
    #[error("feature {0} is not a finite number")]
    NonFinite(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictionError {
    #[error("predictor is not available: {0}")]
    Unavailable(String),
    #[error("inference failed: {0}")]
    Inference(String),
}

/// FeatureVector is the fixed, ordered and validated input record of the skill predictor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Builds a feature vector from name/value pairs. Every feature must be given exactly once,
    /// unknown names are rejected instead of being ignored.
    pub fn from_named<'a, I>(pairs: I) -> Result<FeatureVector, FeatureError>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let mut values = [0.0; FEATURE_COUNT];
        let mut seen = BTreeSet::new();

        for (name, value) in pairs {
            let idx = feature_index(name).ok_or_else(|| FeatureError::Unknown(name.to_owned()))?;
            if !seen.insert(idx) {
                return Err(FeatureError::Duplicate(name.to_owned()));
            }
            if !value.is_finite() {
                return Err(FeatureError::NonFinite(name.to_owned()));
            }
            values[idx] = value;
        }

        if let Some(missing) = (0..FEATURE_COUNT).find(|idx| !seen.contains(idx)) {
            return Err(FeatureError::Missing(FEATURE_NAMES[missing].to_owned()));
        }

        Ok(FeatureVector { values })
    }

    /// Derives all features from one season of driver history and the constructor of the entry.
    pub fn from_record(record: &DriverRecord, car: Option<&ConstructorProfile>) -> FeatureVector {
        let champ_pos = record.championship_position.max(1) as f64;
        let season = record.season as f64;
        let wins = record.wins as f64;

        let experience_factor = ((season - 1980.0) / 40.0).clamp(0.1, 1.0);
        let era_factor = ((season - 1950.0) / 70.0).clamp(0.8, 1.2);
        let championship_factor = ((26.0 - champ_pos) / 25.0).max(0.0);
        let win_rate = (wins / RACES_PER_SEASON).min(1.0);
        let podium_rate = (win_rate * 2.0).min(1.0).max(championship_factor * 0.5);
        let avg_finish = (champ_pos * 0.8 + 1.0).min(20.0);
        let era_numeric = if record.season < 1990 {
            1.0
        } else if record.season < 2010 {
            2.0
        } else {
            3.0
        };
        let constructor_competitiveness = car.map_or(0.7, |c| c.overall_performance / 100.0);

        let named = [
            ("skill_rating", record.skill_rating),
            ("championship_position", champ_pos),
            ("points", record.points),
            ("wins", wins),
            ("race_performance_score", championship_factor * 100.0),
            ("championship_performance_score", (record.points / 4.0).min(100.0)),
            ("consistency_score", (100.0 - avg_finish * 3.0).max(0.0)),
            ("experience_factor", experience_factor),
            ("races_entered", RACES_PER_SEASON),
            ("finish_rate", 0.85 + 0.1 * championship_factor),
            ("avg_finish_position", avg_finish),
            ("podium_rate", podium_rate),
            ("win_rate", win_rate),
            ("constructor_competitiveness", constructor_competitiveness),
            ("avg_qualifying_position", avg_finish),
            ("career_year", (experience_factor * 10.0).round()),
            ("era_numeric", era_numeric),
            ("competitiveness_level", championship_factor),
            ("experience_adjusted_skill", record.skill_rating * (0.9 + 0.1 * experience_factor)),
            ("era_normalized_skill", record.skill_rating / era_factor),
        ];

        let mut values = [0.0; FEATURE_COUNT];
        for (name, value) in named.iter() {
            if let Some(idx) = feature_index(name) {
                values[idx] = *value;
            }
        }
        FeatureVector { values }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        feature_index(name).map(|idx| self.values[idx])
    }

    /// Values in the order of FEATURE_NAMES.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.values.iter().copied())
    }
}

fn feature_index(name: &str) -> Option<usize> {
    FEATURE_NAMES.iter().position(|&n| n == name)
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct SkillPrediction {
    pub skill_rating: f64,
    pub confidence: f64,
}

impl SkillPrediction {
    pub fn fallback() -> SkillPrediction {
        SkillPrediction {
            skill_rating: FALLBACK_SKILL_RATING,
            confidence: FALLBACK_CONFIDENCE,
        }
    }

    /// Clamps the prediction into the valid output ranges.
    pub fn clamped(self) -> SkillPrediction {
        SkillPrediction {
            skill_rating: self.skill_rating.clamp(25.0, 100.0),
            confidence: self.confidence.clamp(0.0, 1.0),
        }
    }
}

/// SkillPredictor maps a feature vector to a skill rating. It is called synchronously and never
/// retried, callers substitute the fallback prediction on failure.
pub trait SkillPredictor: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<SkillPrediction, PredictionError>;
}

/// Calls the predictor once and substitutes the fallback prediction on failure. The second value
/// is false if the fallback was used.
pub fn predict_or_fallback(
    predictor: &dyn SkillPredictor,
    features: &FeatureVector,
) -> (SkillPrediction, bool) {
    match predictor.predict(features) {
        Ok(pred) if pred.skill_rating.is_finite() && pred.confidence.is_finite() => {
            (pred.clamped(), true)
        }
        Ok(_) => {
            warn!("Skill prediction is not finite, using fallback rating");
            (SkillPrediction::fallback(), false)
        }
        Err(e) => {
            warn!("Skill prediction failed, using fallback rating: {}", e);
            (SkillPrediction::fallback(), false)
        }
    }
}

/// Deterministic stand-in for the trained model: the historical skill is modified by weighted
/// championship, points, wins, experience and constructor factors.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicPredictor;

impl SkillPredictor for HeuristicPredictor {
    fn predict(&self, features: &FeatureVector) -> Result<SkillPrediction, PredictionError> {
        let feature = |name: &str| {
            features.get(name).ok_or_else(|| {
                PredictionError::Inference(format!("feature {} not available", name))
            })
        };

        let skill = feature("skill_rating")?;
        let champ_pos = feature("championship_position")?;
        let championship_factor = ((26.0 - champ_pos) / 25.0).max(0.3);
        let points_factor = (feature("points")? / 200.0).clamp(0.0, 1.0);
        let wins_factor = (feature("wins")? / 10.0).clamp(0.0, 1.0);
        let experience_factor = feature("experience_factor")?;
        let car_factor = (feature("constructor_competitiveness")? * 100.0 - 70.0) / 30.0;

        let predicted = skill
            * (0.7
                + 0.2 * championship_factor
                + 0.05 * points_factor
                + 0.1 * wins_factor
                + 0.05 * experience_factor
                + 0.03 * car_factor);

        if !predicted.is_finite() {
            return Err(PredictionError::Inference("prediction is not finite".to_owned()));
        }

        Ok(SkillPrediction {
            skill_rating: predicted,
            confidence: 0.9,
        }
        .clamped())
    }
}
