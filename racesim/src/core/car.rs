use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// * `constructor_id` - Lookup key, e.g. red_bull
/// * `name` - Constructor name, e.g. Red Bull Racing
/// * `overall_performance` - (0-100) Overall car rating used in the composite performance
/// * `speed_rating` - (0-100) Straight line speed rating, used in qualifying and for power
/// circuits
/// * `cornering_rating` - (0-100) Cornering rating
/// * `reliability_rating` - (0-100) Reliability rating, determines the failure probability
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConstructorProfile {
    pub constructor_id: String,
    pub name: String,
    pub overall_performance: f64,
    pub speed_rating: f64,
    #[serde(default)]
    pub cornering_rating: f64,
    pub reliability_rating: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum RetirementCause {
    Engine,
    Gearbox,
    Suspension,
    Collision,
    Spin,
}

pub const RETIREMENT_CAUSES: [RetirementCause; 5] = [
    RetirementCause::Engine,
    RetirementCause::Gearbox,
    RetirementCause::Suspension,
    RetirementCause::Collision,
    RetirementCause::Spin,
];

impl RetirementCause {
    /// Draws a retirement cause uniformly from the fixed set of causes.
    pub fn draw<R: Rng>(rng: &mut R) -> RetirementCause {
        *RETIREMENT_CAUSES
            .choose(rng)
            .unwrap_or(&RetirementCause::Engine)
    }
}

impl fmt::Display for RetirementCause {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            RetirementCause::Engine => "Engine",
            RetirementCause::Gearbox => "Gearbox",
            RetirementCause::Suspension => "Suspension",
            RetirementCause::Collision => "Collision",
            RetirementCause::Spin => "Spin",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Running,
    Finished,
    Retired(RetirementCause),
}

impl EntryStatus {
    /// Status label shown in the classification.
    pub fn label(&self) -> String {
        match self {
            EntryStatus::Running => "Running".to_owned(),
            EntryStatus::Finished => "Finished".to_owned(),
            EntryStatus::Retired(cause) => cause.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn status_labels() {
        assert_eq!(EntryStatus::Finished.label(), "Finished");
        assert_eq!(
            EntryStatus::Retired(RetirementCause::Gearbox).label(),
            "Gearbox"
        );
    }

    #[test]
    fn cause_draw_is_reproducible() {
        let mut rng_a = StdRng::seed_from_u64(7);
        let mut rng_b = StdRng::seed_from_u64(7);
        let a: Vec<RetirementCause> = (0..20).map(|_| RetirementCause::draw(&mut rng_a)).collect();
        let b: Vec<RetirementCause> = (0..20).map(|_| RetirementCause::draw(&mut rng_b)).collect();
        assert_eq!(a, b);
    }
}
