use crate::post::race_result::ZeroLapPolicy;
use serde::{Deserialize, Serialize};

/// Calibration constants of the simulation. None of the values is a semantic invariant, they can
/// all be overwritten from a JSON file (missing keys keep their default value).
///
/// Performance model:
/// * `wet_factor_base` / `wet_factor_skill_gain` - Weather multiplier in the wet, base + skill
/// fraction * gain
/// * `mixed_factor_base` / `mixed_factor_skill_gain` - Weather multiplier in mixed conditions
/// * `technical_skill_threshold` / `technical_bonus` - Bonus on technical circuits for drivers
/// above the skill threshold
/// * `power_speed_threshold` / `power_bonus` - Bonus on power circuits for constructors with a
/// speed rating at or above the threshold
/// * `street_skill_threshold` / `street_bonus` - Bonus on street circuits for drivers above the
/// skill threshold
/// * `failure_rate_scale` - Scales the per-lap failure probability (1 - reliability rating / 100)
///
/// Grid:
/// * `default_skill` / `default_skill_spread` - Generated skill for drivers without history,
/// uniformly drawn from default +- spread
///
/// Qualifying:
/// * `quali_base_time` - (s) Base qualifying lap time
/// * `quali_skill_scale` - (s) Time loss of a driver with skill 0 compared to skill 100
/// * `quali_car_scale` - (s) Time loss of a car with speed rating 0 compared to 100
/// * `quali_wet_penalty_max` - (s) Maximum random time loss in the wet (half of it when mixed)
/// * `quali_wet_skill_gain` - (s) Time a driver with skill 100 recovers in the wet
/// * `quali_noise` - (s) Bound of the uniform qualifying noise
/// * `bonus_time_scale` - (s) Lap time gained per point of track-type bonus
///
/// Race:
/// * `base_lap_time` - (s) Base race lap time
/// * `performance_time_scale` - (s) Lap time loss per 100 points of missing composite performance
/// * `wet_lap_penalty` / `mixed_lap_penalty` - (s) Range of the random weather time loss, scaled
/// by the weather sensitivity of the track
/// * `tyre_degradation_max` - (s) Tyre degradation at the end of the race
/// * `traffic_per_position` - (s) Traffic time loss per position behind the leader, scaled by the
/// overtaking difficulty of the track
/// * `lap_noise` - (s) Bound of the uniform lap time noise
/// * `min_lap_time` - (s) Lower bound of any simulated lap time
/// * `warmup_laps` - Number of laps at the start without reliability checks
/// * `pit_windows` - Race fractions of the mandatory pit stops
/// * `pit_loss` - (s) Time loss of a pit stop
/// * `zero_lap_policy` - Classification of entries that retired without completing a lap
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    pub wet_factor_base: f64,
    pub wet_factor_skill_gain: f64,
    pub mixed_factor_base: f64,
    pub mixed_factor_skill_gain: f64,
    pub technical_skill_threshold: f64,
    pub technical_bonus: f64,
    pub power_speed_threshold: f64,
    pub power_bonus: f64,
    pub street_skill_threshold: f64,
    pub street_bonus: f64,
    pub failure_rate_scale: f64,

    pub default_skill: f64,
    pub default_skill_spread: f64,

    pub quali_base_time: f64,
    pub quali_skill_scale: f64,
    pub quali_car_scale: f64,
    pub quali_wet_penalty_max: f64,
    pub quali_wet_skill_gain: f64,
    pub quali_noise: f64,
    pub bonus_time_scale: f64,

    pub base_lap_time: f64,
    pub performance_time_scale: f64,
    pub wet_lap_penalty: [f64; 2],
    pub mixed_lap_penalty: [f64; 2],
    pub tyre_degradation_max: f64,
    pub traffic_per_position: f64,
    pub lap_noise: f64,
    pub min_lap_time: f64,
    pub warmup_laps: u32,
    pub pit_windows: Vec<f64>,
    pub pit_loss: f64,
    pub zero_lap_policy: ZeroLapPolicy,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            wet_factor_base: 0.85,
            wet_factor_skill_gain: 0.3,
            mixed_factor_base: 0.92,
            mixed_factor_skill_gain: 0.16,
            technical_skill_threshold: 87.0,
            technical_bonus: 1.8,
            power_speed_threshold: 95.0,
            power_bonus: 1.2,
            street_skill_threshold: 82.0,
            street_bonus: 1.5,
            failure_rate_scale: 0.1,

            default_skill: 60.0,
            default_skill_spread: 10.0,

            quali_base_time: 80.0,
            quali_skill_scale: 3.0,
            quali_car_scale: 2.0,
            quali_wet_penalty_max: 3.0,
            quali_wet_skill_gain: 2.0,
            quali_noise: 0.5,
            bonus_time_scale: 0.1,

            base_lap_time: 85.0,
            performance_time_scale: 3.0,
            wet_lap_penalty: [2.0, 8.0],
            mixed_lap_penalty: [1.0, 4.0],
            tyre_degradation_max: 0.5,
            traffic_per_position: 0.1,
            lap_noise: 0.5,
            min_lap_time: 1.0,
            warmup_laps: 5,
            pit_windows: vec![0.3, 0.7],
            pit_loss: 25.0,
            zero_lap_policy: ZeroLapPolicy::Exclude,
        }
    }
}

/// (s or rating points) Largest magnitude accepted for the bounds of a random draw.
pub const MAX_RANDOM_BOUND: f64 = 1.0e6;

impl SimConfig {
    fn named_values(&self) -> [(&'static str, f64); 31] {
        [
            ("wet_factor_base", self.wet_factor_base),
            ("wet_factor_skill_gain", self.wet_factor_skill_gain),
            ("mixed_factor_base", self.mixed_factor_base),
            ("mixed_factor_skill_gain", self.mixed_factor_skill_gain),
            ("technical_skill_threshold", self.technical_skill_threshold),
            ("technical_bonus", self.technical_bonus),
            ("power_speed_threshold", self.power_speed_threshold),
            ("power_bonus", self.power_bonus),
            ("street_skill_threshold", self.street_skill_threshold),
            ("street_bonus", self.street_bonus),
            ("failure_rate_scale", self.failure_rate_scale),
            ("default_skill", self.default_skill),
            ("default_skill_spread", self.default_skill_spread),
            ("quali_base_time", self.quali_base_time),
            ("quali_skill_scale", self.quali_skill_scale),
            ("quali_car_scale", self.quali_car_scale),
            ("quali_wet_penalty_max", self.quali_wet_penalty_max),
            ("quali_wet_skill_gain", self.quali_wet_skill_gain),
            ("quali_noise", self.quali_noise),
            ("bonus_time_scale", self.bonus_time_scale),
            ("base_lap_time", self.base_lap_time),
            ("performance_time_scale", self.performance_time_scale),
            ("wet_lap_penalty", self.wet_lap_penalty[0]),
            ("wet_lap_penalty", self.wet_lap_penalty[1]),
            ("mixed_lap_penalty", self.mixed_lap_penalty[0]),
            ("mixed_lap_penalty", self.mixed_lap_penalty[1]),
            ("tyre_degradation_max", self.tyre_degradation_max),
            ("traffic_per_position", self.traffic_per_position),
            ("lap_noise", self.lap_noise),
            ("min_lap_time", self.min_lap_time),
            ("pit_loss", self.pit_loss),
        ]
    }

    /// Checks the values that would otherwise break the simulation. Every value must be finite
    /// and the bounds of random draws must not exceed MAX_RANDOM_BOUND in magnitude.
    pub fn validate(&self) -> Result<(), String> {
        if let Some((name, _)) = self.named_values().iter().find(|(_, v)| !v.is_finite()) {
            return Err(format!("{} must be finite", name));
        }

        let random_bounds = [
            ("lap_noise", self.lap_noise),
            ("quali_noise", self.quali_noise),
            ("default_skill_spread", self.default_skill_spread),
            ("quali_wet_penalty_max", self.quali_wet_penalty_max),
            ("wet_lap_penalty", self.wet_lap_penalty[0]),
            ("wet_lap_penalty", self.wet_lap_penalty[1]),
            ("mixed_lap_penalty", self.mixed_lap_penalty[0]),
            ("mixed_lap_penalty", self.mixed_lap_penalty[1]),
        ];
        if let Some((name, _)) = random_bounds
            .iter()
            .find(|(_, v)| v.abs() > MAX_RANDOM_BOUND)
        {
            return Err(format!(
                "{} must be within [-{}, {}]",
                name, MAX_RANDOM_BOUND, MAX_RANDOM_BOUND
            ));
        }

        if self.min_lap_time <= 0.0 {
            return Err("min_lap_time must be positive".to_owned());
        }
        if self.pit_loss < 0.0 {
            return Err("pit_loss must not be negative".to_owned());
        }
        if self.failure_rate_scale < 0.0 {
            return Err("failure_rate_scale must not be negative".to_owned());
        }
        if self.pit_windows.iter().any(|w| !(0.0..=1.0).contains(w)) {
            return Err("pit windows must be race fractions in [0, 1]".to_owned());
        }
        for range in [self.wet_lap_penalty, self.mixed_lap_penalty] {
            if range[0] > range[1] {
                return Err("weather penalty ranges must be ordered [min, max]".to_owned());
            }
        }
        Ok(())
    }
}
