use crate::core::driver::select_record;
use crate::core::grid::{FillPolicy, GridBuilder, GridRequest, DEFAULT_GRID_SIZE};
use crate::core::qualifying::{QualifyingResult, QualifyingSimulator};
use crate::core::race::Race;
use crate::core::track::TrackProfile;
use crate::core::weather::Weather;
use crate::error::{MissingDataError, SimError};
use crate::interfaces::reference_data::{normalize_id, ReferenceProvider};
use crate::interfaces::skill_predictor::{
    predict_or_fallback, FeatureError, FeatureVector, SkillPrediction, SkillPredictor,
};
use crate::post::race_result::{aggregate, LapHistory, RaceResult, RaceStatistics};
use crate::pre::sim_config::SimConfig;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

fn default_grid_size() -> usize {
    DEFAULT_GRID_SIZE
}

/// * `track_id` - Track identifier, e.g. silverstone
/// * `season` - Season used for the driver history lookup
/// * `driver_ids` - Requested drivers, may be fewer than `grid_size` if a fill policy is set
/// * `weather` - Weather condition of the race
/// * `total_laps` - Number of race laps (>= 1)
/// * `seed` - Seed of the random number generator, random if not set
/// * `grid_size` - Number of grid entries
/// * `fill_policy` - Handling of grid slots not covered by `driver_ids`
/// * `pairings` - Explicit driver -> constructor assignments
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct RaceRequest {
    pub track_id: String,
    pub season: u32,
    pub driver_ids: Vec<String>,
    #[serde(default)]
    pub weather: Weather,
    pub total_laps: u32,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_grid_size")]
    pub grid_size: usize,
    #[serde(default)]
    pub fill_policy: FillPolicy,
    #[serde(default)]
    pub pairings: BTreeMap<String, String>,
}

/// Everything a single simulated race produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RaceOutcome {
    pub track: TrackProfile,
    pub season: u32,
    pub weather: Weather,
    pub total_laps: u32,
    pub pit_laps: Vec<u32>,
    pub qualifying: Vec<QualifyingResult>,
    pub results: Vec<RaceResult>,
    pub statistics: RaceStatistics,
    pub lap_chart: Vec<Vec<String>>,
    pub lap_history: LapHistory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Serialized answer of a race call: either the outcome itself or `{"error": "<reason>"}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RaceResponse {
    Ok(Box<RaceOutcome>),
    Err(ErrorResponse),
}

impl From<Result<RaceOutcome, SimError>> for RaceResponse {
    fn from(res: Result<RaceOutcome, SimError>) -> Self {
        match res {
            Ok(outcome) => RaceResponse::Ok(Box::new(outcome)),
            Err(e) => RaceResponse::Err(ErrorResponse {
                error: e.to_string(),
            }),
        }
    }
}

/// RaceEngine wires the reference data, the skill predictor and the calibration together and
/// runs complete race sessions (grid, qualifying, race, classification).
pub struct RaceEngine {
    reference: Box<dyn ReferenceProvider>,
    predictor: Box<dyn SkillPredictor>,
    config: SimConfig,
}

impl RaceEngine {
    pub fn new(
        reference: Box<dyn ReferenceProvider>,
        predictor: Box<dyn SkillPredictor>,
        config: SimConfig,
    ) -> RaceEngine {
        RaceEngine {
            reference,
            predictor,
            config,
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn reference(&self) -> &dyn ReferenceProvider {
        self.reference.as_ref()
    }

    /// simulate_race runs a complete race session. The random number generator is seeded from
    /// the request seed if given, otherwise from entropy.
    pub fn simulate_race(&self, req: &RaceRequest) -> Result<RaceOutcome, SimError> {
        let mut rng = match req.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.simulate_race_with_rng(req, &mut rng)
    }

    /// simulate_race_with_rng runs a complete race session drawing all random numbers from the
    /// inserted generator. Errors are returned before any lap is simulated.
    pub fn simulate_race_with_rng<R: Rng>(
        &self,
        req: &RaceRequest,
        rng: &mut R,
    ) -> Result<RaceOutcome, SimError> {
        let track = self
            .reference
            .track_profile(&req.track_id)
            .ok_or_else(|| MissingDataError::Track(req.track_id.to_owned()))?;

        if req.total_laps == 0 {
            return Err(SimError::InvalidParameters(
                "total_laps must be at least 1".to_owned(),
            ));
        }
        self.config.validate().map_err(SimError::InvalidParameters)?;

        info!(
            "Simulating {} laps at {} ({}, {})",
            req.total_laps, track.name, req.season, req.weather
        );

        // grid
        let grid_builder =
            GridBuilder::new(self.reference.as_ref(), self.predictor.as_ref(), &self.config);
        let grid = grid_builder.build(
            &GridRequest {
                driver_ids: &req.driver_ids,
                season: req.season,
                grid_size: req.grid_size,
                fill_policy: req.fill_policy,
                pairings: &req.pairings,
            },
            rng,
        )?;

        // qualifying
        let quali = QualifyingSimulator::new(&self.config, track, req.weather);
        let (grid, qualifying) = quali.run(grid, self.reference.as_ref(), rng)?;

        // race
        let mut race = Race::new(
            &self.config,
            track,
            req.weather,
            req.total_laps,
            &grid,
            self.reference.as_ref(),
        )?;
        race.simulate_remaining_laps(rng);

        // classification
        let (results, statistics) = aggregate(
            race.get_entries(),
            req.total_laps,
            self.config.zero_lap_policy,
        );

        info!(
            "Race finished, winner {}, {} of {} classified as finished",
            statistics.winner.as_deref().unwrap_or("-"),
            statistics.finishers,
            grid.len()
        );

        Ok(RaceOutcome {
            track: track.clone(),
            season: req.season,
            weather: req.weather,
            total_laps: req.total_laps,
            pit_laps: race.get_pit_laps().to_vec(),
            qualifying,
            results,
            statistics,
            lap_chart: race.get_lap_chart().to_vec(),
            lap_history: LapHistory::from_entries(race.get_entries(), req.total_laps),
        })
    }

    /// predict_driver_skill calls the skill predictor, substituting the fallback on failure.
    pub fn predict_driver_skill(&self, features: &FeatureVector) -> SkillPrediction {
        predict_or_fallback(self.predictor.as_ref(), features).0
    }

    /// predict_named_features validates name/value pairs before predicting.
    pub fn predict_named_features<'a, I>(&self, pairs: I) -> Result<SkillPrediction, FeatureError>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        let features = FeatureVector::from_named(pairs)?;
        Ok(self.predict_driver_skill(&features))
    }

    /// driver_features derives the predictor input of a driver for a season from the reference
    /// data (exact season, else the most recent season before it).
    pub fn driver_features(&self, driver_id: &str, season: u32) -> Result<FeatureVector, SimError> {
        let key = normalize_id(driver_id);
        let (record, _) = select_record(self.reference.driver_history(&key), season)
            .ok_or_else(|| MissingDataError::Driver(key.to_owned()))?;

        Ok(FeatureVector::from_record(
            record,
            self.reference.car_profile(&record.constructor_id),
        ))
    }
}
