use crate::core::driver::{select_record, DriverEntry, DriverRecord, SkillSource};
use crate::core::performance::bounded_noise;
use crate::error::{GridConstructionError, MissingDataError, SimError};
use crate::interfaces::reference_data::{normalize_id, ReferenceProvider};
use crate::interfaces::skill_predictor::{predict_or_fallback, FeatureVector, SkillPredictor};
use crate::pre::sim_config::SimConfig;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;
use tracing::{debug, info};

pub const DEFAULT_GRID_SIZE: usize = 20;

/// Policy for grid slots that are not covered by requested drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPolicy {
    /// Fail if fewer drivers than grid slots are requested.
    None,
    /// Fill with unused drivers from the reference data, in catalogue order.
    FromHistory,
    /// Fill with generated reserve drivers.
    Synthesized,
}

impl Default for FillPolicy {
    fn default() -> Self {
        FillPolicy::None
    }
}

impl FromStr for FillPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "none" => Ok(FillPolicy::None),
            "from_history" | "history" => Ok(FillPolicy::FromHistory),
            "synthesized" | "synthesised" => Ok(FillPolicy::Synthesized),
            other => Err(format!("unknown fill policy: {}", other)),
        }
    }
}

/// Input of the grid construction.
/// * `driver_ids` - Requested drivers in submission order (may be fewer than `grid_size`)
/// * `season` - Season used to look up the driver history
/// * `grid_size` - Number of grid entries N
/// * `fill_policy` - How missing slots are filled
/// * `pairings` - Explicit driver -> constructor assignments, all other drivers race for the
/// constructor of their history record if it is known, otherwise they are assigned round-robin
#[derive(Debug, Clone)]
pub struct GridRequest<'a> {
    pub driver_ids: &'a [String],
    pub season: u32,
    pub grid_size: usize,
    pub fill_policy: FillPolicy,
    pub pairings: &'a BTreeMap<String, String>,
}

/// GridBuilder assembles N unique driver/constructor entries with resolved skill ratings.
pub struct GridBuilder<'a> {
    reference: &'a dyn ReferenceProvider,
    predictor: &'a dyn SkillPredictor,
    cfg: &'a SimConfig,
}

impl<'a> GridBuilder<'a> {
    pub fn new(
        reference: &'a dyn ReferenceProvider,
        predictor: &'a dyn SkillPredictor,
        cfg: &'a SimConfig,
    ) -> GridBuilder<'a> {
        GridBuilder {
            reference,
            predictor,
            cfg,
        }
    }

    /// Builds the grid in submission order, requested drivers first. The grid positions are
    /// preliminary until qualifying is completed.
    pub fn build<R: Rng>(
        &self,
        req: &GridRequest,
        rng: &mut R,
    ) -> Result<Vec<DriverEntry>, SimError> {
        if req.grid_size == 0 {
            return Err(GridConstructionError::EmptyGrid.into());
        }

        // requested drivers must be unique
        let mut driver_ids: Vec<String> = Vec::with_capacity(req.grid_size);
        let mut taken = BTreeSet::new();

        for driver_id in req.driver_ids.iter() {
            let key = normalize_id(driver_id);
            if !taken.insert(key.to_owned()) {
                return Err(GridConstructionError::DuplicateDriver(key).into());
            }
            driver_ids.push(key);
        }

        if driver_ids.len() > req.grid_size {
            return Err(GridConstructionError::TooManyDrivers {
                requested: driver_ids.len(),
                grid_size: req.grid_size,
            }
            .into());
        }

        // constructors
        let constructor_ids = self.reference.constructor_ids();
        if constructor_ids.is_empty() {
            return Err(GridConstructionError::NoConstructors.into());
        }

        let mut pairings = BTreeMap::new();
        for (driver_id, constructor_id) in req.pairings.iter() {
            let car = self
                .reference
                .car_profile(constructor_id)
                .ok_or_else(|| MissingDataError::Constructor(constructor_id.to_owned()))?;
            pairings.insert(normalize_id(driver_id), car.constructor_id.to_owned());
        }

        // fill missing slots
        let no_missing = req.grid_size - driver_ids.len();
        let mut synthesized = BTreeSet::new();

        if no_missing > 0 {
            match req.fill_policy {
                FillPolicy::None => {
                    return Err(GridConstructionError::NotEnoughDrivers {
                        available: driver_ids.len(),
                        grid_size: req.grid_size,
                    }
                    .into());
                }
                FillPolicy::FromHistory => {
                    // the provider may list a driver more than once
                    for id in self.reference.driver_ids() {
                        if driver_ids.len() == req.grid_size {
                            break;
                        }
                        let id = normalize_id(&id);
                        if taken.insert(id.to_owned()) {
                            driver_ids.push(id);
                        }
                    }

                    if driver_ids.len() < req.grid_size {
                        return Err(GridConstructionError::NotEnoughDrivers {
                            available: driver_ids.len(),
                            grid_size: req.grid_size,
                        }
                        .into());
                    }
                }
                FillPolicy::Synthesized => {
                    let mut reserve_no = 1;
                    while driver_ids.len() < req.grid_size {
                        let id = format!("reserve_driver_{:02}", reserve_no);
                        reserve_no += 1;
                        if taken.insert(id.to_owned()) {
                            synthesized.insert(id.to_owned());
                            driver_ids.push(id);
                        }
                    }
                }
            }
        }

        // resolve constructors and skill ratings
        let mut grid = Vec::with_capacity(req.grid_size);

        for (i, driver_id) in driver_ids.into_iter().enumerate() {
            let record = if synthesized.contains(&driver_id) {
                None
            } else {
                select_record(self.reference.driver_history(&driver_id), req.season)
            };

            // explicit pairing, then the constructor of the history record, then round-robin
            let constructor_id = match pairings.get(&driver_id) {
                Some(c) => c.to_owned(),
                None => record
                    .and_then(|(rec, _)| self.reference.car_profile(&rec.constructor_id))
                    .map(|car| car.constructor_id.to_owned())
                    .unwrap_or_else(|| constructor_ids[i % constructor_ids.len()].to_owned()),
            };

            let (skill_rating, skill_source) = match record {
                Some((rec, source)) => self.predict_skill(rec, source, &constructor_id),
                None => (self.generated_skill(rng), SkillSource::Generated),
            };

            debug!(
                "Grid slot {}: {} ({}) skill {:.1} [{:?}]",
                i + 1,
                driver_id,
                constructor_id,
                skill_rating,
                skill_source
            );

            grid.push(DriverEntry {
                driver_id,
                constructor_id,
                skill_rating,
                skill_source,
                grid_position: i + 1,
            });
        }

        info!(
            "Grid of {} entries assembled for season {}",
            grid.len(),
            req.season
        );

        Ok(grid)
    }

    /// Passes the selected season record through the skill predictor.
    fn predict_skill(
        &self,
        record: &DriverRecord,
        source: SkillSource,
        constructor_id: &str,
    ) -> (f64, SkillSource) {
        let features =
            FeatureVector::from_record(record, self.reference.car_profile(constructor_id));
        let (prediction, ok) = predict_or_fallback(self.predictor, &features);
        if ok {
            (prediction.skill_rating, source)
        } else {
            (prediction.skill_rating, SkillSource::Fallback)
        }
    }

    fn generated_skill<R: Rng>(&self, rng: &mut R) -> f64 {
        let noise = bounded_noise(rng, self.cfg.default_skill_spread);
        (self.cfg.default_skill + noise).clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::reference_data::ReferenceData;
    use crate::interfaces::skill_predictor::{
        FeatureVector, HeuristicPredictor, PredictionError, SkillPrediction,
    };
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct BrokenPredictor;

    impl SkillPredictor for BrokenPredictor {
        fn predict(&self, _features: &FeatureVector) -> Result<SkillPrediction, PredictionError> {
            Err(PredictionError::Inference("shape mismatch".to_owned()))
        }
    }

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn build(
        drivers: &[String],
        grid_size: usize,
        fill_policy: FillPolicy,
        predictor: &dyn SkillPredictor,
    ) -> Result<Vec<DriverEntry>, SimError> {
        let data = ReferenceData::builtin();
        build_with(&data, drivers, grid_size, fill_policy, predictor)
    }

    fn build_with(
        data: &ReferenceData,
        drivers: &[String],
        grid_size: usize,
        fill_policy: FillPolicy,
        predictor: &dyn SkillPredictor,
    ) -> Result<Vec<DriverEntry>, SimError> {
        let cfg = SimConfig::default();
        let pairings = BTreeMap::new();
        let builder = GridBuilder::new(data, predictor, &cfg);
        let req = GridRequest {
            driver_ids: drivers,
            season: 2023,
            grid_size,
            fill_policy,
            pairings: &pairings,
        };
        builder.build(&req, &mut StdRng::seed_from_u64(1))
    }

    #[test]
    fn short_grid_without_fill_policy_fails() {
        let drivers = ids(&[
            "max_verstappen",
            "lewis_hamilton",
            "charles_leclerc",
            "lando_norris",
            "oscar_piastri",
        ]);
        let err = build(&drivers, 20, FillPolicy::None, &HeuristicPredictor).unwrap_err();
        assert_eq!(
            err,
            SimError::GridConstruction(GridConstructionError::NotEnoughDrivers {
                available: 5,
                grid_size: 20
            })
        );
    }

    #[test]
    fn duplicate_request_fails() {
        let drivers = ids(&["Max Verstappen", "max_verstappen"]);
        let err = build(&drivers, 2, FillPolicy::None, &HeuristicPredictor).unwrap_err();
        assert!(matches!(
            err,
            SimError::GridConstruction(GridConstructionError::DuplicateDriver(_))
        ));
    }

    #[test]
    fn too_many_requests_fail() {
        let drivers = ids(&["a", "b", "c"]);
        let err = build(&drivers, 2, FillPolicy::Synthesized, &HeuristicPredictor).unwrap_err();
        assert!(matches!(
            err,
            SimError::GridConstruction(GridConstructionError::TooManyDrivers { .. })
        ));
    }

    #[test]
    fn history_fill_produces_unique_grid() {
        let drivers = ids(&["lando_norris"]);
        let grid = build(&drivers, 20, FillPolicy::FromHistory, &HeuristicPredictor).unwrap();
        assert_eq!(grid.len(), 20);
        assert_eq!(grid[0].driver_id, "lando_norris");
        let unique: BTreeSet<&str> = grid.iter().map(|e| e.driver_id.as_str()).collect();
        assert_eq!(unique.len(), 20);
        assert!(grid.iter().all(|e| e.skill_rating >= 25.0 && e.skill_rating <= 100.0));
    }

    #[test]
    fn history_fill_skips_drivers_listed_twice() {
        let mut data = ReferenceData::builtin();
        let first = data.drivers[0].clone();
        data.drivers.insert(1, first);

        let grid = build_with(&data, &[], 3, FillPolicy::FromHistory, &HeuristicPredictor).unwrap();
        let unique: BTreeSet<&str> = grid.iter().map(|e| e.driver_id.as_str()).collect();
        assert_eq!(unique.len(), 3);

        data.drivers.truncate(2);
        let err = build_with(&data, &[], 2, FillPolicy::FromHistory, &HeuristicPredictor);
        assert_eq!(
            err.unwrap_err(),
            SimError::GridConstruction(GridConstructionError::NotEnoughDrivers {
                available: 1,
                grid_size: 2
            })
        );
    }

    #[test]
    fn history_record_selects_the_constructor() {
        let mut data = ReferenceData::builtin();
        data.insert_record(
            "jack_brabham",
            DriverRecord {
                season: 1966,
                constructor_id: "brabham".to_owned(),
                skill_rating: 90.0,
                championship_position: 1,
                points: 42.0,
                wins: 4,
            },
        );
        let drivers = ids(&["lewis_hamilton", "jack_brabham", "unknown_rookie"]);
        let grid = build_with(&data, &drivers, 3, FillPolicy::None, &HeuristicPredictor).unwrap();
        assert_eq!(grid[0].constructor_id, "mercedes");
        assert_eq!(grid[1].constructor_id, "ferrari");
        assert_eq!(grid[1].skill_source, SkillSource::PriorSeason);
        assert_eq!(grid[2].constructor_id, "mercedes");
        assert_eq!(grid[2].skill_source, SkillSource::Generated);
    }

    #[test]
    fn synthesized_fill_and_round_robin_constructors() {
        let drivers = ids(&["max_verstappen", "unknown_rookie"]);
        let grid = build(&drivers, 12, FillPolicy::Synthesized, &HeuristicPredictor).unwrap();
        assert_eq!(grid.len(), 12);
        assert_eq!(grid[0].constructor_id, "red_bull");
        assert_eq!(grid[1].constructor_id, "ferrari");
        assert_eq!(grid[10].constructor_id, "red_bull");
        assert_eq!(grid[0].skill_source, SkillSource::Season);
        assert_eq!(grid[1].skill_source, SkillSource::Generated);
        assert_eq!(grid[2].driver_id, "reserve_driver_01");
        assert!(grid[1].skill_rating >= 50.0 && grid[1].skill_rating <= 70.0);
    }

    #[test]
    fn predictor_failure_uses_fallback_skill() {
        let drivers = ids(&["max_verstappen", "lewis_hamilton"]);
        let grid = build(&drivers, 2, FillPolicy::None, &BrokenPredictor).unwrap();
        assert!(grid
            .iter()
            .all(|e| e.skill_rating == 65.0 && e.skill_source == SkillSource::Fallback));
    }

    #[test]
    fn explicit_pairing_is_respected_and_validated() {
        let data = ReferenceData::builtin();
        let cfg = SimConfig::default();
        let drivers = ids(&["max_verstappen", "lewis_hamilton"]);
        let mut pairings = BTreeMap::new();
        pairings.insert("lewis_hamilton".to_owned(), "Ferrari".to_owned());
        let builder = GridBuilder::new(&data, &HeuristicPredictor, &cfg);
        let req = GridRequest {
            driver_ids: &drivers,
            season: 2025,
            grid_size: 2,
            fill_policy: FillPolicy::None,
            pairings: &pairings,
        };
        let grid = builder.build(&req, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(grid[1].constructor_id, "ferrari");
        assert_eq!(grid[1].skill_source, SkillSource::PriorSeason);

        let mut bad_pairings = pairings.clone();
        bad_pairings.insert("max_verstappen".to_owned(), "brabham".to_owned());
        let req = GridRequest {
            pairings: &bad_pairings,
            ..req
        };
        assert_eq!(
            builder.build(&req, &mut StdRng::seed_from_u64(3)).unwrap_err(),
            SimError::MissingData(MissingDataError::Constructor("brabham".to_owned()))
        );
    }
}
