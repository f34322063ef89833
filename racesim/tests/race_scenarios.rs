use racesim::core::car::EntryStatus;
use racesim::core::driver::SkillSource;
use racesim::core::grid::{FillPolicy, GridBuilder, GridRequest};
use racesim::core::qualifying::QualifyingSimulator;
use racesim::core::race::Race;
use racesim::core::weather::Weather;
use racesim::error::GridConstructionError;
use racesim::interfaces::reference_data::{ReferenceData, ReferenceProvider};
use racesim::interfaces::skill_predictor::{
    FeatureVector, HeuristicPredictor, PredictionError, SkillPrediction, SkillPredictor,
};
use racesim::post::race_result::ZeroLapPolicy;
use racesim::pre::sim_config::SimConfig;
use racesim::{RaceEngine, RaceRequest, RaceResponse, SimError};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeMap, BTreeSet};

struct UnavailablePredictor;

impl SkillPredictor for UnavailablePredictor {
    fn predict(&self, _features: &FeatureVector) -> Result<SkillPrediction, PredictionError> {
        Err(PredictionError::Unavailable("model artifact not loaded".to_owned()))
    }
}

/// Predicts only for drivers with a race win in the selected season.
struct WinnersOnlyPredictor;

impl SkillPredictor for WinnersOnlyPredictor {
    fn predict(&self, features: &FeatureVector) -> Result<SkillPrediction, PredictionError> {
        match features.get("wins") {
            Some(wins) if wins > 0.0 => HeuristicPredictor.predict(features),
            _ => Err(PredictionError::Inference("no wins recorded".to_owned())),
        }
    }
}

fn engine_with(predictor: Box<dyn SkillPredictor>, config: SimConfig) -> RaceEngine {
    RaceEngine::new(Box::new(ReferenceData::builtin()), predictor, config)
}

fn engine() -> RaceEngine {
    engine_with(Box::new(HeuristicPredictor), SimConfig::default())
}

fn full_field() -> Vec<String> {
    ReferenceData::builtin()
        .driver_ids()
        .into_iter()
        .take(20)
        .collect()
}

fn silverstone_request() -> RaceRequest {
    RaceRequest {
        track_id: "silverstone".to_owned(),
        season: 2023,
        driver_ids: full_field(),
        weather: "sunny".parse().unwrap(),
        total_laps: 50,
        seed: Some(42),
        grid_size: 20,
        fill_policy: FillPolicy::None,
        pairings: BTreeMap::new(),
    }
}

#[test]
fn seeded_silverstone_race_is_reproducible() {
    let engine = engine();
    let req = silverstone_request();
    assert_eq!(req.weather, Weather::Dry);

    let first = engine.simulate_race(&req).unwrap();
    let second = engine.simulate_race(&req).unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );

    assert_eq!(first.qualifying.len(), 20);
    assert_eq!(first.pit_laps, vec![15, 35]);
    assert_eq!(first.lap_chart.len(), 50);
    assert_eq!(first.statistics.finishers + first.statistics.dnfs, 20);

    // classified entries are ranked by laps, then time
    for pair in first.results.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(
            a.laps_completed > b.laps_completed
                || (a.laps_completed == b.laps_completed && a.total_time <= b.total_time)
        );
    }

    let positions: Vec<usize> = first.results.iter().map(|r| r.position).collect();
    assert_eq!(positions, (1..=first.results.len()).collect::<Vec<usize>>());
    assert_eq!(
        first.results.iter().filter(|r| r.has_fastest_lap).count(),
        1
    );
    assert_eq!(first.statistics.winner.as_deref(), Some(first.results[0].driver.as_str()));
    assert_eq!(first.qualifying[0].driver, first.statistics.pole_sitter.clone().unwrap());
}

#[test]
fn different_seeds_change_the_race() {
    let engine = engine();
    let a = engine.simulate_race(&silverstone_request()).unwrap();
    let b = engine
        .simulate_race(&RaceRequest {
            seed: Some(43),
            ..silverstone_request()
        })
        .unwrap();
    assert_ne!(a.results[0].total_time, b.results[0].total_time);
}

#[test]
fn short_grid_without_fill_policy_is_rejected() {
    let req = RaceRequest {
        driver_ids: full_field().into_iter().take(5).collect(),
        ..silverstone_request()
    };
    let err = engine().simulate_race(&req).unwrap_err();
    assert_eq!(
        err,
        SimError::GridConstruction(GridConstructionError::NotEnoughDrivers {
            available: 5,
            grid_size: 20
        })
    );
}

#[test]
fn short_grid_is_filled_from_history() {
    let req = RaceRequest {
        driver_ids: vec!["lando_norris".to_owned(), "oscar_piastri".to_owned()],
        fill_policy: FillPolicy::FromHistory,
        ..silverstone_request()
    };
    let outcome = engine().simulate_race(&req).unwrap();
    let drivers: BTreeSet<&str> = outcome
        .qualifying
        .iter()
        .map(|q| q.driver.as_str())
        .collect();
    assert_eq!(drivers.len(), 20);
    assert!(drivers.contains("lando_norris"));
}

#[test]
fn unknown_track_yields_error_response() {
    let req = RaceRequest {
        track_id: "nurburgring_nordschleife".to_owned(),
        ..silverstone_request()
    };
    let resp = RaceResponse::from(engine().simulate_race(&req));
    let json = serde_json::to_value(&resp).unwrap();
    assert_eq!(json["error"], "track not found: nurburgring_nordschleife");
}

#[test]
fn failing_predictor_does_not_abort_the_race() {
    let engine = engine_with(Box::new(UnavailablePredictor), SimConfig::default());
    let outcome = engine.simulate_race(&silverstone_request()).unwrap();
    assert!(outcome.qualifying.iter().all(|q| q.skill_rating == 65.0));
    assert!(!outcome.results.is_empty());
}

#[test]
fn partially_failing_predictor_yields_mixed_grid() {
    let data = ReferenceData::builtin();
    let cfg = SimConfig {
        failure_rate_scale: 1.0,
        ..SimConfig::default()
    };
    let drivers = full_field();
    let pairings = BTreeMap::new();
    let mut rng = StdRng::seed_from_u64(7);

    let grid = GridBuilder::new(&data, &WinnersOnlyPredictor, &cfg)
        .build(
            &GridRequest {
                driver_ids: &drivers,
                season: 2023,
                grid_size: 20,
                fill_policy: FillPolicy::None,
                pairings: &pairings,
            },
            &mut rng,
        )
        .unwrap();
    assert!(grid.iter().any(|e| e.skill_source == SkillSource::Fallback));
    assert!(grid.iter().any(|e| e.skill_source != SkillSource::Fallback));
    assert!(grid
        .iter()
        .filter(|e| e.skill_source == SkillSource::Fallback)
        .all(|e| e.skill_rating == 65.0));

    let track = data.track_profile("suzuka").unwrap();
    let quali = QualifyingSimulator::new(&cfg, track, Weather::Mixed);
    let (grid, qualifying) = quali.run(grid, &data, &mut rng).unwrap();
    assert_eq!(qualifying.len(), 20);

    let mut race = Race::new(&cfg, track, Weather::Mixed, 30, &grid, &data).unwrap();
    while !race.get_finished() {
        race.simulate_lap(&mut rng);
        assert!(race.positions_are_consistent());
        assert!(race.get_entries().iter().all(|e| e.pit_stops() <= 2));
    }
    assert!(race.get_entries().iter().all(|e| !e.is_running()));

    let outcome = engine_with(Box::new(WinnersOnlyPredictor), SimConfig::default())
        .simulate_race(&silverstone_request())
        .unwrap();
    assert!(outcome.qualifying.iter().any(|q| q.skill_rating == 65.0));
    assert!(outcome.qualifying.iter().any(|q| q.skill_rating != 65.0));
    assert_eq!(outcome.statistics.finishers + outcome.statistics.dnfs, 20);
}

#[test]
fn unreliable_cars_and_zero_lap_policy() {
    // every car fails on the first lap
    let config = SimConfig {
        warmup_laps: 0,
        failure_rate_scale: 1000.0,
        ..SimConfig::default()
    };
    let req = RaceRequest {
        total_laps: 10,
        ..silverstone_request()
    };

    let excluded = engine_with(Box::new(HeuristicPredictor), config.clone())
        .simulate_race(&req)
        .unwrap();
    assert!(excluded.results.is_empty());
    assert_eq!(excluded.statistics.finishers, 0);
    assert_eq!(excluded.statistics.dnfs, 20);
    assert_eq!(excluded.statistics.completion_rate, 0.0);
    assert_eq!(excluded.statistics.retirements.len(), 20);
    assert!(excluded.statistics.winner.is_none());

    let classified = engine_with(
        Box::new(HeuristicPredictor),
        SimConfig {
            zero_lap_policy: ZeroLapPolicy::ClassifyLast,
            ..config
        },
    )
    .simulate_race(&req)
    .unwrap();
    assert_eq!(classified.results.len(), 20);
    assert!(classified.results.iter().all(|r| r.points == 0));
    let grid_order: Vec<usize> = classified.results.iter().map(|r| r.grid_position).collect();
    assert_eq!(grid_order, (1..=20).collect::<Vec<usize>>());
}

#[test]
fn wet_race_with_perfect_reliability() {
    let config = SimConfig {
        failure_rate_scale: 0.0,
        ..SimConfig::default()
    };
    let req = RaceRequest {
        weather: Weather::Wet,
        total_laps: 20,
        ..silverstone_request()
    };
    let outcome = engine_with(Box::new(HeuristicPredictor), config)
        .simulate_race(&req)
        .unwrap();

    assert_eq!(outcome.statistics.finishers, 20);
    assert_eq!(outcome.statistics.completion_rate, 1.0);
    assert!(outcome.results.iter().all(|r| r.status == EntryStatus::Finished.label()));
    assert!(outcome.results.iter().all(|r| r.pit_stops == 2));
    assert_eq!(outcome.results.iter().map(|r| r.points).sum::<u32>(), 101);
    assert!(outcome.results[1].time_display.starts_with('+'));
}
