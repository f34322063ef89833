use anyhow::Context;
use clap::Parser;
use racesim::core::handle_race::{RaceEngine, RaceOutcome, RaceRequest, RaceResponse};
use racesim::interfaces::reference_data::ReferenceData;
use racesim::interfaces::skill_predictor::HeuristicPredictor;
use racesim::pre::read_sim_pars::{
    read_driver_history_csv, read_feature_file, read_reference_data, read_sim_config,
};
use racesim::pre::sim_config::SimConfig;
use racesim::pre::sim_opts::SimOpts;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("RACESIM_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_outcome(outcome: &RaceOutcome) {
    println!(
        "RESULT: {} ({}), season {}, {} laps, weather {}",
        outcome.track.name, outcome.track.circuit_type, outcome.season, outcome.total_laps,
        outcome.weather
    );

    println!("\nQUALIFYING");
    println!("{:>3}  {:<22} {:<14} {:>10} {:>6}", "pos", "driver", "constructor", "time", "skill");
    for q in outcome.qualifying.iter() {
        println!(
            "{:>3}  {:<22} {:<14} {:>10} {:>6.1}",
            q.position, q.driver, q.constructor, q.time_formatted, q.skill_rating
        );
    }

    println!("\nRACE");
    println!(
        "{:>3}  {:<22} {:<14} {:>4} {:>12} {:>4} {:>10} {:>4} {:<10} {:>3}",
        "pos", "driver", "constructor", "grid", "time", "laps", "fastest", "pit", "status", "pts"
    );
    for r in outcome.results.iter() {
        println!(
            "{:>3}  {:<22} {:<14} {:>4} {:>12} {:>4} {:>9}{} {:>4} {:<10} {:>3}",
            r.position,
            r.driver,
            r.constructor,
            r.grid_position,
            r.time_display,
            r.laps_completed,
            r.fastest_lap,
            if r.has_fastest_lap { "*" } else { " " },
            r.pit_stops,
            r.status,
            r.points
        );
    }

    let stats = &outcome.statistics;
    println!("\nSTATISTICS");
    println!("winner:        {}", stats.winner.as_deref().unwrap_or("-"));
    println!("pole position: {}", stats.pole_sitter.as_deref().unwrap_or("-"));
    println!(
        "fastest lap:   {} ({})",
        stats.fastest_lap_driver.as_deref().unwrap_or("-"),
        stats.fastest_lap_formatted.as_deref().unwrap_or("-")
    );
    println!(
        "finishers:     {} ({} DNF, completion rate {:.1}%)",
        stats.finishers,
        stats.dnfs,
        stats.completion_rate * 100.0
    );
    for ret in stats.retirements.iter() {
        println!("retirement:    {} on lap {} ({})", ret.driver, ret.lap, ret.cause);
    }
}

/// Runs independent seeded races in parallel and prints win and podium counts.
fn run_batch(engine: &RaceEngine, req: &RaceRequest, no_sim_runs: u32) -> anyhow::Result<()> {
    let base_seed = req.seed.unwrap_or(0);

    let outcomes: Vec<RaceOutcome> = (0..no_sim_runs as u64)
        .into_par_iter()
        .map(|run| {
            let run_req = RaceRequest {
                seed: Some(base_seed + run),
                ..req.clone()
            };
            engine.simulate_race(&run_req)
        })
        .collect::<Result<Vec<RaceOutcome>, _>>()?;

    let mut wins: BTreeMap<String, u32> = BTreeMap::new();
    let mut podiums: BTreeMap<String, u32> = BTreeMap::new();
    for outcome in outcomes.iter() {
        for r in outcome.results.iter().take(3) {
            *podiums.entry(r.driver.to_owned()).or_insert(0) += 1;
            if r.position == 1 {
                *wins.entry(r.driver.to_owned()).or_insert(0) += 1;
            }
        }
    }

    let mut summary: Vec<(&String, u32, u32)> = podiums
        .iter()
        .map(|(driver, &p)| (driver, wins.get(driver).copied().unwrap_or(0), p))
        .collect();
    summary.sort_by(|a, b| b.1.cmp(&a.1).then(b.2.cmp(&a.2)).then(a.0.cmp(b.0)));

    println!(
        "RESULT: {} runs (seeds {}..{})",
        no_sim_runs,
        base_seed,
        base_seed + no_sim_runs as u64
    );
    println!("{:<22} {:>6} {:>8}", "driver", "wins", "podiums");
    for (driver, w, p) in summary.iter() {
        println!("{:<22} {:>6} {:>8}", driver, w, p);
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    // PRE-PROCESSING ------------------------------------------------------------------------------
    let sim_opts: SimOpts = SimOpts::parse();
    init_logging(sim_opts.debug);

    let config = match &sim_opts.config_path {
        Some(path) => {
            info!("Reading simulation config from {}", path.display());
            read_sim_config(path)?
        }
        None => SimConfig::default(),
    };

    let mut reference = ReferenceData::builtin();
    if let Some(path) = &sim_opts.reference_path {
        info!("Reading reference data from {}", path.display());
        reference.merge(read_reference_data(path)?);
    }
    if let Some(path) = &sim_opts.history_path {
        info!("Reading driver history from {}", path.display());
        reference.merge(read_driver_history_csv(path)?);
    }

    let engine = RaceEngine::new(Box::new(reference), Box::new(HeuristicPredictor), config);

    // PREDICTION MODE -----------------------------------------------------------------------------
    if let Some(path) = &sim_opts.predict_path {
        let features = read_feature_file(path)?;
        let prediction = engine.predict_driver_skill(&features);
        println!("{}", serde_json::to_string_pretty(&prediction)?);
        return Ok(());
    }

    // EXECUTION -----------------------------------------------------------------------------------
    let req = RaceRequest {
        track_id: sim_opts.track.to_owned(),
        season: sim_opts.season,
        driver_ids: sim_opts.drivers.to_owned(),
        weather: sim_opts.weather,
        total_laps: sim_opts.laps,
        seed: sim_opts.seed,
        grid_size: sim_opts.grid_size,
        fill_policy: sim_opts.fill_policy,
        pairings: BTreeMap::new(),
    };

    let t_start = Instant::now();

    if sim_opts.no_sim_runs > 1 {
        run_batch(&engine, &req, sim_opts.no_sim_runs)?;
        info!("Execution time: {}ms", t_start.elapsed().as_millis());
        return Ok(());
    }

    let res = engine.simulate_race(&req);
    info!("Execution time: {}ms", t_start.elapsed().as_millis());

    if sim_opts.json {
        let resp = RaceResponse::from(res);
        println!("{}", serde_json::to_string_pretty(&resp)?);
        return Ok(());
    }

    let outcome = res.context("Race simulation failed!")?;
    print_outcome(&outcome);

    // POST-PROCESSING -----------------------------------------------------------------------------
    if let Some(path) = &sim_opts.laptimes_path {
        outcome
            .lap_history
            .write_lap_and_race_times_to_file(path)?;
        info!("Lap and race times written to {}", path.display());
    }

    Ok(())
}
