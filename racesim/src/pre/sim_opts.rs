use crate::core::grid::FillPolicy;
use crate::core::weather::Weather;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[clap(
    version = "0.1.0",
    name = "racesim",
    about = "A lap-based grid race simulator with skill prediction"
)]
pub struct SimOpts {
    // FLAGS ---------------------------------------------------------------------------------------
    /// Activate debug logging (overridden by RACESIM_LOG if set)
    #[clap(short, long)]
    pub debug: bool,

    /// Print the outcome as JSON instead of the result tables
    #[clap(short, long)]
    pub json: bool,

    // OPTIONS -------------------------------------------------------------------------------------
    /// Set track identifier, e.g. silverstone
    #[clap(short, long, default_value = "silverstone")]
    pub track: String,

    /// Set season used for the driver history lookup
    #[clap(short, long, default_value = "2024")]
    pub season: u32,

    /// Set comma separated driver identifiers, e.g. max_verstappen,lando_norris
    #[clap(long, value_delimiter = ',')]
    pub drivers: Vec<String>,

    /// Set weather condition (dry, wet, mixed or e.g. sunny, light_rain, heavy_rain)
    #[clap(short, long, default_value = "dry")]
    pub weather: Weather,

    /// Set number of race laps
    #[clap(short, long, default_value = "50")]
    pub laps: u32,

    /// Set seed of the random number generator (random if not set)
    #[clap(long)]
    pub seed: Option<u64>,

    /// Set number of grid entries
    #[clap(short, long, default_value = "20")]
    pub grid_size: usize,

    /// Set fill policy for empty grid slots (none, from_history, synthesized)
    #[clap(short, long, default_value = "from_history")]
    pub fill_policy: FillPolicy,

    /// Set number of simulation runs, more than one run prints a win and podium summary
    #[clap(short, long, default_value = "1")]
    pub no_sim_runs: u32,

    /// Set path to a simulation config file (JSON)
    #[clap(short, long)]
    pub config_path: Option<PathBuf>,

    /// Set path to a reference data file (JSON), merged into the built-in data
    #[clap(short, long)]
    pub reference_path: Option<PathBuf>,

    /// Set path to a driver history file (CSV), merged into the reference data
    #[clap(long)]
    pub history_path: Option<PathBuf>,

    /// Predict the skill rating for a feature file (JSON) instead of simulating a race
    #[clap(short, long)]
    pub predict_path: Option<PathBuf>,

    /// Set path of the lap and race times output file
    #[clap(short = 'o', long)]
    pub laptimes_path: Option<PathBuf>,
}
