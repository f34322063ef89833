pub mod error;

pub mod core {
    pub mod car;
    pub mod driver;
    pub mod grid;
    pub mod handle_race;
    pub mod performance;
    pub mod qualifying;
    pub mod race;
    pub mod state_handler;
    pub mod track;
    pub mod weather;
}

pub mod interfaces {
    pub mod reference_data;
    pub mod skill_predictor;
}

pub mod post {
    pub mod race_result;
}

pub mod pre {
    pub mod read_sim_pars;
    pub mod sim_config;
    pub mod sim_opts;
}

pub use crate::core::handle_race::{RaceEngine, RaceOutcome, RaceRequest, RaceResponse};
pub use crate::error::SimError;
