use thiserror::Error;

/// MissingDataError is raised if an identifier cannot be resolved in the reference data. It
/// indicates a setup mistake and is therefore never replaced by a default value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MissingDataError {
    #[error("track not found: {0}")]
    Track(String),
    #[error("constructor not found: {0}")]
    Constructor(String),
    #[error("driver not found: {0}")]
    Driver(String),
}

/// GridConstructionError is raised before the first lap if no valid grid can be assembled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridConstructionError {
    #[error("grid size must be at least 1")]
    EmptyGrid,
    #[error("{requested} drivers requested but the grid only has {grid_size} slots")]
    TooManyDrivers { requested: usize, grid_size: usize },
    #[error("driver {0} was requested more than once")]
    DuplicateDriver(String),
    #[error("only {available} unique drivers available for {grid_size} grid slots")]
    NotEnoughDrivers { available: usize, grid_size: usize },
    #[error("no constructors available to assign")]
    NoConstructors,
}

/// SimError is the structured failure result of a race simulation call. No partial race state is
/// returned alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    #[error(transparent)]
    MissingData(#[from] MissingDataError),
    #[error("grid construction failed: {0}")]
    GridConstruction(#[from] GridConstructionError),
    #[error("invalid race parameters: {0}")]
    InvalidParameters(String),
}
