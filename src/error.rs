use good_lp::ResolutionError;
use thiserror::Error;

use crate::domain::schedule::Infeasibility;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found or could not be read: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse instance JSON: {0}")]
    DeserializationError(#[from] serde_json::Error),

    #[error("Failed to build internal domain model: {0}")]
    ModelConstructionError(String),

    #[error("Schedule infeasible for server type '{server_type}' at breakpoint {breakpoint}: {violation}")]
    ScheduleInfeasible { server_type: String, breakpoint: usize, violation: Infeasibility },

    #[error("Fractional flow covers {covered} at breakpoint {breakpoint}, but demand is {demand}")]
    FlowCoverageViolation { breakpoint: usize, covered: f64, demand: f64 },

    #[error("Fractional solver failed: {0}")]
    SolverError(#[from] SolverError),

    #[error("Failed to write schedule report: {0}")]
    ReportError(#[from] csv::Error),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SolverError {
    #[error("linear program is infeasible")]
    Infeasible,

    #[error("linear program is unbounded")]
    Unbounded,

    #[error("LP backend failed: {0}")]
    Backend(String),
}

impl From<ResolutionError> for SolverError {
    fn from(error: ResolutionError) -> Self {
        match error {
            ResolutionError::Infeasible => SolverError::Infeasible,
            ResolutionError::Unbounded => SolverError::Unbounded,
            other => SolverError::Backend(other.to_string()),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Unknown solver type: {0}")]
    UnknownSolverType(String),
}

impl From<ConversionError> for Error {
    fn from(error: ConversionError) -> Self {
        Error::ModelConstructionError(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
