use thiserror::Error;

/// Hard failures of the solve step.
///
/// A solver reporting infeasibility or a time limit is not an error; those
/// outcomes travel in [`crate::SolveStatus`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Malformed program: {0}")]
    MalformedProblem(String),
    #[error("Invalid solver configuration: {0}")]
    InvalidConfig(String),
    #[error("Unknown solver engine: {0}")]
    UnknownEngine(String),
    #[error("Solver engine unavailable: {0}")]
    EngineUnavailable(String),
    #[error("Solver engine failure: {0}")]
    EngineFailure(String),
}
