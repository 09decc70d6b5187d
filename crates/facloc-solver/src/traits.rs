use crate::config::SolverConfig;
use crate::error::SolverError;
use crate::problem::MipProblem;
use crate::solution::RawSolution;

/// Contract every solver backend implements.
///
/// A backend receives a complete program and returns a status plus, when it
/// has one, a value for every column. Callers never look past this trait, so
/// any engine that honours it can replace another.
pub trait MipSolver: Send + Sync {
    /// Short identifier of the engine
    fn name(&self) -> &'static str;

    /// Solve `problem` under `config`.
    ///
    /// Non-optimal outcomes are returned as [`crate::SolveStatus`] values.
    /// `Err` is reserved for malformed programs and engine failures.
    fn solve(&self, problem: &MipProblem, config: &SolverConfig) -> Result<RawSolution, SolverError>;
}
