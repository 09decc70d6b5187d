mod config;
mod error;
#[cfg(feature = "highs")]
mod highs_solver;
mod problem;
mod solution;
mod traits;

pub use config::{Engine, SolverConfig};
pub use error::SolverError;
#[cfg(feature = "highs")]
pub use highs_solver::HighsSolver;
pub use problem::{Constraint, ConstraintOp, MipProblem, Objective, VarDomain, VarId, Variable};
pub use solution::{RawSolution, SolveStatus};
pub use traits::MipSolver;
