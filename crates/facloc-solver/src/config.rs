//! Solver configuration.

use std::fmt;
use std::str::FromStr;

use crate::error::SolverError;
use crate::traits::MipSolver;

/// Identifier of a conforming solver backend
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Engine {
    /// HiGHS, built from source and linked statically
    #[default]
    Highs,
}

impl Engine {
    pub const ALL: &'static [Engine] = &[Engine::Highs];

    pub fn as_str(self) -> &'static str {
        match self {
            Engine::Highs => "highs",
        }
    }

    /// Instantiate the backend for this engine
    pub fn solver(self) -> Result<Box<dyn MipSolver>, SolverError> {
        match self {
            #[cfg(feature = "highs")]
            Engine::Highs => Ok(Box::new(crate::highs_solver::HighsSolver::new())),
            #[cfg(not(feature = "highs"))]
            Engine::Highs => Err(SolverError::EngineUnavailable(
                "built without the `highs` feature".to_string(),
            )),
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Engine::ALL
            .iter()
            .copied()
            .find(|e| e.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SolverError::UnknownEngine(s.to_string()))
    }
}

/// Options handed to a solver backend.
///
/// Every limit is optional. With nothing set the engine searches until it
/// proves optimality.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverConfig {
    /// Backend to run
    pub engine: Engine,
    /// Time limit in seconds. `None` means no limit.
    pub time_limit: Option<f64>,
    /// Relative MIP gap at which the search stops. `None` uses the engine default.
    pub mip_rel_gap: Option<f64>,
    /// Absolute MIP gap at which the search stops. `None` uses the engine default.
    pub mip_abs_gap: Option<f64>,
    /// Number of threads. `None` uses the engine default.
    pub threads: Option<u32>,
    /// Let the engine print its own log
    pub log_to_console: bool,
}

impl SolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = Some(seconds);
        self
    }

    pub fn with_mip_gap(mut self, gap: f64) -> Self {
        self.mip_rel_gap = Some(gap);
        self
    }

    pub fn with_abs_gap(mut self, gap: f64) -> Self {
        self.mip_abs_gap = Some(gap);
        self
    }

    pub fn with_threads(mut self, threads: u32) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_log_to_console(mut self, enabled: bool) -> Self {
        self.log_to_console = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), SolverError> {
        if let Some(t) = self.time_limit {
            if t.is_nan() || t <= 0.0 {
                return Err(SolverError::InvalidConfig(format!(
                    "time limit must be positive, got {}",
                    t
                )));
            }
        }
        if let Some(gap) = self.mip_rel_gap {
            if !(0.0..=1.0).contains(&gap) {
                return Err(SolverError::InvalidConfig(format!(
                    "relative gap must be within [0, 1], got {}",
                    gap
                )));
            }
        }
        if let Some(gap) = self.mip_abs_gap {
            if !gap.is_finite() || gap < 0.0 {
                return Err(SolverError::InvalidConfig(format!(
                    "absolute gap must be finite and non-negative, got {}",
                    gap
                )));
            }
        }
        if self.threads == Some(0) {
            return Err(SolverError::InvalidConfig("threads must be at least 1".to_string()));
        }
        Ok(())
    }
}
