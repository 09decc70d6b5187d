//! The solve pipeline: build, solve, extract.

use facloc_solver::{MipSolver, SolverConfig, SolverError};
use thiserror::Error;
use tracing::{info, info_span};

use crate::builder::{CapacityPolicy, ModelBuildError, ModelBuilder};
use crate::data::{Instance, InstanceInput, ValidationError};
use crate::extract::{ConsistencyError, Extractor, Solution, Tolerances};

/// Any failure of the pipeline. Non-optimal solver outcomes are not errors;
/// they arrive as [`Solution::status`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FacilityError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("Cannot build model: {0}")]
    Build(#[from] ModelBuildError),
    #[error(transparent)]
    Solver(#[from] SolverError),
    #[error("Inconsistent solver output: {0}")]
    Consistency(#[from] ConsistencyError),
}

/// Runs one solve request end to end.
///
/// A `Planner` holds only configuration; every call builds a fresh program,
/// so one planner can serve concurrent requests from several threads.
#[derive(Debug, Clone, Default)]
pub struct Planner {
    builder: ModelBuilder,
    extractor: Extractor,
    config: SolverConfig,
}

impl Planner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_capacity_policy(mut self, policy: CapacityPolicy) -> Self {
        self.builder = self.builder.with_capacity_policy(policy);
        self
    }

    pub fn with_tolerances(mut self, tolerances: Tolerances) -> Self {
        self.extractor = self.extractor.with_tolerances(tolerances);
        self
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Validate raw input, then solve it
    pub fn solve_input(&self, input: InstanceInput) -> Result<Solution, FacilityError> {
        let instance = input.into_instance()?;
        self.solve(&instance)
    }

    /// Solve with the engine named in the configuration
    pub fn solve(&self, instance: &Instance) -> Result<Solution, FacilityError> {
        let solver = self.config.engine.solver()?;
        self.solve_with(instance, solver.as_ref())
    }

    /// Solve with any conforming backend
    pub fn solve_with(
        &self,
        instance: &Instance,
        solver: &dyn MipSolver,
    ) -> Result<Solution, FacilityError> {
        let span = info_span!(
            "solve",
            engine = solver.name(),
            sites = instance.sites().len(),
            customers = instance.customers().len()
        );
        let _guard = span.enter();

        let model = self.builder.build(instance)?;
        let raw = solver.solve(&model.problem, &self.config)?;
        let solution = self.extractor.extract(instance, &model, &raw)?;

        info!(
            status = %solution.status,
            open_sites = solution.open_sites.len(),
            total_cost = ?solution.total_cost(),
            seconds = solution.solve_seconds,
            "Solve complete"
        );
        Ok(solution)
    }
}
