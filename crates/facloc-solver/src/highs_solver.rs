//! HiGHS backend.

use std::time::Instant;

use highs::{Col, HighsModelStatus, RowProblem, Sense};
use tracing::{debug, warn};

use crate::config::SolverConfig;
use crate::error::SolverError;
use crate::problem::{ConstraintOp, MipProblem};
use crate::solution::{RawSolution, SolveStatus};
use crate::traits::MipSolver;

const ENGINE_NAME: &str = "highs";

/// Runs programs through HiGHS' branch-and-cut MIP solver
#[derive(Debug, Clone, Copy, Default)]
pub struct HighsSolver;

impl HighsSolver {
    pub fn new() -> Self {
        Self
    }

    fn load(problem: &MipProblem) -> (RowProblem, Vec<Col>) {
        let mut pb = RowProblem::default();

        let cols: Vec<Col> = problem
            .variables
            .iter()
            .zip(&problem.objective.coefficients)
            .map(|(var, &cost)| {
                let (lower, upper) = var.domain.bounds();
                if var.domain.is_integer() {
                    pb.add_integer_column(cost, lower..=upper)
                } else {
                    pb.add_column(cost, lower..=upper)
                }
            })
            .collect();

        for c in &problem.constraints {
            let terms: Vec<(Col, f64)> = c
                .terms
                .iter()
                .filter(|(_, coef)| *coef != 0.0)
                .map(|&(var, coef)| (cols[var], coef))
                .collect();
            match c.op {
                ConstraintOp::Le => pb.add_row(..=c.rhs, terms),
                ConstraintOp::Ge => pb.add_row(c.rhs.., terms),
                ConstraintOp::Eq => pb.add_row(c.rhs..=c.rhs, terms),
            }
        }

        (pb, cols)
    }
}

impl MipSolver for HighsSolver {
    fn name(&self) -> &'static str {
        ENGINE_NAME
    }

    fn solve(&self, problem: &MipProblem, config: &SolverConfig) -> Result<RawSolution, SolverError> {
        problem.check()?;
        config.validate()?;

        debug!(
            engine = ENGINE_NAME,
            variables = problem.num_variables(),
            constraints = problem.num_constraints(),
            nonzeros = problem.num_nonzeros(),
            "Loading program"
        );

        let (pb, cols) = Self::load(problem);
        let sense = if problem.objective.minimize {
            Sense::Minimise
        } else {
            Sense::Maximise
        };

        let mut model = pb.optimise(sense);
        model.make_quiet();
        if config.log_to_console {
            model.set_option("output_flag", true);
            model.set_option("log_to_console", true);
        }
        if let Some(seconds) = config.time_limit {
            model.set_option("time_limit", seconds);
        }
        if let Some(gap) = config.mip_rel_gap {
            model.set_option("mip_rel_gap", gap);
        }
        if let Some(gap) = config.mip_abs_gap {
            model.set_option("mip_abs_gap", gap);
        }
        if let Some(threads) = config.threads {
            let threads = i32::try_from(threads)
                .map_err(|_| SolverError::InvalidConfig(format!("too many threads: {}", threads)))?;
            model.set_option("threads", threads);
        }

        let started = Instant::now();
        let solved = model.try_solve().map_err(|status| {
            warn!(engine = ENGINE_NAME, ?status, "Engine rejected the program");
            SolverError::EngineFailure(format!("HiGHS returned {:?}", status))
        })?;
        let solve_seconds = started.elapsed().as_secs_f64();

        let highs_status = solved.status();
        let status = map_status(highs_status)?;

        let mut raw = RawSolution::without_values(status, ENGINE_NAME, solve_seconds);
        if matches!(status, SolveStatus::Optimal | SolveStatus::TimeLimitReached) {
            let objective = solved.objective_value();
            if objective.is_finite() {
                let sol = solved.get_solution();
                raw.values = cols.iter().map(|&c| sol[c]).collect();
                raw.objective_value = Some(objective);
                let gap = solved.mip_gap();
                raw.mip_gap = gap.is_finite().then_some(gap);
            }
        }

        debug!(
            engine = ENGINE_NAME,
            ?highs_status,
            status = %status,
            objective = ?raw.objective_value,
            seconds = solve_seconds,
            "Solve finished"
        );
        Ok(raw)
    }
}

fn map_status(status: HighsModelStatus) -> Result<SolveStatus, SolverError> {
    match status {
        HighsModelStatus::Optimal | HighsModelStatus::ModelEmpty => Ok(SolveStatus::Optimal),
        // non-negative costs over capacity-bounded flows cannot be unbounded,
        // so the ambiguous presolve verdict means no feasible point exists
        HighsModelStatus::Infeasible | HighsModelStatus::UnboundedOrInfeasible => {
            Ok(SolveStatus::Infeasible)
        }
        HighsModelStatus::Unbounded => Ok(SolveStatus::Unbounded),
        HighsModelStatus::ReachedTimeLimit => Ok(SolveStatus::TimeLimitReached),
        HighsModelStatus::LoadError
        | HighsModelStatus::ModelError
        | HighsModelStatus::PresolveError
        | HighsModelStatus::SolveError
        | HighsModelStatus::PostsolveError => Err(SolverError::EngineFailure(format!(
            "HiGHS reported {:?}",
            status
        ))),
        _ => Ok(SolveStatus::Error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::VarDomain;

    #[test]
    fn test_minimization_with_ge() {
        // Minimize: 2x + 3y
        // Subject to:
        //   x + y >= 4
        //   x <= 3
        //   y <= 3
        // Optimal: x=3, y=1, obj=9
        let mut problem = MipProblem::new();
        let x = problem.add_variable("x", VarDomain::non_negative(), 2.0);
        let y = problem.add_variable("y", VarDomain::non_negative(), 3.0);
        problem.add_constraint("sum", vec![(x, 1.0), (y, 1.0)], ConstraintOp::Ge, 4.0);
        problem.add_constraint("x_max", vec![(x, 1.0)], ConstraintOp::Le, 3.0);
        problem.add_constraint("y_max", vec![(y, 1.0)], ConstraintOp::Le, 3.0);

        let raw = HighsSolver::new().solve(&problem, &SolverConfig::new()).unwrap();

        assert_eq!(raw.status, SolveStatus::Optimal);
        assert_eq!(raw.engine, "highs");
        assert!((raw.values[x] - 3.0).abs() < 1e-6, "x = {} (expected 3)", raw.values[x]);
        assert!((raw.values[y] - 1.0).abs() < 1e-6, "y = {} (expected 1)", raw.values[y]);
        assert!((raw.objective_value.unwrap() - 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_binary_variable_is_enforced() {
        // Covering 2.5 units with a binary worth 2 each: two binaries must open.
        let mut problem = MipProblem::new();
        let a = problem.add_variable("a", VarDomain::Binary, 1.0);
        let b = problem.add_variable("b", VarDomain::Binary, 1.0);
        let c = problem.add_variable("c", VarDomain::Binary, 1.0);
        problem.add_constraint(
            "cover",
            vec![(a, 2.0), (b, 2.0), (c, 2.0)],
            ConstraintOp::Ge,
            2.5,
        );

        let raw = HighsSolver::new().solve(&problem, &SolverConfig::new()).unwrap();

        assert_eq!(raw.status, SolveStatus::Optimal);
        assert!((raw.objective_value.unwrap() - 2.0).abs() < 1e-6);
        for v in &raw.values {
            assert!(v.abs() < 1e-6 || (v - 1.0).abs() < 1e-6, "non-integral {}", v);
        }
    }

    #[test]
    fn test_infeasible() {
        let mut problem = MipProblem::new();
        let x = problem.add_variable("x", VarDomain::non_negative(), 1.0);
        problem.add_constraint("lower", vec![(x, 1.0)], ConstraintOp::Ge, 5.0);
        problem.add_constraint("upper", vec![(x, 1.0)], ConstraintOp::Le, 3.0);

        let raw = HighsSolver::new().solve(&problem, &SolverConfig::new()).unwrap();

        assert_eq!(raw.status, SolveStatus::Infeasible);
        assert!(raw.values.is_empty());
        assert!(raw.objective_value.is_none());
    }

    #[test]
    fn test_unbounded() {
        let mut problem = MipProblem::new();
        let x = problem.add_variable("x", VarDomain::non_negative(), -1.0);
        problem.add_constraint("floor", vec![(x, 1.0)], ConstraintOp::Ge, 1.0);

        let raw = HighsSolver::new().solve(&problem, &SolverConfig::new()).unwrap();

        assert_eq!(raw.status, SolveStatus::Unbounded);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(map_status(HighsModelStatus::Optimal), Ok(SolveStatus::Optimal));
        assert_eq!(map_status(HighsModelStatus::ModelEmpty), Ok(SolveStatus::Optimal));
        assert_eq!(map_status(HighsModelStatus::Infeasible), Ok(SolveStatus::Infeasible));
        assert_eq!(
            map_status(HighsModelStatus::UnboundedOrInfeasible),
            Ok(SolveStatus::Infeasible)
        );
        assert_eq!(map_status(HighsModelStatus::Unbounded), Ok(SolveStatus::Unbounded));
        assert_eq!(
            map_status(HighsModelStatus::ReachedTimeLimit),
            Ok(SolveStatus::TimeLimitReached)
        );
        assert!(matches!(
            map_status(HighsModelStatus::SolveError),
            Err(SolverError::EngineFailure(_))
        ));
    }

    #[test]
    fn test_malformed_program_is_rejected() {
        let problem = MipProblem::new();
        let err = HighsSolver::new().solve(&problem, &SolverConfig::new()).unwrap_err();
        assert!(matches!(err, SolverError::MalformedProblem(_)));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut problem = MipProblem::new();
        problem.add_variable("x", VarDomain::Binary, 1.0);
        let config = SolverConfig::new().with_mip_gap(2.0);
        let err = HighsSolver::new().solve(&problem, &config).unwrap_err();
        assert!(matches!(err, SolverError::InvalidConfig(_)));
    }

    #[test]
    fn test_limits_are_accepted() {
        let mut problem = MipProblem::new();
        let x = problem.add_variable("x", VarDomain::Integer { lower: 0.0, upper: 10.0 }, 1.0);
        problem.add_constraint("floor", vec![(x, 1.0)], ConstraintOp::Ge, 2.5);
        let config = SolverConfig::new()
            .with_time_limit(30.0)
            .with_mip_gap(0.0)
            .with_abs_gap(0.0)
            .with_threads(1);

        let raw = HighsSolver::new().solve(&problem, &config).unwrap();

        assert_eq!(raw.status, SolveStatus::Optimal);
        assert!((raw.values[x] - 3.0).abs() < 1e-6);
        assert!(raw.solve_seconds >= 0.0);
    }
}
