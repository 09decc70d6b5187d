/// Raw output of a solver engine for one program
#[derive(Debug, Clone)]
pub struct RawSolution {
    /// Solve status
    pub status: SolveStatus,
    /// Value of each variable, in column order (empty when the engine has none)
    pub values: Vec<f64>,
    /// Objective value reported by the engine
    pub objective_value: Option<f64>,
    /// Relative MIP gap of the incumbent, when the engine reports one
    pub mip_gap: Option<f64>,
    /// Wall-clock time spent inside the engine
    pub solve_seconds: f64,
    /// Name of the engine that produced this result
    pub engine: &'static str,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolveStatus {
    /// A proven optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// The time limit stopped the search (an incumbent may exist)
    TimeLimitReached,
    /// The engine finished without a classifiable outcome
    Error,
}

impl SolveStatus {
    pub fn is_optimal(self) -> bool {
        matches!(self, SolveStatus::Optimal)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SolveStatus::Optimal => "optimal",
            SolveStatus::Infeasible => "infeasible",
            SolveStatus::Unbounded => "unbounded",
            SolveStatus::TimeLimitReached => "time_limit_reached",
            SolveStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RawSolution {
    /// A result that carries a status and nothing else
    pub fn without_values(status: SolveStatus, engine: &'static str, solve_seconds: f64) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective_value: None,
            mip_gap: None,
            solve_seconds,
            engine,
        }
    }

    /// Whether `values` holds a usable assignment for a program with `num_variables` columns.
    ///
    /// Optimal results always do; a time-limited result only when the engine
    /// kept a finite incumbent.
    pub fn has_incumbent(&self, num_variables: usize) -> bool {
        let complete = self.values.len() == num_variables
            && self.objective_value.is_some_and(f64::is_finite);
        match self.status {
            SolveStatus::Optimal => complete,
            SolveStatus::TimeLimitReached => complete,
            _ => false,
        }
    }
}
