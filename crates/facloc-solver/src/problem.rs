use crate::error::SolverError;

/// Index of a variable (column) inside a [`MipProblem`]
pub type VarId = usize;

/// Represents a mixed-integer linear program
#[derive(Debug, Clone)]
pub struct MipProblem {
    /// Decision variables, in column order
    pub variables: Vec<Variable>,
    /// Objective function
    pub objective: Objective,
    /// Constraints
    pub constraints: Vec<Constraint>,
}

#[derive(Debug, Clone)]
pub struct Variable {
    /// Name/label for the variable (for diagnostics)
    pub name: String,
    pub domain: VarDomain,
}

/// Domain of a decision variable
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VarDomain {
    /// 0 or 1
    Binary,
    /// Real-valued in `[lower, upper]`; `upper` may be infinite
    Continuous { lower: f64, upper: f64 },
    /// Integer-valued in `[lower, upper]`
    Integer { lower: f64, upper: f64 },
}

impl VarDomain {
    /// Non-negative continuous variable
    pub fn non_negative() -> Self {
        VarDomain::Continuous {
            lower: 0.0,
            upper: f64::INFINITY,
        }
    }

    pub fn bounds(&self) -> (f64, f64) {
        match *self {
            VarDomain::Binary => (0.0, 1.0),
            VarDomain::Continuous { lower, upper } | VarDomain::Integer { lower, upper } => {
                (lower, upper)
            }
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, VarDomain::Binary | VarDomain::Integer { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Objective {
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Whether to minimize or maximize
    pub minimize: bool,
}

#[derive(Debug, Clone)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    /// Sparse row: (variable, coefficient) pairs
    pub terms: Vec<(VarId, f64)>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

impl Default for MipProblem {
    fn default() -> Self {
        Self::new()
    }
}

impl MipProblem {
    pub fn new() -> Self {
        Self {
            variables: Vec::new(),
            objective: Objective {
                coefficients: Vec::new(),
                minimize: true,
            },
            constraints: Vec::new(),
        }
    }

    pub fn with_capacity(variables: usize, constraints: usize) -> Self {
        Self {
            variables: Vec::with_capacity(variables),
            objective: Objective {
                coefficients: Vec::with_capacity(variables),
                minimize: true,
            },
            constraints: Vec::with_capacity(constraints),
        }
    }

    /// Add a variable with its objective coefficient, returning its column index
    pub fn add_variable(&mut self, name: impl Into<String>, domain: VarDomain, cost: f64) -> VarId {
        self.variables.push(Variable {
            name: name.into(),
            domain,
        });
        self.objective.coefficients.push(cost);
        self.variables.len() - 1
    }

    pub fn set_minimize(&mut self, minimize: bool) {
        self.objective.minimize = minimize;
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        terms: Vec<(VarId, f64)>,
        op: ConstraintOp,
        rhs: f64,
    ) {
        self.constraints.push(Constraint {
            name: name.into(),
            terms,
            op,
            rhs,
        });
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Number of non-zero constraint coefficients
    pub fn num_nonzeros(&self) -> usize {
        self.constraints.iter().map(|c| c.terms.len()).sum()
    }

    /// Objective value of an assignment, evaluated against the raw values
    pub fn evaluate_objective(&self, values: &[f64]) -> f64 {
        self.objective
            .coefficients
            .iter()
            .zip(values)
            .map(|(c, v)| c * v)
            .sum()
    }

    /// Reject programs that no engine should be handed
    pub fn check(&self) -> Result<(), SolverError> {
        let n = self.variables.len();
        if n == 0 {
            return Err(SolverError::MalformedProblem("program has no variables".to_string()));
        }
        if self.objective.coefficients.len() != n {
            return Err(SolverError::MalformedProblem(format!(
                "objective has {} coefficients for {} variables",
                self.objective.coefficients.len(),
                n
            )));
        }
        if let Some(j) = self.objective.coefficients.iter().position(|c| !c.is_finite()) {
            return Err(SolverError::MalformedProblem(format!(
                "objective coefficient of {} is not finite",
                self.variables[j].name
            )));
        }

        for var in &self.variables {
            let (lower, upper) = var.domain.bounds();
            if lower.is_nan() || upper.is_nan() || lower > upper {
                return Err(SolverError::MalformedProblem(format!(
                    "variable {} has invalid bounds [{}, {}]",
                    var.name, lower, upper
                )));
            }
        }

        for c in &self.constraints {
            if !c.rhs.is_finite() {
                return Err(SolverError::MalformedProblem(format!(
                    "constraint {} has non-finite right-hand side",
                    c.name
                )));
            }
            for &(var, coef) in &c.terms {
                if var >= n {
                    return Err(SolverError::MalformedProblem(format!(
                        "constraint {} references variable {} (only {} exist)",
                        c.name, var, n
                    )));
                }
                if !coef.is_finite() {
                    return Err(SolverError::MalformedProblem(format!(
                        "constraint {} has non-finite coefficient for {}",
                        c.name, self.variables[var].name
                    )));
                }
            }
        }
        Ok(())
    }
}
