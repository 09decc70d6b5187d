//! Maps raw solver values back onto sites and customers.

use facloc_solver::{RawSolution, SolveStatus};
use thiserror::Error;
use tracing::{debug, error};

use crate::builder::FacilityModel;
use crate::data::Instance;

/// A site is open when its binary variable exceeds this value.
pub const OPEN_THRESHOLD: f64 = 0.5;

/// Flows below this value are solver noise and are reported as zero.
pub const FLOW_EPSILON: f64 = 1e-6;

/// Allowed relative gap between the recomputed cost and the solver's objective.
pub const OBJECTIVE_TOLERANCE: f64 = 1e-6;

/// Raised when extraction finds the raw output inconsistent with the program.
/// Always a defect; never corrected silently.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConsistencyError {
    #[error("Recomputed cost {computed} does not match solver objective {reported}")]
    ObjectiveMismatch { computed: f64, reported: f64 },
    #[error("Solver returned {got} values for {expected} variables")]
    ValueCountMismatch { expected: usize, got: usize },
    #[error("Closed site {site} ships {quantity} to {customer}")]
    FlowFromClosedSite {
        site: String,
        customer: String,
        quantity: f64,
    },
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub open_threshold: f64,
    pub flow_epsilon: f64,
    pub objective_tolerance: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            open_threshold: OPEN_THRESHOLD,
            flow_epsilon: FLOW_EPSILON,
            objective_tolerance: OBJECTIVE_TOLERANCE,
        }
    }
}

/// Units shipped from one site to one customer
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Flow {
    pub site: String,
    pub customer: String,
    pub quantity: f64,
    pub unit_cost: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostBreakdown {
    pub fixed: f64,
    pub variable: f64,
    pub total: f64,
}

/// Outbound volume of an open site
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SiteUsage {
    pub site: String,
    pub volume: f64,
    pub capacity: f64,
    /// volume / capacity
    pub utilization: f64,
}

/// Domain-level result of one solve.
///
/// Only results with an incumbent carry open sites, flows and costs; check
/// [`Solution::has_assignment`] (or `status`) before reading them.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub status: SolveStatus,
    /// Open site ids, in input order
    pub open_sites: Vec<String>,
    /// Non-zero flows, site-major in input order
    pub flows: Vec<Flow>,
    pub costs: Option<CostBreakdown>,
    pub objective_value: Option<f64>,
    pub site_usage: Vec<SiteUsage>,
    pub mip_gap: Option<f64>,
    pub solve_seconds: f64,
    pub engine: String,
}

impl Solution {
    fn status_only(raw: &RawSolution) -> Self {
        Self {
            status: raw.status,
            open_sites: Vec::new(),
            flows: Vec::new(),
            costs: None,
            objective_value: None,
            site_usage: Vec::new(),
            mip_gap: None,
            solve_seconds: raw.solve_seconds,
            engine: raw.engine.to_string(),
        }
    }

    pub fn has_assignment(&self) -> bool {
        self.costs.is_some()
    }

    pub fn total_cost(&self) -> Option<f64> {
        self.costs.map(|c| c.total)
    }

    pub fn is_open(&self, site: &str) -> bool {
        self.open_sites.iter().any(|s| s == site)
    }

    /// Quantity shipped from `site` to `customer` (zero when absent)
    pub fn flow(&self, site: &str, customer: &str) -> f64 {
        self.flows
            .iter()
            .find(|f| f.site == site && f.customer == customer)
            .map_or(0.0, |f| f.quantity)
    }

    /// Total quantity received by `customer`
    pub fn inbound(&self, customer: &str) -> f64 {
        self.flows
            .iter()
            .filter(|f| f.customer == customer)
            .map(|f| f.quantity)
            .sum()
    }

    /// Total quantity shipped by `site`
    pub fn outbound(&self, site: &str) -> f64 {
        self.flows
            .iter()
            .filter(|f| f.site == site)
            .map(|f| f.quantity)
            .sum()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Extractor {
    tolerances: Tolerances,
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerances(mut self, tolerances: Tolerances) -> Self {
        self.tolerances = tolerances;
        self
    }

    pub fn tolerances(&self) -> &Tolerances {
        &self.tolerances
    }

    pub fn extract(
        &self,
        instance: &Instance,
        model: &FacilityModel,
        raw: &RawSolution,
    ) -> Result<Solution, ConsistencyError> {
        let expected = model.problem.num_variables();
        let usable = matches!(raw.status, SolveStatus::Optimal | SolveStatus::TimeLimitReached);
        if !usable {
            return Ok(Solution::status_only(raw));
        }
        if raw.status.is_optimal() && raw.values.len() != expected {
            return Err(ConsistencyError::ValueCountMismatch {
                expected,
                got: raw.values.len(),
            });
        }
        if !raw.has_incumbent(expected) {
            debug!(status = %raw.status, "No incumbent to extract");
            return Ok(Solution::status_only(raw));
        }

        let tol = &self.tolerances;
        let values = &raw.values;
        let mut solution = Solution::status_only(raw);
        solution.objective_value = raw.objective_value;
        solution.mip_gap = raw.mip_gap;

        let mut fixed = 0.0;
        let mut variable = 0.0;
        for (i, site) in instance.sites().iter().enumerate() {
            let open = values[model.open_var(i)] > tol.open_threshold;
            if open {
                fixed += site.fixed_cost;
                solution.open_sites.push(site.id.clone());
            }

            let mut volume = 0.0;
            for (j, customer) in instance.customers().iter().enumerate() {
                let quantity = values[model.flow_var(i, j)];
                if quantity < tol.flow_epsilon {
                    continue;
                }
                if !open {
                    error!(site = %site.id, customer = %customer.id, quantity, "Flow from closed site");
                    return Err(ConsistencyError::FlowFromClosedSite {
                        site: site.id.clone(),
                        customer: customer.id.clone(),
                        quantity,
                    });
                }
                let unit_cost = instance.unit_cost(i, j);
                variable += quantity * unit_cost;
                volume += quantity;
                solution.flows.push(Flow {
                    site: site.id.clone(),
                    customer: customer.id.clone(),
                    quantity,
                    unit_cost,
                });
            }

            if open {
                solution.site_usage.push(SiteUsage {
                    site: site.id.clone(),
                    volume,
                    capacity: site.capacity,
                    utilization: volume / site.capacity,
                });
            }
        }

        let total = fixed + variable;
        if let Some(reported) = raw.objective_value {
            let allowed = tol.objective_tolerance * reported.abs().max(1.0);
            if (total - reported).abs() > allowed {
                error!(computed = total, reported, "Objective mismatch during extraction");
                return Err(ConsistencyError::ObjectiveMismatch {
                    computed: total,
                    reported,
                });
            }
        }

        solution.costs = Some(CostBreakdown {
            fixed,
            variable,
            total,
        });
        Ok(solution)
    }
}
