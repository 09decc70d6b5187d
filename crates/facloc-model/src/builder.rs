use facloc_solver::{ConstraintOp, MipProblem, VarDomain, VarId};
use thiserror::Error;
use tracing::debug;

use crate::data::Instance;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelBuildError {
    #[error("Instance has no sites")]
    NoSites,
    #[error("Instance has no customers")]
    NoCustomers,
    #[error("Total capacity ({total_capacity:.2}) is less than total demand ({total_demand:.2})")]
    InfeasibleByCapacity { total_capacity: f64, total_demand: f64 },
}

/// What to do when total capacity cannot cover total demand
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapacityPolicy {
    /// Build the program anyway and let the solver report infeasibility
    #[default]
    DeferToSolver,
    /// Refuse to build with [`ModelBuildError::InfeasibleByCapacity`]
    FastFail,
}

/// A built program plus the map from domain positions to its columns
#[derive(Debug, Clone)]
pub struct FacilityModel {
    pub problem: MipProblem,
    open: Vec<VarId>,
    /// site-major: flow[site * customers + customer]
    flow: Vec<VarId>,
    customers: usize,
}

impl FacilityModel {
    /// Column of the binary "site is open" indicator
    pub fn open_var(&self, site: usize) -> VarId {
        self.open[site]
    }

    /// Column of the continuous flow from `site` to `customer`
    pub fn flow_var(&self, site: usize, customer: usize) -> VarId {
        self.flow[site * self.customers + customer]
    }

    pub fn num_sites(&self) -> usize {
        self.open.len()
    }

    pub fn num_customers(&self) -> usize {
        self.customers
    }
}

/// Translates a validated instance into the capacitated facility location MIP:
///
/// ```text
/// min  Σ_i fixed[i]·open[i] + Σ_i Σ_j cost[i,j]·flow[i,j]
/// s.t. Σ_i flow[i,j] = demand[j]                  for every customer j
///      Σ_j flow[i,j] - capacity[i]·open[i] <= 0   for every site i
///      open[i] ∈ {0,1}, flow[i,j] >= 0
/// ```
///
/// The capacity row doubles as the linking constraint: a closed site has a
/// right-hand side of zero, so it cannot ship anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelBuilder {
    capacity_policy: CapacityPolicy,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity_policy(mut self, policy: CapacityPolicy) -> Self {
        self.capacity_policy = policy;
        self
    }

    pub fn capacity_policy(&self) -> CapacityPolicy {
        self.capacity_policy
    }

    /// Build a fresh program for `instance`
    pub fn build(&self, instance: &Instance) -> Result<FacilityModel, ModelBuildError> {
        let sites = instance.sites();
        let customers = instance.customers();
        if sites.is_empty() {
            return Err(ModelBuildError::NoSites);
        }
        if customers.is_empty() {
            return Err(ModelBuildError::NoCustomers);
        }

        let total_capacity = instance.total_capacity();
        let total_demand = instance.total_demand();
        if total_capacity < total_demand {
            if self.capacity_policy == CapacityPolicy::FastFail {
                return Err(ModelBuildError::InfeasibleByCapacity {
                    total_capacity,
                    total_demand,
                });
            }
            debug!(
                total_capacity,
                total_demand, "Capacity short of demand; deferring to solver"
            );
        }

        let n_sites = sites.len();
        let n_customers = customers.len();
        let mut problem =
            MipProblem::with_capacity(n_sites * (n_customers + 1), n_sites + n_customers);

        // Variables: open[i] for each site, then flow[i][j]
        let open: Vec<VarId> = sites
            .iter()
            .map(|s| problem.add_variable(format!("open[{}]", s.id), VarDomain::Binary, s.fixed_cost))
            .collect();

        let mut flow = Vec::with_capacity(n_sites * n_customers);
        for (i, site) in sites.iter().enumerate() {
            for (j, customer) in customers.iter().enumerate() {
                flow.push(problem.add_variable(
                    format!("flow[{},{}]", site.id, customer.id),
                    VarDomain::non_negative(),
                    instance.unit_cost(i, j),
                ));
            }
        }

        // Demand satisfaction: every customer receives exactly its demand
        for (j, customer) in customers.iter().enumerate() {
            let terms: Vec<(VarId, f64)> = (0..n_sites)
                .map(|i| (flow[i * n_customers + j], 1.0))
                .collect();
            problem.add_constraint(
                format!("demand[{}]", customer.id),
                terms,
                ConstraintOp::Eq,
                customer.demand,
            );
        }

        // Capacity and linking: Σ_j flow[i][j] - capacity[i]·open[i] <= 0
        for (i, site) in sites.iter().enumerate() {
            let mut terms: Vec<(VarId, f64)> = flow[i * n_customers..(i + 1) * n_customers]
                .iter()
                .map(|&v| (v, 1.0))
                .collect();
            terms.push((open[i], -site.capacity));
            problem.add_constraint(format!("capacity[{}]", site.id), terms, ConstraintOp::Le, 0.0);
        }

        debug!(
            sites = n_sites,
            customers = n_customers,
            variables = problem.num_variables(),
            constraints = problem.num_constraints(),
            "Built facility location program"
        );

        Ok(FacilityModel {
            problem,
            open,
            flow,
            customers: n_customers,
        })
    }
}
