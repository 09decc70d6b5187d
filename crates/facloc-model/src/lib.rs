pub mod builder;
pub mod data;
pub mod extract;
pub mod generate;
pub mod planner;

pub use builder::{CapacityPolicy, FacilityModel, ModelBuildError, ModelBuilder};
pub use data::{CostEntry, CostMatrix, Customer, Instance, InstanceInput, Location, Site, ValidationError};
pub use extract::{
    ConsistencyError, CostBreakdown, Extractor, FLOW_EPSILON, Flow, OBJECTIVE_TOLERANCE, OPEN_THRESHOLD,
    SiteUsage, Solution, Tolerances,
};
pub use generate::{InstanceGenerator, miles_to_km_rate};
pub use planner::{FacilityError, Planner};

pub use facloc_solver::{Engine, SolveStatus, SolverConfig};
