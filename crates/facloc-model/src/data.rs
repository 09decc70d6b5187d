//! Validated input records: sites, customers and unit shipping costs.

use std::collections::HashMap;

use thiserror::Error;

/// Mean earth radius used for great-circle distances, in kilometres
pub const EARTH_RADIUS_KM: f64 = 6378.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate site id: {0}")]
    DuplicateSite(String),
    #[error("Duplicate customer id: {0}")]
    DuplicateCustomer(String),
    #[error("Fixed cost of site {site} must be finite and non-negative, got {value}")]
    InvalidFixedCost { site: String, value: f64 },
    #[error("Capacity of site {site} must be finite and positive, got {value}")]
    InvalidCapacity { site: String, value: f64 },
    #[error("Demand of customer {customer} must be finite and positive, got {value}")]
    InvalidDemand { customer: String, value: f64 },
    #[error("Unit cost from {site} to {customer} must be finite and non-negative, got {value}")]
    InvalidUnitCost {
        site: String,
        customer: String,
        value: f64,
    },
    #[error("Cost entry references unknown site: {0}")]
    UnknownSite(String),
    #[error("Cost entry references unknown customer: {0}")]
    UnknownCustomer(String),
    #[error("Duplicate cost entry for {site} -> {customer}")]
    DuplicateCost { site: String, customer: String },
    #[error("Missing cost entry for {site} -> {customer}")]
    MissingCost { site: String, customer: String },
    #[error("No coordinates for {0}")]
    MissingLocation(String),
    #[error("Invalid coordinates for {id}: ({lat}, {lon})")]
    InvalidLocation { id: String, lat: f64, lon: f64 },
    #[error("Cost per km must be finite and non-negative, got {0}")]
    InvalidCostRate(f64),
}

/// A point on the globe, in decimal degrees
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
}

impl Location {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Great-circle distance in kilometres (spherical law of cosines)
    pub fn haversine_km(&self, other: &Location) -> f64 {
        if self == other {
            return 0.0;
        }
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlon = other.lon.to_radians() - self.lon.to_radians();
        let v = lat1.sin() * lat2.sin() + lat1.cos() * lat2.cos() * dlon.cos();
        // rounding can push the cosine just outside [-1, 1]
        EARTH_RADIUS_KM * v.clamp(-1.0, 1.0).acos()
    }
}

/// A candidate facility
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub id: String,
    pub fixed_cost: f64,
    pub capacity: f64,
    /// Only used for presentation and distance-derived costs
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub location: Option<Location>,
}

impl Site {
    pub fn new(id: impl Into<String>, fixed_cost: f64, capacity: f64) -> Self {
        Self {
            id: id.into(),
            fixed_cost,
            capacity,
            location: None,
        }
    }

    pub fn at(mut self, lat: f64, lon: f64) -> Self {
        self.location = Some(Location::new(lat, lon));
        self
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: String,
    pub demand: f64,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub location: Option<Location>,
}

impl Customer {
    pub fn new(id: impl Into<String>, demand: f64) -> Self {
        Self {
            id: id.into(),
            demand,
            location: None,
        }
    }

    pub fn at(mut self, lat: f64, lon: f64) -> Self {
        self.location = Some(Location::new(lat, lon));
        self
    }
}

/// Unit shipping cost for one site/customer pair
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct CostEntry {
    pub site: String,
    pub customer: String,
    pub unit_cost: f64,
}

impl CostEntry {
    pub fn new(site: impl Into<String>, customer: impl Into<String>, unit_cost: f64) -> Self {
        Self {
            site: site.into(),
            customer: customer.into(),
            unit_cost,
        }
    }
}

/// Dense unit costs, site-major, indexed by validated positions
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    data: Vec<f64>,
    customers: usize,
}

impl CostMatrix {
    /// Cost of shipping one unit from site `site` to customer `customer`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn get(&self, site: usize, customer: usize) -> f64 {
        self.data[site * self.customers + customer]
    }
}

/// Raw, unvalidated input as supplied by a loader or form
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstanceInput {
    pub sites: Vec<Site>,
    pub customers: Vec<Customer>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub costs: Vec<CostEntry>,
    /// Derive unit costs from distance when no explicit costs are given
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub cost_per_km: Option<f64>,
}

impl InstanceInput {
    pub fn into_instance(self) -> Result<Instance, ValidationError> {
        match self.cost_per_km {
            Some(rate) if self.costs.is_empty() => {
                Instance::with_distance_costs(self.sites, self.customers, rate)
            }
            _ => Instance::new(self.sites, self.customers, self.costs),
        }
    }
}

impl From<&Instance> for InstanceInput {
    fn from(instance: &Instance) -> Self {
        let mut costs = Vec::with_capacity(instance.sites.len() * instance.customers.len());
        for (i, site) in instance.sites.iter().enumerate() {
            for (j, customer) in instance.customers.iter().enumerate() {
                costs.push(CostEntry::new(&site.id, &customer.id, instance.costs.get(i, j)));
            }
        }
        Self {
            sites: instance.sites.clone(),
            customers: instance.customers.clone(),
            costs,
            cost_per_km: None,
        }
    }
}

/// A validated problem instance; immutable once built
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    sites: Vec<Site>,
    customers: Vec<Customer>,
    costs: CostMatrix,
    site_index: HashMap<String, usize>,
    customer_index: HashMap<String, usize>,
}

impl Instance {
    /// Validate records and an explicit cost list.
    ///
    /// Every site/customer pair needs exactly one cost entry, and every entry
    /// must name a known site and customer.
    pub fn new(
        sites: Vec<Site>,
        customers: Vec<Customer>,
        costs: Vec<CostEntry>,
    ) -> Result<Self, ValidationError> {
        let (site_index, customer_index) = index_records(&sites, &customers)?;

        let n_customers = customers.len();
        let mut data: Vec<Option<f64>> = vec![None; sites.len() * n_customers];
        for entry in costs {
            let i = *site_index
                .get(&entry.site)
                .ok_or_else(|| ValidationError::UnknownSite(entry.site.clone()))?;
            let j = *customer_index
                .get(&entry.customer)
                .ok_or_else(|| ValidationError::UnknownCustomer(entry.customer.clone()))?;
            if !entry.unit_cost.is_finite() || entry.unit_cost < 0.0 {
                return Err(ValidationError::InvalidUnitCost {
                    site: entry.site,
                    customer: entry.customer,
                    value: entry.unit_cost,
                });
            }
            let slot = &mut data[i * n_customers + j];
            if slot.is_some() {
                return Err(ValidationError::DuplicateCost {
                    site: entry.site,
                    customer: entry.customer,
                });
            }
            *slot = Some(entry.unit_cost);
        }

        let mut dense = Vec::with_capacity(data.len());
        for (k, cost) in data.into_iter().enumerate() {
            match cost {
                Some(c) => dense.push(c),
                None => {
                    return Err(ValidationError::MissingCost {
                        site: sites[k / n_customers].id.clone(),
                        customer: customers[k % n_customers].id.clone(),
                    });
                }
            }
        }

        Ok(Self {
            sites,
            customers,
            costs: CostMatrix {
                data: dense,
                customers: n_customers,
            },
            site_index,
            customer_index,
        })
    }

    /// Validate records and derive every unit cost as `cost_per_km` times the
    /// great-circle distance between site and customer.
    pub fn with_distance_costs(
        sites: Vec<Site>,
        customers: Vec<Customer>,
        cost_per_km: f64,
    ) -> Result<Self, ValidationError> {
        if !cost_per_km.is_finite() || cost_per_km < 0.0 {
            return Err(ValidationError::InvalidCostRate(cost_per_km));
        }
        let site_locs = sites
            .iter()
            .map(|s| s.location.ok_or_else(|| ValidationError::MissingLocation(s.id.clone())))
            .collect::<Result<Vec<_>, _>>()?;
        let customer_locs = customers
            .iter()
            .map(|c| c.location.ok_or_else(|| ValidationError::MissingLocation(c.id.clone())))
            .collect::<Result<Vec<_>, _>>()?;

        let mut costs = Vec::with_capacity(sites.len() * customers.len());
        for (site, from) in sites.iter().zip(&site_locs) {
            for (customer, to) in customers.iter().zip(&customer_locs) {
                costs.push(CostEntry::new(
                    &site.id,
                    &customer.id,
                    cost_per_km * from.haversine_km(to),
                ));
            }
        }
        Self::new(sites, customers, costs)
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn costs(&self) -> &CostMatrix {
        &self.costs
    }

    pub fn unit_cost(&self, site: usize, customer: usize) -> f64 {
        self.costs.get(site, customer)
    }

    pub fn site_index(&self, id: &str) -> Option<usize> {
        self.site_index.get(id).copied()
    }

    pub fn customer_index(&self, id: &str) -> Option<usize> {
        self.customer_index.get(id).copied()
    }

    pub fn total_capacity(&self) -> f64 {
        self.sites.iter().map(|s| s.capacity).sum()
    }

    pub fn total_demand(&self) -> f64 {
        self.customers.iter().map(|c| c.demand).sum()
    }
}

fn index_records(
    sites: &[Site],
    customers: &[Customer],
) -> Result<(HashMap<String, usize>, HashMap<String, usize>), ValidationError> {
    let mut site_index = HashMap::with_capacity(sites.len());
    for (i, site) in sites.iter().enumerate() {
        if site_index.insert(site.id.clone(), i).is_some() {
            return Err(ValidationError::DuplicateSite(site.id.clone()));
        }
        if !site.fixed_cost.is_finite() || site.fixed_cost < 0.0 {
            return Err(ValidationError::InvalidFixedCost {
                site: site.id.clone(),
                value: site.fixed_cost,
            });
        }
        if !site.capacity.is_finite() || site.capacity <= 0.0 {
            return Err(ValidationError::InvalidCapacity {
                site: site.id.clone(),
                value: site.capacity,
            });
        }
        check_location(&site.id, site.location)?;
    }

    let mut customer_index = HashMap::with_capacity(customers.len());
    for (j, customer) in customers.iter().enumerate() {
        if customer_index.insert(customer.id.clone(), j).is_some() {
            return Err(ValidationError::DuplicateCustomer(customer.id.clone()));
        }
        if !customer.demand.is_finite() || customer.demand <= 0.0 {
            return Err(ValidationError::InvalidDemand {
                customer: customer.id.clone(),
                value: customer.demand,
            });
        }
        check_location(&customer.id, customer.location)?;
    }

    Ok((site_index, customer_index))
}

fn check_location(id: &str, location: Option<Location>) -> Result<(), ValidationError> {
    match location {
        Some(loc) if !loc.is_valid() => Err(ValidationError::InvalidLocation {
            id: id.to_string(),
            lat: loc.lat,
            lon: loc.lon,
        }),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two() -> (Vec<Site>, Vec<Customer>, Vec<CostEntry>) {
        let sites = vec![Site::new("a", 100.0, 50.0), Site::new("b", 80.0, 40.0)];
        let customers = vec![Customer::new("x", 30.0), Customer::new("y", 20.0)];
        let costs = vec![
            CostEntry::new("a", "x", 1.0),
            CostEntry::new("a", "y", 2.0),
            CostEntry::new("b", "x", 3.0),
            CostEntry::new("b", "y", 4.0),
        ];
        (sites, customers, costs)
    }

    #[test]
    fn test_valid_instance() {
        let (sites, customers, costs) = two_by_two();
        let instance = Instance::new(sites, customers, costs).unwrap();

        assert_eq!(instance.sites().len(), 2);
        assert_eq!(instance.customers().len(), 2);
        assert_eq!(instance.unit_cost(1, 0), 3.0);
        assert_eq!(instance.site_index("b"), Some(1));
        assert_eq!(instance.customer_index("y"), Some(1));
        assert_eq!(instance.customer_index("z"), None);
        assert_eq!(instance.total_capacity(), 90.0);
        assert_eq!(instance.total_demand(), 50.0);
    }

    #[test]
    fn test_cost_order_does_not_matter() {
        let (sites, customers, mut costs) = two_by_two();
        costs.reverse();
        let instance = Instance::new(sites, customers, costs).unwrap();
        assert_eq!(instance.unit_cost(0, 1), 2.0);
    }

    #[test]
    fn test_missing_cost_entry() {
        let (sites, customers, mut costs) = two_by_two();
        costs.remove(2);
        let err = Instance::new(sites, customers, costs).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingCost {
                site: "b".to_string(),
                customer: "x".to_string()
            }
        );
    }

    #[test]
    fn test_duplicate_ids() {
        let (mut sites, customers, costs) = two_by_two();
        sites.push(Site::new("a", 1.0, 1.0));
        assert_eq!(
            Instance::new(sites, customers, costs).unwrap_err(),
            ValidationError::DuplicateSite("a".to_string())
        );

        let (sites, mut customers, costs) = two_by_two();
        customers.push(Customer::new("x", 1.0));
        assert_eq!(
            Instance::new(sites, customers, costs).unwrap_err(),
            ValidationError::DuplicateCustomer("x".to_string())
        );
    }

    #[test]
    fn test_unknown_references() {
        let (sites, customers, mut costs) = two_by_two();
        costs.push(CostEntry::new("ghost", "x", 1.0));
        assert_eq!(
            Instance::new(sites, customers, costs).unwrap_err(),
            ValidationError::UnknownSite("ghost".to_string())
        );

        let (sites, customers, mut costs) = two_by_two();
        costs.push(CostEntry::new("a", "ghost", 1.0));
        assert_eq!(
            Instance::new(sites, customers, costs).unwrap_err(),
            ValidationError::UnknownCustomer("ghost".to_string())
        );
    }

    #[test]
    fn test_duplicate_cost_entry() {
        let (sites, customers, mut costs) = two_by_two();
        costs.push(CostEntry::new("a", "x", 9.0));
        assert!(matches!(
            Instance::new(sites, customers, costs),
            Err(ValidationError::DuplicateCost { .. })
        ));
    }

    #[test]
    fn test_numeric_invariants() {
        let (mut sites, customers, costs) = two_by_two();
        sites[0].fixed_cost = -1.0;
        assert!(matches!(
            Instance::new(sites, customers, costs),
            Err(ValidationError::InvalidFixedCost { .. })
        ));

        let (mut sites, customers, costs) = two_by_two();
        sites[1].capacity = 0.0;
        assert!(matches!(
            Instance::new(sites, customers, costs),
            Err(ValidationError::InvalidCapacity { .. })
        ));

        let (sites, mut customers, costs) = two_by_two();
        customers[0].demand = f64::NAN;
        assert!(matches!(
            Instance::new(sites, customers, costs),
            Err(ValidationError::InvalidDemand { .. })
        ));

        let (sites, customers, mut costs) = two_by_two();
        costs[3].unit_cost = -0.5;
        assert!(matches!(
            Instance::new(sites, customers, costs),
            Err(ValidationError::InvalidUnitCost { .. })
        ));
    }

    #[test]
    fn test_zero_fixed_cost_and_unit_cost_are_allowed() {
        let sites = vec![Site::new("a", 0.0, 10.0)];
        let customers = vec![Customer::new("x", 5.0)];
        let costs = vec![CostEntry::new("a", "x", 0.0)];
        assert!(Instance::new(sites, customers, costs).is_ok());
    }

    #[test]
    fn test_empty_collections_validate() {
        let instance = Instance::new(vec![], vec![], vec![]).unwrap();
        assert_eq!(instance.total_capacity(), 0.0);
    }

    #[test]
    fn test_haversine() {
        let a = Location::new(40.7128, -74.0060);
        assert_eq!(a.haversine_km(&a), 0.0);

        // one degree of latitude along a meridian
        let b = Location::new(41.7128, -74.0060);
        let expected = EARTH_RADIUS_KM * 1f64.to_radians();
        assert!((a.haversine_km(&b) - expected).abs() < 1e-6);
        assert!((a.haversine_km(&b) - b.haversine_km(&a)).abs() < 1e-9);
    }

    #[test]
    fn test_distance_costs() {
        let sites = vec![Site::new("a", 10.0, 10.0).at(0.0, 0.0)];
        let customers = vec![
            Customer::new("x", 1.0).at(0.0, 0.0),
            Customer::new("y", 1.0).at(1.0, 0.0),
        ];
        let instance = Instance::with_distance_costs(sites, customers, 2.0).unwrap();
        assert_eq!(instance.unit_cost(0, 0), 0.0);
        let expected = 2.0 * EARTH_RADIUS_KM * 1f64.to_radians();
        assert!((instance.unit_cost(0, 1) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_distance_costs_need_locations() {
        let sites = vec![Site::new("a", 10.0, 10.0)];
        let customers = vec![Customer::new("x", 1.0).at(0.0, 0.0)];
        assert_eq!(
            Instance::with_distance_costs(sites, customers, 1.0).unwrap_err(),
            ValidationError::MissingLocation("a".to_string())
        );
    }

    #[test]
    fn test_invalid_location() {
        let sites = vec![Site::new("a", 10.0, 10.0).at(95.0, 0.0)];
        let customers = vec![Customer::new("x", 1.0)];
        let costs = vec![CostEntry::new("a", "x", 1.0)];
        assert!(matches!(
            Instance::new(sites, customers, costs),
            Err(ValidationError::InvalidLocation { .. })
        ));
    }

    #[test]
    fn test_input_round_trip() {
        let (sites, customers, costs) = two_by_two();
        let instance = Instance::new(sites, customers, costs).unwrap();
        let input = InstanceInput::from(&instance);
        assert_eq!(input.costs.len(), 4);
        assert_eq!(input.into_instance().unwrap(), instance);
    }

    #[test]
    fn test_input_prefers_explicit_costs() {
        let (sites, customers, costs) = two_by_two();
        let input = InstanceInput {
            sites,
            customers,
            costs,
            cost_per_km: Some(1.0),
        };
        // no locations, so the distance path would fail
        assert!(input.into_instance().is_ok());
    }
}
