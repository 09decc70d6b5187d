//! Random instances for demos and benchmarks.

use rand::Rng;

use crate::data::{Customer, Instance, Site, ValidationError};

const KM_PER_MILE: f64 = 1.609344;

/// Continental US bounding box (lat, lon)
const LAT_RANGE: (f64, f64) = (25.0, 49.0);
const LON_RANGE: (f64, f64) = (-124.0, -67.0);

/// Convert a per-unit-mile shipping rate into a per-unit-km rate
pub fn miles_to_km_rate(per_mile: f64) -> f64 {
    per_mile / KM_PER_MILE
}

/// Parameters for random instances. Integer ranges are half-open `[low, high)`;
/// a range with `low == high` always yields `low`.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceGenerator {
    pub customers: usize,
    pub demand_range: (u64, u64),
    pub sites: usize,
    pub capacity_range: (u64, u64),
    pub fixed_cost_range: (u64, u64),
    pub cost_per_km: f64,
}

impl Default for InstanceGenerator {
    fn default() -> Self {
        Self {
            customers: 50,
            demand_range: (20, 80),
            sites: 5,
            capacity_range: (1000, 4000),
            fixed_cost_range: (4_000_000, 6_000_000),
            cost_per_km: miles_to_km_rate(0.1),
        }
    }
}

impl InstanceGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_customers(mut self, n: usize, demand_range: (u64, u64)) -> Self {
        self.customers = n;
        self.demand_range = demand_range;
        self
    }

    pub fn with_sites(mut self, n: usize, capacity_range: (u64, u64), fixed_cost_range: (u64, u64)) -> Self {
        self.sites = n;
        self.capacity_range = capacity_range;
        self.fixed_cost_range = fixed_cost_range;
        self
    }

    pub fn with_cost_per_km(mut self, rate: f64) -> Self {
        self.cost_per_km = rate;
        self
    }

    pub fn generate<R: Rng>(&self, rng: &mut R) -> Result<Instance, ValidationError> {
        let customers: Vec<Customer> = (0..self.customers)
            .map(|j| {
                let (lat, lon) = random_location(rng);
                Customer::new(format!("C{}", j), draw(rng, self.demand_range) as f64).at(lat, lon)
            })
            .collect();

        let sites: Vec<Site> = (0..self.sites)
            .map(|i| {
                let (lat, lon) = random_location(rng);
                Site::new(
                    format!("S{}", i),
                    draw(rng, self.fixed_cost_range) as f64,
                    draw(rng, self.capacity_range) as f64,
                )
                .at(lat, lon)
            })
            .collect();

        Instance::with_distance_costs(sites, customers, self.cost_per_km)
    }
}

fn draw<R: Rng>(rng: &mut R, (low, high): (u64, u64)) -> u64 {
    if high <= low {
        low
    } else {
        rng.random_range(low..high)
    }
}

fn random_location<R: Rng>(rng: &mut R) -> (f64, f64) {
    (
        rng.random_range(LAT_RANGE.0..LAT_RANGE.1),
        rng.random_range(LON_RANGE.0..LON_RANGE.1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_defaults() {
        let generator = InstanceGenerator::new();
        assert_eq!(generator.customers, 50);
        assert_eq!(generator.sites, 5);
        assert!((generator.cost_per_km - 0.1 / 1.609344).abs() < 1e-12);
    }

    #[test]
    fn test_generate_within_ranges() {
        let generator = InstanceGenerator::new()
            .with_customers(12, (20, 80))
            .with_sites(4, (1000, 4000), (10, 20));
        let mut rng = StdRng::seed_from_u64(7);
        let instance = generator.generate(&mut rng).unwrap();

        assert_eq!(instance.customers().len(), 12);
        assert_eq!(instance.sites().len(), 4);
        for c in instance.customers() {
            assert!((20.0..80.0).contains(&c.demand));
            assert!(c.location.is_some());
        }
        for s in instance.sites() {
            assert!((1000.0..4000.0).contains(&s.capacity));
            assert!((10.0..20.0).contains(&s.fixed_cost));
        }
        assert_eq!(instance.sites()[3].id, "S3");
        assert_eq!(instance.customer_index("C11"), Some(11));
    }

    #[test]
    fn test_degenerate_range_is_constant() {
        let generator = InstanceGenerator::new()
            .with_customers(3, (5, 5))
            .with_sites(2, (100, 200), (7, 7));
        let mut rng = StdRng::seed_from_u64(1);
        let instance = generator.generate(&mut rng).unwrap();

        assert!(instance.sites().iter().all(|s| s.fixed_cost == 7.0));
        assert!(instance.customers().iter().all(|c| c.demand == 5.0));
    }

    #[test]
    fn test_seeded_generation_is_deterministic() {
        let generator = InstanceGenerator::new().with_customers(8, (1, 10));
        let a = generator.generate(&mut StdRng::seed_from_u64(42)).unwrap();
        let b = generator.generate(&mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_negative_rate_is_rejected() {
        let generator = InstanceGenerator::new().with_cost_per_km(-1.0);
        let err = generator.generate(&mut StdRng::seed_from_u64(3)).unwrap_err();
        assert_eq!(err, ValidationError::InvalidCostRate(-1.0));
    }
}
