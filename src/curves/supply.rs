//! Supply ceiling until a normalization month

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupplyConstraint {
    pub constrained: bool,
    /// Maximum deliverable units per month while constrained
    pub capacity: f64,
    /// First month in which supply is unconstrained
    pub normalization_month: u32,
}

impl Default for SupplyConstraint {
    fn default() -> Self {
        Self {
            constrained: false,
            capacity: 200_000.0,
            normalization_month: 0,
        }
    }
}

/// Demand, delivered volume and the unmet remainder for one month
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SupplyOutcome {
    pub demand: f64,
    pub actual: f64,
    pub shortfall: f64,
}

impl SupplyConstraint {
    pub fn is_binding(&self, t: i32) -> bool {
        self.constrained && t < super::month_index(self.normalization_month)
    }

    pub fn apply(&self, t: i32, demand: f64) -> SupplyOutcome {
        let demand = demand.max(0.0);
        let actual = if self.is_binding(t) {
            demand.min(self.capacity.max(0.0))
        } else {
            demand
        };
        SupplyOutcome {
            demand,
            actual,
            shortfall: demand - actual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actual_never_exceeds_demand() {
        let supply = SupplyConstraint {
            constrained: true,
            capacity: 150_000.0,
            normalization_month: 12,
        };
        for t in 0..36 {
            for demand in [0.0, 100_000.0, 150_000.0, 400_000.0] {
                let out = supply.apply(t, demand);
                assert!(out.actual <= out.demand);
                assert_eq!(out.shortfall, out.demand - out.actual);
                if t >= 12 {
                    assert_eq!(out.actual, demand);
                }
            }
        }
        assert_eq!(supply.apply(11, 400_000.0).shortfall, 250_000.0);
    }

    #[test]
    fn test_unconstrained_passes_through() {
        let out = SupplyConstraint::default().apply(0, 1_000_000.0);
        assert_eq!(out.actual, 1_000_000.0);
        assert_eq!(out.shortfall, 0.0);
    }
}
