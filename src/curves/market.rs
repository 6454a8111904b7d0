//! Market size curves

use serde::{Deserialize, Serialize};

/// `base * (1 + annual_rate / 12)^months`, the nominal-monthly compounding
/// used for slowly growing mature markets
pub fn compound_growth(base: f64, annual_rate: f64, months: i32) -> f64 {
    (base * (1.0 + annual_rate / 12.0).max(0.0).powi(months)).max(0.0)
}

/// `base * (1 + annual_rate)^years` with fractional years
///
/// Rates below -100% are treated as -100%.
pub fn annual_compounding(base: f64, annual_rate: f64, years: f64) -> f64 {
    base * (1.0 + annual_rate).max(0.0).powf(years)
}

/// Expanding market with growth that decelerates toward maturity and a hard
/// cap expressed as a multiple of the starting size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketExpansion {
    /// Monthly volume at month 0
    pub start_volume: f64,
    /// Undamped annual growth rate
    pub growth_annual: f64,
    /// Cap as a multiple of `start_volume`
    pub max_growth_factor: f64,
    /// Months until damping is fully applied
    pub maturity_months: u32,
    /// Fraction of growth removed at maturity
    pub damping: f64,
}

impl Default for MarketExpansion {
    fn default() -> Self {
        Self {
            start_volume: 950_000.0,
            growth_annual: 0.25,
            max_growth_factor: 4.0,
            maturity_months: 60,
            damping: 0.5,
        }
    }
}

impl MarketExpansion {
    /// Whole-unit market volume at month `t`
    pub fn volume_at(&self, t: i32) -> f64 {
        let start = self.start_volume.max(0.0);
        let t = t.max(0);
        let monthly_rate = (1.0 + self.growth_annual).max(0.0).powf(1.0 / 12.0) - 1.0;
        let progress = super::ramp::linear_progress(t as f64, self.maturity_months as f64);
        let damped = monthly_rate * (1.0 - self.damping * progress);
        let raw = start * (1.0 + damped).max(0.0).powi(t);
        let cap = start * self.max_growth_factor.max(0.0);
        raw.min(cap).floor().max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_compound_growth() {
        assert_eq!(compound_growth(4_200_000.0, 0.02, 0), 4_200_000.0);
        assert_relative_eq!(
            compound_growth(100.0, 0.12, 12),
            100.0 * 1.01f64.powi(12),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_annual_compounding_is_fractional() {
        assert_relative_eq!(annual_compounding(350.0, -0.03, 0.5), 350.0 * 0.97f64.sqrt());
        assert_eq!(annual_compounding(10.0, -2.0, 1.0), 0.0);
    }

    #[test]
    fn test_expansion_starts_at_start_and_respects_cap() {
        let market = MarketExpansion::default();
        assert_eq!(market.volume_at(0), 950_000.0);

        let fast = MarketExpansion {
            growth_annual: 3.0,
            ..Default::default()
        };
        for t in 0..600 {
            assert!(fast.volume_at(t) <= 950_000.0 * 4.0);
        }
        assert_eq!(fast.volume_at(599), 3_800_000.0);
    }

    #[test]
    fn test_growth_decelerates() {
        let market = MarketExpansion::default();
        let early = market.volume_at(2) / market.volume_at(1);
        let late = market.volume_at(60) / market.volume_at(59);
        assert!(early > late);
        assert!(late > 1.0);
    }
}
