//! Regulated price lifecycle
//!
//! A product launches at a free price, keeps it until the benefit
//! assessment, takes a one-time negotiated cut and then erodes (or inflates)
//! by a compounding annual rate.

use serde::{Deserialize, Serialize};

use super::market::annual_compounding;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceLifecycle {
    /// Model month of launch
    pub launch_month: i32,
    /// Price during the free-pricing phase
    pub free_price: f64,
    /// Model month of the assessment; the free price still applies in it
    pub assessment_month: i32,
    /// One-time cut applied after the assessment month
    pub price_cut_pct: f64,
    /// Signed annual change after the assessment (negative erodes)
    pub annual_erosion_pct: f64,
}

impl PriceLifecycle {
    /// Price in model month `month`; zero before launch
    pub fn price_at(&self, month: i32) -> f64 {
        let t = month - self.launch_month;
        if t < 0 {
            return 0.0;
        }
        let assessment_t = self.assessment_month - self.launch_month;
        if t <= assessment_t {
            return self.free_price.max(0.0);
        }
        let years_post = (t - assessment_t) as f64 / 12.0;
        let negotiated = self.free_price * (1.0 - self.price_cut_pct.clamp(0.0, 1.0));
        annual_compounding(negotiated, self.annual_erosion_pct, years_post).max(0.0)
    }

    /// Whether the negotiated price is in effect
    pub fn is_post_assessment(&self, month: i32) -> bool {
        month > self.assessment_month && month >= self.launch_month
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn lifecycle() -> PriceLifecycle {
        PriceLifecycle {
            launch_month: 18,
            free_price: 45.0,
            assessment_month: 24,
            price_cut_pct: 0.25,
            annual_erosion_pct: -0.03,
        }
    }

    #[test]
    fn test_zero_before_launch() {
        assert_eq!(lifecycle().price_at(17), 0.0);
        assert_eq!(lifecycle().price_at(-5), 0.0);
    }

    #[test]
    fn test_free_price_through_assessment_month() {
        let p = lifecycle();
        assert_eq!(p.price_at(18), 45.0);
        assert_eq!(p.price_at(24), 45.0);
        assert!(!p.is_post_assessment(24));
    }

    #[test]
    fn test_cut_then_erosion() {
        let p = lifecycle();
        assert_relative_eq!(p.price_at(25), 33.75 * 0.97f64.powf(1.0 / 12.0), epsilon = 1e-9);
        assert_relative_eq!(p.price_at(36), 33.75 * 0.97, epsilon = 1e-9);
        assert!(p.is_post_assessment(25));
    }

    #[test]
    fn test_assessment_before_launch_cuts_immediately_after_launch_month() {
        let p = PriceLifecycle {
            assessment_month: 10,
            ..lifecycle()
        };
        // assessment already passed at launch
        assert_relative_eq!(p.price_at(18), 33.75 * 0.97f64.powf(8.0 / 12.0), epsilon = 1e-9);
    }
}
