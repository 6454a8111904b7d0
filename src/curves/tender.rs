//! Payer tender (discount contract) expected value
//!
//! Each sickness fund tenders its volume separately. Winning a tender makes
//! the product the exclusive substitute for that fund's insured, so the
//! expected incremental share is `sum(payer_share * win_probability)` and
//! the resulting volume effect is amplified by an exclusivity multiplier.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ramp::linear_progress;
use crate::error::ForecastError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityTier {
    Target,
    Optional,
    /// Joins only after the secondary delay has elapsed
    Secondary,
}

impl fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PriorityTier::Target => "target",
            PriorityTier::Optional => "optional",
            PriorityTier::Secondary => "secondary",
        };
        f.write_str(s)
    }
}

impl FromStr for PriorityTier {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "target" => Ok(PriorityTier::Target),
            "optional" => Ok(PriorityTier::Optional),
            "secondary" => Ok(PriorityTier::Secondary),
            _ => Err(ForecastError::UnknownTier(s.to_string())),
        }
    }
}

/// One payer competing for a tender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenderTarget {
    pub name: String,
    /// Insured lives in millions (reporting only)
    pub covered_lives_mio: f64,
    /// Payer's share of the statutory market
    pub payer_share: f64,
    pub win_probability: f64,
    pub tier: PriorityTier,
}

impl TenderTarget {
    pub fn new(
        name: &str,
        covered_lives_mio: f64,
        payer_share: f64,
        win_probability: f64,
        tier: PriorityTier,
    ) -> Self {
        Self {
            name: name.to_string(),
            covered_lives_mio,
            payer_share,
            win_probability,
            tier,
        }
    }

    pub fn expected_share(&self) -> f64 {
        self.payer_share.clamp(0.0, 1.0) * self.win_probability.clamp(0.0, 1.0)
    }

    /// The ten largest statutory funds
    pub fn default_panel() -> Vec<TenderTarget> {
        use PriorityTier::*;
        vec![
            TenderTarget::new("TK", 11.5, 0.158, 0.50, Target),
            TenderTarget::new("BARMER", 8.7, 0.119, 0.40, Target),
            TenderTarget::new("DAK", 5.5, 0.075, 0.45, Target),
            TenderTarget::new("AOK Bayern", 4.6, 0.063, 0.30, Optional),
            TenderTarget::new("AOK BaWü", 4.5, 0.062, 0.30, Optional),
            TenderTarget::new("AOK Nordwest", 3.0, 0.041, 0.35, Optional),
            TenderTarget::new("AOK Rhld/Hbg", 2.9, 0.040, 0.35, Optional),
            TenderTarget::new("IKK classic", 3.0, 0.041, 0.25, Secondary),
            TenderTarget::new("KKH", 1.5, 0.021, 0.20, Secondary),
            TenderTarget::new("hkk", 0.9, 0.012, 0.20, Secondary),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TenderProgram {
    pub enabled: bool,
    /// Months after launch until the first tender can be won
    pub start_month: u32,
    /// Months from first tender to full contract volume
    pub ramp_months: u32,
    /// Extra months before secondary-tier payers join
    pub secondary_delay_months: u32,
    /// Volume amplification of an exclusive contract
    pub exclusivity_multiplier: f64,
    pub targets: Vec<TenderTarget>,
}

impl Default for TenderProgram {
    fn default() -> Self {
        Self {
            enabled: true,
            start_month: 3,
            ramp_months: 6,
            secondary_delay_months: 12,
            exclusivity_multiplier: 2.5,
            targets: TenderTarget::default_panel(),
        }
    }
}

/// Tender effect for one month
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TenderBoost {
    /// Volume multiplier, always >= 1
    pub factor: f64,
    /// Ramped expected share won through tenders
    pub expected_share: f64,
    pub active_targets: usize,
    pub active: bool,
}

impl TenderBoost {
    pub const NONE: TenderBoost = TenderBoost {
        factor: 1.0,
        expected_share: 0.0,
        active_targets: 0,
        active: false,
    };
}

/// Expected tender boost `t` months after launch
///
/// The sum over targets is order independent.
pub fn tender_expected_value(t: i32, program: &TenderProgram) -> TenderBoost {
    let start = super::month_index(program.start_month);
    if !program.enabled || t < start {
        return TenderBoost::NONE;
    }
    let months_active = t - start;
    let ramp = linear_progress(months_active as f64, program.ramp_months as f64);
    let secondary_open = months_active >= super::month_index(program.secondary_delay_months);

    let (total, count) = program
        .targets
        .iter()
        .filter(|target| secondary_open || target.tier != PriorityTier::Secondary)
        .fold((0.0, 0usize), |(sum, n), target| {
            (sum + target.expected_share(), n + 1)
        });

    let expected_share = total * ramp;
    TenderBoost {
        factor: (1.0 + expected_share * program.exclusivity_multiplier).max(1.0),
        expected_share,
        active_targets: count,
        active: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn primary_sum() -> f64 {
        0.158 * 0.50 + 0.119 * 0.40 + 0.075 * 0.45 + 0.063 * 0.30 + 0.062 * 0.30
            + 0.041 * 0.35
            + 0.040 * 0.35
    }

    #[test]
    fn test_inactive_before_start() {
        let program = TenderProgram::default();
        assert_eq!(tender_expected_value(2, &program), TenderBoost::NONE);
        assert_eq!(tender_expected_value(3, &program).factor, 1.0);
        assert!(tender_expected_value(3, &program).active);
    }

    #[test]
    fn test_ramp_and_secondary_delay() {
        let program = TenderProgram::default();
        let half = tender_expected_value(6, &program);
        assert_abs_diff_eq!(half.expected_share, primary_sum() * 0.5, epsilon = 1e-12);
        assert_eq!(half.active_targets, 7);

        let before_secondary = tender_expected_value(14, &program);
        assert_eq!(before_secondary.active_targets, 7);
        assert_abs_diff_eq!(before_secondary.factor, 1.0 + primary_sum() * 2.5, epsilon = 1e-12);

        let all = tender_expected_value(15, &program);
        assert_eq!(all.active_targets, 10);
        let full = primary_sum() + 0.041 * 0.25 + 0.021 * 0.20 + 0.012 * 0.20;
        assert_abs_diff_eq!(all.factor, 1.0 + full * 2.5, epsilon = 1e-12);
    }

    #[test]
    fn test_order_does_not_matter() {
        let program = TenderProgram::default();
        let mut reversed = program.clone();
        reversed.targets.reverse();
        for t in 0..40 {
            assert_abs_diff_eq!(
                tender_expected_value(t, &program).factor,
                tender_expected_value(t, &reversed).factor,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_zero_ramp_is_immediately_full() {
        let program = TenderProgram {
            ramp_months: 0,
            ..Default::default()
        };
        assert_abs_diff_eq!(
            tender_expected_value(3, &program).expected_share,
            primary_sum(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_tier_parsing() {
        assert_eq!("Secondary".parse::<PriorityTier>().unwrap(), PriorityTier::Secondary);
        assert!(matches!(
            "nachrangig".parse::<PriorityTier>(),
            Err(ForecastError::UnknownTier(_))
        ));
    }
}
