//! Curve primitives shared by every scenario
//!
//! All functions are pure in `(t, parameters)`. Zero-length ramps and
//! durations degenerate to the terminal value instead of dividing by zero.

mod erosion;
mod logistic;
mod market;
mod price;
mod ramp;
mod supply;
mod tender;

pub use erosion::{
    decay_toward, disruption_decay, exponential_erosion, retention_decay, RESIDUAL_GAP_AT_FLOOR,
};
pub use logistic::{logistic_adoption, share_shift, SCurve};
pub use market::{annual_compounding, compound_growth, MarketExpansion};
pub use price::PriceLifecycle;
pub use ramp::{linear_progress, linear_ramp, SubstitutionRamp};
pub use supply::{SupplyConstraint, SupplyOutcome};
pub use tender::{tender_expected_value, PriorityTier, TenderBoost, TenderProgram, TenderTarget};

/// Month count as a signed month index, saturating at `i32::MAX`
pub fn month_index(months: u32) -> i32 {
    i32::try_from(months).unwrap_or(i32::MAX)
}

/// Clamp a share-like value into [0, 1]
pub fn clamp_share(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

/// `numerator / denominator`, or 0 when the denominator is not positive
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}
