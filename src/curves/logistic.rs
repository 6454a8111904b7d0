//! Logistic (S-curve) adoption
//!
//! Every adoption-style quantity in the engine (generic uptake, brand share
//! shift, OTC volume, awareness, specialty adoption, competitor migration)
//! is a logistic curve parameterised by a ramp length. The ramp length is
//! turned into a midpoint and a steepness by an [`SCurve`] shape; the shape
//! constants differ per use and are named below.

/// Raw logistic value `peak / (1 + exp(-steepness * (t - midpoint)))`
///
/// Negative peaks are treated as zero, so the result always lies in
/// `[0, peak]`.
pub fn logistic_adoption(t: f64, peak: f64, midpoint: f64, steepness: f64) -> f64 {
    let peak = peak.max(0.0);
    let value = peak / (1.0 + (-steepness * (t - midpoint)).exp());
    value.clamp(0.0, peak)
}

/// Shape of an S-curve relative to its ramp length
///
/// `midpoint = ramp_months * midpoint_fraction` and
/// `steepness = steepness_k / ramp_months`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SCurve {
    pub midpoint_fraction: f64,
    pub steepness_k: f64,
}

impl SCurve {
    /// Generic-segment penetration after LOE
    pub const GENERIC_SEGMENT: SCurve = SCurve::new(0.5, 4.8);

    /// Organic uptake of a single generic entrant
    pub const GENERIC_ORGANIC: SCurve = SCurve::new(0.5, 6.0);

    /// OTC volume ramp; bends before the half-way point
    pub const OTC_VOLUME: SCurve = SCurve::new(0.45, 6.0);

    /// Consumer awareness build-up
    pub const AWARENESS: SCurve = SCurve::new(0.5, 6.0);

    /// Specialist adoption of a newly launched product
    pub const SPECIALTY_ADOPTION: SCurve = SCurve::new(0.45, 6.0);

    /// Patients migrating from a competitor molecule
    pub const MIGRATION: SCurve = SCurve::new(0.5, 6.0);

    pub const fn new(midpoint_fraction: f64, steepness_k: f64) -> Self {
        Self {
            midpoint_fraction,
            steepness_k,
        }
    }

    /// Brand share shift, `k = 4 * speed`
    pub fn share_shift(speed: f64) -> Self {
        Self::new(0.5, 4.0 * speed)
    }

    /// Value at month `t` for a curve rising to `peak` over `ramp_months`
    ///
    /// A zero ramp completes instantly and returns `peak`.
    pub fn at(&self, t: f64, peak: f64, ramp_months: u32) -> f64 {
        if ramp_months == 0 {
            return peak.max(0.0);
        }
        let ramp = ramp_months as f64;
        logistic_adoption(
            t,
            peak,
            ramp * self.midpoint_fraction,
            self.steepness_k / ramp,
        )
    }

    /// Fraction of the way from 0 to 1 at month `t`
    pub fn progress(&self, t: f64, ramp_months: u32) -> f64 {
        self.at(t, 1.0, ramp_months)
    }
}

/// S-curve interpolation from `current` to `target` share, clamped to [0, 1]
pub fn share_shift(t: f64, current: f64, target: f64, months_to_peak: u32, speed: f64) -> f64 {
    if months_to_peak == 0 {
        return target.clamp(0.0, 1.0);
    }
    let sigmoid = SCurve::share_shift(speed).progress(t, months_to_peak);
    (current + (target - current) * sigmoid).clamp(0.0, 1.0)
}
