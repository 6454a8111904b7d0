//! Linear ramps

/// Zero before `start`, linear between `start` and `end`, `peak` from `end`
///
/// When `end <= start` the ramp completes at `start`.
pub fn linear_ramp(t: f64, start: f64, end: f64, peak: f64) -> f64 {
    if t < start {
        0.0
    } else if t < end {
        peak * (t - start) / (end - start)
    } else {
        peak
    }
}

/// `min(1, max(0, elapsed) / duration)`; a zero duration is already complete
pub fn linear_progress(elapsed: f64, duration: f64) -> f64 {
    if duration <= 0.0 {
        return 1.0;
    }
    (elapsed.max(0.0) / duration).min(1.0)
}

/// Regulatory substitution quota (aut-idem style) ramping between two
/// milestone months
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SubstitutionRamp {
    pub enabled: bool,
    /// Substitution rate reached at `full_month`
    pub peak_rate: f64,
    /// Month the quota starts to rise
    pub ramp_start_month: u32,
    /// Month the quota reaches its peak
    pub full_month: u32,
}

impl Default for SubstitutionRamp {
    fn default() -> Self {
        Self {
            enabled: true,
            peak_rate: 0.75,
            ramp_start_month: 6,
            full_month: 12,
        }
    }
}

impl SubstitutionRamp {
    /// Substitution rate at months since LOE/launch
    pub fn rate_at(&self, t: f64) -> f64 {
        if !self.enabled {
            return 0.0;
        }
        linear_ramp(
            t,
            self.ramp_start_month as f64,
            self.full_month as f64,
            self.peak_rate.clamp(0.0, 1.0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_ramp_phases() {
        assert_eq!(linear_ramp(5.0, 6.0, 12.0, 0.75), 0.0);
        assert_eq!(linear_ramp(6.0, 6.0, 12.0, 0.75), 0.0);
        assert!((linear_ramp(9.0, 6.0, 12.0, 0.75) - 0.375).abs() < 1e-12);
        assert_eq!(linear_ramp(12.0, 6.0, 12.0, 0.75), 0.75);
        assert_eq!(linear_ramp(40.0, 6.0, 12.0, 0.75), 0.75);
    }

    #[test]
    fn test_degenerate_ramp_jumps_at_start() {
        assert_eq!(linear_ramp(5.0, 6.0, 6.0, 0.5), 0.0);
        assert_eq!(linear_ramp(6.0, 6.0, 6.0, 0.5), 0.5);
        assert_eq!(linear_ramp(6.0, 6.0, 2.0, 0.5), 0.5);
    }

    #[test]
    fn test_linear_progress() {
        assert_eq!(linear_progress(-3.0, 6.0), 0.0);
        assert_eq!(linear_progress(3.0, 6.0), 0.5);
        assert_eq!(linear_progress(30.0, 6.0), 1.0);
        assert_eq!(linear_progress(0.0, 0.0), 1.0);
    }

    #[test]
    fn test_disabled_substitution_is_zero() {
        let ramp = SubstitutionRamp { enabled: false, ..Default::default() };
        assert_eq!(ramp.rate_at(24.0), 0.0);
        assert_eq!(SubstitutionRamp::default().rate_at(24.0), 0.75);
    }
}
