//! Indication and channel composition
//!
//! Two modes: additive layering of independently ramping uplifts on top of a
//! base multiplier, and normalization of drifting raw shares into a
//! partition that sums to one.

use serde::{Deserialize, Serialize};

use crate::curves::{clamp_share, linear_progress};

/// One indication or feature adding volume once it launches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicationLayer {
    pub name: String,
    pub enabled: bool,
    /// Uplift at full ramp, added to the base multiplier
    pub uplift: f64,
    /// Model month the uplift starts ramping
    pub start_month: i32,
    /// Linear ramp length; zero means full uplift at `start_month`
    pub ramp_months: u32,
}

impl IndicationLayer {
    pub fn new(name: &str, enabled: bool, uplift: f64, start_month: i32, ramp_months: u32) -> Self {
        Self {
            name: name.to_string(),
            enabled,
            uplift,
            start_month,
            ramp_months,
        }
    }

    /// Contribution at month `t`, never negative
    pub fn contribution(&self, t: i32) -> f64 {
        if !self.enabled || t < self.start_month {
            return 0.0;
        }
        let ramp = linear_progress((t - self.start_month) as f64, self.ramp_months as f64);
        self.uplift.max(0.0) * ramp
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicationStack {
    pub base: f64,
    pub layers: Vec<IndicationLayer>,
}

/// Composed multiplier with each layer's share of it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposedMultiplier {
    pub total: f64,
    pub contributions: Vec<(String, f64)>,
}

impl ComposedMultiplier {
    /// Contribution of the named layer, 0 if absent or disabled
    pub fn contribution(&self, name: &str) -> f64 {
        self.contributions
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
            .unwrap_or(0.0)
    }
}

impl IndicationStack {
    pub fn new(base: f64) -> Self {
        Self {
            base,
            layers: Vec::new(),
        }
    }

    pub fn with_layer(mut self, layer: IndicationLayer) -> Self {
        self.layers.push(layer);
        self
    }

    /// Base plus every enabled layer's ramped uplift at month `t`
    pub fn compose(&self, t: i32) -> ComposedMultiplier {
        let contributions: Vec<(String, f64)> = self
            .layers
            .iter()
            .filter(|layer| layer.enabled)
            .map(|layer| (layer.name.clone(), layer.contribution(t)))
            .collect();
        let total = self.base + contributions.iter().map(|(_, v)| v).sum::<f64>();
        ComposedMultiplier {
            total,
            contributions,
        }
    }
}

/// Channel share drifting linearly per year, clamped to [0, 1]
pub fn trended_share(base: f64, trend_annual: f64, month: i32) -> f64 {
    clamp_share(base + trend_annual * (month as f64 / 12.0))
}

/// Scale raw shares so they sum to exactly one
///
/// All-zero input falls back to an equal split.
pub fn normalize_partition(raw: &[f64]) -> Vec<f64> {
    if raw.is_empty() {
        return Vec::new();
    }
    let total: f64 = raw.iter().map(|s| s.max(0.0)).sum();
    if total <= 0.0 {
        let equal = 1.0 / raw.len() as f64;
        return vec![equal; raw.len()];
    }
    raw.iter().map(|s| s.max(0.0) / total).collect()
}

/// Volume multiplier from a channel's discretion/propensity factor relative
/// to a reference level
pub fn propensity_multiplier(factor: f64, reference: f64, sensitivity: f64) -> f64 {
    (1.0 + (factor - reference) * sensitivity).max(0.0)
}

/// Named entity shares plus the residual "rest of market"
#[derive(Debug, Clone, PartialEq)]
pub struct ShareAllocation {
    pub named: Vec<f64>,
    pub rest: f64,
}

/// Allocate named shares leaving at least `rest_floor` to the rest of market
///
/// Named shares are only rescaled when together they exceed
/// `1 - rest_floor`; the residual is `max(rest_floor, 1 - named)`.
pub fn allocate_with_residual(named: &[f64], rest_floor: f64) -> ShareAllocation {
    let rest_floor = clamp_share(rest_floor);
    let clamped: Vec<f64> = named.iter().map(|s| clamp_share(*s)).collect();
    let sum: f64 = clamped.iter().sum();
    let cap = 1.0 - rest_floor;
    let named = if sum > cap && sum > 0.0 {
        let scale = cap / sum;
        clamped.iter().map(|s| s * scale).collect()
    } else {
        clamped
    };
    let named_total: f64 = named.iter().sum();
    ShareAllocation {
        rest: rest_floor.max(1.0 - named_total),
        named,
    }
}

/// Brand versus generic split of one volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrandSplit {
    pub brand_share: f64,
    pub brand_volume: f64,
    pub generic_volume: f64,
}

/// Split `volume` at a brand share drifting by `trend_annual`, floored at
/// `brand_floor`
pub fn brand_generic_split(
    volume: f64,
    base_share: f64,
    trend_annual: f64,
    brand_floor: f64,
    years: f64,
) -> BrandSplit {
    let brand_share = clamp_share((base_share + trend_annual * years).max(brand_floor));
    BrandSplit {
        brand_share,
        brand_volume: volume * brand_share,
        generic_volume: volume * (1.0 - brand_share),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn stack() -> IndicationStack {
        IndicationStack::new(1.0)
            .with_layer(IndicationLayer::new("obesity", true, 0.08, 0, 36))
            .with_layer(IndicationLayer::new("cv", true, 0.15, 6, 18))
            .with_layer(IndicationLayer::new("mash", false, 0.10, 18, 24))
    }

    #[test]
    fn test_additive_layers() {
        let composed = stack().compose(12);
        assert_abs_diff_eq!(composed.contribution("obesity"), 0.08 / 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(composed.contribution("cv"), 0.05, epsilon = 1e-12);
        assert_eq!(composed.contribution("mash"), 0.0);
        assert_abs_diff_eq!(composed.total, 1.0 + 0.08 / 3.0 + 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_composed_never_below_base() {
        let s = stack().with_layer(IndicationLayer::new("bad", true, -0.5, 0, 0));
        for t in -12..120 {
            assert!(s.compose(t).total >= 1.0);
        }
    }

    #[test]
    fn test_layer_order_is_irrelevant() {
        let mut reversed = stack();
        reversed.layers.reverse();
        for t in 0..60 {
            assert_abs_diff_eq!(stack().compose(t).total, reversed.compose(t).total, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_zero_ramp_layer_waits_for_start() {
        let layer = IndicationLayer::new("cv", true, 0.15, 6, 0);
        assert_eq!(layer.contribution(5), 0.0);
        assert_eq!(layer.contribution(6), 0.15);
    }

    #[test]
    fn test_partition_sums_to_one() {
        for m in 1..=120 {
            let raw = [
                trended_share(0.50, -0.03, m),
                trended_share(0.40, 0.04, m),
                trended_share(0.10, 0.01, m),
            ];
            let shares = normalize_partition(&raw);
            assert_abs_diff_eq!(shares.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        }
        assert_eq!(normalize_partition(&[0.0, 0.0]), vec![0.5, 0.5]);
        assert!(normalize_partition(&[]).is_empty());
    }

    #[test]
    fn test_residual_floor() {
        let alloc = allocate_with_residual(&[0.25, 0.30], 0.10);
        assert_eq!(alloc.named, vec![0.25, 0.30]);
        assert_abs_diff_eq!(alloc.rest, 0.45, epsilon = 1e-12);

        let crowded = allocate_with_residual(&[0.6, 0.6], 0.10);
        assert_abs_diff_eq!(crowded.named[0], 0.45, epsilon = 1e-12);
        assert_abs_diff_eq!(crowded.rest, 0.10, epsilon = 1e-12);
        assert!(crowded.named.iter().sum::<f64>() + crowded.rest <= 1.0 + 1e-12);
    }

    #[test]
    fn test_brand_split_floor() {
        let split = brand_generic_split(1000.0, 0.45, -0.03, 0.15, 20.0);
        assert_eq!(split.brand_share, 0.15);
        assert_abs_diff_eq!(split.brand_volume + split.generic_volume, 1000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_propensity() {
        assert_abs_diff_eq!(propensity_multiplier(1.0, 0.7, 0.15), 1.045, epsilon = 1e-12);
        assert_eq!(propensity_multiplier(0.7, 0.7, 0.15), 1.0);
    }
}
