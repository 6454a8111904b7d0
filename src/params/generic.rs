//! Generic entry parameters, from the originator's and from an entrant's side

use serde::{Deserialize, Serialize};

use super::{finite, fraction, months, non_negative};
use crate::curves::{SubstitutionRamp, TenderProgram};
use crate::error::Result;

/// Seeded jitter applied to the pre-LOE share history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryNoise {
    pub seed: u64,
    /// Standard deviation of the monthly share noise
    pub std_dev: f64,
    /// Noisy share is clipped to baseline +/- this band
    pub band: f64,
}

impl Default for HistoryNoise {
    fn default() -> Self {
        Self {
            seed: 42,
            std_dev: 0.003,
            band: 0.02,
        }
    }
}

/// Originator-owned generic sold at a discount inside the generic segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorizedGeneric {
    pub enabled: bool,
    /// Initial share of the generic segment
    pub share_of_generics: f64,
    /// Initial discount versus the originator baseline price
    pub price_discount: f64,
    /// 0 keeps the share static; decays as `exp(-speed * 0.05 * t)`
    pub share_decay_speed: f64,
    /// 0 keeps the discount static; grows as `1 - (1 - d0) * exp(-speed * 0.03 * t)`
    pub discount_growth_speed: f64,
    pub share_floor: f64,
    pub discount_cap: f64,
}

impl Default for AuthorizedGeneric {
    fn default() -> Self {
        Self {
            enabled: false,
            share_of_generics: 0.25,
            price_discount: 0.30,
            share_decay_speed: 0.0,
            discount_growth_speed: 0.0,
            share_floor: 0.02,
            discount_cap: 0.85,
        }
    }
}

/// Originator view of loss of exclusivity (revenue at risk)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginatorParams {
    /// Pre-LOE monthly prescriptions of the originator
    pub baseline_monthly_trx: f64,
    pub baseline_price: f64,
    pub baseline_share: f64,

    /// Price reduction reached after `price_reduction_months`
    pub price_reduction_pct: f64,
    pub price_reduction_months: u32,

    pub erosion_speed: f64,
    pub floor_share: f64,
    pub months_to_floor: u32,
    pub market_growth_annual: f64,

    pub substitution: SubstitutionRamp,
    /// Fraction of erodible share substitution can claim beyond baseline erosion
    pub substitution_erosion_coefficient: f64,

    /// Fraction of lost originator share picked up by the generic segment
    pub generic_capture: f64,

    pub authorized_generic: AuthorizedGeneric,

    /// Pre-LOE months shown before month 0
    pub history_months: u32,
    pub history_noise: HistoryNoise,

    pub cogs_pct: f64,
    pub fixed_costs_monthly: f64,
}

impl Default for OriginatorParams {
    fn default() -> Self {
        Self {
            baseline_monthly_trx: 1_764_000.0,
            baseline_price: 91.50,
            baseline_share: 0.42,
            price_reduction_pct: 0.15,
            price_reduction_months: 6,
            erosion_speed: 1.0,
            floor_share: 0.12,
            months_to_floor: 18,
            market_growth_annual: 0.02,
            substitution: SubstitutionRamp::default(),
            substitution_erosion_coefficient: 0.3,
            generic_capture: 0.85,
            authorized_generic: AuthorizedGeneric::default(),
            history_months: 12,
            history_noise: HistoryNoise::default(),
            cogs_pct: 0.0,
            fixed_costs_monthly: 0.0,
        }
    }
}

impl OriginatorParams {
    pub fn sanitize(mut self) -> Result<Self> {
        self.baseline_monthly_trx = non_negative("baseline_monthly_trx", self.baseline_monthly_trx)?;
        self.baseline_price = non_negative("baseline_price", self.baseline_price)?;
        self.baseline_share = fraction("baseline_share", self.baseline_share)?;
        self.price_reduction_pct = fraction("price_reduction_pct", self.price_reduction_pct)?;
        self.erosion_speed = finite("erosion_speed", self.erosion_speed)?;
        self.floor_share = fraction("floor_share", self.floor_share)?;
        self.market_growth_annual = finite("market_growth_annual", self.market_growth_annual)?;
        self.substitution.peak_rate = fraction("substitution.peak_rate", self.substitution.peak_rate)?;
        self.substitution_erosion_coefficient = fraction(
            "substitution_erosion_coefficient",
            self.substitution_erosion_coefficient,
        )?;
        self.generic_capture = fraction("generic_capture", self.generic_capture)?;

        let ag = &mut self.authorized_generic;
        ag.share_of_generics = fraction("authorized_generic.share_of_generics", ag.share_of_generics)?;
        ag.price_discount = fraction("authorized_generic.price_discount", ag.price_discount)?;
        ag.share_decay_speed = non_negative("authorized_generic.share_decay_speed", ag.share_decay_speed)?;
        ag.discount_growth_speed =
            non_negative("authorized_generic.discount_growth_speed", ag.discount_growth_speed)?;
        ag.share_floor = fraction("authorized_generic.share_floor", ag.share_floor)?;
        ag.discount_cap = fraction("authorized_generic.discount_cap", ag.discount_cap)?;

        self.history_noise.std_dev = non_negative("history_noise.std_dev", self.history_noise.std_dev)?;
        self.history_noise.band = non_negative("history_noise.band", self.history_noise.band)?;
        self.cogs_pct = fraction("cogs_pct", self.cogs_pct)?;
        self.fixed_costs_monthly = non_negative("fixed_costs_monthly", self.fixed_costs_monthly)?;

        self.price_reduction_months = months("price_reduction_months", self.price_reduction_months);
        self.months_to_floor = months("months_to_floor", self.months_to_floor);
        self.history_months = months("history_months", self.history_months);
        sanitize_substitution_months(&mut self.substitution);
        Ok(self)
    }
}

fn sanitize_substitution_months(ramp: &mut SubstitutionRamp) {
    ramp.ramp_start_month = months("substitution.ramp_start_month", ramp.ramp_start_month);
    ramp.full_month = months("substitution.full_month", ramp.full_month);
}

/// Entrant view of a generic launch (market opportunity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenericParams {
    pub total_market_monthly_trx: f64,
    pub originator_price: f64,
    /// Originator share used to size the substitutable pool
    pub originator_reference_share: f64,
    /// Pool never shrinks below this fraction of the reference volume
    pub originator_residual_floor: f64,

    /// Launch delay after LOE
    pub launch_month_offset: u32,
    pub price_discount: f64,
    /// Extra discount per month since launch, capped at `max_price_erosion`
    pub monthly_price_erosion: f64,
    pub max_price_erosion: f64,
    pub price_floor: f64,

    /// Achievable peak share of the total market
    pub target_peak_share: f64,
    pub months_to_peak: u32,
    /// Fraction of the capped peak reached through organic uptake
    pub organic_take_rate: f64,

    /// Peak share of all generics together
    pub segment_peak_share: f64,
    pub segment_months_to_peak: u32,

    pub cogs_pct: f64,
    pub sga_monthly: f64,
    /// SG&A charged before launch, as a fraction of `sga_monthly`
    pub pre_launch_sga_ratio: f64,
    pub launch_investment: f64,
    pub fixed_costs_monthly: f64,
    pub market_growth_annual: f64,

    pub substitution: SubstitutionRamp,
    /// Entrant's share of pharmacy substitutions
    pub substitution_capture: f64,

    pub tender: TenderProgram,
}

impl Default for GenericParams {
    fn default() -> Self {
        Self {
            total_market_monthly_trx: 4_200_000.0,
            originator_price: 91.50,
            originator_reference_share: 0.42,
            originator_residual_floor: 0.3,
            launch_month_offset: 0,
            price_discount: 0.45,
            monthly_price_erosion: 0.003,
            max_price_erosion: 0.15,
            price_floor: 20.0,
            target_peak_share: 0.10,
            months_to_peak: 18,
            organic_take_rate: 0.5,
            segment_peak_share: 0.55,
            segment_months_to_peak: 24,
            cogs_pct: 0.25,
            sga_monthly: 150_000.0,
            pre_launch_sga_ratio: 0.5,
            launch_investment: 500_000.0,
            fixed_costs_monthly: 50_000.0,
            market_growth_annual: 0.02,
            substitution: SubstitutionRamp::default(),
            substitution_capture: 0.30,
            tender: TenderProgram::default(),
        }
    }
}

impl GenericParams {
    pub fn sanitize(mut self) -> Result<Self> {
        self.total_market_monthly_trx =
            non_negative("total_market_monthly_trx", self.total_market_monthly_trx)?;
        self.originator_price = non_negative("originator_price", self.originator_price)?;
        self.originator_reference_share =
            fraction("originator_reference_share", self.originator_reference_share)?;
        self.originator_residual_floor =
            fraction("originator_residual_floor", self.originator_residual_floor)?;
        self.price_discount = fraction("price_discount", self.price_discount)?;
        self.monthly_price_erosion = non_negative("monthly_price_erosion", self.monthly_price_erosion)?;
        self.max_price_erosion = fraction("max_price_erosion", self.max_price_erosion)?;
        self.price_floor = non_negative("price_floor", self.price_floor)?;
        self.target_peak_share = fraction("target_peak_share", self.target_peak_share)?;
        self.organic_take_rate = fraction("organic_take_rate", self.organic_take_rate)?;
        self.segment_peak_share = fraction("segment_peak_share", self.segment_peak_share)?;
        self.cogs_pct = fraction("cogs_pct", self.cogs_pct)?;
        self.sga_monthly = non_negative("sga_monthly", self.sga_monthly)?;
        self.pre_launch_sga_ratio = non_negative("pre_launch_sga_ratio", self.pre_launch_sga_ratio)?;
        self.launch_investment = non_negative("launch_investment", self.launch_investment)?;
        self.fixed_costs_monthly = non_negative("fixed_costs_monthly", self.fixed_costs_monthly)?;
        self.market_growth_annual = finite("market_growth_annual", self.market_growth_annual)?;
        self.substitution.peak_rate = fraction("substitution.peak_rate", self.substitution.peak_rate)?;
        self.substitution_capture = fraction("substitution_capture", self.substitution_capture)?;
        self.tender.exclusivity_multiplier =
            non_negative("tender.exclusivity_multiplier", self.tender.exclusivity_multiplier)?;
        for target in &mut self.tender.targets {
            target.payer_share = fraction("tender.targets.payer_share", target.payer_share)?;
            target.win_probability = fraction("tender.targets.win_probability", target.win_probability)?;
        }

        self.launch_month_offset = months("launch_month_offset", self.launch_month_offset);
        self.months_to_peak = months("months_to_peak", self.months_to_peak);
        self.segment_months_to_peak = months("segment_months_to_peak", self.segment_months_to_peak);
        sanitize_substitution_months(&mut self.substitution);
        let tender = &mut self.tender;
        tender.start_month = months("tender.start_month", tender.start_month);
        tender.ramp_months = months("tender.ramp_months", tender.ramp_months);
        tender.secondary_delay_months =
            months("tender.secondary_delay_months", tender.secondary_delay_months);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForecastError;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let params: GenericParams =
            serde_json::from_str(r#"{"target_peak_share": 0.2, "tender": {"enabled": false}}"#).unwrap();
        assert_eq!(params.target_peak_share, 0.2);
        assert_eq!(params.segment_peak_share, 0.55);
        assert!(!params.tender.enabled);
        assert_eq!(params.tender.targets.len(), 10);
    }

    #[test]
    fn test_sanitize_clamps_shares() {
        let params = OriginatorParams {
            floor_share: -0.2,
            baseline_share: 1.3,
            ..Default::default()
        }
        .sanitize()
        .unwrap();
        assert_eq!(params.floor_share, 0.0);
        assert_eq!(params.baseline_share, 1.0);
    }

    #[test]
    fn test_nan_is_rejected() {
        let err = GenericParams {
            price_discount: f64::NAN,
            ..Default::default()
        }
        .sanitize()
        .unwrap_err();
        assert!(matches!(err, ForecastError::NonFiniteParameter { field: "price_discount" }));
    }
}
