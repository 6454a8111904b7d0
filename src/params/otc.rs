//! Rx-to-OTC switch parameters: a mass-market switch and a specialty
//! omnichannel switch

use serde::{Deserialize, Serialize};

use super::{finite, fraction, months, non_negative};
use crate::error::Result;

/// Month-of-year demand multipliers, January first
pub type Seasonality = [f64; 12];

fn sanitize_seasonality(field: &'static str, seasonality: &mut Seasonality) -> Result<()> {
    for factor in seasonality.iter_mut() {
        *factor = non_negative(field, *factor)?;
    }
    Ok(())
}

/// Adjacent OTC category losing revenue to the switched product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdjacentCategory {
    pub name: String,
    pub monthly_revenue: f64,
    pub cannibalization_peak: f64,
    pub cannibalization_months: u32,
}

impl Default for AdjacentCategory {
    fn default() -> Self {
        Self {
            name: "Antacids".to_string(),
            monthly_revenue: 7_750_000.0,
            cannibalization_peak: 0.15,
            cannibalization_months: 18,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RxOtcParams {
    // Rx channel before the switch
    pub rx_packs_per_month: f64,
    pub rx_price_per_pack: f64,
    /// Fraction of Rx volume eventually lost
    pub rx_decline_rate: f64,
    pub rx_decline_months: u32,

    // OTC channel
    pub otc_price_per_pack: f64,
    pub otc_peak_packs_per_month: f64,
    pub otc_ramp_months: u32,
    pub otc_pack_size: u32,
    pub rx_pack_size: u32,

    /// Fraction of OTC volume from patients new to therapy
    pub new_patient_share: f64,

    pub price_elasticity: f64,
    pub price_trend_annual: f64,
    pub seasonality: Seasonality,

    pub marketing_monthly: f64,
    /// Spend multiplier once past `marketing_taper_after` awareness ramps
    pub marketing_maintenance_ratio: f64,
    pub marketing_taper_after: f64,

    pub awareness_peak: f64,
    pub awareness_ramp_months: u32,
    /// OTC demand never drops below this fraction of aware demand
    pub awareness_floor_ratio: f64,

    pub trial_rate: f64,
    pub repeat_rate: f64,
    /// Potential users as a multiple of peak monthly OTC packs
    pub potential_users_multiple: f64,

    pub cogs_pct: f64,
    pub pharmacy_margin_pct: f64,
    pub distribution_cost_pct: f64,

    pub adjacent: AdjacentCategory,
}

impl Default for RxOtcParams {
    fn default() -> Self {
        Self {
            rx_packs_per_month: 350_000.0,
            rx_price_per_pack: 16.99,
            rx_decline_rate: 0.15,
            rx_decline_months: 24,
            otc_price_per_pack: 7.99,
            otc_peak_packs_per_month: 280_000.0,
            otc_ramp_months: 18,
            otc_pack_size: 14,
            rx_pack_size: 50,
            new_patient_share: 0.70,
            price_elasticity: -0.8,
            price_trend_annual: -0.02,
            seasonality: [
                0.90, 0.85, 0.95, 1.05, 1.05, 1.00, 0.95, 0.90, 1.00, 1.10, 1.15, 1.10,
            ],
            marketing_monthly: 300_000.0,
            marketing_maintenance_ratio: 0.6,
            marketing_taper_after: 1.5,
            awareness_peak: 0.65,
            awareness_ramp_months: 12,
            awareness_floor_ratio: 0.1,
            trial_rate: 0.30,
            repeat_rate: 0.55,
            potential_users_multiple: 2.0,
            cogs_pct: 0.25,
            pharmacy_margin_pct: 0.40,
            distribution_cost_pct: 0.08,
            adjacent: AdjacentCategory::default(),
        }
    }
}

impl RxOtcParams {
    pub fn sanitize(mut self) -> Result<Self> {
        self.rx_packs_per_month = non_negative("rx_packs_per_month", self.rx_packs_per_month)?;
        self.rx_price_per_pack = non_negative("rx_price_per_pack", self.rx_price_per_pack)?;
        self.rx_decline_rate = fraction("rx_decline_rate", self.rx_decline_rate)?;
        self.otc_price_per_pack = non_negative("otc_price_per_pack", self.otc_price_per_pack)?;
        self.otc_peak_packs_per_month =
            non_negative("otc_peak_packs_per_month", self.otc_peak_packs_per_month)?;
        self.new_patient_share = fraction("new_patient_share", self.new_patient_share)?;
        self.price_elasticity = finite("price_elasticity", self.price_elasticity)?;
        self.price_trend_annual = finite("price_trend_annual", self.price_trend_annual)?;
        sanitize_seasonality("seasonality", &mut self.seasonality)?;
        self.marketing_monthly = non_negative("marketing_monthly", self.marketing_monthly)?;
        self.marketing_maintenance_ratio =
            non_negative("marketing_maintenance_ratio", self.marketing_maintenance_ratio)?;
        self.marketing_taper_after = non_negative("marketing_taper_after", self.marketing_taper_after)?;
        self.awareness_peak = fraction("awareness_peak", self.awareness_peak)?;
        self.awareness_floor_ratio = fraction("awareness_floor_ratio", self.awareness_floor_ratio)?;
        self.trial_rate = fraction("trial_rate", self.trial_rate)?;
        self.repeat_rate = fraction("repeat_rate", self.repeat_rate)?;
        self.potential_users_multiple =
            non_negative("potential_users_multiple", self.potential_users_multiple)?;
        self.cogs_pct = fraction("cogs_pct", self.cogs_pct)?;
        self.pharmacy_margin_pct = fraction("pharmacy_margin_pct", self.pharmacy_margin_pct)?;
        self.distribution_cost_pct = fraction("distribution_cost_pct", self.distribution_cost_pct)?;
        self.adjacent.monthly_revenue = non_negative("adjacent.monthly_revenue", self.adjacent.monthly_revenue)?;
        self.adjacent.cannibalization_peak =
            fraction("adjacent.cannibalization_peak", self.adjacent.cannibalization_peak)?;

        self.rx_decline_months = months("rx_decline_months", self.rx_decline_months);
        self.otc_ramp_months = months("otc_ramp_months", self.otc_ramp_months);
        self.awareness_ramp_months = months("awareness_ramp_months", self.awareness_ramp_months);
        self.adjacent.cannibalization_months =
            months("adjacent.cannibalization_months", self.adjacent.cannibalization_months);
        Ok(self)
    }
}

/// One OTC distribution channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelParams {
    pub name: String,
    /// Raw share of OTC volume at month 0
    pub base_share: f64,
    pub share_trend_annual: f64,
    pub margin_pct: f64,
    pub distribution_cost_pct: f64,
    /// 1.0 is fully anonymous; biases absolute volume, not the partition
    pub discretion_factor: f64,
}

impl Default for ChannelParams {
    fn default() -> Self {
        Self {
            name: "Pharmacy".to_string(),
            base_share: 0.50,
            share_trend_annual: -0.03,
            margin_pct: 0.42,
            distribution_cost_pct: 0.06,
            discretion_factor: 0.70,
        }
    }
}

impl ChannelParams {
    pub fn default_mix() -> Vec<ChannelParams> {
        vec![
            ChannelParams::default(),
            ChannelParams {
                name: "Online pharmacy".to_string(),
                base_share: 0.40,
                share_trend_annual: 0.04,
                margin_pct: 0.30,
                distribution_cost_pct: 0.10,
                discretion_factor: 1.0,
            },
            ChannelParams {
                name: "Drugstore".to_string(),
                base_share: 0.10,
                share_trend_annual: 0.01,
                margin_pct: 0.35,
                distribution_cost_pct: 0.08,
                discretion_factor: 0.50,
            },
        ]
    }
}

/// Prescribing channel disrupted once the product is available OTC
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemedChannel {
    pub name: String,
    pub monthly_revenue: f64,
    pub decline_rate: f64,
    pub decline_months: u32,
    /// Fraction of revenue kept through other services
    pub retention: f64,
}

impl Default for TelemedChannel {
    fn default() -> Self {
        Self {
            name: "Telemedicine".to_string(),
            monthly_revenue: 4_500_000.0,
            decline_rate: 0.60,
            decline_months: 24,
            retention: 0.15,
        }
    }
}

/// Rx-only competitor whose patients partly migrate to the OTC product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitorMigration {
    pub name: String,
    pub monthly_packs: f64,
    pub switch_share: f64,
    pub migration_months: u32,
}

impl Default for CompetitorMigration {
    fn default() -> Self {
        Self {
            name: "Rx-only competitor".to_string(),
            monthly_packs: 120_000.0,
            switch_share: 0.12,
            migration_months: 24,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpecialtyOtcParams {
    // Epidemiology
    pub prevalence: f64,
    pub treatment_rate: f64,
    /// Fraction of the untreated reached by the OTC product
    pub gap_closure_rate: f64,
    pub gap_closure_months: u32,

    // Rx channel
    pub rx_packs_per_month: f64,
    pub rx_price_brand: f64,
    pub rx_price_generic: f64,
    pub rx_brand_share: f64,
    pub rx_pack_size: u32,
    pub rx_decline_rate: f64,
    pub rx_decline_months: u32,

    // OTC channel
    pub otc_price_per_tablet: f64,
    pub otc_pack_size: u32,
    pub otc_peak_packs_per_month: f64,
    pub otc_ramp_months: u32,

    pub new_patient_share: f64,
    /// Fraction of the non-new volume attributed to Rx migration
    pub rx_migration_factor: f64,

    pub brand_otc_share: f64,
    pub brand_share_trend: f64,
    pub brand_share_floor: f64,
    pub brand_price_premium: f64,

    pub price_elasticity: f64,
    pub price_trend_annual: f64,

    pub channels: Vec<ChannelParams>,
    pub discretion_reference: f64,
    pub discretion_sensitivity: f64,
    /// Manufacturer share used when no retail revenue exists to average over
    pub fallback_manufacturer_share: f64,

    pub telemed: TelemedChannel,
    pub competitor_migration: CompetitorMigration,

    pub seasonality: Seasonality,

    pub marketing_monthly: f64,
    pub marketing_maintenance_ratio: f64,
    pub marketing_taper_after: f64,

    pub awareness_baseline: f64,
    pub awareness_peak: f64,
    pub awareness_ramp_months: u32,
    pub awareness_floor_ratio: f64,

    pub cogs_pct: f64,
}

impl Default for SpecialtyOtcParams {
    fn default() -> Self {
        Self {
            prevalence: 5_000_000.0,
            treatment_rate: 0.33,
            gap_closure_rate: 0.08,
            gap_closure_months: 36,
            rx_packs_per_month: 217_000.0,
            rx_price_brand: 11.19,
            rx_price_generic: 1.50,
            rx_brand_share: 0.10,
            rx_pack_size: 4,
            rx_decline_rate: 0.08,
            rx_decline_months: 36,
            otc_price_per_tablet: 5.99,
            otc_pack_size: 6,
            otc_peak_packs_per_month: 350_000.0,
            otc_ramp_months: 18,
            new_patient_share: 0.63,
            rx_migration_factor: 0.7,
            brand_otc_share: 0.45,
            brand_share_trend: -0.03,
            brand_share_floor: 0.15,
            brand_price_premium: 1.8,
            price_elasticity: -0.5,
            price_trend_annual: -0.03,
            channels: ChannelParams::default_mix(),
            discretion_reference: 0.7,
            discretion_sensitivity: 0.15,
            fallback_manufacturer_share: 0.52,
            telemed: TelemedChannel::default(),
            competitor_migration: CompetitorMigration::default(),
            seasonality: [
                0.90, 1.05, 1.00, 1.00, 1.05, 1.10, 1.05, 1.00, 0.95, 0.95, 0.95, 1.00,
            ],
            marketing_monthly: 500_000.0,
            marketing_maintenance_ratio: 0.5,
            marketing_taper_after: 2.0,
            awareness_baseline: 0.60,
            awareness_peak: 0.75,
            awareness_ramp_months: 9,
            awareness_floor_ratio: 0.3,
            cogs_pct: 0.12,
        }
    }
}

impl SpecialtyOtcParams {
    pub fn sanitize(mut self) -> Result<Self> {
        self.prevalence = non_negative("prevalence", self.prevalence)?;
        self.treatment_rate = fraction("treatment_rate", self.treatment_rate)?;
        self.gap_closure_rate = fraction("gap_closure_rate", self.gap_closure_rate)?;
        self.rx_packs_per_month = non_negative("rx_packs_per_month", self.rx_packs_per_month)?;
        self.rx_price_brand = non_negative("rx_price_brand", self.rx_price_brand)?;
        self.rx_price_generic = non_negative("rx_price_generic", self.rx_price_generic)?;
        self.rx_brand_share = fraction("rx_brand_share", self.rx_brand_share)?;
        self.rx_decline_rate = fraction("rx_decline_rate", self.rx_decline_rate)?;
        self.otc_price_per_tablet = non_negative("otc_price_per_tablet", self.otc_price_per_tablet)?;
        self.otc_peak_packs_per_month =
            non_negative("otc_peak_packs_per_month", self.otc_peak_packs_per_month)?;
        self.new_patient_share = fraction("new_patient_share", self.new_patient_share)?;
        self.rx_migration_factor = fraction("rx_migration_factor", self.rx_migration_factor)?;
        self.brand_otc_share = fraction("brand_otc_share", self.brand_otc_share)?;
        self.brand_share_trend = finite("brand_share_trend", self.brand_share_trend)?;
        self.brand_share_floor = fraction("brand_share_floor", self.brand_share_floor)?;
        self.brand_price_premium = non_negative("brand_price_premium", self.brand_price_premium)?;
        self.price_elasticity = finite("price_elasticity", self.price_elasticity)?;
        self.price_trend_annual = finite("price_trend_annual", self.price_trend_annual)?;
        for channel in &mut self.channels {
            channel.base_share = fraction("channels.base_share", channel.base_share)?;
            channel.share_trend_annual = finite("channels.share_trend_annual", channel.share_trend_annual)?;
            channel.margin_pct = fraction("channels.margin_pct", channel.margin_pct)?;
            channel.distribution_cost_pct =
                fraction("channels.distribution_cost_pct", channel.distribution_cost_pct)?;
            channel.discretion_factor = fraction("channels.discretion_factor", channel.discretion_factor)?;
        }
        self.discretion_reference = fraction("discretion_reference", self.discretion_reference)?;
        self.discretion_sensitivity = finite("discretion_sensitivity", self.discretion_sensitivity)?;
        self.fallback_manufacturer_share =
            fraction("fallback_manufacturer_share", self.fallback_manufacturer_share)?;
        self.telemed.monthly_revenue = non_negative("telemed.monthly_revenue", self.telemed.monthly_revenue)?;
        self.telemed.decline_rate = fraction("telemed.decline_rate", self.telemed.decline_rate)?;
        self.telemed.retention = fraction("telemed.retention", self.telemed.retention)?;
        self.competitor_migration.monthly_packs =
            non_negative("competitor_migration.monthly_packs", self.competitor_migration.monthly_packs)?;
        self.competitor_migration.switch_share =
            fraction("competitor_migration.switch_share", self.competitor_migration.switch_share)?;
        sanitize_seasonality("seasonality", &mut self.seasonality)?;
        self.marketing_monthly = non_negative("marketing_monthly", self.marketing_monthly)?;
        self.marketing_maintenance_ratio =
            non_negative("marketing_maintenance_ratio", self.marketing_maintenance_ratio)?;
        self.marketing_taper_after = non_negative("marketing_taper_after", self.marketing_taper_after)?;
        self.awareness_baseline = fraction("awareness_baseline", self.awareness_baseline)?;
        self.awareness_peak = fraction("awareness_peak", self.awareness_peak)?;
        self.awareness_floor_ratio = fraction("awareness_floor_ratio", self.awareness_floor_ratio)?;
        self.cogs_pct = fraction("cogs_pct", self.cogs_pct)?;

        self.gap_closure_months = months("gap_closure_months", self.gap_closure_months);
        self.rx_decline_months = months("rx_decline_months", self.rx_decline_months);
        self.otc_ramp_months = months("otc_ramp_months", self.otc_ramp_months);
        self.awareness_ramp_months = months("awareness_ramp_months", self.awareness_ramp_months);
        self.telemed.decline_months = months("telemed.decline_months", self.telemed.decline_months);
        self.competitor_migration.migration_months =
            months("competitor_migration.migration_months", self.competitor_migration.migration_months);
        Ok(self)
    }
}
