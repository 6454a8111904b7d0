//! Brand-vs-brand competition parameters

use serde::{Deserialize, Serialize};

use super::{finite, fraction, months, non_negative};
use crate::curves::{MarketExpansion, SupplyConstraint};
use crate::error::Result;

/// Expanding class market
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandMarketParams {
    pub expansion: MarketExpansion,
    /// Statutory coverage of the obesity indication
    pub obesity_coverage: bool,
    /// Model month coverage starts (default two years in)
    pub obesity_coverage_start_month: u32,
}

impl Default for BrandMarketParams {
    fn default() -> Self {
        Self {
            expansion: MarketExpansion::default(),
            obesity_coverage: false,
            obesity_coverage_start_month: 24,
        }
    }
}

/// The brand being forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandProfile {
    pub name: String,

    pub current_share: f64,
    pub target_peak_share: f64,
    pub months_to_peak: u32,
    pub share_ramp_speed: f64,

    /// Monthly therapy price at month 0
    pub price_per_month: f64,
    pub price_trend_annual: f64,
    /// Month of the negotiated price cut; 0 disables it
    pub price_cut_month: u32,
    pub price_cut_pct: f64,
    pub price_floor: f64,

    pub has_obesity: bool,
    pub has_cv_indication: bool,
    pub has_mash: bool,

    pub supply: SupplyConstraint,

    pub cogs_pct: f64,
    pub sga_monthly: f64,
    pub medical_affairs_monthly: f64,
}

impl Default for BrandProfile {
    fn default() -> Self {
        Self {
            name: "Subject brand".to_string(),
            current_share: 0.08,
            target_peak_share: 0.25,
            months_to_peak: 36,
            share_ramp_speed: 1.0,
            price_per_month: 350.0,
            price_trend_annual: -0.03,
            price_cut_month: 0,
            price_cut_pct: 0.0,
            price_floor: 100.0,
            has_obesity: true,
            has_cv_indication: false,
            has_mash: false,
            supply: SupplyConstraint::default(),
            cogs_pct: 0.20,
            sga_monthly: 800_000.0,
            medical_affairs_monthly: 200_000.0,
        }
    }
}

/// Main competitor, modelled by share and price only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompetitorProfile {
    pub name: String,
    pub current_share: f64,
    pub target_peak_share: f64,
    pub months_to_peak: u32,
    pub price_per_month: f64,
}

impl Default for CompetitorProfile {
    fn default() -> Self {
        Self {
            name: "Lead competitor".to_string(),
            current_share: 0.36,
            target_peak_share: 0.30,
            months_to_peak: 36,
            price_per_month: 300.0,
        }
    }
}

/// Uplift sizes and timing of the indication layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicationUplifts {
    pub obesity_covered_uplift: f64,
    pub obesity_covered_ramp_months: u32,
    pub obesity_self_pay_uplift: f64,
    pub obesity_self_pay_ramp_months: u32,
    pub cv_uplift: f64,
    pub cv_start_month: u32,
    pub cv_ramp_months: u32,
    pub mash_uplift: f64,
    pub mash_start_month: u32,
    pub mash_ramp_months: u32,
}

impl Default for IndicationUplifts {
    fn default() -> Self {
        Self {
            obesity_covered_uplift: 0.5,
            obesity_covered_ramp_months: 24,
            obesity_self_pay_uplift: 0.08,
            obesity_self_pay_ramp_months: 36,
            cv_uplift: 0.15,
            cv_start_month: 6,
            cv_ramp_months: 18,
            mash_uplift: 0.10,
            mash_start_month: 18,
            mash_ramp_months: 24,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrandCompetitionParams {
    pub market: BrandMarketParams,
    pub brand: BrandProfile,
    pub competitor: CompetitorProfile,
    pub indications: IndicationUplifts,
    /// Minimum share left to the rest of the market
    pub rest_of_market_floor: f64,
}

impl BrandCompetitionParams {
    pub fn sanitize(mut self) -> Result<Self> {
        let market = &mut self.market.expansion;
        market.start_volume = non_negative("market.expansion.start_volume", market.start_volume)?;
        market.growth_annual = finite("market.expansion.growth_annual", market.growth_annual)?;
        market.max_growth_factor =
            non_negative("market.expansion.max_growth_factor", market.max_growth_factor)?;
        market.damping = fraction("market.expansion.damping", market.damping)?;

        let brand = &mut self.brand;
        brand.current_share = fraction("brand.current_share", brand.current_share)?;
        brand.target_peak_share = fraction("brand.target_peak_share", brand.target_peak_share)?;
        brand.share_ramp_speed = finite("brand.share_ramp_speed", brand.share_ramp_speed)?;
        brand.price_per_month = non_negative("brand.price_per_month", brand.price_per_month)?;
        brand.price_trend_annual = finite("brand.price_trend_annual", brand.price_trend_annual)?;
        brand.price_cut_pct = fraction("brand.price_cut_pct", brand.price_cut_pct)?;
        brand.price_floor = non_negative("brand.price_floor", brand.price_floor)?;
        brand.supply.capacity = non_negative("brand.supply.capacity", brand.supply.capacity)?;
        brand.cogs_pct = fraction("brand.cogs_pct", brand.cogs_pct)?;
        brand.sga_monthly = non_negative("brand.sga_monthly", brand.sga_monthly)?;
        brand.medical_affairs_monthly =
            non_negative("brand.medical_affairs_monthly", brand.medical_affairs_monthly)?;

        let competitor = &mut self.competitor;
        competitor.current_share = fraction("competitor.current_share", competitor.current_share)?;
        competitor.target_peak_share =
            fraction("competitor.target_peak_share", competitor.target_peak_share)?;
        competitor.price_per_month = non_negative("competitor.price_per_month", competitor.price_per_month)?;

        let ind = &mut self.indications;
        ind.obesity_covered_uplift =
            non_negative("indications.obesity_covered_uplift", ind.obesity_covered_uplift)?;
        ind.obesity_self_pay_uplift =
            non_negative("indications.obesity_self_pay_uplift", ind.obesity_self_pay_uplift)?;
        ind.cv_uplift = non_negative("indications.cv_uplift", ind.cv_uplift)?;
        ind.mash_uplift = non_negative("indications.mash_uplift", ind.mash_uplift)?;

        self.rest_of_market_floor = fraction("rest_of_market_floor", self.rest_of_market_floor)?;

        self.market.expansion.maturity_months =
            months("market.expansion.maturity_months", self.market.expansion.maturity_months);
        self.market.obesity_coverage_start_month =
            months("market.obesity_coverage_start_month", self.market.obesity_coverage_start_month);
        let brand = &mut self.brand;
        brand.months_to_peak = months("brand.months_to_peak", brand.months_to_peak);
        brand.price_cut_month = months("brand.price_cut_month", brand.price_cut_month);
        brand.supply.normalization_month =
            months("brand.supply.normalization_month", brand.supply.normalization_month);
        self.competitor.months_to_peak = months("competitor.months_to_peak", self.competitor.months_to_peak);
        let ind = &mut self.indications;
        for (field, value) in [
            ("indications.obesity_covered_ramp_months", &mut ind.obesity_covered_ramp_months),
            ("indications.obesity_self_pay_ramp_months", &mut ind.obesity_self_pay_ramp_months),
            ("indications.cv_start_month", &mut ind.cv_start_month),
            ("indications.cv_ramp_months", &mut ind.cv_ramp_months),
            ("indications.mash_start_month", &mut ind.mash_start_month),
            ("indications.mash_ramp_months", &mut ind.mash_ramp_months),
        ] {
            *value = months(field, *value);
        }
        Ok(self)
    }
}

impl Default for BrandCompetitionParams {
    fn default() -> Self {
        Self {
            market: BrandMarketParams::default(),
            brand: BrandProfile::default(),
            competitor: CompetitorProfile::default(),
            indications: IndicationUplifts::default(),
            rest_of_market_floor: 0.10,
        }
    }
}
