//! Multi-product specialty portfolio parameters

use serde::{Deserialize, Serialize};

use super::{finite, fraction, months, non_negative};
use crate::error::Result;

/// One product of the portfolio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductParams {
    pub name: String,
    /// Model month of launch (1 = first month)
    pub launch_month: u32,

    pub eligible_patients: f64,
    pub market_growth_annual: f64,
    /// Already-treated fraction; 0 means no existing therapy
    pub current_treatment_rate: f64,
    pub addressable_pct: f64,

    pub peak_market_share: f64,
    /// Peak share at which `peak_prescribers` is reached
    pub reference_peak_share: f64,
    pub adoption_months: u32,
    pub peak_prescribers: f64,

    pub launch_price: f64,
    /// Model month of the benefit assessment
    pub amnog_month: u32,
    pub amnog_price_cut_pct: f64,
    pub price_erosion_annual: f64,

    pub compliance_rate: f64,
    pub cogs_pct: f64,
    pub royalty_pct: f64,
    /// Signed annual change in share from competition
    pub competitive_pressure_annual: f64,
}

impl Default for ProductParams {
    fn default() -> Self {
        Self {
            name: "Product".to_string(),
            launch_month: 1,
            eligible_patients: 100_000.0,
            market_growth_annual: 0.02,
            current_treatment_rate: 0.50,
            addressable_pct: 0.30,
            peak_market_share: 0.15,
            reference_peak_share: 0.15,
            adoption_months: 24,
            peak_prescribers: 2_000.0,
            launch_price: 150.0,
            amnog_month: 6,
            amnog_price_cut_pct: 0.20,
            price_erosion_annual: -0.02,
            compliance_rate: 0.70,
            cogs_pct: 0.15,
            royalty_pct: 0.05,
            competitive_pressure_annual: -0.02,
        }
    }
}

impl ProductParams {
    /// Mydriasis reversal: per-procedure use, first in class
    pub fn mydriasis_reversal() -> Self {
        Self {
            name: "Mydriasis reversal".to_string(),
            launch_month: 1,
            eligible_patients: 800_000.0,
            market_growth_annual: 0.02,
            current_treatment_rate: 0.0,
            addressable_pct: 0.25,
            peak_market_share: 0.50,
            reference_peak_share: 0.50,
            adoption_months: 18,
            peak_prescribers: 3_000.0,
            launch_price: 25.0,
            amnog_month: 6,
            amnog_price_cut_pct: 0.10,
            price_erosion_annual: -0.01,
            compliance_rate: 1.0,
            cogs_pct: 0.20,
            royalty_pct: 0.08,
            competitive_pressure_annual: 0.0,
        }
    }

    /// Presbyopia: chronic daily drops, large but barely addressable pool
    pub fn presbyopia() -> Self {
        Self {
            name: "Presbyopia".to_string(),
            launch_month: 18,
            eligible_patients: 15_000_000.0,
            market_growth_annual: 0.03,
            current_treatment_rate: 0.0,
            addressable_pct: 0.02,
            peak_market_share: 0.40,
            reference_peak_share: 0.40,
            adoption_months: 24,
            peak_prescribers: 2_500.0,
            launch_price: 45.0,
            amnog_month: 24,
            amnog_price_cut_pct: 0.25,
            price_erosion_annual: -0.03,
            compliance_rate: 0.60,
            cogs_pct: 0.15,
            royalty_pct: 0.05,
            competitive_pressure_annual: -0.03,
        }
    }

    /// Dry eye disease: competitive, partly treated market
    pub fn dry_eye() -> Self {
        Self {
            name: "Dry eye".to_string(),
            launch_month: 42,
            eligible_patients: 1_700_000.0,
            market_growth_annual: 0.057,
            current_treatment_rate: 0.36,
            addressable_pct: 0.12,
            peak_market_share: 0.20,
            reference_peak_share: 0.20,
            adoption_months: 30,
            peak_prescribers: 3_500.0,
            launch_price: 140.0,
            amnog_month: 48,
            amnog_price_cut_pct: 0.15,
            price_erosion_annual: -0.02,
            compliance_rate: 0.65,
            cogs_pct: 0.18,
            royalty_pct: 0.0,
            competitive_pressure_annual: -0.03,
        }
    }

    fn sanitize(mut self) -> Result<Self> {
        self.eligible_patients = non_negative("products.eligible_patients", self.eligible_patients)?;
        self.market_growth_annual = finite("products.market_growth_annual", self.market_growth_annual)?;
        self.current_treatment_rate =
            fraction("products.current_treatment_rate", self.current_treatment_rate)?;
        self.addressable_pct = fraction("products.addressable_pct", self.addressable_pct)?;
        self.peak_market_share = fraction("products.peak_market_share", self.peak_market_share)?;
        self.reference_peak_share = fraction("products.reference_peak_share", self.reference_peak_share)?;
        self.peak_prescribers = non_negative("products.peak_prescribers", self.peak_prescribers)?;
        self.launch_price = non_negative("products.launch_price", self.launch_price)?;
        self.amnog_price_cut_pct = fraction("products.amnog_price_cut_pct", self.amnog_price_cut_pct)?;
        self.price_erosion_annual = finite("products.price_erosion_annual", self.price_erosion_annual)?;
        self.compliance_rate = fraction("products.compliance_rate", self.compliance_rate)?;
        self.cogs_pct = fraction("products.cogs_pct", self.cogs_pct)?;
        self.royalty_pct = fraction("products.royalty_pct", self.royalty_pct)?;
        self.competitive_pressure_annual =
            finite("products.competitive_pressure_annual", self.competitive_pressure_annual)?;
        self.launch_month = months("products.launch_month", self.launch_month);
        self.adoption_months = months("products.adoption_months", self.adoption_months);
        self.amnog_month = months("products.amnog_month", self.amnog_month);
        Ok(self)
    }
}

/// Shared go-to-market organisation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldForceParams {
    pub reps_at_launch: f64,
    pub reps_peak: f64,
    pub reps_ramp_months: u32,
    pub rep_annual_cost: f64,

    pub msls_at_launch: f64,
    pub msls_peak: f64,
    pub msl_ramp_months: u32,
    pub msl_annual_cost: f64,

    pub launch_marketing_monthly: f64,
    pub maintenance_marketing_monthly: f64,
    pub launch_phase_months: u32,
    pub congress_annual: f64,
    pub kol_program_annual: f64,
    pub digital_marketing_monthly: f64,

    /// Launch-phase marketing multiplier for the second launch
    pub synergy_second_launch: f64,
    /// Launch-phase marketing multiplier for the third and later launches
    pub synergy_later_launches: f64,
}

impl Default for FieldForceParams {
    fn default() -> Self {
        Self {
            reps_at_launch: 15.0,
            reps_peak: 45.0,
            reps_ramp_months: 18,
            rep_annual_cost: 120_000.0,
            msls_at_launch: 5.0,
            msls_peak: 12.0,
            msl_ramp_months: 12,
            msl_annual_cost: 150_000.0,
            launch_marketing_monthly: 400_000.0,
            maintenance_marketing_monthly: 150_000.0,
            launch_phase_months: 12,
            congress_annual: 200_000.0,
            kol_program_annual: 150_000.0,
            digital_marketing_monthly: 50_000.0,
            synergy_second_launch: 0.70,
            synergy_later_launches: 0.60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortfolioParams {
    pub products: Vec<ProductParams>,
    pub field_force: FieldForceParams,
    /// Blended COGS applied to portfolio revenue for profit
    pub portfolio_cogs_pct: f64,
}

impl Default for PortfolioParams {
    fn default() -> Self {
        Self {
            products: vec![
                ProductParams::mydriasis_reversal(),
                ProductParams::presbyopia(),
                ProductParams::dry_eye(),
            ],
            field_force: FieldForceParams::default(),
            portfolio_cogs_pct: 0.15,
        }
    }
}

impl PortfolioParams {
    pub fn sanitize(mut self) -> Result<Self> {
        self.products = self
            .products
            .into_iter()
            .map(ProductParams::sanitize)
            .collect::<Result<Vec<_>>>()?;
        let ff = &mut self.field_force;
        for (field, value) in [
            ("field_force.reps_at_launch", &mut ff.reps_at_launch),
            ("field_force.reps_peak", &mut ff.reps_peak),
            ("field_force.rep_annual_cost", &mut ff.rep_annual_cost),
            ("field_force.msls_at_launch", &mut ff.msls_at_launch),
            ("field_force.msls_peak", &mut ff.msls_peak),
            ("field_force.msl_annual_cost", &mut ff.msl_annual_cost),
            ("field_force.launch_marketing_monthly", &mut ff.launch_marketing_monthly),
            ("field_force.maintenance_marketing_monthly", &mut ff.maintenance_marketing_monthly),
            ("field_force.congress_annual", &mut ff.congress_annual),
            ("field_force.kol_program_annual", &mut ff.kol_program_annual),
            ("field_force.digital_marketing_monthly", &mut ff.digital_marketing_monthly),
            ("field_force.synergy_second_launch", &mut ff.synergy_second_launch),
            ("field_force.synergy_later_launches", &mut ff.synergy_later_launches),
        ] {
            *value = non_negative(field, *value)?;
        }
        self.portfolio_cogs_pct = fraction("portfolio_cogs_pct", self.portfolio_cogs_pct)?;
        for (field, value) in [
            ("field_force.reps_ramp_months", &mut ff.reps_ramp_months),
            ("field_force.msl_ramp_months", &mut ff.msl_ramp_months),
            ("field_force.launch_phase_months", &mut ff.launch_phase_months),
        ] {
            *value = months(field, *value);
        }
        Ok(self)
    }

    /// Launch months in ascending order
    pub fn launch_sequence(&self) -> Vec<u32> {
        let mut months: Vec<u32> = self.products.iter().map(|p| p.launch_month).collect();
        months.sort_unstable();
        months
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_launch_sequence() {
        assert_eq!(PortfolioParams::default().launch_sequence(), vec![1, 18, 42]);
    }

    #[test]
    fn test_sanitize_floors_negative_costs() {
        let mut params = PortfolioParams::default();
        params.field_force.rep_annual_cost = -1.0;
        params.products[0].peak_market_share = 1.5;
        let clean = params.sanitize().unwrap();
        assert_eq!(clean.field_force.rep_annual_cost, 0.0);
        assert_eq!(clean.products[0].peak_market_share, 1.0);
    }
}
