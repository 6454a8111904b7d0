//! Multi-product specialty launch portfolio
//!
//! Products launch independently, each with its own adoption curve and
//! assessed price lifecycle. The go-to-market organisation is shared: its
//! cost is computed once per month, and later launches reuse the launch
//! infrastructure at a discount.

use chrono::NaiveDate;
use log::debug;
use serde::Serialize;

use super::Scenario;
use crate::curves::{
    annual_compounding, linear_progress, month_index, safe_ratio, PriceLifecycle, SCurve,
};
use crate::error::Result;
use crate::kpi::{max_of, CoreMetrics, KpiSet};
use crate::params::{FieldForceParams, PortfolioParams, ProductParams, ScenarioKind};
use crate::projection::{monthly_irr, ForecastConfig, ForecastState, ForecastTable, MonthlyRow, RunningSum};

/// One product in one month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRow {
    pub name: String,
    pub launched: bool,
    pub share: f64,
    pub prescribers: f64,
    pub patients: f64,
    pub price: f64,
    pub gross_revenue: f64,
    /// Revenue after product COGS and royalties
    pub net_revenue: f64,
}

impl ProductRow {
    fn not_launched(name: &str) -> Self {
        Self {
            name: name.to_string(),
            launched: false,
            share: 0.0,
            prescribers: 0.0,
            patients: 0.0,
            price: 0.0,
            gross_revenue: 0.0,
            net_revenue: 0.0,
        }
    }
}

/// Shared go-to-market cost of one month
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GtmCost {
    pub reps: f64,
    pub msls: f64,
    pub rep_cost: f64,
    pub msl_cost: f64,
    pub marketing: f64,
    pub congress_kol: f64,
    pub digital: f64,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioRow {
    // Timing
    pub month: i32,
    pub date: NaiveDate,
    pub products_launched: u32,

    // Per product
    pub products: Vec<ProductRow>,

    // Go-to-market
    pub gtm: GtmCost,

    // Portfolio totals
    pub revenue: f64,
    pub total_patients: f64,
    pub total_prescribers: f64,
    pub operating_profit: f64,
    pub cumulative_revenue: f64,
    pub cumulative_profit: f64,
    pub cumulative_gtm_cost: f64,
    /// Cumulative profit over cumulative go-to-market cost
    pub roi: f64,
}

impl MonthlyRow for PortfolioRow {
    fn month(&self) -> i32 {
        self.month
    }
    fn date(&self) -> NaiveDate {
        self.date
    }
    fn revenue(&self) -> f64 {
        self.revenue
    }
    fn operating_profit(&self) -> f64 {
        self.operating_profit
    }
    fn cumulative_revenue(&self) -> f64 {
        self.cumulative_revenue
    }
    fn cumulative_profit(&self) -> f64 {
        self.cumulative_profit
    }
}

/// Field force, marketing and medical spend for month `m`
///
/// `launches` must be sorted; each launch opens its own launch-phase window
/// and the earliest open window decides the synergy factor.
pub fn gtm_cost(m: i32, ff: &FieldForceParams, launches: &[u32], products_launched: u32) -> GtmCost {
    if products_launched == 0 {
        return GtmCost::default();
    }
    let mf = m as f64;
    let reps = ff.reps_at_launch
        + (ff.reps_peak - ff.reps_at_launch) * linear_progress(mf, ff.reps_ramp_months as f64);
    let msls = ff.msls_at_launch
        + (ff.msls_peak - ff.msls_at_launch) * linear_progress(mf, ff.msl_ramp_months as f64);
    let rep_cost = reps * ff.rep_annual_cost / 12.0;
    let msl_cost = msls * ff.msl_annual_cost / 12.0;

    let launch_window = launches.iter().position(|&launch| {
        let launch = month_index(launch);
        launch <= m && m < launch.saturating_add(month_index(ff.launch_phase_months))
    });
    let marketing = match launch_window {
        Some(0) => ff.launch_marketing_monthly,
        Some(1) => ff.launch_marketing_monthly * ff.synergy_second_launch,
        Some(_) => ff.launch_marketing_monthly * ff.synergy_later_launches,
        None => ff.maintenance_marketing_monthly,
    };
    let congress_kol = (ff.congress_annual + ff.kol_program_annual) / 12.0;
    let digital = ff.digital_marketing_monthly;

    GtmCost {
        reps,
        msls,
        rep_cost,
        msl_cost,
        marketing,
        congress_kol,
        digital,
        total: rep_cost + msl_cost + marketing + congress_kol + digital,
    }
}

/// Lower-case KPI prefix for a product name
fn kpi_prefix(name: &str) -> String {
    let slug: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    slug.split('_').filter(|s| !s.is_empty()).collect::<Vec<_>>().join("_")
}

/// One KPI prefix per product; names that collide (or slug to nothing) get
/// their product index appended
fn kpi_prefixes(products: &[ProductParams]) -> Vec<String> {
    let slugs: Vec<String> = products.iter().map(|p| kpi_prefix(&p.name)).collect();
    slugs
        .iter()
        .enumerate()
        .map(|(i, slug)| {
            let shared = slugs.iter().filter(|other| *other == slug).count() > 1;
            match (slug.is_empty(), shared) {
                (true, _) => format!("product_{i}"),
                (false, true) => format!("{slug}_{i}"),
                (false, false) => slug.clone(),
            }
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct PortfolioForecast {
    params: PortfolioParams,
}

impl PortfolioForecast {
    pub fn new(params: PortfolioParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &PortfolioParams {
        &self.params
    }

    fn product_row(&self, product: &ProductParams, m: i32) -> ProductRow {
        let launch = month_index(product.launch_month);
        if m < launch {
            return ProductRow::not_launched(&product.name);
        }
        let t = (m - launch) as f64;

        let base_share = SCurve::SPECIALTY_ADOPTION.at(t, product.peak_market_share, product.adoption_months);
        let erosion = (1.0 + product.competitive_pressure_annual * t / 12.0).max(0.0);
        let share = base_share * erosion;

        // Prescribers follow the adoption curve and scale with the peak share
        let ramp_progress = safe_ratio(base_share, product.peak_market_share);
        let share_ratio = if product.reference_peak_share > 0.0 {
            product.peak_market_share / product.reference_peak_share
        } else {
            1.0
        };
        let prescribers = ramp_progress * erosion * product.peak_prescribers * share_ratio;

        let eligible = annual_compounding(
            product.eligible_patients,
            product.market_growth_annual,
            (m - 1) as f64 / 12.0,
        );
        let pool = if product.current_treatment_rate > 0.0 {
            eligible * product.current_treatment_rate * product.addressable_pct
        } else {
            eligible * product.addressable_pct
        };
        let patients = pool * share * product.compliance_rate;

        let price = PriceLifecycle {
            launch_month: launch,
            free_price: product.launch_price,
            assessment_month: month_index(product.amnog_month),
            price_cut_pct: product.amnog_price_cut_pct,
            annual_erosion_pct: product.price_erosion_annual,
        }
        .price_at(m);
        let gross_revenue = patients * price;

        ProductRow {
            name: product.name.clone(),
            launched: true,
            share,
            prescribers,
            patients,
            price,
            gross_revenue,
            net_revenue: (gross_revenue * (1.0 - product.cogs_pct - product.royalty_pct)).max(0.0),
        }
    }
}

impl Scenario for PortfolioForecast {
    type Row = PortfolioRow;

    fn kind(&self) -> ScenarioKind {
        ScenarioKind::Portfolio
    }

    fn forecast(&self, config: &ForecastConfig) -> Result<ForecastTable<PortfolioRow>> {
        let horizon = config.validate()? as i32;
        let p = &self.params;
        let launches = p.launch_sequence();
        debug!("portfolio forecast: {} months, launches at {:?}", horizon, launches);

        let mut table = ForecastTable::with_capacity(horizon as usize);
        let mut state = ForecastState::new();
        let mut gtm_total = RunningSum::default();

        for m in 1..=horizon {
            let products_launched = launches.iter().filter(|&&l| month_index(l) <= m).count() as u32;
            let gtm = gtm_cost(m, &p.field_force, &launches, products_launched);

            let products: Vec<ProductRow> = p.products.iter().map(|prod| self.product_row(prod, m)).collect();
            let revenue: f64 = products.iter().map(|r| r.gross_revenue).sum();
            let total_patients = products.iter().map(|r| r.patients).sum();
            let total_prescribers = products.iter().map(|r| r.prescribers).sum();

            let operating_profit = revenue * (1.0 - p.portfolio_cogs_pct) - gtm.total;
            let (cumulative_revenue, cumulative_profit) = state.record(m, revenue, operating_profit);
            let cumulative_gtm_cost = gtm_total.add(gtm.total);

            table.push(PortfolioRow {
                month: m,
                date: config.date_at(m - 1)?,
                products_launched,
                products,
                gtm,
                revenue,
                total_patients,
                total_prescribers,
                operating_profit,
                cumulative_revenue,
                cumulative_profit,
                cumulative_gtm_cost,
                roi: safe_ratio(cumulative_profit, cumulative_gtm_cost),
            });
        }

        Ok(table)
    }

    fn summarize(&self, table: &ForecastTable<PortfolioRow>) -> KpiSet {
        let rows = &table.rows;
        let mut kpis = KpiSet::new();
        CoreMetrics::from_rows(rows).insert_into(&mut kpis);

        kpis.set_value(
            "revenue_year3",
            rows.iter().filter(|r| r.month <= 36).map(|r| r.revenue).sum(),
        );
        if let Some(last) = table.last() {
            kpis.set_value("total_gtm_cost", last.cumulative_gtm_cost);
            kpis.set_value("final_roi", last.roi);
            kpis.set_value("products_launched_final", last.products_launched as f64);
            kpis.set_value("total_prescribers_final", last.total_prescribers);
        }
        kpis.insert("irr", monthly_irr(&table.profit_stream()));

        let portfolio_revenue: f64 = rows.iter().map(|r| r.revenue).sum();
        for (i, prefix) in kpi_prefixes(&self.params.products).iter().enumerate() {
            let revenue_of = |r: &PortfolioRow| r.products.get(i).map_or(0.0, |p| p.gross_revenue);
            let total: f64 = rows.iter().map(revenue_of).sum();
            kpis.set_value(format!("{prefix}_total_revenue"), total);
            kpis.insert(
                format!("{prefix}_peak_patients"),
                max_of(rows, |r| r.products.get(i).map_or(0.0, |p| p.patients)),
            );
            kpis.insert(format!("{prefix}_peak_monthly_revenue"), max_of(rows, revenue_of));
            kpis.set_value(format!("{prefix}_revenue_share"), safe_ratio(total, portfolio_revenue));
        }
        kpis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn run(params: PortfolioParams, months: i32) -> ForecastTable<PortfolioRow> {
        PortfolioForecast::new(params)
            .forecast(&ForecastConfig::with_horizon(months))
            .unwrap()
    }

    #[test]
    fn test_products_launched_steps() {
        let table = run(PortfolioParams::default(), 84);
        let launched = |m: i32| table.row_at(m).unwrap().products_launched;
        assert_eq!(launched(1), 1);
        assert_eq!(launched(17), 1);
        assert_eq!(launched(18), 2);
        assert_eq!(launched(41), 2);
        assert_eq!(launched(42), 3);
        for w in table.rows.windows(2) {
            assert!(w[1].products_launched >= w[0].products_launched);
        }
        assert!(!table.row_at(17).unwrap().products[1].launched);
        assert!(table.row_at(18).unwrap().products[1].launched);
    }

    #[test]
    fn test_nothing_launched_costs_nothing() {
        let mut params = PortfolioParams::default();
        params.products.truncate(1);
        params.products[0].launch_month = 3;
        let table = run(params, 6);
        let first = table.row_at(1).unwrap();
        assert_eq!(first.products_launched, 0);
        assert_eq!(first.gtm, GtmCost::default());
        assert_eq!(first.operating_profit, 0.0);
        assert!(table.row_at(3).unwrap().gtm.total > 0.0);
    }

    #[test]
    fn test_launch_marketing_synergy() {
        let ff = FieldForceParams::default();
        let launches = [1, 18, 42];
        assert_eq!(gtm_cost(12, &ff, &launches, 1).marketing, 400_000.0);
        assert_eq!(gtm_cost(13, &ff, &launches, 1).marketing, 150_000.0);
        assert_relative_eq!(gtm_cost(18, &ff, &launches, 2).marketing, 280_000.0);
        assert_relative_eq!(gtm_cost(53, &ff, &launches, 3).marketing, 240_000.0);
        assert_eq!(gtm_cost(54, &ff, &launches, 3).marketing, 150_000.0);
    }

    #[test]
    fn test_field_force_ramp() {
        let ff = FieldForceParams::default();
        let cost = gtm_cost(9, &ff, &[1], 1);
        assert_abs_diff_eq!(cost.reps, 30.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cost.rep_cost, 30.0 * 10_000.0, epsilon = 1e-6);
        let later = gtm_cost(40, &ff, &[1], 1);
        assert_eq!(later.reps, 45.0);
        assert_eq!(later.msls, 12.0);
        assert_abs_diff_eq!(
            later.total,
            45.0 * 10_000.0 + 12.0 * 12_500.0 + 150_000.0 + 350_000.0 / 12.0 + 50_000.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_assessed_price_lifecycle() {
        let table = run(PortfolioParams::default(), 36);
        let presbyopia = |m: i32| table.row_at(m).unwrap().products[1].price;
        assert_eq!(presbyopia(17), 0.0);
        assert_eq!(presbyopia(24), 45.0);
        assert_relative_eq!(presbyopia(25), 45.0 * 0.75 * 0.97f64.powf(1.0 / 12.0), epsilon = 1e-12);
    }

    #[test]
    fn test_prescribers_scale_with_peak_share() {
        let base = run(PortfolioParams::default(), 36);
        let mut params = PortfolioParams::default();
        params.products[0].peak_market_share = 0.25;
        let halved = run(params, 36);
        let m = 36;
        assert_relative_eq!(
            halved.row_at(m).unwrap().products[0].prescribers,
            base.row_at(m).unwrap().products[0].prescribers / 2.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_portfolio_totals_and_kpis() {
        let forecast = PortfolioForecast::new(PortfolioParams::default());
        let table = forecast.forecast(&ForecastConfig::with_horizon(84)).unwrap();
        for row in table.iter() {
            let sum: f64 = row.products.iter().map(|p| p.gross_revenue).sum();
            assert_abs_diff_eq!(row.revenue, sum, epsilon = 1e-6);
            assert_abs_diff_eq!(row.operating_profit, row.revenue * 0.85 - row.gtm.total, epsilon = 1e-6);
        }
        let kpis = forecast.summarize(&table);
        assert_eq!(kpis.value("products_launched_final"), Some(3.0));
        let shares: f64 = ["mydriasis_reversal", "presbyopia", "dry_eye"]
            .iter()
            .map(|p| kpis.value(&format!("{p}_revenue_share")).unwrap())
            .sum();
        assert_abs_diff_eq!(shares, 1.0, epsilon = 1e-9);
        assert!(kpis.value("dry_eye_total_revenue").unwrap() > 0.0);
        assert!(kpis.get("breakeven_month").is_some());
    }

    #[test]
    fn test_kpi_prefix() {
        assert_eq!(kpi_prefix("MR-141 (Presbyopia)"), "mr_141_presbyopia");
        assert_eq!(kpi_prefix("Dry eye"), "dry_eye");
    }

    #[test]
    fn test_duplicate_product_names_keep_separate_kpis() {
        let product = |name: &str, launch_month: u32| ProductParams {
            name: name.to_string(),
            launch_month,
            ..Default::default()
        };
        let products = vec![product("Dry eye", 1), product("Dry eye", 13), product("Glaucoma", 1)];
        assert_eq!(kpi_prefixes(&products), vec!["dry_eye_0", "dry_eye_1", "glaucoma"]);
        assert_eq!(kpi_prefixes(&[product("++", 1)]), vec!["product_0"]);

        let params = PortfolioParams {
            products,
            ..Default::default()
        };
        let forecast = PortfolioForecast::new(params.clone());
        let kpis = forecast.summarize(&run(params, 36));
        let early = kpis.value("dry_eye_0_total_revenue").unwrap();
        let late = kpis.value("dry_eye_1_total_revenue").unwrap();
        assert!(early > late && late > 0.0);
        assert!(kpis.get("dry_eye_total_revenue").is_none());
    }

    #[test]
    fn test_cumulative_recurrence() {
        let rows = run(PortfolioParams::default(), 84).rows;
        assert_eq!(rows[0].cumulative_profit, rows[0].operating_profit);
        for w in rows.windows(2) {
            assert_abs_diff_eq!(
                w[1].cumulative_profit,
                w[0].cumulative_profit + w[1].operating_profit,
                epsilon = 1e-6
            );
            assert!(w[1].cumulative_gtm_cost >= w[0].cumulative_gtm_cost);
        }
    }
}
