//! Brand versus brand competition in an expanding class market
//!
//! The subject brand and one competitor shift share along independent
//! S-curves; indication layers scale only the subject brand's volume.

use chrono::NaiveDate;
use log::debug;
use serde::Serialize;

use super::Scenario;
use crate::composer::{allocate_with_residual, IndicationLayer, IndicationStack};
use crate::curves::{annual_compounding, month_index, safe_ratio, share_shift};
use crate::error::Result;
use crate::kpi::{first_month_where, max_of, mean_of, value_at_index, CoreMetrics, KpiSet};
use crate::params::{BrandCompetitionParams, ScenarioKind};
use crate::projection::{ForecastConfig, ForecastState, ForecastTable, MonthlyRow};

const OBESITY: &str = "obesity";
const CV_RISK: &str = "cv_risk";
const MASH: &str = "mash";

/// Competitor share shifts over a fixed three-year horizon
const COMPETITOR_SHIFT_MONTHS: u32 = 36;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandRow {
    // Timing
    pub month: i32,
    pub date: NaiveDate,

    // Market
    pub total_market_trx: f64,
    pub market_growth_vs_start: f64,

    // Subject brand
    pub my_share: f64,
    pub base_trx: f64,
    pub indication_multiplier: f64,
    pub demand_trx: f64,
    pub actual_trx: f64,
    pub supply_gap_trx: f64,
    pub price: f64,
    pub revenue: f64,
    pub cogs: f64,
    pub gross_profit: f64,
    pub sga: f64,
    pub medical_affairs: f64,
    pub operating_profit: f64,
    pub cumulative_revenue: f64,
    pub cumulative_profit: f64,

    // Competitor and rest of market
    pub competitor_share: f64,
    pub competitor_trx: f64,
    pub competitor_revenue: f64,
    pub rest_share: f64,
    pub rest_trx: f64,

    // Indication breakdown
    pub indication_base: f64,
    pub indication_obesity: f64,
    pub indication_cv: f64,
    pub indication_mash: f64,
}

impl MonthlyRow for BrandRow {
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

#[derive(Debug, Clone)]
pub struct BrandCompetitionForecast {
    params: BrandCompetitionParams,
    indications: IndicationStack,
}

impl BrandCompetitionForecast {
    pub fn new(params: BrandCompetitionParams) -> Self {
        let indications = Self::indication_stack(&params);
        Self { params, indications }
    }

    pub fn params(&self) -> &BrandCompetitionParams {
        &self.params
    }

    /// Base multiplier 1.0 plus the brand's enabled indication layers
    fn indication_stack(params: &BrandCompetitionParams) -> IndicationStack {
        let brand = &params.brand;
        let up = &params.indications;
        let obesity = if params.market.obesity_coverage {
            IndicationLayer::new(
                OBESITY,
                brand.has_obesity,
                up.obesity_covered_uplift,
                month_index(params.market.obesity_coverage_start_month),
                up.obesity_covered_ramp_months,
            )
        } else {
            IndicationLayer::new(
                OBESITY,
                brand.has_obesity,
                up.obesity_self_pay_uplift,
                0,
                up.obesity_self_pay_ramp_months,
            )
        };
        IndicationStack::new(1.0)
            .with_layer(obesity)
            .with_layer(IndicationLayer::new(
                CV_RISK,
                brand.has_cv_indication,
                up.cv_uplift,
                month_index(up.cv_start_month),
                up.cv_ramp_months,
            ))
            .with_layer(IndicationLayer::new(
                MASH,
                brand.has_mash,
                up.mash_uplift,
                month_index(up.mash_start_month),
                up.mash_ramp_months,
            ))
    }

    /// Monthly therapy price after trend, negotiated cut and floor
    fn price_at(&self, t: i32) -> f64 {
        let brand = &self.params.brand;
        let mut price = annual_compounding(brand.price_per_month, brand.price_trend_annual, t as f64 / 12.0);
        if brand.price_cut_month > 0 && t >= month_index(brand.price_cut_month) {
            price *= 1.0 - brand.price_cut_pct;
        }
        price.max(brand.price_floor)
    }
}

impl Scenario for BrandCompetitionForecast {
    type Row = BrandRow;

    fn kind(&self) -> ScenarioKind {
        ScenarioKind::BrandCompetition
    }

    fn forecast(&self, config: &ForecastConfig) -> Result<ForecastTable<BrandRow>> {
        let horizon = config.validate()? as i32;
        let p = &self.params;
        debug!(
            "brand competition forecast: {} months, {} vs {}",
            horizon, p.brand.name, p.competitor.name
        );

        let start_volume = p.market.expansion.volume_at(0);
        let mut table = ForecastTable::with_capacity(horizon as usize);
        let mut state = ForecastState::new();

        for t in 0..horizon {
            let tf = t as f64;
            let market = p.market.expansion.volume_at(t);

            let my_target = share_shift(
                tf,
                p.brand.current_share,
                p.brand.target_peak_share,
                p.brand.months_to_peak,
                p.brand.share_ramp_speed,
            );
            let competitor_target = share_shift(
                tf,
                p.competitor.current_share,
                p.competitor.target_peak_share,
                COMPETITOR_SHIFT_MONTHS,
                1.0,
            );
            let allocation = allocate_with_residual(&[my_target, competitor_target], p.rest_of_market_floor);
            let (my_share, competitor_share) = (allocation.named[0], allocation.named[1]);

            let composed = self.indications.compose(t);
            let base_trx = (market * my_share).floor();
            let demand = (base_trx * composed.total).floor();
            let supply = p.brand.supply.apply(t, demand);

            let price = self.price_at(t);
            let revenue = supply.actual * price;
            let cogs = revenue * p.brand.cogs_pct;
            let gross_profit = revenue - cogs;
            let operating_profit = gross_profit - p.brand.sga_monthly - p.brand.medical_affairs_monthly;
            let (cumulative_revenue, cumulative_profit) = state.record(t, revenue, operating_profit);

            let competitor_trx = (market * competitor_share).floor();

            table.push(BrandRow {
                month: t,
                date: config.date_at(t)?,
                total_market_trx: market,
                market_growth_vs_start: safe_ratio(market, start_volume),
                my_share,
                base_trx,
                indication_multiplier: composed.total,
                demand_trx: supply.demand,
                actual_trx: supply.actual,
                supply_gap_trx: supply.shortfall,
                price,
                revenue,
                cogs,
                gross_profit,
                sga: p.brand.sga_monthly,
                medical_affairs: p.brand.medical_affairs_monthly,
                operating_profit,
                cumulative_revenue,
                cumulative_profit,
                competitor_share,
                competitor_trx,
                competitor_revenue: competitor_trx * p.competitor.price_per_month,
                rest_share: allocation.rest,
                rest_trx: (market * allocation.rest).floor(),
                indication_base: self.indications.base,
                indication_obesity: composed.contribution(OBESITY),
                indication_cv: composed.contribution(CV_RISK),
                indication_mash: composed.contribution(MASH),
            });
        }

        Ok(table)
    }

    fn summarize(&self, table: &ForecastTable<BrandRow>) -> KpiSet {
        let rows = &table.rows;
        let mut kpis = KpiSet::new();
        CoreMetrics::from_rows(rows).insert_into(&mut kpis);

        kpis.insert("peak_share", max_of(rows, |r| r.my_share));
        kpis.insert("share_at_month_12", value_at_index(rows, 11, |r| r.my_share));
        kpis.insert("share_at_month_36", value_at_index(rows, 35, |r| r.my_share));
        kpis.insert("final_share", table.last().map(|r| r.my_share));
        kpis.set_month(
            "overtake_month",
            first_month_where(rows, |r| r.my_share > r.competitor_share),
        );

        let start = table.first().map_or(0.0, |r| r.total_market_trx);
        let end = table.last().map_or(0.0, |r| r.total_market_trx);
        kpis.set_value("market_size_start", start);
        kpis.set_value("market_size_end", end);
        kpis.set_value("market_growth_total", safe_ratio(end, start));

        kpis.insert("avg_price", mean_of(rows, |r| r.price));
        kpis.insert("avg_indication_multiplier", mean_of(rows, |r| r.indication_multiplier));
        kpis.set_value("total_supply_gap_trx", rows.iter().map(|r| r.supply_gap_trx).sum());
        kpis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use crate::curves::SupplyConstraint;
    use crate::params::{BrandMarketParams, BrandProfile, CompetitorProfile};

    fn run(params: BrandCompetitionParams) -> ForecastTable<BrandRow> {
        BrandCompetitionForecast::new(params)
            .forecast(&ForecastConfig::with_horizon(60))
            .unwrap()
    }

    fn with_brand(brand: BrandProfile) -> BrandCompetitionParams {
        BrandCompetitionParams {
            brand,
            ..Default::default()
        }
    }

    #[test]
    fn test_market_expands_under_cap() {
        let table = run(BrandCompetitionParams::default());
        assert_eq!(table.first().unwrap().total_market_trx, 950_000.0);
        for w in table.rows.windows(2) {
            assert!(w[1].total_market_trx >= w[0].total_market_trx);
        }
        assert!(table.iter().all(|r| r.total_market_trx <= 4.0 * 950_000.0));
    }

    #[test]
    fn test_self_pay_obesity_layer() {
        let table = run(BrandCompetitionParams::default());
        assert_eq!(table.row_at(0).unwrap().indication_multiplier, 1.0);
        assert_abs_diff_eq!(table.row_at(18).unwrap().indication_obesity, 0.04, epsilon = 1e-12);
        assert_abs_diff_eq!(table.row_at(48).unwrap().indication_multiplier, 1.08, epsilon = 1e-12);
        assert!(table.iter().all(|r| r.indication_multiplier >= 1.0));
    }

    #[test]
    fn test_covered_obesity_cv_and_mash() {
        let params = BrandCompetitionParams {
            market: BrandMarketParams {
                obesity_coverage: true,
                ..Default::default()
            },
            brand: BrandProfile {
                has_cv_indication: true,
                has_mash: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let table = run(params);
        let m23 = table.row_at(23).unwrap();
        assert_eq!(m23.indication_obesity, 0.0);
        assert_abs_diff_eq!(m23.indication_cv, 0.15 * 17.0 / 18.0, epsilon = 1e-12);
        assert_abs_diff_eq!(m23.indication_mash, 0.10 * 5.0 / 24.0, epsilon = 1e-12);
        let m36 = table.row_at(36).unwrap();
        assert_abs_diff_eq!(m36.indication_obesity, 0.25, epsilon = 1e-12);
        assert_abs_diff_eq!(m36.indication_multiplier, 1.0 + 0.25 + 0.15 + 0.075, epsilon = 1e-12);
    }

    #[test]
    fn test_supply_clamp() {
        let table = run(with_brand(BrandProfile {
            supply: SupplyConstraint {
                constrained: true,
                capacity: 100_000.0,
                normalization_month: 12,
            },
            ..Default::default()
        }));
        for row in table.iter() {
            assert!(row.actual_trx <= row.demand_trx);
            assert_eq!(row.supply_gap_trx, row.demand_trx - row.actual_trx);
            if row.month < 12 {
                assert!(row.actual_trx <= 100_000.0);
            } else {
                assert_eq!(row.actual_trx, row.demand_trx);
            }
        }
        assert!(table.row_at(11).unwrap().supply_gap_trx > 0.0);
    }

    #[test]
    fn test_price_trend_cut_and_floor() {
        let forecast = BrandCompetitionForecast::new(with_brand(BrandProfile {
            price_cut_month: 12,
            price_cut_pct: 0.30,
            ..Default::default()
        }));
        assert_eq!(forecast.price_at(0), 350.0);
        assert_abs_diff_eq!(forecast.price_at(11), 350.0 * 0.97_f64.powf(11.0 / 12.0), epsilon = 1e-9);
        assert_abs_diff_eq!(forecast.price_at(12), 350.0 * 0.97 * 0.7, epsilon = 1e-9);

        let floored = BrandCompetitionForecast::new(with_brand(BrandProfile {
            price_cut_month: 1,
            price_cut_pct: 0.9,
            ..Default::default()
        }));
        assert_eq!(floored.price_at(1), 100.0);
    }

    #[test]
    fn test_rest_of_market_floor() {
        let table = run(BrandCompetitionParams {
            brand: BrandProfile {
                current_share: 0.6,
                target_peak_share: 0.8,
                ..Default::default()
            },
            competitor: CompetitorProfile {
                current_share: 0.5,
                target_peak_share: 0.5,
                ..Default::default()
            },
            ..Default::default()
        });
        for row in table.iter() {
            assert!(row.rest_share >= 0.10 - 1e-12);
            assert!(row.my_share + row.competitor_share + row.rest_share <= 1.0 + 1e-9);
        }
        let default = run(BrandCompetitionParams::default());
        let row = default.row_at(30).unwrap();
        assert_abs_diff_eq!(row.rest_share, 1.0 - row.my_share - row.competitor_share, epsilon = 1e-12);
    }

    #[test]
    fn test_overtake_month() {
        let forecast = BrandCompetitionForecast::new(BrandCompetitionParams::default());
        let table = forecast.forecast(&ForecastConfig::with_horizon(60)).unwrap();
        assert!(forecast.summarize(&table).is_absent("overtake_month"));

        let challenger = BrandCompetitionForecast::new(with_brand(BrandProfile {
            target_peak_share: 0.45,
            ..Default::default()
        }));
        let table = challenger.forecast(&ForecastConfig::with_horizon(60)).unwrap();
        let kpis = challenger.summarize(&table);
        let month = kpis.month("overtake_month").unwrap();
        let row = table.row_at(month).unwrap();
        assert!(row.my_share > row.competitor_share);
        assert!(kpis.value("market_growth_total").unwrap() > 1.0);
    }

    #[test]
    fn test_zero_ramp_jumps_to_target() {
        let table = run(with_brand(BrandProfile {
            months_to_peak: 0,
            ..Default::default()
        }));
        assert_eq!(table.row_at(0).unwrap().my_share, 0.25);
    }

    #[test]
    fn test_cumulative_recurrence() {
        let table = run(BrandCompetitionParams::default());
        let rows = &table.rows;
        assert_eq!(rows[0].cumulative_profit, rows[0].operating_profit);
        for w in rows.windows(2) {
            assert_abs_diff_eq!(
                w[1].cumulative_profit,
                w[0].cumulative_profit + w[1].operating_profit,
                epsilon = 1e-6
            );
        }
    }
}
