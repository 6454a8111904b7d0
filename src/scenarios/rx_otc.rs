//! Rx-to-OTC switch of a mass-market product
//!
//! Rx volume decays toward a retained floor while OTC volume ramps on an
//! S-curve scaled by consumer awareness, seasonality and price elasticity.
//! Cannibalization of an adjacent OTC category is tracked on that
//! category's own revenue, not on the product's volume.

use chrono::NaiveDate;
use log::debug;
use serde::Serialize;

use super::Scenario;
use crate::curves::{annual_compounding, linear_progress, retention_decay, safe_ratio, SCurve};
use crate::error::Result;
use crate::kpi::{first_month_where, max_of, mean_of, value_at_month, CoreMetrics, KpiSet};
use crate::params::{RxOtcParams, ScenarioKind, Seasonality};
use crate::projection::{ForecastConfig, ForecastState, ForecastTable, MonthlyRow, RunningSum};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RxOtcRow {
    // Timing
    /// Months since the switch, from 1
    pub month: i32,
    pub date: NaiveDate,
    pub season_factor: f64,
    pub awareness: f64,

    // Rx channel
    pub rx_packs: f64,
    pub rx_price: f64,
    pub rx_revenue: f64,
    pub rx_tablets: f64,

    // OTC channel
    pub otc_packs: f64,
    pub otc_price: f64,
    pub otc_retail_revenue: f64,
    pub otc_manufacturer_revenue: f64,
    pub otc_tablets: f64,
    pub otc_from_rx_migration: f64,
    pub otc_from_new_patients: f64,

    // Combined
    pub total_tablets: f64,
    pub otc_share_tablets: f64,
    pub otc_share_revenue: f64,

    // Adjacent category
    pub cannibalization_rate: f64,
    pub adjacent_revenue_lost: f64,

    // Profitability
    /// Rx revenue plus OTC manufacturer revenue
    pub revenue: f64,
    pub cogs: f64,
    pub gross_profit: f64,
    pub marketing_spend: f64,
    pub operating_profit: f64,
    pub cumulative_revenue: f64,
    pub cumulative_profit: f64,
    pub cumulative_otc_revenue: f64,
    pub cumulative_rx_revenue: f64,
    pub cumulative_marketing: f64,

    // Consumer funnel
    pub potential_users: f64,
    pub aware_users: f64,
    pub trialists: f64,
    pub repeaters: f64,
}

impl MonthlyRow for RxOtcRow {
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

/// Seasonal factor of model month `m` (1-based), cycling every 12 months
pub(crate) fn season_factor(seasonality: &Seasonality, m: i32) -> f64 {
    seasonality[((m - 1).rem_euclid(12)) as usize]
}

/// Volume effect of a compounding price trend under constant elasticity
pub(crate) fn price_volume_effect(trend_annual: f64, elasticity: f64, years: f64) -> f64 {
    1.0 + trend_annual * years * elasticity
}

#[derive(Debug, Clone)]
pub struct RxOtcForecast {
    params: RxOtcParams,
}

impl RxOtcForecast {
    pub fn new(params: RxOtcParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &RxOtcParams {
        &self.params
    }

    /// Demand multiplier from awareness, never below the floor ratio
    fn awareness_factor(&self, awareness: f64) -> f64 {
        let p = &self.params;
        if p.awareness_peak > 0.0 {
            p.awareness_floor_ratio.max(awareness / p.awareness_peak)
        } else {
            1.0
        }
    }

    fn marketing_at(&self, m: i32) -> f64 {
        let p = &self.params;
        if m as f64 > p.awareness_ramp_months as f64 * p.marketing_taper_after {
            p.marketing_monthly * p.marketing_maintenance_ratio
        } else {
            p.marketing_monthly
        }
    }
}

impl Scenario for RxOtcForecast {
    type Row = RxOtcRow;

    fn kind(&self) -> ScenarioKind {
        ScenarioKind::RxOtcSwitch
    }

    fn forecast(&self, config: &ForecastConfig) -> Result<ForecastTable<RxOtcRow>> {
        let horizon = config.validate()? as i32;
        let p = &self.params;
        debug!(
            "rx-to-otc forecast: {} months, OTC peak {:.0} packs over {} months",
            horizon, p.otc_peak_packs_per_month, p.otc_ramp_months
        );

        let manufacturer_share = (1.0 - p.pharmacy_margin_pct - p.distribution_cost_pct).max(0.0);
        let potential_users = p.otc_peak_packs_per_month * p.potential_users_multiple;

        let mut table = ForecastTable::with_capacity(horizon as usize);
        let mut state = ForecastState::new();
        let mut otc_total = RunningSum::default();
        let mut rx_total = RunningSum::default();
        let mut marketing_total = RunningSum::default();

        for m in 1..=horizon {
            let mf = m as f64;
            let years = mf / 12.0;
            let season = season_factor(&p.seasonality, m);
            let awareness = SCurve::AWARENESS.at(mf, p.awareness_peak, p.awareness_ramp_months);

            let rx_packs = retention_decay(mf, p.rx_packs_per_month, p.rx_decline_rate, p.rx_decline_months);
            let rx_revenue = rx_packs * p.rx_price_per_pack;

            let otc_base = SCurve::OTC_VOLUME.at(mf, p.otc_peak_packs_per_month, p.otc_ramp_months);
            let otc_demand = otc_base * season * self.awareness_factor(awareness);
            let otc_packs =
                (otc_demand * price_volume_effect(p.price_trend_annual, p.price_elasticity, years)).max(0.0);
            let otc_price = annual_compounding(p.otc_price_per_pack, p.price_trend_annual, years);
            let otc_retail_revenue = otc_packs * otc_price;
            let otc_manufacturer_revenue = otc_retail_revenue * manufacturer_share;

            let rx_tablets = rx_packs * p.rx_pack_size as f64;
            let otc_tablets = otc_packs * p.otc_pack_size as f64;
            let total_tablets = rx_tablets + otc_tablets;

            let adjacent = &p.adjacent;
            let cannibalization_rate =
                adjacent.cannibalization_peak * linear_progress(mf, adjacent.cannibalization_months as f64);

            let marketing_spend = self.marketing_at(m);
            let revenue = rx_revenue + otc_manufacturer_revenue;
            let cogs = revenue * p.cogs_pct;
            let gross_profit = revenue - cogs;
            let operating_profit = gross_profit - marketing_spend;
            let (cumulative_revenue, cumulative_profit) = state.record(m, revenue, operating_profit);

            let aware_users = potential_users * awareness;
            let trialists = aware_users * p.trial_rate;

            table.push(RxOtcRow {
                month: m,
                date: config.date_at(m - 1)?,
                season_factor: season,
                awareness,
                rx_packs,
                rx_price: p.rx_price_per_pack,
                rx_revenue,
                rx_tablets,
                otc_packs,
                otc_price,
                otc_retail_revenue,
                otc_manufacturer_revenue,
                otc_tablets,
                otc_from_rx_migration: otc_packs * (1.0 - p.new_patient_share),
                otc_from_new_patients: otc_packs * p.new_patient_share,
                total_tablets,
                otc_share_tablets: safe_ratio(otc_tablets, total_tablets),
                otc_share_revenue: safe_ratio(otc_manufacturer_revenue, revenue),
                cannibalization_rate,
                adjacent_revenue_lost: adjacent.monthly_revenue * cannibalization_rate,
                revenue,
                cogs,
                gross_profit,
                marketing_spend,
                operating_profit,
                cumulative_revenue,
                cumulative_profit,
                cumulative_otc_revenue: otc_total.add(otc_manufacturer_revenue),
                cumulative_rx_revenue: rx_total.add(rx_revenue),
                cumulative_marketing: marketing_total.add(marketing_spend),
                potential_users,
                aware_users,
                trialists,
                repeaters: trialists * p.repeat_rate,
            });
        }

        Ok(table)
    }

    fn summarize(&self, table: &ForecastTable<RxOtcRow>) -> KpiSet {
        let rows = &table.rows;
        let mut kpis = KpiSet::new();
        CoreMetrics::from_rows(rows).insert_into(&mut kpis);

        let year1 = rows.iter().filter(|r| r.month <= 12);
        let (y1_otc, y1_rx) = year1.fold((0.0, 0.0), |(otc, rx), r| {
            (otc + r.otc_manufacturer_revenue, rx + r.rx_revenue)
        });
        kpis.set_value("year1_otc_revenue", y1_otc);
        kpis.set_value("year1_rx_revenue", y1_rx);
        if let Some(last) = table.last() {
            kpis.set_value("total_otc_revenue", last.cumulative_otc_revenue);
            kpis.set_value("total_rx_revenue", last.cumulative_rx_revenue);
            kpis.set_value("total_marketing", last.cumulative_marketing);
        }

        kpis.set_month(
            "crossover_month",
            first_month_where(rows, |r| r.otc_manufacturer_revenue > r.rx_revenue),
        );
        let peak = rows
            .iter()
            .fold(None::<&RxOtcRow>, |best, r| match best {
                Some(b) if b.otc_packs >= r.otc_packs => Some(b),
                _ => Some(r),
            });
        kpis.set_month("peak_otc_month", peak.map(|r| r.month));
        kpis.insert("peak_otc_packs", peak.map(|r| r.otc_packs));

        let rx_start = table.first().map_or(0.0, |r| r.rx_packs);
        let rx_end = table.last().map_or(0.0, |r| r.rx_packs);
        kpis.set_value("rx_decline_total", safe_ratio(rx_start - rx_end, rx_start));

        for month in [12, 24, 36] {
            kpis.insert(
                format!("otc_share_tablets_m{month}"),
                value_at_month(rows, month, |r| r.otc_share_tablets),
            );
        }
        kpis.insert("peak_awareness", max_of(rows, |r| r.awareness));
        kpis.set_value("total_adjacent_lost", rows.iter().map(|r| r.adjacent_revenue_lost).sum());
        kpis.insert("otc_packs_month_12", value_at_month(rows, 12, |r| r.otc_packs));
        kpis.insert("rx_packs_month_12", value_at_month(rows, 12, |r| r.rx_packs));
        kpis.insert("avg_otc_price", mean_of(rows, |r| r.otc_price));
        kpis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn run(params: RxOtcParams, months: i32) -> ForecastTable<RxOtcRow> {
        RxOtcForecast::new(params)
            .forecast(&ForecastConfig::with_horizon(months))
            .unwrap()
    }

    #[test]
    fn test_otc_ramp_with_awareness() {
        let table = run(RxOtcParams::default(), 60);
        let first = table.row_at(1).unwrap();
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert!(first.otc_packs < 0.02 * 280_000.0, "month 1 packs {}", first.otc_packs);
        for m in 20..=36 {
            let row = table.row_at(m).unwrap();
            let ratio = row.otc_packs / (280_000.0 * row.season_factor);
            assert!(ratio > 0.95 && ratio < 1.10, "month {m} ratio {ratio}");
        }
    }

    #[test]
    fn test_awareness_floor_keeps_demand() {
        let table = run(
            RxOtcParams {
                awareness_ramp_months: 48,
                ..Default::default()
            },
            12,
        );
        let first = table.row_at(1).unwrap();
        assert!(first.awareness / 0.65 < 0.1);
        assert!(first.otc_packs > 0.0);
    }

    #[test]
    fn test_rx_retention_decay() {
        let table = run(RxOtcParams::default(), 60);
        let expected = 350_000.0 * (0.85 + 0.15 * 0.85);
        assert_abs_diff_eq!(table.row_at(24).unwrap().rx_packs, expected, epsilon = 1e-6);
        assert!(table.iter().all(|r| r.rx_packs >= 350_000.0 * 0.85));
    }

    #[test]
    fn test_seasonality_cycles() {
        let table = run(RxOtcParams::default(), 26);
        assert_eq!(table.row_at(1).unwrap().season_factor, 0.90);
        assert_eq!(table.row_at(11).unwrap().season_factor, 1.15);
        assert_eq!(table.row_at(13).unwrap().season_factor, 0.90);
        assert_eq!(table.row_at(26).unwrap().season_factor, 0.85);
    }

    #[test]
    fn test_decomposition_and_tablets() {
        let table = run(RxOtcParams::default(), 24);
        for row in table.iter() {
            assert_abs_diff_eq!(
                row.otc_from_new_patients + row.otc_from_rx_migration,
                row.otc_packs,
                epsilon = 1e-6
            );
            assert_abs_diff_eq!(row.total_tablets, row.rx_packs * 50.0 + row.otc_packs * 14.0, epsilon = 1e-6);
            assert!((0.0..=1.0).contains(&row.otc_share_tablets));
        }
    }

    #[test]
    fn test_marketing_taper_and_cannibalization() {
        let table = run(RxOtcParams::default(), 24);
        assert_eq!(table.row_at(18).unwrap().marketing_spend, 300_000.0);
        assert_eq!(table.row_at(19).unwrap().marketing_spend, 180_000.0);
        assert_abs_diff_eq!(table.row_at(9).unwrap().cannibalization_rate, 0.075, epsilon = 1e-12);
        assert_abs_diff_eq!(
            table.row_at(20).unwrap().adjacent_revenue_lost,
            7_750_000.0 * 0.15,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_crossover() {
        let forecast = RxOtcForecast::new(RxOtcParams::default());
        let table = forecast.forecast(&ForecastConfig::with_horizon(60)).unwrap();
        let kpis = forecast.summarize(&table);
        assert!(kpis.is_absent("crossover_month"));
        assert_abs_diff_eq!(kpis.value("peak_awareness").unwrap(), 0.65, epsilon = 1e-3);

        let small_rx = RxOtcForecast::new(RxOtcParams {
            rx_packs_per_month: 20_000.0,
            ..Default::default()
        });
        let table = small_rx.forecast(&ForecastConfig::with_horizon(60)).unwrap();
        let kpis = small_rx.summarize(&table);
        let month = kpis.month("crossover_month").unwrap();
        let row = table.row_at(month).unwrap();
        assert!(row.otc_manufacturer_revenue > row.rx_revenue);
    }

    #[test]
    fn test_share_kpis_absent_past_horizon() {
        let forecast = RxOtcForecast::new(RxOtcParams::default());
        let table = forecast.forecast(&ForecastConfig::with_horizon(18)).unwrap();
        let kpis = forecast.summarize(&table);
        assert!(kpis.value("otc_share_tablets_m12").is_some());
        assert!(kpis.is_absent("otc_share_tablets_m24"));
        assert!(kpis.is_absent("otc_share_tablets_m36"));
    }

    #[test]
    fn test_zero_ramps_degenerate() {
        let table = run(
            RxOtcParams {
                otc_ramp_months: 0,
                awareness_ramp_months: 0,
                rx_decline_months: 0,
                ..Default::default()
            },
            12,
        );
        let first = table.row_at(1).unwrap();
        assert_eq!(first.awareness, 0.65);
        assert_eq!(first.rx_packs, 350_000.0);
        let expected = 280_000.0 * 0.90 * price_volume_effect(-0.02, -0.8, 1.0 / 12.0);
        assert_abs_diff_eq!(first.otc_packs, expected, epsilon = 1e-6);
    }

    #[test]
    fn test_cumulative_recurrence() {
        let table = run(RxOtcParams::default(), 60);
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
