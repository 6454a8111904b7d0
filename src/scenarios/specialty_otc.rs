//! Rx-to-OTC switch of a stigma-sensitive specialty product, distributed
//! through several retail channels
//!
//! Compared with the mass-market switch this adds a pre-switch awareness
//! baseline, a brand/generic OTC split with a price premium, patient
//! migration from an Rx-only competitor, disruption of a telemedicine
//! channel and closure of the treatment gap.

use chrono::NaiveDate;
use log::debug;
use serde::Serialize;

use super::rx_otc::{price_volume_effect, season_factor};
use super::Scenario;
use crate::composer::{brand_generic_split, normalize_partition, propensity_multiplier, trended_share};
use crate::curves::{
    annual_compounding, disruption_decay, linear_progress, retention_decay, safe_ratio, SCurve,
};
use crate::error::Result;
use crate::kpi::{first_month_where, max_of, value_at_month, CoreMetrics, KpiSet};
use crate::params::{ScenarioKind, SpecialtyOtcParams};
use crate::projection::{ForecastConfig, ForecastState, ForecastTable, MonthlyRow, RunningSum};

/// One distribution channel in one month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelRow {
    pub name: String,
    pub share: f64,
    pub packs: f64,
    pub retail_revenue: f64,
    pub manufacturer_revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecialtyOtcRow {
    // Timing
    pub month: i32,
    pub date: NaiveDate,
    pub season_factor: f64,
    pub awareness: f64,

    // Rx channel
    pub rx_packs: f64,
    pub rx_price_per_pack: f64,
    pub rx_revenue: f64,
    pub rx_tablets: f64,

    // OTC channel
    pub otc_packs: f64,
    pub otc_price_per_tablet: f64,
    pub otc_retail_revenue: f64,
    pub otc_manufacturer_revenue: f64,
    pub otc_tablets: f64,
    pub channels: Vec<ChannelRow>,

    // Brand vs generic OTC
    pub otc_brand_share: f64,
    pub otc_brand_packs: f64,
    pub otc_generic_packs: f64,

    // Volume sources
    pub otc_from_new_patients: f64,
    pub otc_from_rx_migration: f64,
    pub otc_from_competitor: f64,
    /// Residual of the OTC volume not explained by the other sources
    pub otc_from_other: f64,

    // Combined
    pub total_tablets: f64,
    pub otc_share_tablets: f64,

    // Telemedicine
    pub telemed_revenue: f64,
    pub telemed_lost: f64,

    // Profitability
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

    // Treatment gap
    pub newly_treated_cumulative: f64,
    pub treatment_rate_effective: f64,
}

impl MonthlyRow for SpecialtyOtcRow {
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
pub struct SpecialtyOtcForecast {
    params: SpecialtyOtcParams,
}

impl SpecialtyOtcForecast {
    pub fn new(params: SpecialtyOtcParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &SpecialtyOtcParams {
        &self.params
    }

    /// Awareness rising from the pre-switch baseline to the peak
    fn awareness_at(&self, m: f64) -> f64 {
        let p = &self.params;
        let progress = SCurve::AWARENESS.progress(m, p.awareness_ramp_months);
        p.awareness_baseline + (p.awareness_peak - p.awareness_baseline) * progress
    }

    fn rx_price_per_pack(&self) -> f64 {
        let p = &self.params;
        (p.rx_brand_share * p.rx_price_brand + (1.0 - p.rx_brand_share) * p.rx_price_generic)
            * p.rx_pack_size as f64
    }

    fn channel_rows(&self, m: i32, otc_packs: f64, price_per_tablet: f64) -> Vec<ChannelRow> {
        let p = &self.params;
        let raw: Vec<f64> = p
            .channels
            .iter()
            .map(|c| trended_share(c.base_share, c.share_trend_annual, m))
            .collect();
        let shares = normalize_partition(&raw);

        p.channels
            .iter()
            .zip(shares)
            .map(|(channel, share)| {
                let packs = otc_packs
                    * share
                    * propensity_multiplier(
                        channel.discretion_factor,
                        p.discretion_reference,
                        p.discretion_sensitivity,
                    );
                let retail_revenue = packs * price_per_tablet * p.otc_pack_size as f64;
                let manufacturer_share =
                    (1.0 - channel.margin_pct - channel.distribution_cost_pct).max(0.0);
                ChannelRow {
                    name: channel.name.clone(),
                    share,
                    packs,
                    retail_revenue,
                    manufacturer_revenue: retail_revenue * manufacturer_share,
                }
            })
            .collect()
    }
}

impl Scenario for SpecialtyOtcForecast {
    type Row = SpecialtyOtcRow;

    fn kind(&self) -> ScenarioKind {
        ScenarioKind::SpecialtyOtcSwitch
    }

    fn forecast(&self, config: &ForecastConfig) -> Result<ForecastTable<SpecialtyOtcRow>> {
        let horizon = config.validate()? as i32;
        let p = &self.params;
        debug!(
            "specialty otc forecast: {} months across {} channels",
            horizon,
            p.channels.len()
        );

        let rx_price_per_pack = self.rx_price_per_pack();
        let untreated = p.prevalence * (1.0 - p.treatment_rate);
        let competitor = &p.competitor_migration;
        let telemed = &p.telemed;

        let mut table = ForecastTable::with_capacity(horizon as usize);
        let mut state = ForecastState::new();
        let mut otc_total = RunningSum::default();
        let mut rx_total = RunningSum::default();
        let mut marketing_total = RunningSum::default();

        for m in 1..=horizon {
            let mf = m as f64;
            let years = mf / 12.0;
            let season = season_factor(&p.seasonality, m);
            let awareness = self.awareness_at(mf);

            // Rx
            let rx_packs = retention_decay(mf, p.rx_packs_per_month, p.rx_decline_rate, p.rx_decline_months);
            let rx_revenue = rx_packs * rx_price_per_pack;

            // OTC demand before channel effects
            let otc_base = SCurve::OTC_VOLUME.at(mf, p.otc_peak_packs_per_month, p.otc_ramp_months);
            let awareness_factor = if p.awareness_peak > 0.0 {
                p.awareness_floor_ratio.max(awareness / p.awareness_peak)
            } else {
                1.0
            };
            let otc_demand = otc_base * season * awareness_factor;
            let migration = SCurve::MIGRATION.at(
                mf,
                competitor.monthly_packs * competitor.switch_share,
                competitor.migration_months,
            );
            let otc_raw = (otc_demand * price_volume_effect(p.price_trend_annual, p.price_elasticity, years))
                .max(0.0)
                + migration;

            let price_per_tablet = annual_compounding(p.otc_price_per_tablet, p.price_trend_annual, years);
            let channels = self.channel_rows(m, otc_raw, price_per_tablet);
            let otc_packs: f64 = channels.iter().map(|c| c.packs).sum();
            let mut otc_retail_revenue: f64 = channels.iter().map(|c| c.retail_revenue).sum();
            let mut otc_manufacturer_revenue: f64 = channels.iter().map(|c| c.manufacturer_revenue).sum();

            // Brand premium on top of the generic OTC price
            let split = brand_generic_split(
                otc_packs,
                p.brand_otc_share,
                p.brand_share_trend,
                p.brand_share_floor,
                years,
            );
            let brand_bonus = split.brand_volume
                * price_per_tablet
                * (p.brand_price_premium - 1.0)
                * p.otc_pack_size as f64;
            let avg_manufacturer_share = if otc_retail_revenue > 0.0 {
                otc_manufacturer_revenue / otc_retail_revenue
            } else {
                p.fallback_manufacturer_share
            };
            otc_manufacturer_revenue += brand_bonus * avg_manufacturer_share;
            otc_retail_revenue += brand_bonus;

            let otc_from_new_patients = otc_packs * p.new_patient_share;
            let otc_from_rx_migration = otc_packs * (1.0 - p.new_patient_share) * p.rx_migration_factor;

            let rx_tablets = rx_packs * p.rx_pack_size as f64;
            let otc_tablets = otc_packs * p.otc_pack_size as f64;
            let total_tablets = rx_tablets + otc_tablets;

            let telemed_revenue = disruption_decay(
                mf,
                telemed.monthly_revenue,
                telemed.decline_rate,
                telemed.decline_months,
                telemed.retention,
            );

            let marketing_spend =
                if mf > p.awareness_ramp_months as f64 * p.marketing_taper_after {
                    p.marketing_monthly * p.marketing_maintenance_ratio
                } else {
                    p.marketing_monthly
                };

            let revenue = rx_revenue + otc_manufacturer_revenue;
            let cogs = revenue * p.cogs_pct;
            let gross_profit = revenue - cogs;
            let operating_profit = gross_profit - marketing_spend;
            let (cumulative_revenue, cumulative_profit) = state.record(m, revenue, operating_profit);

            let newly_treated_cumulative =
                untreated * p.gap_closure_rate * linear_progress(mf, p.gap_closure_months as f64);

            table.push(SpecialtyOtcRow {
                month: m,
                date: config.date_at(m - 1)?,
                season_factor: season,
                awareness,
                rx_packs,
                rx_price_per_pack,
                rx_revenue,
                rx_tablets,
                otc_packs,
                otc_price_per_tablet: price_per_tablet,
                otc_retail_revenue,
                otc_manufacturer_revenue,
                otc_tablets,
                channels,
                otc_brand_share: split.brand_share,
                otc_brand_packs: split.brand_volume,
                otc_generic_packs: split.generic_volume,
                otc_from_new_patients,
                otc_from_rx_migration,
                otc_from_competitor: migration,
                otc_from_other: otc_packs - otc_from_new_patients - otc_from_rx_migration - migration,
                total_tablets,
                otc_share_tablets: safe_ratio(otc_tablets, total_tablets),
                telemed_revenue,
                telemed_lost: telemed.monthly_revenue - telemed_revenue,
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
                newly_treated_cumulative,
                treatment_rate_effective: p.treatment_rate
                    + safe_ratio(newly_treated_cumulative, p.prevalence),
            });
        }

        Ok(table)
    }

    fn summarize(&self, table: &ForecastTable<SpecialtyOtcRow>) -> KpiSet {
        let rows = &table.rows;
        let mut kpis = KpiSet::new();
        CoreMetrics::from_rows(rows).insert_into(&mut kpis);

        let (y1_otc, y1_rx) = rows
            .iter()
            .filter(|r| r.month <= 12)
            .fold((0.0, 0.0), |(otc, rx), r| (otc + r.otc_manufacturer_revenue, rx + r.rx_revenue));
        kpis.set_value("year1_otc_revenue", y1_otc);
        kpis.set_value("year1_rx_revenue", y1_rx);
        if let Some(last) = table.last() {
            kpis.set_value("total_otc_revenue", last.cumulative_otc_revenue);
            kpis.set_value("total_rx_revenue", last.cumulative_rx_revenue);
            kpis.set_value("total_marketing", last.cumulative_marketing);
            kpis.set_value("treatment_rate_final", last.treatment_rate_effective);
            kpis.set_value("newly_treated_total", last.newly_treated_cumulative);
        }

        kpis.set_month(
            "crossover_month",
            first_month_where(rows, |r| r.otc_manufacturer_revenue > r.rx_revenue),
        );
        let peak = rows.iter().fold(None::<&SpecialtyOtcRow>, |best, r| match best {
            Some(b) if b.otc_packs >= r.otc_packs => Some(b),
            _ => Some(r),
        });
        kpis.set_month("peak_otc_month", peak.map(|r| r.month));
        kpis.insert("peak_otc_packs", peak.map(|r| r.otc_packs));

        let rx_start = table.first().map_or(0.0, |r| r.rx_packs);
        let rx_end = table.last().map_or(0.0, |r| r.rx_packs);
        kpis.set_value("rx_decline_total", safe_ratio(rx_start - rx_end, rx_start));

        // The first channel gaining share is the one the channel KPIs follow
        let growth_channel = self.params.channels.iter().position(|c| c.share_trend_annual > 0.0);
        for month in [12, 24] {
            kpis.insert(
                format!("otc_share_m{month}"),
                value_at_month(rows, month, |r| r.otc_share_tablets),
            );
            kpis.insert(
                format!("brand_share_m{month}"),
                value_at_month(rows, month, |r| r.otc_brand_share),
            );
            let channel_share = growth_channel.and_then(|i| {
                value_at_month(rows, month, |r| r.channels.get(i).map_or(0.0, |c| c.share))
            });
            kpis.insert(format!("growth_channel_share_m{month}"), channel_share);
        }

        kpis.set_value("telemed_lost_total", rows.iter().map(|r| r.telemed_lost).sum());
        kpis.insert("peak_awareness", max_of(rows, |r| r.awareness));
        kpis
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn run(params: SpecialtyOtcParams, months: i32) -> ForecastTable<SpecialtyOtcRow> {
        SpecialtyOtcForecast::new(params)
            .forecast(&ForecastConfig::with_horizon(months))
            .unwrap()
    }

    #[test]
    fn test_awareness_starts_from_baseline() {
        let table = run(SpecialtyOtcParams::default(), 36);
        let first = table.row_at(1).unwrap().awareness;
        assert!(first >= 0.60 && first < 0.65, "awareness {first}");
        assert_abs_diff_eq!(table.row_at(36).unwrap().awareness, 0.75, epsilon = 1e-3);
    }

    #[test]
    fn test_channel_partition_and_discretion() {
        let table = run(SpecialtyOtcParams::default(), 60);
        for row in table.iter() {
            let total: f64 = row.channels.iter().map(|c| c.share).sum();
            assert_abs_diff_eq!(total, 1.0, epsilon = 1e-9);
        }
        // Online ordering is anonymous and gets more volume per unit of share
        let row = table.row_at(12).unwrap();
        let per_share = |i: usize| row.channels[i].packs / row.channels[i].share;
        assert!(per_share(1) > per_share(0));
        assert!(per_share(0) > per_share(2));
        assert!(table.row_at(24).unwrap().channels[1].share > row.channels[1].share);
    }

    #[test]
    fn test_manufacturer_revenue_includes_brand_premium() {
        let table = run(SpecialtyOtcParams::default(), 12);
        let row = table.row_at(12).unwrap();
        let channel_mfr: f64 = row.channels.iter().map(|c| c.manufacturer_revenue).sum();
        assert!(row.otc_manufacturer_revenue > channel_mfr);
        assert_abs_diff_eq!(row.otc_brand_packs + row.otc_generic_packs, row.otc_packs, epsilon = 1e-6);
    }

    #[test]
    fn test_brand_share_floor() {
        let table = run(
            SpecialtyOtcParams {
                brand_share_trend: -0.30,
                ..Default::default()
            },
            36,
        );
        assert_abs_diff_eq!(table.row_at(36).unwrap().otc_brand_share, 0.15, epsilon = 1e-12);
    }

    #[test]
    fn test_telemed_and_treatment_gap() {
        let table = run(SpecialtyOtcParams::default(), 60);
        let last = table.last().unwrap();
        assert!(last.telemed_revenue > 4_500_000.0 * 0.15);
        assert!(last.telemed_revenue < 4_500_000.0 * 0.5);
        let newly = 5_000_000.0 * 0.67 * 0.08;
        assert_abs_diff_eq!(last.newly_treated_cumulative, newly, epsilon = 1e-6);
        assert_abs_diff_eq!(last.treatment_rate_effective, 0.33 + newly / 5_000_000.0, epsilon = 1e-12);
        assert_abs_diff_eq!(
            table.row_at(18).unwrap().newly_treated_cumulative,
            newly / 2.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_competitor_migration_feeds_otc() {
        let without = run(
            SpecialtyOtcParams {
                competitor_migration: crate::params::CompetitorMigration {
                    switch_share: 0.0,
                    ..Default::default()
                },
                ..Default::default()
            },
            24,
        );
        let with = run(SpecialtyOtcParams::default(), 24);
        let m = 24;
        assert!(with.row_at(m).unwrap().otc_packs > without.row_at(m).unwrap().otc_packs);
        assert_eq!(without.row_at(m).unwrap().otc_from_competitor, 0.0);
    }

    #[test]
    fn test_kpis() {
        let forecast = SpecialtyOtcForecast::new(SpecialtyOtcParams::default());
        let table = forecast.forecast(&ForecastConfig::with_horizon(60)).unwrap();
        let kpis = forecast.summarize(&table);
        let crossover = kpis.month("crossover_month").unwrap();
        let row = table.row_at(crossover).unwrap();
        assert!(row.otc_manufacturer_revenue > row.rx_revenue);
        assert!(kpis.value("growth_channel_share_m24").unwrap() > kpis.value("growth_channel_share_m12").unwrap());
        assert!(kpis.value("telemed_lost_total").unwrap() > 0.0);
        assert!(kpis.value("rx_decline_total").unwrap() > 0.0);

        let short = forecast.forecast(&ForecastConfig::with_horizon(12)).unwrap();
        assert!(forecast.summarize(&short).is_absent("brand_share_m24"));
    }

    #[test]
    fn test_zero_ramps_degenerate() {
        let table = run(
            SpecialtyOtcParams {
                otc_ramp_months: 0,
                awareness_ramp_months: 0,
                rx_decline_months: 0,
                gap_closure_months: 0,
                ..Default::default()
            },
            6,
        );
        let first = table.row_at(1).unwrap();
        assert_eq!(first.awareness, 0.75);
        assert_eq!(first.rx_packs, 217_000.0);
        assert_abs_diff_eq!(first.newly_treated_cumulative, 5_000_000.0 * 0.67 * 0.08, epsilon = 1e-6);
    }

    #[test]
    fn test_cumulative_recurrence() {
        let rows = run(SpecialtyOtcParams::default(), 48).rows;
        for w in rows.windows(2) {
            assert_abs_diff_eq!(
                w[1].cumulative_profit,
                w[0].cumulative_profit + w[1].operating_profit,
                epsilon = 1e-6
            );
        }
    }
}
