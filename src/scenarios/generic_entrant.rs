//! Generic entrant view of loss of exclusivity: market opportunity
//!
//! Entrant volume is decomposed into three channels that are reported
//! separately: organic S-curve uptake, pharmacy substitution of the
//! remaining originator volume, and tender volume on top of organic.

use chrono::NaiveDate;
use log::debug;
use serde::Serialize;

use super::Scenario;
use crate::curves::{compound_growth, month_index, safe_ratio, tender_expected_value, SCurve};
use crate::error::Result;
use crate::kpi::{decomposition_shares, max_of, mean_of, CoreMetrics, KpiSet};
use crate::params::{GenericParams, ScenarioKind};
use crate::projection::{monthly_irr, ForecastConfig, ForecastState, ForecastTable, MonthlyRow};

/// One month of the entrant forecast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenericRow {
    // Timing
    /// Months since LOE
    pub month: i32,
    pub date: NaiveDate,
    /// `None` before launch
    pub months_since_launch: Option<i32>,
    pub is_launched: bool,

    // Market
    pub total_market_trx: f64,
    /// Share of all generics together
    pub total_generic_share: f64,

    // Volume decomposition
    pub organic_share: f64,
    pub organic_trx: f64,
    pub substitution_trx: f64,
    pub tender_trx: f64,
    pub my_trx: f64,
    pub my_share: f64,
    pub substitution_rate: f64,
    pub tender_factor: f64,
    pub tender_expected_share: f64,

    // Revenue and profit
    pub price: f64,
    pub revenue: f64,
    pub cogs: f64,
    pub gross_profit: f64,
    pub sga: f64,
    pub fixed_costs: f64,
    pub launch_cost: f64,
    pub operating_profit: f64,
    pub cumulative_revenue: f64,
    pub cumulative_profit: f64,
    pub breakeven_reached: bool,
}

impl MonthlyRow for GenericRow {
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

/// Volumes of one launched month
#[derive(Debug, Clone, Copy, Default)]
struct EntrantVolume {
    organic_share: f64,
    organic_trx: f64,
    substitution_rate: f64,
    substitution_trx: f64,
    tender_factor: f64,
    tender_expected_share: f64,
    tender_trx: f64,
}

impl EntrantVolume {
    fn total(&self) -> f64 {
        self.organic_trx + self.substitution_trx + self.tender_trx
    }
}

#[derive(Debug, Clone)]
pub struct GenericEntrantForecast {
    params: GenericParams,
}

impl GenericEntrantForecast {
    pub fn new(params: GenericParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &GenericParams {
        &self.params
    }

    /// Volume channels `t` months after launch in a market of `market` TRx
    fn launched_volume(&self, t: i32, market: f64) -> EntrantVolume {
        let p = &self.params;
        let tf = t as f64;
        let uptake = SCurve::GENERIC_ORGANIC.progress(tf, p.months_to_peak);

        let effective_peak = p.target_peak_share.min(p.segment_peak_share);
        let organic_share = effective_peak * uptake * p.organic_take_rate;
        let organic_trx = (market * organic_share).floor();

        let substitution_rate = p.substitution.rate_at(tf);
        let substitution_trx = if p.substitution.enabled {
            let originator_remaining =
                market * p.originator_reference_share * p.originator_residual_floor.max(1.0 - uptake);
            (originator_remaining * substitution_rate * p.substitution_capture).floor()
        } else {
            0.0
        };

        let boost = tender_expected_value(t, &p.tender);
        let tender_trx = (organic_trx * (boost.factor - 1.0)).floor();

        EntrantVolume {
            organic_share,
            organic_trx,
            substitution_rate,
            substitution_trx,
            tender_factor: boost.factor,
            tender_expected_share: boost.expected_share,
            tender_trx,
        }
    }

    /// Net price `t` months after launch
    fn price_at(&self, t: i32) -> f64 {
        let p = &self.params;
        let erosion = (p.monthly_price_erosion * t as f64).min(p.max_price_erosion);
        (p.originator_price * (1.0 - p.price_discount - erosion)).max(p.price_floor)
    }
}

impl Scenario for GenericEntrantForecast {
    type Row = GenericRow;

    fn kind(&self) -> ScenarioKind {
        ScenarioKind::GenericEntrant
    }

    fn forecast(&self, config: &ForecastConfig) -> Result<ForecastTable<GenericRow>> {
        let horizon = config.validate()? as i32;
        let p = &self.params;
        debug!(
            "generic entrant forecast: {} months, launch offset {}, target share {:.3}",
            horizon, p.launch_month_offset, p.target_peak_share
        );

        let mut table = ForecastTable::with_capacity(horizon as usize);
        let mut state = ForecastState::new();

        for month in 0..horizon {
            let since_launch = month - month_index(p.launch_month_offset);
            let is_launched = since_launch >= 0;
            let market = compound_growth(p.total_market_monthly_trx, p.market_growth_annual, month);
            let total_generic_share =
                SCurve::GENERIC_SEGMENT.at(month as f64, p.segment_peak_share, p.segment_months_to_peak);

            let (volume, price) = if is_launched {
                (self.launched_volume(since_launch, market), self.price_at(since_launch))
            } else {
                (EntrantVolume::default(), 0.0)
            };
            let my_trx = volume.total();
            let revenue = my_trx * price;

            let cogs = revenue * p.cogs_pct;
            let sga = if is_launched {
                p.sga_monthly
            } else {
                p.sga_monthly * p.pre_launch_sga_ratio
            };
            let launch_cost = if since_launch == 0 { p.launch_investment } else { 0.0 };
            let gross_profit = revenue - cogs;
            let operating_profit = gross_profit - sga - p.fixed_costs_monthly - launch_cost;
            let (cumulative_revenue, cumulative_profit) = state.record(month, revenue, operating_profit);

            table.push(GenericRow {
                month,
                date: config.date_at(month)?,
                months_since_launch: is_launched.then_some(since_launch),
                is_launched,
                total_market_trx: market.floor(),
                total_generic_share,
                organic_share: volume.organic_share,
                organic_trx: volume.organic_trx,
                substitution_trx: volume.substitution_trx,
                tender_trx: volume.tender_trx,
                my_trx,
                my_share: safe_ratio(my_trx, market),
                substitution_rate: volume.substitution_rate,
                tender_factor: if is_launched { volume.tender_factor } else { 1.0 },
                tender_expected_share: volume.tender_expected_share,
                price,
                revenue,
                cogs,
                gross_profit,
                sga,
                fixed_costs: p.fixed_costs_monthly,
                launch_cost,
                operating_profit,
                cumulative_revenue,
                cumulative_profit,
                breakeven_reached: cumulative_profit > 0.0,
            });
        }

        Ok(table)
    }

    fn summarize(&self, table: &ForecastTable<GenericRow>) -> KpiSet {
        let launched_from = table.rows.iter().position(|r| r.is_launched).unwrap_or(table.len());
        let launched = &table.rows[launched_from..];
        let mut kpis = KpiSet::new();

        CoreMetrics::from_rows(launched).insert_into(&mut kpis);
        kpis.insert("peak_share", max_of(launched, |r| r.my_share));
        let priced: Vec<&GenericRow> = launched.iter().filter(|r| r.price > 0.0).collect();
        kpis.insert("avg_price", mean_of(&priced, |r| r.price));

        let totals = [
            launched.iter().map(|r| r.organic_trx).sum::<f64>(),
            launched.iter().map(|r| r.substitution_trx).sum::<f64>(),
            launched.iter().map(|r| r.tender_trx).sum::<f64>(),
        ];
        let shares = decomposition_shares(&totals);
        kpis.set_value("volume_organic_pct", shares[0]);
        kpis.set_value("volume_substitution_pct", shares[1]);
        kpis.set_value("volume_tender_pct", shares[2]);
        kpis.set_value("total_trx", totals.iter().sum());

        kpis.insert("irr", monthly_irr(&table.profit_stream()));
        kpis
    }
}
