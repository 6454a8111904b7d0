//! Originator view of loss of exclusivity: revenue at risk
//!
//! The table starts with `history_months` pre-LOE rows (negative month
//! index) whose share jitters around the baseline with seeded noise, followed
//! by the post-LOE forecast from month 0. Cumulative columns run from LOE
//! and stay at 0 on history rows.

use chrono::NaiveDate;
use log::debug;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;

use super::Scenario;
use crate::curves::{compound_growth, decay_toward, exponential_erosion, linear_progress, safe_ratio};
use crate::error::Result;
use crate::kpi::{first_month_where, max_of, value_at_index, CoreMetrics, KpiSet};
use crate::params::{OriginatorParams, ScenarioKind, MAX_MONTH_PARAMETER};
use crate::projection::{ForecastConfig, ForecastState, ForecastTable, MonthlyRow};

/// Decay of the authorized generic's segment share per unit of decay speed
const AG_SHARE_DECAY_SCALE: f64 = 0.05;

/// Growth of the authorized generic's discount per unit of growth speed
const AG_DISCOUNT_GROWTH_SCALE: f64 = 0.03;

/// One month of the originator forecast
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OriginatorRow {
    // Timing
    /// Months since LOE; negative for history rows
    pub month: i32,
    pub date: NaiveDate,
    pub is_post_loe: bool,

    // Market and share
    pub total_market_trx: f64,
    pub originator_trx: f64,
    pub originator_share: f64,
    pub originator_price: f64,
    pub originator_revenue: f64,
    pub generic_segment_trx: f64,
    pub generic_segment_share: f64,
    pub substitution_rate: f64,

    // Revenue at risk
    pub counterfactual_revenue: f64,
    pub revenue_at_risk: f64,
    pub cumulative_revenue_at_risk: f64,

    // Authorized generic
    pub ag_trx: f64,
    pub ag_share: f64,
    pub ag_discount: f64,
    pub ag_revenue: f64,

    // Totals
    /// Originator plus authorized generic revenue
    pub revenue: f64,
    pub cogs: f64,
    pub fixed_costs: f64,
    pub operating_profit: f64,
    /// Since LOE
    pub cumulative_revenue: f64,
    pub cumulative_profit: f64,
}

impl MonthlyRow for OriginatorRow {
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

/// Share, price and substitution at one month
struct ShareState {
    share: f64,
    price: f64,
    substitution_rate: f64,
}

#[derive(Debug, Clone)]
pub struct OriginatorForecast {
    params: OriginatorParams,
}

impl OriginatorForecast {
    pub fn new(params: OriginatorParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &OriginatorParams {
        &self.params
    }

    /// Post-LOE share after erosion and substitution pull, and the price
    fn post_loe_state(&self, t: f64) -> ShareState {
        let p = &self.params;
        let mut share =
            exponential_erosion(t, p.baseline_share, p.floor_share, p.months_to_floor, p.erosion_speed);

        let substitution_rate = p.substitution.rate_at(t);
        if p.substitution.enabled {
            let additional = (share - p.floor_share) * substitution_rate * p.substitution_erosion_coefficient;
            share = p.floor_share.max(share - additional);
        }

        let reduction = p.price_reduction_pct * linear_progress(t, p.price_reduction_months as f64);
        ShareState {
            share,
            price: p.baseline_price * (1.0 - reduction),
            substitution_rate,
        }
    }

    /// Authorized generic `(trx, share, discount, revenue)` for a generic
    /// segment volume at month `t`
    fn authorized_generic(&self, t: f64, generic_trx: f64) -> (f64, f64, f64, f64) {
        let ag = &self.params.authorized_generic;
        let share = decay_toward(t, ag.share_of_generics, 0.0, ag.share_decay_speed * AG_SHARE_DECAY_SCALE)
            .max(ag.share_floor);
        let discount = if ag.discount_growth_speed > 0.0 {
            decay_toward(t, ag.price_discount, 1.0, ag.discount_growth_speed * AG_DISCOUNT_GROWTH_SCALE)
                .min(ag.discount_cap)
        } else {
            ag.price_discount
        };
        let trx = (generic_trx * share).floor();
        let price = self.params.baseline_price * (1.0 - discount);
        (trx, share, discount, trx * price)
    }
}

impl Scenario for OriginatorForecast {
    type Row = OriginatorRow;

    fn kind(&self) -> ScenarioKind {
        ScenarioKind::Originator
    }

    fn forecast(&self, config: &ForecastConfig) -> Result<ForecastTable<OriginatorRow>> {
        let horizon = config.validate()?;
        let p = &self.params;
        debug!(
            "originator forecast: {} history + {} months, baseline share {:.3}",
            p.history_months, horizon, p.baseline_share
        );

        let mut rng = ChaCha8Rng::seed_from_u64(p.history_noise.seed);
        let noise = Normal::new(0.0, p.history_noise.std_dev)?;

        let base_market = safe_ratio(p.baseline_monthly_trx, p.baseline_share);
        let history = p.history_months.min(MAX_MONTH_PARAMETER) as i32;
        let total_rows = history + horizon as i32;

        let mut table = ForecastTable::with_capacity(total_rows as usize);
        let mut state = ForecastState::new();
        let mut cumulative_rar = 0.0;

        for i in 0..total_rows {
            let month = i - history;
            let is_post_loe = month >= 0;
            let t = month as f64;
            let market = compound_growth(base_market, p.market_growth_annual, i);

            let (current, generic_share) = if is_post_loe {
                let current = self.post_loe_state(t);
                let generic_share = ((p.baseline_share - current.share) * p.generic_capture).max(0.0);
                (current, generic_share)
            } else {
                let jitter = noise.sample(&mut rng);
                let band = p.history_noise.band;
                let share = (p.baseline_share + jitter)
                    .clamp(p.baseline_share - band, p.baseline_share + band);
                let current = ShareState {
                    share,
                    price: p.baseline_price,
                    substitution_rate: 0.0,
                };
                (current, 0.0)
            };

            let originator_trx = (market * current.share).floor();
            let originator_revenue = originator_trx * current.price;
            let generic_segment_trx = (market * generic_share).floor();

            let counterfactual_revenue = (market * p.baseline_share).floor() * p.baseline_price;
            let revenue_at_risk = if is_post_loe {
                (counterfactual_revenue - originator_revenue).max(0.0)
            } else {
                0.0
            };
            cumulative_rar += revenue_at_risk;

            let (ag_trx, ag_share, ag_discount, ag_revenue) =
                if p.authorized_generic.enabled && is_post_loe {
                    self.authorized_generic(t, generic_segment_trx)
                } else {
                    (0.0, 0.0, 0.0, 0.0)
                };

            let revenue = originator_revenue + ag_revenue;
            let cogs = revenue * p.cogs_pct;
            let operating_profit = revenue - cogs - p.fixed_costs_monthly;
            let (cumulative_revenue, cumulative_profit) = if is_post_loe {
                state.record(month, revenue, operating_profit)
            } else {
                (0.0, 0.0)
            };

            table.push(OriginatorRow {
                month,
                date: config.date_at(month)?,
                is_post_loe,
                total_market_trx: market.floor(),
                originator_trx,
                originator_share: current.share,
                originator_price: current.price,
                originator_revenue,
                generic_segment_trx,
                generic_segment_share: generic_share,
                substitution_rate: current.substitution_rate,
                counterfactual_revenue,
                revenue_at_risk,
                cumulative_revenue_at_risk: cumulative_rar,
                ag_trx,
                ag_share,
                ag_discount,
                ag_revenue,
                revenue,
                cogs,
                fixed_costs: p.fixed_costs_monthly,
                operating_profit,
                cumulative_revenue,
                cumulative_profit,
            });
        }

        Ok(table)
    }

    fn summarize(&self, table: &ForecastTable<OriginatorRow>) -> KpiSet {
        let split = table.rows.iter().position(|r| r.is_post_loe).unwrap_or(table.len());
        let (pre, post) = table.rows.split_at(split);
        let mut kpis = KpiSet::new();
        CoreMetrics::from_rows(post).insert_into(&mut kpis);

        kpis.insert("pre_loe_peak_monthly_revenue", max_of(pre, |r| r.originator_revenue));
        let pre_annual: f64 = pre.iter().rev().take(12).map(|r| r.originator_revenue).sum();
        let year1: f64 = post.iter().take(12).map(|r| r.originator_revenue).sum();
        kpis.set_value("pre_loe_annual_revenue", pre_annual);
        kpis.set_value("year1_post_loe_revenue", year1);
        // 0 when there is no pre-LOE revenue to compare against
        let decline = if pre_annual > 0.0 { (1.0 - year1 / pre_annual) * 100.0 } else { 0.0 };
        kpis.set_value("year1_revenue_decline_pct", decline);

        kpis.set_value("total_revenue_at_risk", post.iter().map(|r| r.revenue_at_risk).sum());
        kpis.set_value(
            "cumulative_revenue_at_risk",
            post.last().map_or(0.0, |r| r.cumulative_revenue_at_risk),
        );
        kpis.set_value("total_post_loe_revenue", post.iter().map(|r| r.revenue).sum());
        kpis.set_value("total_ag_revenue", post.iter().map(|r| r.ag_revenue).sum());

        kpis.insert("share_at_month_12", value_at_index(post, 11, |r| r.originator_share));
        kpis.insert("share_at_month_24", value_at_index(post, 23, |r| r.originator_share));
        kpis.insert("final_share", post.last().map(|r| r.originator_share));
        kpis.set_month(
            "generic_overtake_month",
            first_month_where(post, |r| r.generic_segment_share > r.originator_share),
        );
        kpis
    }
}
