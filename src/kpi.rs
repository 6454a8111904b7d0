//! KPI aggregation over forecast tables
//!
//! Every KPI is derived from table rows alone; no curve is re-evaluated.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::curves::safe_ratio;
use crate::error::Result;
use crate::projection::MonthlyRow;

/// A single metric value
///
/// `Absent` marks a condition never met within the horizon (breakeven,
/// crossover, a share at a month past the end). It serializes as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum KpiValue {
    Value(f64),
    Month(i32),
    Absent,
}

impl KpiValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            KpiValue::Value(v) => Some(*v),
            KpiValue::Month(m) => Some(*m as f64),
            KpiValue::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, KpiValue::Absent)
    }
}

impl fmt::Display for KpiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KpiValue::Value(v) => write!(f, "{v:.4}"),
            KpiValue::Month(m) => write!(f, "{m}"),
            KpiValue::Absent => f.write_str(""),
        }
    }
}

impl From<Option<f64>> for KpiValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(KpiValue::Absent, KpiValue::Value)
    }
}

impl From<Option<i32>> for KpiValue {
    fn from(month: Option<i32>) -> Self {
        month.map_or(KpiValue::Absent, KpiValue::Month)
    }
}

/// Named summary metrics of one forecast run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct KpiSet {
    values: BTreeMap<String, KpiValue>,
}

impl KpiSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<KpiValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn set_value(&mut self, name: impl Into<String>, value: f64) {
        self.insert(name, KpiValue::Value(value));
    }

    pub fn set_month(&mut self, name: impl Into<String>, month: Option<i32>) {
        self.insert(name, month);
    }

    pub fn get(&self, name: &str) -> Option<&KpiValue> {
        self.values.get(name)
    }

    /// Numeric value; `None` when missing or absent
    pub fn value(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(KpiValue::as_f64)
    }

    pub fn month(&self, name: &str) -> Option<i32> {
        match self.get(name) {
            Some(KpiValue::Month(m)) => Some(*m),
            _ => None,
        }
    }

    /// Present in the set but explicitly absent
    pub fn is_absent(&self, name: &str) -> bool {
        self.get(name).is_some_and(KpiValue::is_absent)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &KpiValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Metrics shared by every scenario family, gathered in one pass
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CoreMetrics {
    pub year1_revenue: f64,
    pub year1_profit: f64,
    pub total_revenue: f64,
    pub total_profit: f64,
    pub peak_revenue: f64,
    pub peak_revenue_month: Option<i32>,
    /// First month with positive cumulative profit
    pub breakeven_month: Option<i32>,
    pub cumulative_revenue: f64,
    pub cumulative_profit: f64,
}

impl CoreMetrics {
    /// Reduce `rows`; the first twelve rows form year 1
    pub fn from_rows<R: MonthlyRow>(rows: &[R]) -> Self {
        let mut metrics = CoreMetrics::default();
        for (i, row) in rows.iter().enumerate() {
            let revenue = row.revenue();
            let profit = row.operating_profit();
            if i < 12 {
                metrics.year1_revenue += revenue;
                metrics.year1_profit += profit;
            }
            metrics.total_revenue += revenue;
            metrics.total_profit += profit;
            if metrics.peak_revenue_month.is_none() || revenue > metrics.peak_revenue {
                metrics.peak_revenue = revenue;
                metrics.peak_revenue_month = Some(row.month());
            }
            if metrics.breakeven_month.is_none() && row.cumulative_profit() > 0.0 {
                metrics.breakeven_month = Some(row.month());
            }
            metrics.cumulative_revenue = row.cumulative_revenue();
            metrics.cumulative_profit = row.cumulative_profit();
        }
        metrics
    }

    pub fn insert_into(&self, kpis: &mut KpiSet) {
        kpis.set_value("year1_revenue", self.year1_revenue);
        kpis.set_value("year1_profit", self.year1_profit);
        kpis.set_value("total_revenue", self.total_revenue);
        kpis.set_value("total_profit", self.total_profit);
        kpis.set_value("peak_monthly_revenue", self.peak_revenue);
        kpis.set_month("peak_revenue_month", self.peak_revenue_month);
        kpis.set_month("breakeven_month", self.breakeven_month);
        kpis.set_value("cumulative_revenue", self.cumulative_revenue);
        kpis.set_value("cumulative_profit", self.cumulative_profit);
    }
}

/// Model month of the first row satisfying `condition`
pub fn first_month_where<R: MonthlyRow>(rows: &[R], condition: impl Fn(&R) -> bool) -> Option<i32> {
    rows.iter().find(|r| condition(r)).map(|r| r.month())
}

/// Value of `field` at model month `month`, absent outside the table
pub fn value_at_month<R: MonthlyRow>(rows: &[R], month: i32, field: impl Fn(&R) -> f64) -> Option<f64> {
    rows.iter().find(|r| r.month() == month).map(field)
}

/// Value of `field` in the `index`-th row (0-based), absent past the end
pub fn value_at_index<R>(rows: &[R], index: usize, field: impl Fn(&R) -> f64) -> Option<f64> {
    rows.get(index).map(field)
}

pub fn max_of<R>(rows: &[R], field: impl Fn(&R) -> f64) -> Option<f64> {
    rows.iter().map(field).fold(None, |acc, v| match acc {
        Some(best) if best >= v => Some(best),
        _ => Some(v),
    })
}

pub fn mean_of<R>(rows: &[R], field: impl Fn(&R) -> f64) -> Option<f64> {
    if rows.is_empty() {
        return None;
    }
    Some(rows.iter().map(field).sum::<f64>() / rows.len() as f64)
}

/// Each channel's share of the channel totals; all zeros when nothing flowed
pub fn decomposition_shares(totals: &[f64]) -> Vec<f64> {
    let sum: f64 = totals.iter().sum();
    totals.iter().map(|t| safe_ratio(*t, sum)).collect()
}
