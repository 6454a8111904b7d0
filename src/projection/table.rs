//! Forecast output table and its tabular export

use std::io::Write;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Columns every scenario row carries
pub trait MonthlyRow: Serialize {
    /// Model month index (negative for history rows)
    fn month(&self) -> i32;
    fn date(&self) -> NaiveDate;
    /// Headline revenue of the forecasted product or portfolio
    fn revenue(&self) -> f64;
    fn operating_profit(&self) -> f64;
    fn cumulative_revenue(&self) -> f64;
    fn cumulative_profit(&self) -> f64;
}

/// Ordered monthly rows of one scenario run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastTable<R> {
    pub rows: Vec<R>,
}

impl<R> Default for ForecastTable<R> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<R> ForecastTable<R> {
    pub fn with_capacity(months: usize) -> Self {
        Self {
            rows: Vec::with_capacity(months),
        }
    }

    pub fn push(&mut self, row: R) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.rows.iter()
    }

    pub fn first(&self) -> Option<&R> {
        self.rows.first()
    }

    pub fn last(&self) -> Option<&R> {
        self.rows.last()
    }
}

/// Totals over a whole table
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TableSummary {
    pub months: usize,
    pub total_revenue: f64,
    pub total_profit: f64,
    pub final_cumulative_profit: f64,
}

impl<R: MonthlyRow> ForecastTable<R> {
    /// Row for model month `month`, if inside the table
    pub fn row_at(&self, month: i32) -> Option<&R> {
        self.rows.iter().find(|r| r.month() == month)
    }

    pub fn profit_stream(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.operating_profit()).collect()
    }

    pub fn summary(&self) -> TableSummary {
        TableSummary {
            months: self.rows.len(),
            total_revenue: self.rows.iter().map(|r| r.revenue()).sum(),
            total_profit: self.rows.iter().map(|r| r.operating_profit()).sum(),
            final_cumulative_profit: self.last().map(|r| r.cumulative_profit()).unwrap_or(0.0),
        }
    }

    /// Write the table as CSV; nested records become `field.index.subfield`
    /// columns
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut out = csv::Writer::from_writer(writer);
        let mut header_written = false;
        for row in &self.rows {
            let mut cells = Vec::new();
            flatten("", &serde_json::to_value(row)?, &mut cells);
            if !header_written {
                out.write_record(cells.iter().map(|(k, _)| k.as_str()))?;
                header_written = true;
            }
            out.write_record(cells.iter().map(|(_, v)| v.as_str()))?;
        }
        out.flush()?;
        Ok(())
    }

    pub fn write_csv_path(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        self.write_csv(std::io::BufWriter::new(file))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.rows)?)
    }
}

fn flatten(prefix: &str, value: &Value, cells: &mut Vec<(String, String)>) {
    let key = |child: &str| {
        if prefix.is_empty() {
            child.to_string()
        } else {
            format!("{prefix}.{child}")
        }
    };
    match value {
        Value::Object(map) => {
            for (name, child) in map {
                flatten(&key(name), child, cells);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                flatten(&key(&i.to_string()), child, cells);
            }
        }
        Value::Null => cells.push((prefix.to_string(), String::new())),
        Value::String(s) => cells.push((prefix.to_string(), s.clone())),
        other => cells.push((prefix.to_string(), other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Channel {
        name: &'static str,
        packs: f64,
    }

    #[derive(Serialize)]
    struct Row {
        month: i32,
        date: NaiveDate,
        revenue: f64,
        profit: f64,
        cum_revenue: f64,
        cum_profit: f64,
        breakeven: Option<i32>,
        channels: Vec<Channel>,
    }

    impl MonthlyRow for Row {
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
            self.profit
        }
        fn cumulative_revenue(&self) -> f64 {
            self.cum_revenue
        }
        fn cumulative_profit(&self) -> f64 {
            self.cum_profit
        }
    }

    fn table() -> ForecastTable<Row> {
        let mut table: ForecastTable<Row> = ForecastTable::with_capacity(2);
        for (m, rev, profit) in [(1, 100.0, -20.0), (2, 150.0, 40.0)] {
            let (cum_revenue, cum_profit) = match table.last() {
                Some(prev) => (prev.cum_revenue + rev, prev.cum_profit + profit),
                None => (rev, profit),
            };
            table.push(Row {
                month: m,
                date: NaiveDate::from_ymd_opt(2026, m as u32, 1).unwrap(),
                revenue: rev,
                profit,
                cum_revenue,
                cum_profit,
                breakeven: None,
                channels: vec![Channel { name: "online", packs: 10.0 * m as f64 }],
            });
        }
        table
    }

    #[test]
    fn test_csv_flattens_nested_columns() {
        let mut buf = Vec::new();
        table().write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "month,date,revenue,profit,cum_revenue,cum_profit,breakeven,channels.0.name,channels.0.packs"
        );
        assert_eq!(lines.next().unwrap(), "1,2026-01-01,100.0,-20.0,100.0,-20.0,,online,10.0");
    }

    #[test]
    fn test_summary_and_lookup() {
        let t = table();
        let summary = t.summary();
        assert_eq!(summary.months, 2);
        assert_eq!(summary.total_revenue, 250.0);
        assert_eq!(summary.final_cumulative_profit, 20.0);
        assert_eq!(t.row_at(2).map(|r| r.revenue), Some(150.0));
        assert!(t.row_at(3).is_none());
        assert_eq!(t.profit_stream(), vec![-20.0, 40.0]);
    }

    #[test]
    fn test_json_export() {
        let json = table().to_json().unwrap();
        assert!(json.contains("\"cum_profit\": 20.0"));
    }
}
