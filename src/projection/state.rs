//! Running state carried from one forecast month to the next

/// A running sum over monthly flows
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningSum(f64);

impl RunningSum {
    /// Add this month's flow and return the new cumulative value
    pub fn add(&mut self, flow: f64) -> f64 {
        self.0 += flow;
        self.0
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

/// Cumulative state of a single forecast run
///
/// Rows must be recorded in increasing month order: month `t`'s cumulative
/// fields are month `t-1`'s plus month `t`'s flows.
#[derive(Debug, Clone, Default)]
pub struct ForecastState {
    /// Model month of the last recorded row
    pub month: Option<i32>,

    pub revenue: RunningSum,

    pub profit: RunningSum,
}

impl ForecastState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one month's revenue and operating profit, returning the
    /// cumulative revenue and profit after it
    pub fn record(&mut self, month: i32, revenue: f64, operating_profit: f64) -> (f64, f64) {
        debug_assert!(self.month.map_or(true, |prev| month > prev));
        self.month = Some(month);
        (self.revenue.add(revenue), self.profit.add(operating_profit))
    }

    pub fn cumulative_revenue(&self) -> f64 {
        self.revenue.value()
    }

    pub fn cumulative_profit(&self) -> f64 {
        self.profit.value()
    }
}
