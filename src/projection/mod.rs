//! Forecast run configuration, running state and output tables

mod config;
mod irr;
mod state;
mod table;

pub use config::{ForecastConfig, MAX_HORIZON_MONTHS};
pub use irr::{annual_irr, monthly_irr};
pub use state::{ForecastState, RunningSum};
pub use table::{ForecastTable, MonthlyRow, TableSummary};
