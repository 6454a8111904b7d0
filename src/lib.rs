//! Pharma Forecast - monthly forecast engine for pharmaceutical market scenarios
//!
//! This library provides:
//! - Shared curve primitives (S-curves, erosion, ramps, price lifecycle, supply, tenders)
//! - Indication and channel composition of demand
//! - Six scenario families: originator defence, generic entry, brand competition,
//!   mass-market and specialty Rx-to-OTC switches, multi-product launch portfolio
//! - KPI aggregation over forecast tables
//! - Parallel what-if runs across parameter variants

pub mod composer;
pub mod curves;
pub mod error;
pub mod kpi;
pub mod params;
pub mod projection;
pub mod scenario;
pub mod scenarios;

// Re-export commonly used types
pub use error::{ForecastError, Result};
pub use kpi::{KpiSet, KpiValue};
pub use params::{ScenarioKind, ScenarioParameters};
pub use projection::{ForecastConfig, ForecastTable, MonthlyRow};
pub use scenario::ScenarioRunner;
pub use scenarios::{ForecastOutput, Scenario, ScenarioTable};
