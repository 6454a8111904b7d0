//! Scenario families
//!
//! Each family is a month-by-month loop over the shared curve primitives
//! producing a [`ForecastTable`] of its own row type, plus a reducer turning
//! that table into a [`KpiSet`].

mod brand_competition;
mod generic_entrant;
mod originator;
mod portfolio;
mod rx_otc;
mod specialty_otc;

use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::kpi::KpiSet;
use crate::params::{ScenarioKind, ScenarioParameters};
use crate::projection::{ForecastConfig, ForecastTable, MonthlyRow, TableSummary};

pub use brand_competition::{BrandCompetitionForecast, BrandRow};
pub use generic_entrant::{GenericEntrantForecast, GenericRow};
pub use originator::{OriginatorForecast, OriginatorRow};
pub use portfolio::{gtm_cost, GtmCost, PortfolioForecast, PortfolioRow, ProductRow};
pub use rx_otc::{RxOtcForecast, RxOtcRow};
pub use specialty_otc::{ChannelRow, SpecialtyOtcForecast, SpecialtyOtcRow};

/// A scenario family bound to its parameters
pub trait Scenario {
    type Row: MonthlyRow;

    fn kind(&self) -> ScenarioKind;

    /// Run the monthly loop; deterministic for a given parameter set
    fn forecast(&self, config: &ForecastConfig) -> Result<ForecastTable<Self::Row>>;

    /// Reduce a table produced by [`Scenario::forecast`] to its KPIs
    fn summarize(&self, table: &ForecastTable<Self::Row>) -> KpiSet;
}

/// Output table of any scenario family
#[derive(Debug, Clone)]
pub enum ScenarioTable {
    Originator(ForecastTable<OriginatorRow>),
    GenericEntrant(ForecastTable<GenericRow>),
    BrandCompetition(ForecastTable<BrandRow>),
    RxOtcSwitch(ForecastTable<RxOtcRow>),
    SpecialtyOtcSwitch(ForecastTable<SpecialtyOtcRow>),
    Portfolio(ForecastTable<PortfolioRow>),
}

macro_rules! each_table {
    ($self:expr, $table:ident => $body:expr) => {
        match $self {
            ScenarioTable::Originator($table) => $body,
            ScenarioTable::GenericEntrant($table) => $body,
            ScenarioTable::BrandCompetition($table) => $body,
            ScenarioTable::RxOtcSwitch($table) => $body,
            ScenarioTable::SpecialtyOtcSwitch($table) => $body,
            ScenarioTable::Portfolio($table) => $body,
        }
    };
}

impl ScenarioTable {
    pub fn kind(&self) -> ScenarioKind {
        match self {
            ScenarioTable::Originator(_) => ScenarioKind::Originator,
            ScenarioTable::GenericEntrant(_) => ScenarioKind::GenericEntrant,
            ScenarioTable::BrandCompetition(_) => ScenarioKind::BrandCompetition,
            ScenarioTable::RxOtcSwitch(_) => ScenarioKind::RxOtcSwitch,
            ScenarioTable::SpecialtyOtcSwitch(_) => ScenarioKind::SpecialtyOtcSwitch,
            ScenarioTable::Portfolio(_) => ScenarioKind::Portfolio,
        }
    }

    pub fn len(&self) -> usize {
        each_table!(self, t => t.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn summary(&self) -> TableSummary {
        each_table!(self, t => t.summary())
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        each_table!(self, t => t.write_csv(writer))
    }

    pub fn write_csv_path(&self, path: &Path) -> Result<()> {
        each_table!(self, t => t.write_csv_path(path))
    }

    pub fn to_json(&self) -> Result<String> {
        each_table!(self, t => t.to_json())
    }
}

/// Table and KPIs of one scenario run
#[derive(Debug, Clone)]
pub struct ForecastOutput {
    pub table: ScenarioTable,
    pub kpis: KpiSet,
}

impl ForecastOutput {
    pub fn kind(&self) -> ScenarioKind {
        self.table.kind()
    }
}

fn forecast_and_summarize<S: Scenario>(
    scenario: &S,
    config: &ForecastConfig,
) -> Result<(ForecastTable<S::Row>, KpiSet)> {
    let table = scenario.forecast(config)?;
    let kpis = scenario.summarize(&table);
    Ok((table, kpis))
}

/// Run one scenario of any family
///
/// Parameters are sanitized first: out-of-range knobs are clamped and
/// non-finite ones rejected with `ForecastError::NonFiniteParameter`.
pub fn run(params: &ScenarioParameters, config: &ForecastConfig) -> Result<ForecastOutput> {
    let params = params.clone().sanitize()?;
    let (table, kpis) = match &params {
        ScenarioParameters::Originator(p) => {
            let (t, k) = forecast_and_summarize(&OriginatorForecast::new(p.clone()), config)?;
            (ScenarioTable::Originator(t), k)
        }
        ScenarioParameters::GenericEntrant(p) => {
            let (t, k) = forecast_and_summarize(&GenericEntrantForecast::new(p.clone()), config)?;
            (ScenarioTable::GenericEntrant(t), k)
        }
        ScenarioParameters::BrandCompetition(p) => {
            let (t, k) = forecast_and_summarize(&BrandCompetitionForecast::new(p.clone()), config)?;
            (ScenarioTable::BrandCompetition(t), k)
        }
        ScenarioParameters::RxOtcSwitch(p) => {
            let (t, k) = forecast_and_summarize(&RxOtcForecast::new(p.clone()), config)?;
            (ScenarioTable::RxOtcSwitch(t), k)
        }
        ScenarioParameters::SpecialtyOtcSwitch(p) => {
            let (t, k) = forecast_and_summarize(&SpecialtyOtcForecast::new(p.clone()), config)?;
            (ScenarioTable::SpecialtyOtcSwitch(t), k)
        }
        ScenarioParameters::Portfolio(p) => {
            let (t, k) = forecast_and_summarize(&PortfolioForecast::new(p.clone()), config)?;
            (ScenarioTable::Portfolio(t), k)
        }
    };
    Ok(ForecastOutput { table, kpis })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ForecastError;

    #[test]
    fn test_every_family_runs_with_defaults() {
        let config = ForecastConfig::with_horizon(24);
        for kind in ScenarioKind::ALL {
            let output = run(&ScenarioParameters::default_for(kind), &config).unwrap();
            assert_eq!(output.kind(), kind);
            assert!(!output.table.is_empty());
            assert!(output.kpis.get("total_revenue").is_some(), "{kind} lacks total_revenue");
        }
    }

    #[test]
    fn test_runs_are_deterministic() {
        let config = ForecastConfig::with_horizon(36);
        for kind in ScenarioKind::ALL {
            let params = ScenarioParameters::default_for(kind);
            let a = run(&params, &config).unwrap();
            let b = run(&params, &config).unwrap();
            assert_eq!(a.table.to_json().unwrap(), b.table.to_json().unwrap());
            assert_eq!(a.kpis, b.kpis);
        }
    }

    #[test]
    fn test_invalid_horizon_fails_fast() {
        let params = ScenarioParameters::default_for(ScenarioKind::Portfolio);
        let err = run(&params, &ForecastConfig::with_horizon(0)).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidHorizon(0)));
    }

    #[test]
    fn test_csv_export_of_nested_rows() {
        let params = ScenarioParameters::default_for(ScenarioKind::SpecialtyOtcSwitch);
        let output = run(&params, &ForecastConfig::with_horizon(3)).unwrap();
        let mut buf = Vec::new();
        output.table.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.starts_with("month,date,"));
        assert!(header.contains("channels.1.packs"));
        assert_eq!(text.lines().count(), 4);
    }
}
