//! Typed scenario parameters
//!
//! One struct per scenario family, each `#[serde(default)]` so a partial
//! JSON document only overrides the knobs it names. `sanitize` clamps
//! out-of-range values (with a warning) and rejects non-finite ones.

mod brand;
mod generic;
pub mod loader;
mod otc;
mod portfolio;

use std::fmt;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};
use crate::projection::MAX_HORIZON_MONTHS;

pub use brand::{
    BrandCompetitionParams, BrandMarketParams, BrandProfile, CompetitorProfile, IndicationUplifts,
};
pub use generic::{AuthorizedGeneric, GenericParams, HistoryNoise, OriginatorParams};
pub use loader::{
    load_scenario, load_scenario_from_reader, load_tender_targets, load_tender_targets_from_reader,
};
pub use otc::{
    AdjacentCategory, ChannelParams, CompetitorMigration, RxOtcParams, Seasonality,
    SpecialtyOtcParams, TelemedChannel,
};
pub use portfolio::{FieldForceParams, PortfolioParams, ProductParams};

/// Reject NaN and infinities
pub(crate) fn finite(field: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ForecastError::NonFiniteParameter { field })
    }
}

/// Share-like value clamped to [0, 1]
pub(crate) fn fraction(field: &'static str, value: f64) -> Result<f64> {
    let value = finite(field, value)?;
    let clamped = value.clamp(0.0, 1.0);
    if clamped != value {
        warn!("parameter `{field}` = {value} outside [0, 1], clamped to {clamped}");
    }
    Ok(clamped)
}

/// Volume, price or cost floored at 0
pub(crate) fn non_negative(field: &'static str, value: f64) -> Result<f64> {
    let value = finite(field, value)?;
    if value < 0.0 {
        warn!("parameter `{field}` = {value} is negative, floored at 0");
        return Ok(0.0);
    }
    Ok(value)
}

/// Largest accepted month count or model month
///
/// Well past any forecast horizon, and small enough that month arithmetic
/// in `i32` cannot wrap.
pub(crate) const MAX_MONTH_PARAMETER: u32 = 10 * MAX_HORIZON_MONTHS as u32;

/// Month count or model month capped at `MAX_MONTH_PARAMETER`
pub(crate) fn months(field: &'static str, value: u32) -> u32 {
    if value > MAX_MONTH_PARAMETER {
        warn!("parameter `{field}` = {value} months exceeds {MAX_MONTH_PARAMETER}, capped");
        return MAX_MONTH_PARAMETER;
    }
    value
}

/// Scenario family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    Originator,
    GenericEntrant,
    BrandCompetition,
    RxOtcSwitch,
    SpecialtyOtcSwitch,
    Portfolio,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 6] = [
        ScenarioKind::Originator,
        ScenarioKind::GenericEntrant,
        ScenarioKind::BrandCompetition,
        ScenarioKind::RxOtcSwitch,
        ScenarioKind::SpecialtyOtcSwitch,
        ScenarioKind::Portfolio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioKind::Originator => "originator",
            ScenarioKind::GenericEntrant => "generic_entrant",
            ScenarioKind::BrandCompetition => "brand_competition",
            ScenarioKind::RxOtcSwitch => "rx_otc_switch",
            ScenarioKind::SpecialtyOtcSwitch => "specialty_otc_switch",
            ScenarioKind::Portfolio => "portfolio",
        }
    }
}

impl FromStr for ScenarioKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        ScenarioKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| ForecastError::UnknownScenarioKind(s.to_string()))
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully populated parameters of one scenario run, tagged by family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioParameters {
    Originator(OriginatorParams),
    GenericEntrant(GenericParams),
    BrandCompetition(BrandCompetitionParams),
    RxOtcSwitch(RxOtcParams),
    SpecialtyOtcSwitch(SpecialtyOtcParams),
    Portfolio(PortfolioParams),
}

impl ScenarioParameters {
    /// Default parameter set of a family
    pub fn default_for(kind: ScenarioKind) -> Self {
        match kind {
            ScenarioKind::Originator => ScenarioParameters::Originator(Default::default()),
            ScenarioKind::GenericEntrant => ScenarioParameters::GenericEntrant(Default::default()),
            ScenarioKind::BrandCompetition => ScenarioParameters::BrandCompetition(Default::default()),
            ScenarioKind::RxOtcSwitch => ScenarioParameters::RxOtcSwitch(Default::default()),
            ScenarioKind::SpecialtyOtcSwitch => {
                ScenarioParameters::SpecialtyOtcSwitch(Default::default())
            }
            ScenarioKind::Portfolio => ScenarioParameters::Portfolio(Default::default()),
        }
    }

    pub fn kind(&self) -> ScenarioKind {
        match self {
            ScenarioParameters::Originator(_) => ScenarioKind::Originator,
            ScenarioParameters::GenericEntrant(_) => ScenarioKind::GenericEntrant,
            ScenarioParameters::BrandCompetition(_) => ScenarioKind::BrandCompetition,
            ScenarioParameters::RxOtcSwitch(_) => ScenarioKind::RxOtcSwitch,
            ScenarioParameters::SpecialtyOtcSwitch(_) => ScenarioKind::SpecialtyOtcSwitch,
            ScenarioParameters::Portfolio(_) => ScenarioKind::Portfolio,
        }
    }

    pub fn sanitize(self) -> Result<Self> {
        Ok(match self {
            ScenarioParameters::Originator(p) => ScenarioParameters::Originator(p.sanitize()?),
            ScenarioParameters::GenericEntrant(p) => ScenarioParameters::GenericEntrant(p.sanitize()?),
            ScenarioParameters::BrandCompetition(p) => {
                ScenarioParameters::BrandCompetition(p.sanitize()?)
            }
            ScenarioParameters::RxOtcSwitch(p) => ScenarioParameters::RxOtcSwitch(p.sanitize()?),
            ScenarioParameters::SpecialtyOtcSwitch(p) => {
                ScenarioParameters::SpecialtyOtcSwitch(p.sanitize()?)
            }
            ScenarioParameters::Portfolio(p) => ScenarioParameters::Portfolio(p.sanitize()?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_clamps() {
        assert_eq!(fraction("x", 1.5).unwrap(), 1.0);
        assert_eq!(fraction("x", -0.5).unwrap(), 0.0);
        assert_eq!(fraction("x", 0.3).unwrap(), 0.3);
        assert!(fraction("x", f64::INFINITY).is_err());
    }

    #[test]
    fn test_months_cap_keeps_i32_arithmetic_safe() {
        assert_eq!(months("x", 24), 24);
        assert_eq!(months("x", u32::MAX), MAX_MONTH_PARAMETER);
        assert!(i32::try_from(MAX_MONTH_PARAMETER).is_ok());
    }

    #[test]
    fn test_non_negative_floors() {
        assert_eq!(non_negative("x", -10.0).unwrap(), 0.0);
        assert_eq!(non_negative("x", 10.0).unwrap(), 10.0);
    }

    #[test]
    fn test_kind_tag_round_trip() {
        for kind in ScenarioKind::ALL {
            let params = ScenarioParameters::default_for(kind);
            assert_eq!(params.kind(), kind);
            let json = serde_json::to_string(&params).unwrap();
            assert!(json.starts_with(&format!("{{\"kind\":\"{kind}\"")));
            let back: ScenarioParameters = serde_json::from_str(&json).unwrap();
            assert_eq!(back, params);
        }
    }

    #[test]
    fn test_kind_from_cli_spelling() {
        assert_eq!("rx-otc-switch".parse::<ScenarioKind>().unwrap(), ScenarioKind::RxOtcSwitch);
        assert_eq!("Portfolio".parse::<ScenarioKind>().unwrap(), ScenarioKind::Portfolio);
        assert!(matches!(
            "biosimilar".parse::<ScenarioKind>(),
            Err(ForecastError::UnknownScenarioKind(_))
        ));
    }

    #[test]
    fn test_tagged_partial_document() {
        let params: ScenarioParameters =
            serde_json::from_str(r#"{"kind": "rx_otc_switch", "awareness_peak": 0.8}"#).unwrap();
        match params {
            ScenarioParameters::RxOtcSwitch(p) => {
                assert_eq!(p.awareness_peak, 0.8);
                assert_eq!(p.otc_peak_packs_per_month, 280_000.0);
            }
            other => panic!("unexpected kind {}", other.kind()),
        }
    }
}
