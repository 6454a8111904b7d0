//! Load scenario parameters (JSON) and tender panels (CSV)

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::Reader;
use log::debug;

use super::ScenarioParameters;
use crate::curves::TenderTarget;
use crate::error::Result;

/// Raw CSV row of a tender panel file
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    name: String,
    covered_lives_mio: f64,
    payer_share: f64,
    win_probability: f64,
    tier: String,
}

impl CsvRow {
    fn to_target(self) -> Result<TenderTarget> {
        Ok(TenderTarget::new(
            &self.name,
            self.covered_lives_mio,
            self.payer_share,
            self.win_probability,
            self.tier.parse()?,
        ))
    }
}

/// Load a tagged scenario document and sanitize it
pub fn load_scenario<P: AsRef<Path>>(path: P) -> Result<ScenarioParameters> {
    let file = File::open(path.as_ref())?;
    debug!("loading scenario from {}", path.as_ref().display());
    load_scenario_from_reader(BufReader::new(file))
}

pub fn load_scenario_from_reader<R: Read>(reader: R) -> Result<ScenarioParameters> {
    let params: ScenarioParameters = serde_json::from_reader(reader)?;
    params.sanitize()
}

/// Load tender targets from a CSV file with header
/// `name,covered_lives_mio,payer_share,win_probability,tier`
pub fn load_tender_targets<P: AsRef<Path>>(path: P) -> Result<Vec<TenderTarget>> {
    let file = File::open(path.as_ref())?;
    let targets = load_tender_targets_from_reader(file)?;
    debug!("loaded {} tender targets from {}", targets.len(), path.as_ref().display());
    Ok(targets)
}

pub fn load_tender_targets_from_reader<R: Read>(reader: R) -> Result<Vec<TenderTarget>> {
    let mut reader = Reader::from_reader(reader);
    let mut targets = Vec::new();

    for result in reader.deserialize() {
        let row: CsvRow = result?;
        targets.push(row.to_target()?);
    }

    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::PriorityTier;
    use crate::error::ForecastError;
    use crate::params::ScenarioKind;

    #[test]
    fn test_load_tender_targets() {
        let data = "name,covered_lives_mio,payer_share,win_probability,tier\n\
                    TK,11.5,0.158,0.5,target\n\
                    hkk,0.9,0.012,0.2,Secondary\n";
        let targets = load_tender_targets_from_reader(data.as_bytes()).unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].name, "TK");
        assert_eq!(targets[1].tier, PriorityTier::Secondary);
    }

    #[test]
    fn test_unknown_tier_is_an_error() {
        let data = "name,covered_lives_mio,payer_share,win_probability,tier\nX,1,0.1,0.5,gold\n";
        let err = load_tender_targets_from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, ForecastError::UnknownTier(ref t) if t == "gold"));
    }

    #[test]
    fn test_load_scenario_sanitizes() {
        let json = r#"{"kind": "originator", "floor_share": 1.4}"#;
        let params = load_scenario_from_reader(json.as_bytes()).unwrap();
        assert_eq!(params.kind(), ScenarioKind::Originator);
        match params {
            ScenarioParameters::Originator(p) => assert_eq!(p.floor_share, 1.0),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let err = load_scenario_from_reader(r#"{"kind": "biosimilar"}"#.as_bytes()).unwrap_err();
        assert!(matches!(err, ForecastError::Json(_)));
    }
}
