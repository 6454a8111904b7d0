//! Run configuration shared by all scenario families

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{ForecastError, Result};

/// Longest horizon accepted by [`ForecastConfig::validate`] (50 years)
pub const MAX_HORIZON_MONTHS: i32 = 600;

/// Configuration for a forecast run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Number of monthly rows to produce (history rows excluded)
    pub horizon_months: i32,

    /// Calendar month of model month 1 (or of LOE/launch for the generic
    /// entry families); only the month and year are used
    pub start_date: NaiveDate,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon_months: 60,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or_default(),
        }
    }
}

impl ForecastConfig {
    pub fn new(horizon_months: i32, start_date: NaiveDate) -> Self {
        Self {
            horizon_months,
            start_date,
        }
    }

    pub fn with_horizon(horizon_months: i32) -> Self {
        Self {
            horizon_months,
            ..Default::default()
        }
    }

    /// Check the horizon and return it as a row count
    pub fn validate(&self) -> Result<u32> {
        if self.horizon_months <= 0 {
            return Err(ForecastError::InvalidHorizon(self.horizon_months));
        }
        if self.horizon_months > MAX_HORIZON_MONTHS {
            return Err(ForecastError::HorizonTooLong {
                months: self.horizon_months,
                max: MAX_HORIZON_MONTHS,
            });
        }
        Ok(self.horizon_months as u32)
    }

    /// First day of the calendar month `offset` months after the start month
    ///
    /// Negative offsets address history rows before the start.
    pub fn date_at(&self, offset: i32) -> Result<NaiveDate> {
        let first = NaiveDate::from_ymd_opt(self.start_date.year(), self.start_date.month(), 1)
            .ok_or(ForecastError::DateOverflow(offset))?;
        let shifted = if offset >= 0 {
            first.checked_add_months(Months::new(offset.unsigned_abs()))
        } else {
            first.checked_sub_months(Months::new(offset.unsigned_abs()))
        };
        shifted.ok_or(ForecastError::DateOverflow(offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ForecastConfig::default();
        assert_eq!(config.horizon_months, 60);
        assert_eq!(config.validate().unwrap(), 60);
    }

    #[test]
    fn test_out_of_contract_horizons_fail() {
        assert!(matches!(
            ForecastConfig::with_horizon(0).validate(),
            Err(ForecastError::InvalidHorizon(0))
        ));
        assert!(matches!(
            ForecastConfig::with_horizon(-12).validate(),
            Err(ForecastError::InvalidHorizon(-12))
        ));
        assert!(matches!(
            ForecastConfig::with_horizon(601).validate(),
            Err(ForecastError::HorizonTooLong { months: 601, max: 600 })
        ));
    }

    #[test]
    fn test_date_at_offsets() {
        let config = ForecastConfig::new(60, NaiveDate::from_ymd_opt(2026, 5, 17).unwrap());
        assert_eq!(config.date_at(0).unwrap(), NaiveDate::from_ymd_opt(2026, 5, 1).unwrap());
        assert_eq!(config.date_at(8).unwrap(), NaiveDate::from_ymd_opt(2027, 1, 1).unwrap());
        assert_eq!(config.date_at(-12).unwrap(), NaiveDate::from_ymd_opt(2025, 5, 1).unwrap());
    }
}
