//! Error types for forecast runs, parameter loading and table export

use thiserror::Error;

/// Crate result type
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors surfaced to callers of the forecast engine
///
/// Finite but out-of-range knobs never end up here: they are clamped or
/// degenerate to a terminal curve value. Only genuinely out-of-contract
/// inputs (non-positive horizons, NaN parameters) and I/O failures do.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("forecast horizon must be positive, got {0} months")]
    InvalidHorizon(i32),

    #[error("forecast horizon of {months} months exceeds the supported maximum of {max}")]
    HorizonTooLong { months: i32, max: i32 },

    #[error("parameter `{field}` is not a finite number")]
    NonFiniteParameter { field: &'static str },

    #[error("calendar date out of range at month offset {0}")]
    DateOverflow(i32),

    #[error("unknown tender priority tier `{0}`")]
    UnknownTier(String),

    #[error("unknown scenario kind `{0}`")]
    UnknownScenarioKind(String),

    #[error("invalid noise distribution: {0}")]
    Noise(#[from] rand_distr::NormalError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
