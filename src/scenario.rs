//! Scenario runner for single runs and what-if batches
//!
//! Holds one run configuration and executes any number of parameter
//! variants against it. Variants are independent, so batches run in
//! parallel on the rayon pool.

use log::info;
use rayon::prelude::*;

use crate::error::Result;
use crate::params::ScenarioParameters;
use crate::projection::ForecastConfig;
use crate::scenarios::{self, ForecastOutput};

/// Runs scenarios against a shared configuration
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::with_config(ForecastConfig::with_horizon(84));
///
/// let variants: Vec<_> = [0.10, 0.15, 0.20]
///     .iter()
///     .map(|&share| ScenarioParameters::GenericEntrant(GenericParams {
///         target_peak_share: share,
///         ..Default::default()
///     }))
///     .collect();
/// let outputs = runner.run_variants(&variants)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScenarioRunner {
    config: ForecastConfig,
}

impl ScenarioRunner {
    /// Runner with the default 60-month configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Run a single scenario
    pub fn run(&self, params: &ScenarioParameters) -> Result<ForecastOutput> {
        info!(
            "running {} scenario over {} months",
            params.kind(),
            self.config.horizon_months
        );
        scenarios::run(params, &self.config)
    }

    /// Run what-if variants in parallel, returning outputs in input order
    ///
    /// Fails with the first error in input order if any variant fails.
    pub fn run_variants(&self, variants: &[ScenarioParameters]) -> Result<Vec<ForecastOutput>> {
        info!(
            "running {} variants over {} months",
            variants.len(),
            self.config.horizon_months
        );
        variants
            .par_iter()
            .map(|params| scenarios::run(params, &self.config))
            .collect()
    }
}
