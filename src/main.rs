//! Pharma Forecast CLI
//!
//! Runs one scenario from a family's defaults or a JSON parameter file and
//! prints its KPIs.
//!
//! Usage: `pharma_forecast [--kind KIND | --params FILE] [--months N] [--start YYYY-MM-DD]
//!         [--tenders FILE] [--csv FILE] [--json FILE]`

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use log::info;

use pharma_forecast::params::loader::{load_scenario, load_tender_targets};
use pharma_forecast::{ForecastConfig, ScenarioKind, ScenarioParameters, ScenarioRunner};

#[derive(Parser, Debug)]
#[command(name = "pharma_forecast")]
#[command(about = "Monthly forecast of a pharmaceutical market scenario")]
struct Args {
    /// Scenario family run with its default parameters
    #[arg(long, conflicts_with = "params")]
    kind: Option<ScenarioKind>,

    /// JSON parameter file tagged with `"kind"`
    #[arg(long)]
    params: Option<PathBuf>,

    /// Forecast horizon in months
    #[arg(long = "months", default_value = "60")]
    months: i32,

    /// Calendar month of model month 1
    #[arg(long, default_value = "2026-01-01")]
    start: NaiveDate,

    /// Tender panel CSV replacing the default panel (generic entrant only)
    #[arg(long)]
    tenders: Option<PathBuf>,

    /// Write the monthly table as CSV
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write the monthly table as JSON
    #[arg(long)]
    json: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    let mut params = match (&args.params, args.kind) {
        (Some(path), _) => load_scenario(path)
            .with_context(|| format!("failed to load parameters from {}", path.display()))?,
        (None, Some(kind)) => ScenarioParameters::default_for(kind),
        (None, None) => bail!("pass either --kind or --params"),
    };

    if let Some(path) = &args.tenders {
        let targets = load_tender_targets(path)
            .with_context(|| format!("failed to load tender panel from {}", path.display()))?;
        match &mut params {
            ScenarioParameters::GenericEntrant(p) => {
                info!("using {} tender targets from {}", targets.len(), path.display());
                p.tender.targets = targets;
            }
            other => bail!("--tenders only applies to generic_entrant, not {}", other.kind()),
        }
    }

    let runner = ScenarioRunner::with_config(ForecastConfig::new(args.months, args.start));
    let output = runner
        .run(&params)
        .with_context(|| format!("{} forecast failed", params.kind()))?;

    println!("Pharma Forecast v{}", env!("CARGO_PKG_VERSION"));
    println!("{}\n", "=".repeat(40));
    let summary = output.table.summary();
    println!("Scenario: {}", output.kind());
    println!("  Months:        {}", summary.months);
    println!("  Total revenue: {:.0}", summary.total_revenue);
    println!("  Total profit:  {:.0}", summary.total_profit);
    println!();

    println!("{:<36} {:>18}", "KPI", "Value");
    println!("{}", "-".repeat(55));
    for (name, value) in output.kpis.iter() {
        let shown = if value.is_absent() { "n/a".to_string() } else { value.to_string() };
        println!("{:<36} {:>18}", name, shown);
    }

    if let Some(path) = &args.csv {
        output
            .table
            .write_csv_path(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("\nMonthly table written to {}", path.display());
    }
    if let Some(path) = &args.json {
        let json = output.table.to_json()?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        println!("Monthly table written to {}", path.display());
    }

    Ok(())
}
