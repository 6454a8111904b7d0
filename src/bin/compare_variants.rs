//! Sweep one knob of a scenario and compare the KPIs of every variant
//!
//! Usage: `compare_variants --kind KIND [--values 0.1,0.2] [--months N] [--output FILE]`
//!
//! Swept knob per family:
//! - originator: `floor_share`
//! - generic_entrant: `target_peak_share`
//! - brand_competition: `brand.target_peak_share`
//! - rx_otc_switch: `otc_peak_packs_per_month`
//! - specialty_otc_switch: `brand_price_premium`
//! - portfolio: `field_force.synergy_second_launch`

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use pharma_forecast::{ForecastConfig, ScenarioKind, ScenarioParameters, ScenarioRunner};

#[derive(Parser, Debug)]
#[command(name = "compare_variants")]
#[command(about = "Run what-if variants of one scenario in parallel and tabulate their KPIs")]
struct Args {
    /// Scenario family to sweep
    #[arg(long)]
    kind: ScenarioKind,

    /// Knob values; defaults to a grid around the family's default
    #[arg(long, value_delimiter = ',')]
    values: Vec<f64>,

    /// Forecast horizon in months
    #[arg(long = "months", default_value = "60")]
    months: i32,

    /// Output CSV path
    #[arg(long, default_value = "variant_comparison.csv")]
    output: PathBuf,
}

fn knob_name(kind: ScenarioKind) -> &'static str {
    match kind {
        ScenarioKind::Originator => "floor_share",
        ScenarioKind::GenericEntrant => "target_peak_share",
        ScenarioKind::BrandCompetition => "brand.target_peak_share",
        ScenarioKind::RxOtcSwitch => "otc_peak_packs_per_month",
        ScenarioKind::SpecialtyOtcSwitch => "brand_price_premium",
        ScenarioKind::Portfolio => "field_force.synergy_second_launch",
    }
}

fn default_grid(kind: ScenarioKind) -> Vec<f64> {
    match kind {
        ScenarioKind::Originator => vec![0.08, 0.12, 0.16, 0.20],
        ScenarioKind::GenericEntrant => vec![0.05, 0.10, 0.15, 0.20],
        ScenarioKind::BrandCompetition => vec![0.15, 0.20, 0.25, 0.30],
        ScenarioKind::RxOtcSwitch => vec![200_000.0, 280_000.0, 360_000.0],
        ScenarioKind::SpecialtyOtcSwitch => vec![1.4, 1.8, 2.2],
        ScenarioKind::Portfolio => vec![0.5, 0.7, 0.9, 1.0],
    }
}

/// Default parameters of `kind` with the swept knob set to `value`
fn variant(kind: ScenarioKind, value: f64) -> ScenarioParameters {
    let mut params = ScenarioParameters::default_for(kind);
    match &mut params {
        ScenarioParameters::Originator(p) => p.floor_share = value,
        ScenarioParameters::GenericEntrant(p) => p.target_peak_share = value,
        ScenarioParameters::BrandCompetition(p) => p.brand.target_peak_share = value,
        ScenarioParameters::RxOtcSwitch(p) => p.otc_peak_packs_per_month = value,
        ScenarioParameters::SpecialtyOtcSwitch(p) => p.brand_price_premium = value,
        ScenarioParameters::Portfolio(p) => p.field_force.synergy_second_launch = value,
    }
    params
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let start = Instant::now();

    let values = if args.values.is_empty() {
        default_grid(args.kind)
    } else {
        args.values.clone()
    };
    let variants = values
        .iter()
        .map(|&v| variant(args.kind, v).sanitize())
        .collect::<pharma_forecast::Result<Vec<_>>>()
        .context("invalid knob value")?;

    println!(
        "Running {} {} variants over {} months...",
        variants.len(),
        args.kind,
        args.months
    );
    let runner = ScenarioRunner::with_config(ForecastConfig::with_horizon(args.months));
    let outputs = runner.run_variants(&variants).context("variant run failed")?;
    info!("variants complete in {:?}", start.elapsed());

    let kpi_names: Vec<String> = outputs
        .first()
        .map(|o| o.kpis.iter().map(|(name, _)| name.to_string()).collect())
        .unwrap_or_default();

    let mut writer = csv::Writer::from_path(&args.output)
        .with_context(|| format!("failed to create {}", args.output.display()))?;
    let mut header = vec![knob_name(args.kind).to_string()];
    header.extend(kpi_names.iter().cloned());
    writer.write_record(&header)?;

    for (value, output) in values.iter().zip(&outputs) {
        let mut record = vec![value.to_string()];
        record.extend(kpi_names.iter().map(|name| {
            output
                .kpis
                .get(name)
                .and_then(|v| v.as_f64())
                .map(|v| v.to_string())
                .unwrap_or_default()
        }));
        writer.write_record(&record)?;
    }
    writer.flush()?;

    println!("Output written to {}", args.output.display());

    // Print a short comparison
    println!("\n{:>34} {:>18} {:>18}", knob_name(args.kind), "total_revenue", "total_profit");
    for (value, output) in values.iter().zip(&outputs) {
        let summary = output.table.summary();
        println!(
            "{:>34} {:>18.0} {:>18.0}",
            value, summary.total_revenue, summary.total_profit
        );
    }

    println!("\nTotal time: {:?}", start.elapsed());
    Ok(())
}
