//! Fit the earnings regression on a survey extract and print the coefficients
//!
//! Usage: cargo run --bin fit_model -- --survey puf.csv

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde::Serialize;
use ss_mtr::earnings::{EarningsModel, RegressionCoefficients};
use ss_mtr::population::load_population;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "fit_model", about = "Fit the lifetime earnings regression")]
struct Args {
    /// Tax-unit survey extract (CSV)
    #[arg(long)]
    survey: PathBuf,
}

#[derive(Serialize)]
struct FitResponse {
    population: usize,
    sample_size: usize,
    simulation_size: usize,
    coefficients: RegressionCoefficients,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let population = load_population(&args.survey)
        .map_err(|e| anyhow!("{}", e))
        .with_context(|| format!("Failed to load survey {}", args.survey.display()))?;

    let coefficients = EarningsModel::fit_population(&population).context("Regression failed")?;

    let response = FitResponse {
        population: population.len(),
        sample_size: population.iter().filter(|p| p.in_fit_sample()).count(),
        simulation_size: population.iter().filter(|p| p.in_simulation()).count(),
        coefficients,
    };
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
