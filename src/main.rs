//! Social Security MTR CLI
//!
//! Runs the full pipeline against an external benefit calculator and writes
//! the household MTR table.
//!
//! Defaults come from the environment (MTR_ADJUSTMENT, MTR_WORKERS,
//! MTR_BASE_YEAR, MTR_RETIREMENT_AGE, MTR_TIMEOUT_SECS); flags override them.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde::Serialize;
use ss_mtr::calculator::{CalculatorConfig, ExternalCalculator};
use ss_mtr::mtr::write_households;
use ss_mtr::pipeline::{MissingBenefitResult, Pipeline, PipelineConfig};
use ss_mtr::population::load_population;
use ss_mtr::wages::load_wage_index;
use ss_mtr::RegressionCoefficients;
use std::env;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Debug, Parser)]
#[command(name = "ss_mtr", version, about = "Social Security marginal tax rates")]
struct Args {
    /// Tax-unit survey extract (CSV)
    #[arg(long)]
    survey: PathBuf,

    /// Average wage series with an Avg_Wage column (CSV)
    #[arg(long)]
    wages: PathBuf,

    /// Benefit calculator executable
    #[arg(long)]
    calculator: PathBuf,

    /// Output CSV for household MTRs
    #[arg(long, default_value = "SS_MTR_nofuture_PUF.csv")]
    output: PathBuf,

    /// Earnings perturbation added to the current year
    #[arg(long)]
    adjustment: Option<u64>,

    /// Concurrent calculator invocations
    #[arg(long)]
    workers: Option<usize>,

    /// Per-invocation timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Print a JSON run summary to stdout
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct RunSummary<'a> {
    coefficients: RegressionCoefficients,
    households: usize,
    simulated: usize,
    excluded: usize,
    failed_ids: Vec<u64>,
    failures: &'a [MissingBenefitResult],
    output: &'a PathBuf,
    execution_time_ms: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let start = Instant::now();

    let mut config = PipelineConfig::from_env();
    if let Some(adjustment) = args.adjustment {
        config.adjustment = adjustment;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }

    let mut calculator_config = CalculatorConfig::new(&args.calculator);
    let timeout_secs = args.timeout_secs.or_else(|| {
        env::var("MTR_TIMEOUT_SECS").ok().and_then(|s| s.parse().ok())
    });
    if let Some(secs) = timeout_secs {
        calculator_config.timeout = Duration::from_secs(secs);
    }
    let calculator = ExternalCalculator::new(calculator_config);

    let population = load_population(&args.survey)
        .map_err(|e| anyhow!("{}", e))
        .with_context(|| format!("Failed to load survey {}", args.survey.display()))?;
    let wage_index = load_wage_index(&args.wages)
        .map_err(|e| anyhow!("{}", e))
        .with_context(|| format!("Failed to load wages {}", args.wages.display()))?;
    log::info!(
        "Loaded {} individuals and {} years of wages",
        population.len(),
        wage_index.len()
    );

    let report = Pipeline::new(config)
        .run(&population, &wage_index, &calculator)
        .context("MTR pipeline failed")?;

    write_households(&args.output, &report.households)
        .map_err(|e| anyhow!("{}", e))
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    let failed_ids = report.failed_ids();
    if args.json {
        let summary = RunSummary {
            coefficients: report.coefficients,
            households: report.households.len(),
            simulated: report.simulated,
            excluded: report.excluded,
            failed_ids,
            failures: &report.failures,
            output: &args.output,
            execution_time_ms: start.elapsed().as_millis() as u64,
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Social Security MTR v{}", env!("CARGO_PKG_VERSION"));
    println!("=========================\n");
    println!("Regression coefficients:");
    println!("  Intercept:      {:>12.6}", report.coefficients.intercept);
    println!("  Education:      {:>12.6}", report.coefficients.education);
    println!("  Experience:     {:>12.6}", report.coefficients.experience);
    println!("  Experience^2:   {:>12.6}", report.coefficients.experience_squared);
    println!();
    println!("Simulated:  {}", report.simulated);
    println!("Excluded:   {}", report.excluded);
    println!("Households: {}", report.households.len());

    if !failed_ids.is_empty() {
        println!("\n{} individual(s) without benefit results (MTR set to 0):", failed_ids.len());
        for failure in &report.failures {
            println!("  {:>8}  {:?}", failure.individual_id, failure.reason);
        }
    }

    println!("\nResults written to: {}", args.output.display());
    println!("Total time: {:?}", start.elapsed());
    Ok(())
}
