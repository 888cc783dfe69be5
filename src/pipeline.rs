//! End-to-end MTR run: fit, simulate, encode, invoke, aggregate
//!
//! The regression and the wage index are computed once and shared read-only
//! by every simulation. Calculator calls run on a bounded rayon pool; each
//! baseline and adjusted call is an independent job, and results are joined
//! by individual id so completion order does not matter.
//!
//! # Example
//! ```ignore
//! let population = load_population("puf.csv")?;
//! let wages = load_wage_index("averagewages.csv")?;
//! let calculator = ExternalCalculator::new(CalculatorConfig::new("./anypiab"));
//!
//! let report = Pipeline::new(PipelineConfig::default()).run(&population, &wages, &calculator)?;
//! write_households("out.csv", &report.households)?;
//! ```

use crate::calculator::{BenefitCalculator, RecordEncoder, RecordLayout};
use crate::earnings::{EarningsModel, LifetimeEarningsSimulator, RegressionCoefficients, Scenario, ScenarioPaths};
use crate::error::{PipelineError, SimulationError};
use crate::mtr::{BenefitResult, HouseholdOutcome, IndividualOutcome, MTRAggregator};
use crate::population::Individual;
use crate::wages::WageIndex;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;
use std::env;

/// Default one-year earnings perturbation
pub const DEFAULT_ADJUSTMENT: u64 = 500;

/// Configuration for a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Amount added to current-year earnings in the adjusted scenario
    pub adjustment: u64,

    /// Calendar anchoring of calculator records
    pub layout: RecordLayout,

    /// Maximum concurrent calculator invocations
    pub workers: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            adjustment: DEFAULT_ADJUSTMENT,
            layout: RecordLayout::default(),
            workers: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by MTR_ADJUSTMENT, MTR_WORKERS, MTR_BASE_YEAR and
    /// MTR_RETIREMENT_AGE when set
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let adjustment = env::var("MTR_ADJUSTMENT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.adjustment);

        let workers = env::var("MTR_WORKERS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.workers);

        let base_year = env::var("MTR_BASE_YEAR")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.layout.base_year);

        let retirement_age = env::var("MTR_RETIREMENT_AGE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.layout.retirement_age);

        Self {
            adjustment,
            layout: RecordLayout {
                base_year,
                retirement_age,
            },
            workers,
        }
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if self.adjustment == 0 {
            return Err(PipelineError::Config("adjustment must be positive".to_string()));
        }
        if self.workers == 0 {
            return Err(PipelineError::Config("workers must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Why an individual has no MTR
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MissingReason {
    /// Zero-length career, nothing was sent to the calculator
    EmptyPath,
    /// Earnings could not be simulated, nothing was sent to the calculator
    Simulation { error: String },
    /// The calculator failed for this scenario
    Invocation { scenario: Scenario, error: String },
}

/// An individual whose MTR was defaulted to zero
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingBenefitResult {
    pub individual_id: u64,
    pub reason: MissingReason,
}

/// Result of a pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub coefficients: RegressionCoefficients,

    /// One row per household, zero-filled
    pub households: Vec<HouseholdOutcome>,

    /// Every individual of the population with its (possibly zero) MTR
    pub individuals: Vec<IndividualOutcome>,

    /// Individuals that passed the simulation filter but have no MTR
    pub failures: Vec<MissingBenefitResult>,

    /// Individuals simulated and sent to the calculator
    pub simulated: usize,

    /// Individuals outside the simulation filter
    pub excluded: usize,
}

impl PipelineReport {
    /// Distinct ids of individuals with missing benefit results
    pub fn failed_ids(&self) -> Vec<u64> {
        self.failures
            .iter()
            .map(|f| f.individual_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// One calculator call
struct Job {
    individual_id: u64,
    scenario: Scenario,
    record: String,
}

/// Pipeline runner
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Fit the earnings regression on the population, then run
    pub fn run<C>(
        &self,
        population: &[Individual],
        wage_index: &WageIndex,
        calculator: &C,
    ) -> Result<PipelineReport, PipelineError>
    where
        C: BenefitCalculator + ?Sized,
    {
        self.config.validate()?;
        let coefficients = EarningsModel::fit_population(population)?;
        self.run_with_coefficients(population, &coefficients, wage_index, calculator)
    }

    /// Run with coefficients fitted elsewhere
    pub fn run_with_coefficients<C>(
        &self,
        population: &[Individual],
        coefficients: &RegressionCoefficients,
        wage_index: &WageIndex,
        calculator: &C,
    ) -> Result<PipelineReport, PipelineError>
    where
        C: BenefitCalculator + ?Sized,
    {
        self.config.validate()?;

        let simulator = LifetimeEarningsSimulator::new(coefficients, wage_index, self.config.adjustment);
        let labor_force: Vec<&Individual> = population.iter().filter(|p| p.in_simulation()).collect();
        let excluded = population.len() - labor_force.len();
        log::info!(
            "Simulating {} individuals ({} excluded by filters)",
            labor_force.len(),
            excluded
        );

        // All paths are built before any calculator call so a short wage
        // history aborts the run up front
        let mut failures = Vec::new();
        let mut simulated = Vec::with_capacity(labor_force.len());
        for individual in &labor_force {
            match simulator.simulate(individual) {
                Ok(paths) => simulated.push((*individual, paths)),
                Err(SimulationError::WageIndex(e)) => return Err(e.into()),
                Err(e) => {
                    log::warn!("Cannot simulate individual {}: {}", individual.id, e);
                    failures.push(MissingBenefitResult {
                        individual_id: individual.id,
                        reason: MissingReason::Simulation { error: e.to_string() },
                    });
                }
            }
        }

        let jobs = self.build_jobs(&simulated, &mut failures);
        log::info!(
            "Invoking calculator for {} records on {} workers",
            jobs.len(),
            self.config.workers
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .build()?;

        let outcomes: Vec<_> = pool.install(|| {
            jobs.par_iter()
                .map(|job| (job.individual_id, job.scenario, calculator.benefit(&job.record)))
                .collect()
        });

        let mut baseline = Vec::new();
        let mut adjusted = Vec::new();
        for (individual_id, scenario, outcome) in outcomes {
            match outcome {
                Ok(benefit_amount) => {
                    let result = BenefitResult {
                        individual_id,
                        benefit_amount,
                    };
                    match scenario {
                        Scenario::Baseline => baseline.push(result),
                        Scenario::Adjusted => adjusted.push(result),
                    }
                }
                Err(e) => {
                    log::warn!(
                        "Calculator failed for individual {} ({:?}): {}",
                        individual_id,
                        scenario,
                        e
                    );
                    failures.push(MissingBenefitResult {
                        individual_id,
                        reason: MissingReason::Invocation {
                            scenario,
                            error: e.to_string(),
                        },
                    });
                }
            }
        }

        let aggregator = MTRAggregator::new(self.config.adjustment as f64);
        let mtrs = aggregator.aggregate(&baseline, &adjusted);
        let individuals = aggregator.merge_population(population, &mtrs);
        let households = aggregator.households(&individuals);

        let report = PipelineReport {
            coefficients: *coefficients,
            households,
            individuals,
            failures,
            simulated: labor_force.len(),
            excluded,
        };

        if !report.failures.is_empty() {
            log::warn!(
                "{} individual(s) without benefit results, MTR set to 0: {:?}",
                report.failed_ids().len(),
                report.failed_ids()
            );
        }
        log::info!("Produced {} household rows", report.households.len());

        Ok(report)
    }

    fn build_jobs(
        &self,
        simulated: &[(&Individual, ScenarioPaths)],
        failures: &mut Vec<MissingBenefitResult>,
    ) -> Vec<Job> {
        let encoder = RecordEncoder::new(self.config.layout);
        let mut jobs = Vec::with_capacity(simulated.len() * 2);

        for (individual, paths) in simulated {
            if paths.is_empty() {
                failures.push(MissingBenefitResult {
                    individual_id: individual.id,
                    reason: MissingReason::EmptyPath,
                });
                continue;
            }

            for scenario in [Scenario::Baseline, Scenario::Adjusted] {
                jobs.push(Job {
                    individual_id: individual.id,
                    scenario,
                    record: encoder.encode(individual, individual.work_experience(), paths.get(scenario)),
                });
            }
        }

        jobs
    }
}
