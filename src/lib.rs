//! Social Security marginal tax rates from simulated lifetime earnings
//!
//! This library provides:
//! - Survey population loading and inclusion filters
//! - Mincer earnings regression and lifetime earnings simulation
//! - Fixed-width record encoding for an external benefit calculator
//! - Isolated, bounded-parallel calculator invocation
//! - MTR aggregation and household reassembly

pub mod error;
pub mod population;
pub mod wages;
pub mod earnings;
pub mod calculator;
pub mod mtr;
pub mod pipeline;

// Re-export commonly used types
pub use error::{CalculatorInvocationError, FitError, PipelineError, SimulationError, WageIndexError};
pub use population::{Individual, Role, Sex};
pub use wages::WageIndex;
pub use earnings::{EarningsModel, EarningsPath, LifetimeEarningsSimulator, RegressionCoefficients, Scenario};
pub use calculator::{BenefitCalculator, CalculatorConfig, ExternalCalculator, RecordEncoder};
pub use mtr::{HouseholdOutcome, MTRAggregator};
pub use pipeline::{Pipeline, PipelineConfig, PipelineReport};
