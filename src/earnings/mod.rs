//! Earnings regression and lifetime earnings simulation

mod model;
mod simulator;

pub use model::{EarningsModel, RegressionCoefficients, REGRESSORS};
pub use simulator::{simulate, EarningsPath, LifetimeEarningsSimulator, Scenario, ScenarioPaths};
