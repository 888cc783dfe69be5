//! Lifetime earnings paths from the fitted regression and the wage index

use super::model::RegressionCoefficients;
use crate::error::SimulationError;
use crate::population::Individual;
use crate::wages::WageIndex;
use serde::{Deserialize, Serialize};

/// Earnings scenario fed to the benefit calculator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scenario {
    /// Simulated earnings as predicted
    Baseline,
    /// Baseline with the perturbation added to the current year
    Adjusted,
}

/// Yearly earnings over a career, in current-year wage terms
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarningsPath {
    /// Experience years 0..=years_worked
    pub years: Vec<u32>,
    /// Earnings per year, whole currency units
    pub values: Vec<u64>,
}

impl EarningsPath {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// Baseline and adjusted paths for one individual
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioPaths {
    pub baseline: EarningsPath,
    pub adjusted: EarningsPath,
}

impl ScenarioPaths {
    pub fn get(&self, scenario: Scenario) -> &EarningsPath {
        match scenario {
            Scenario::Baseline => &self.baseline,
            Scenario::Adjusted => &self.adjusted,
        }
    }

    /// Zero-length career: nothing to send to the calculator
    pub fn is_empty(&self) -> bool {
        self.baseline.is_empty()
    }
}

/// Simulates career earnings against shared, read-only coefficients and wages
#[derive(Debug, Clone, Copy)]
pub struct LifetimeEarningsSimulator<'a> {
    coefficients: &'a RegressionCoefficients,
    wage_index: &'a WageIndex,
    adjustment: u64,
}

impl<'a> LifetimeEarningsSimulator<'a> {
    pub fn new(coefficients: &'a RegressionCoefficients, wage_index: &'a WageIndex, adjustment: u64) -> Self {
        Self {
            coefficients,
            wage_index,
            adjustment,
        }
    }

    /// Build baseline and adjusted earnings paths for one individual
    pub fn simulate(&self, individual: &Individual) -> Result<ScenarioPaths, SimulationError> {
        simulate(individual, self.coefficients, self.wage_index, self.adjustment)
    }
}

/// Build baseline and adjusted earnings paths for one individual
///
/// Predicted earnings are truncated toward zero both before and after wage
/// inflation. The last `years_worked + 1` wage ratios are applied so every
/// career ends at the current wage level.
pub fn simulate(
    individual: &Individual,
    coefficients: &RegressionCoefficients,
    wage_index: &WageIndex,
    adjustment: u64,
) -> Result<ScenarioPaths, SimulationError> {
    let years_worked = individual.years_worked();
    let education = individual.education_years as f64;

    let years: Vec<u32> = (0..=years_worked).collect();
    if years.is_empty() {
        return Ok(ScenarioPaths::default());
    }

    let ratios = wage_index.tail(years.len())?;
    let mut values = Vec::with_capacity(years.len());
    for (&experience, ratio) in years.iter().zip(ratios) {
        let predicted = coefficients.predict_log(education, experience as f64).exp().trunc();
        let value = predicted * ratio;
        values.push(whole_amount(value).ok_or(SimulationError::EarningsOutOfRange { experience, value })?);
    }

    let mut adjusted = values.clone();
    if let Some(last) = adjusted.last_mut() {
        *last = last
            .checked_add(adjustment)
            .ok_or(SimulationError::AdjustmentOverflow {
                earnings: *last,
                adjustment,
            })?;
    }

    Ok(ScenarioPaths {
        baseline: EarningsPath {
            years: years.clone(),
            values,
        },
        adjusted: EarningsPath {
            years,
            values: adjusted,
        },
    })
}

/// Truncate a non-negative earnings amount, None if it has no u64 value
fn whole_amount(value: f64) -> Option<u64> {
    if value.is_finite() && value >= 0.0 && value < u64::MAX as f64 {
        Some(value as u64)
    } else {
        None
    }
}
