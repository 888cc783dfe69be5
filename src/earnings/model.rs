//! Mincer log-earnings regression
//!
//! ln(earnings) = b0 + b1 * education + b2 * experience + b3 * experience^2
//!
//! Fitted by ordinary least squares using a Householder QR factorization of
//! the design matrix.

use crate::error::FitError;
use crate::population::{fit_sample_description, Individual};
use serde::{Deserialize, Serialize};

/// Number of regressors: constant, education, experience, experience^2
pub const REGRESSORS: usize = 4;

/// Relative threshold below which a column is treated as linearly dependent
const RANK_TOLERANCE: f64 = 1e-10;

/// Fitted coefficients of the earnings equation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionCoefficients {
    pub intercept: f64,
    pub education: f64,
    pub experience: f64,
    pub experience_squared: f64,
}

impl RegressionCoefficients {
    /// Predicted log earnings for given education and experience
    pub fn predict_log(&self, education: f64, experience: f64) -> f64 {
        self.intercept
            + self.education * education
            + self.experience * experience
            + self.experience_squared * experience * experience
    }

    fn from_vector(beta: [f64; REGRESSORS]) -> Self {
        Self {
            intercept: beta[0],
            education: beta[1],
            experience: beta[2],
            experience_squared: beta[3],
        }
    }
}

/// Earnings regression estimator
#[derive(Debug, Clone, Default)]
pub struct EarningsModel;

impl EarningsModel {
    /// Fit on individuals that already passed the sample filter
    pub fn fit(sample: &[&Individual]) -> Result<RegressionCoefficients, FitError> {
        let observations = sample.len();
        if observations < REGRESSORS {
            return Err(FitError::InsufficientData {
                observations,
                required: REGRESSORS,
                sample: fit_sample_description(),
            });
        }

        let design: Vec<[f64; REGRESSORS]> = sample
            .iter()
            .map(|p| {
                let exp = p.work_experience() as f64;
                [1.0, p.education_years as f64, exp, exp * exp]
            })
            .collect();
        let response: Vec<f64> = sample.iter().map(|p| p.earned_income.ln()).collect();

        let beta = least_squares(design, response).ok_or_else(|| FitError::SingularDesignMatrix {
            observations,
            sample: fit_sample_description(),
        })?;

        let coefficients = RegressionCoefficients::from_vector(beta);
        log::info!(
            "Fitted earnings regression on {} observations: {:?}",
            observations,
            coefficients
        );
        Ok(coefficients)
    }

    /// Apply the fit sample filter to a population, then fit
    pub fn fit_population(population: &[Individual]) -> Result<RegressionCoefficients, FitError> {
        let sample: Vec<&Individual> = population.iter().filter(|p| p.in_fit_sample()).collect();
        log::debug!(
            "{} of {} individuals in regression sample",
            sample.len(),
            population.len()
        );
        Self::fit(&sample)
    }
}

/// Solve min ||A b - y|| by Householder QR. None if A is rank-deficient.
fn least_squares(mut a: Vec<[f64; REGRESSORS]>, mut y: Vec<f64>) -> Option<[f64; REGRESSORS]> {
    let n = a.len();

    let column_norms: Vec<f64> = (0..REGRESSORS)
        .map(|j| a.iter().map(|row| row[j] * row[j]).sum::<f64>().sqrt())
        .collect();

    for k in 0..REGRESSORS {
        let norm = (k..n).map(|i| a[i][k] * a[i][k]).sum::<f64>().sqrt();
        if column_norms[k] == 0.0 || !norm.is_finite() || norm <= RANK_TOLERANCE * column_norms[k] {
            return None;
        }

        let alpha = if a[k][k] > 0.0 { -norm } else { norm };
        let mut v: Vec<f64> = (k..n).map(|i| a[i][k]).collect();
        v[0] -= alpha;
        let v_norm_sq: f64 = v.iter().map(|x| x * x).sum();

        for j in k..REGRESSORS {
            let s: f64 = v.iter().enumerate().map(|(i, vi)| vi * a[k + i][j]).sum();
            let factor = 2.0 * s / v_norm_sq;
            for (i, vi) in v.iter().enumerate() {
                a[k + i][j] -= factor * vi;
            }
        }

        let s: f64 = v.iter().enumerate().map(|(i, vi)| vi * y[k + i]).sum();
        let factor = 2.0 * s / v_norm_sq;
        for (i, vi) in v.iter().enumerate() {
            y[k + i] -= factor * vi;
        }
    }

    // Back substitution on the upper-triangular R
    let mut beta = [0.0; REGRESSORS];
    for k in (0..REGRESSORS).rev() {
        let tail: f64 = (k + 1..REGRESSORS).map(|j| a[k][j] * beta[j]).sum();
        beta[k] = (y[k] - tail) / a[k][k];
    }

    if beta.iter().all(|b| b.is_finite()) {
        Some(beta)
    } else {
        None
    }
}
