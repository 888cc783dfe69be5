//! Wage index normalized to the most recent year

use crate::error::WageIndexError;
use serde::{Deserialize, Serialize};

/// Year-ordered wage ratios, last entry = 1.0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WageIndex {
    ratios: Vec<f64>,
}

impl WageIndex {
    /// Build from raw average-wage levels, oldest year first
    pub fn from_levels(levels: &[f64]) -> Result<Self, WageIndexError> {
        let base = *levels.last().ok_or(WageIndexError::Empty)?;
        if !(base > 0.0) {
            return Err(WageIndexError::NonPositiveBase(base));
        }

        Ok(Self {
            ratios: levels.iter().map(|level| level / base).collect(),
        })
    }

    /// Number of years of history
    pub fn len(&self) -> usize {
        self.ratios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratios.is_empty()
    }

    /// All ratios, oldest first
    pub fn ratios(&self) -> &[f64] {
        &self.ratios
    }

    /// The most recent `years` ratios, oldest first
    ///
    /// A career of n years is anchored so its final year lands on the
    /// current wage level.
    pub fn tail(&self, years: usize) -> Result<&[f64], WageIndexError> {
        if years > self.ratios.len() {
            return Err(WageIndexError::InsufficientHistory {
                requested: years,
                available: self.ratios.len(),
            });
        }
        Ok(&self.ratios[self.ratios.len() - years..])
    }
}
