//! Person-level records derived from survey tax units

use serde::{Deserialize, Serialize};

/// Entry age into the labour force after secondary school
pub const LABOR_FORCE_ENTRY_AGE: i32 = 17;

/// Upper bound (exclusive) on age for both the fit and the simulation
pub const MAX_WORKING_AGE: u32 = 66;

/// Lower bound (exclusive) on age for the regression sample
pub const MIN_FIT_AGE: u32 = 16;

/// Lower bound (exclusive) on age for lifetime earnings simulation
pub const MIN_SIMULATION_AGE: u32 = 17;

/// Position of a person within a household
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Head,
    Spouse,
}

/// Sex as coded by the benefit calculator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Survey gender code: 1 = male, 2 = female
    pub fn from_survey_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Sex::Male),
            2 => Some(Sex::Female),
            _ => None,
        }
    }

    /// Calculator sex code: 0 = male, 1 = female
    pub fn code(&self) -> u8 {
        match self {
            Sex::Male => 0,
            Sex::Female => 1,
        }
    }
}

/// Years of schooling past high school for a survey education code
///
/// Codes 31-38 are below a diploma and count as zero, 39 is a diploma,
/// 43 a bachelor's degree and 45/46 professional or doctoral degrees.
pub fn years_past_secondary(education_code: u8) -> Option<u32> {
    match education_code {
        0 | 31..=38 => Some(0),
        39 => Some(1),
        40 => Some(2),
        41 => Some(3),
        42 => Some(4),
        43 => Some(6),
        44 => Some(8),
        45 | 46 => Some(11),
        _ => None,
    }
}

/// One working-age person derived from a household record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    /// Unique person-level key used to join benefit results
    pub id: u64,

    /// Survey person identifier written into calculator records
    pub survey_id: String,

    /// Groups head and spouse for household reassembly
    pub household_id: u64,

    pub role: Role,

    pub age: u32,

    pub sex: Sex,

    /// Years of education beyond secondary school
    pub education_years: u32,

    /// Current-period earnings: wages + self-employment + farm income
    pub earned_income: f64,

    /// Full-time, year-round worker
    pub full_time: bool,
}

impl Individual {
    /// Potential work experience: age - education - 17 (may be negative)
    pub fn work_experience(&self) -> i32 {
        self.age as i32 - self.education_years as i32 - LABOR_FORCE_ENTRY_AGE
    }

    /// Years worked before the current year, clipped at zero
    pub fn years_worked(&self) -> u32 {
        self.work_experience().max(0) as u32
    }

    fn is_working(&self) -> bool {
        self.full_time && self.earned_income > 0.0
    }

    /// Included in the regression sample
    pub fn in_fit_sample(&self) -> bool {
        self.age > MIN_FIT_AGE && self.age < MAX_WORKING_AGE && self.is_working()
    }

    /// Included in lifetime earnings simulation
    pub fn in_simulation(&self) -> bool {
        self.age > MIN_SIMULATION_AGE && self.age < MAX_WORKING_AGE && self.is_working()
    }
}

/// Human-readable description of the fit sample filter, used in error messages
pub fn fit_sample_description() -> String {
    format!(
        "{} < age < {}, full-time year-round, earned income > 0",
        MIN_FIT_AGE, MAX_WORKING_AGE
    )
}
