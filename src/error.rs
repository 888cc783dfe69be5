//! Error taxonomy for the MTR pipeline
//!
//! Fit-time errors are fatal for a run. Invocation errors are scoped to a single
//! individual and scenario and end up as missing benefit results.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while fitting the earnings regression
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FitError {
    /// Fewer observations than regressors
    #[error("insufficient data: {observations} observation(s) passed filter [{sample}], at least {required} required")]
    InsufficientData {
        observations: usize,
        required: usize,
        sample: String,
    },

    /// The design matrix is rank-deficient (constant or collinear regressors)
    #[error("singular design matrix: {observations} observation(s) passed filter [{sample}] but education/experience terms are degenerate")]
    SingularDesignMatrix { observations: usize, sample: String },
}

/// Errors raised when the wage history cannot cover a career
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WageIndexError {
    #[error("wage index is empty")]
    Empty,

    #[error("most recent wage level must be positive, got {0}")]
    NonPositiveBase(f64),

    #[error("career of {requested} year(s) exceeds wage history of {available} year(s)")]
    InsufficientHistory { requested: usize, available: usize },
}

/// Errors raised while simulating one individual's earnings paths
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimulationError {
    #[error(transparent)]
    WageIndex(#[from] WageIndexError),

    #[error("predicted earnings {value} at experience year {experience} are not a representable amount")]
    EarningsOutOfRange { experience: u32, value: f64 },

    #[error("adjustment {adjustment} overflows current-year earnings {earnings}")]
    AdjustmentOverflow { earnings: u64, adjustment: u64 },
}

/// Failure of a single call to the external benefit calculator
#[derive(Debug, Error)]
pub enum CalculatorInvocationError {
    #[error("failed to prepare calculator workspace: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("failed to start calculator {}: {source}", .executable.display())]
    Spawn {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to pass input name to calculator: {0}")]
    Stdin(#[source] std::io::Error),

    #[error("failed waiting for calculator: {0}")]
    Wait(#[source] std::io::Error),

    #[error("calculator did not finish within {millis}ms")]
    Timeout { millis: u128 },

    #[error("calculator exited with status {status:?}")]
    NonZeroExit { status: Option<i32> },

    #[error("calculator produced no output file at {}", .path.display())]
    MissingOutput { path: PathBuf },

    #[error("calculator output is empty")]
    EmptyOutput,

    #[error("calculator output line has no benefit column: {line:?}")]
    MalformedOutput { line: String },

    #[error("benefit amount {token:?} is not a number")]
    UnparseableBenefit { token: String },
}

/// Fatal pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("earnings regression failed: {0}")]
    Fit(#[from] FitError),

    #[error("wage index cannot support simulation: {0}")]
    WageIndex(#[from] WageIndexError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}
