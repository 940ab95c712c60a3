use mixwise_solvers::optimization::sqp;
use thiserror::Error;

use crate::SettingsError;

/// Problems with a request, detected before any solving.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InputError {
    #[error("missing batches data")]
    NoBatches,

    #[error("missing limits data")]
    NoLimits,

    #[error("batch '{batch}' has no value for limited parameter '{parameter}'")]
    MissingParameter { batch: String, parameter: String },

    #[error("batch '{batch}' (index {index}) has parameters {found:?}, expected {expected:?}")]
    InconsistentParameters {
        index: usize,
        batch: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("limit for '{parameter}' is invalid: [{lower}, {upper}]")]
    InvalidLimit {
        parameter: String,
        lower: f64,
        upper: f64,
    },

    #[error("tolerance must be within [0, 1], got {0}")]
    InvalidTolerance(f64),

    #[error("batch '{batch}' has a non-finite value for '{parameter}'")]
    NonFiniteValue { batch: String, parameter: String },

    #[error("ratio bounds for batch {index} are invalid: [{min}, {max}]")]
    InvalidRatioBounds { index: usize, min: f64, max: f64 },

    #[error("ratio bounds reference batch {index}, but there are only {count} batches")]
    UnknownBatch { index: usize, count: usize },
}

/// Errors that can occur when optimizing a blend.
///
/// Solver non-convergence and limit violations are not errors; they are
/// reported in the returned [`MixSolution`](crate::MixSolution).
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    #[error("solver error: {0}")]
    Solver(#[from] sqp::Error),

    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
}

impl Error {
    /// Returns `true` if the caller supplied a bad request.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}
