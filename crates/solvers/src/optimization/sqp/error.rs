use crate::optimization::EvalError;

/// Errors that can occur during an SQP solve.
///
/// Numerical outcomes such as incompatible constraints or a stalled line
/// search are reported through [`Status`](super::Status), not here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{what} has length {found}, expected {expected}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("bound {index} is invalid: [{lower}, {upper}]")]
    InvalidBound { index: usize, lower: f64, upper: f64 },

    #[error("initial guess is not finite at index {index}")]
    NonFiniteGuess { index: usize },

    #[error("problem error: {0}")]
    Problem(Box<dyn std::error::Error + Send + Sync>),

    #[error("non-finite {what} at x = {x:?}")]
    NonFinite { what: &'static str, x: Vec<f64> },
}

impl<E> From<EvalError<E>> for Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: EvalError<E>) -> Self {
        match err {
            EvalError::Problem(e) => Error::Problem(Box::new(e)),
            EvalError::Shape {
                what,
                expected,
                found,
            } => Error::DimensionMismatch {
                what,
                expected,
                found,
            },
            EvalError::NonFinite { what, x } => Error::NonFinite { what, x },
        }
    }
}
