use thiserror::Error;

use mixwise_core::ConstrainedProblem;

/// Everything a solver needs to know about a problem at one `x`.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub x: Vec<f64>,

    pub objective: f64,

    pub gradient: Vec<f64>,

    /// Equality constraint values `h(x)`.
    pub equalities: Vec<f64>,

    pub equality_jacobian: Vec<Vec<f64>>,

    /// Inequality constraint values `g(x)`.
    pub inequalities: Vec<f64>,

    pub inequality_jacobian: Vec<Vec<f64>>,
}

impl Evaluation {
    /// Returns the L1 constraint violation `Σ|hᵢ(x)| + Σ max(0, -gⱼ(x))`.
    #[must_use]
    pub fn violation(&self) -> f64 {
        let equality: f64 = self.equalities.iter().map(|h| h.abs()).sum();
        let inequality: f64 = self.inequalities.iter().map(|g| (-g).max(0.0)).sum();
        equality + inequality
    }
}

/// Errors that can occur when evaluating a constrained problem.
#[derive(Debug, Error)]
pub enum EvalError<E> {
    /// A problem method returned an error.
    #[error("problem error")]
    Problem(#[source] E),

    /// A problem method returned a vector or matrix of the wrong size.
    #[error("{what} has length {found}, expected {expected}")]
    Shape {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// A problem method returned NaN or an infinity.
    #[error("non-finite {what} at x = {x:?}")]
    NonFinite { what: &'static str, x: Vec<f64> },
}

/// Evaluates the objective, constraints, and their derivatives at `x`.
///
/// # Errors
///
/// Returns an error if a problem method fails, returns a result of the wrong
/// shape, or returns a non-finite value.
pub fn evaluate<P>(problem: &P, x: &[f64]) -> Result<Evaluation, EvalError<P::Error>>
where
    P: ConstrainedProblem,
{
    let n = x.len();

    let objective = problem.objective(x).map_err(EvalError::Problem)?;
    check_finite("objective", &[objective], x)?;

    let gradient = problem.gradient(x).map_err(EvalError::Problem)?;
    check_shape("gradient", n, gradient.len())?;
    check_finite("gradient", &gradient, x)?;

    let equalities = problem.equalities(x).map_err(EvalError::Problem)?;
    check_finite("equality constraint", &equalities, x)?;
    let equality_jacobian = problem.equality_jacobian(x).map_err(EvalError::Problem)?;
    check_jacobian("equality jacobian", &equality_jacobian, equalities.len(), n, x)?;

    let inequalities = problem.inequalities(x).map_err(EvalError::Problem)?;
    check_finite("inequality constraint", &inequalities, x)?;
    let inequality_jacobian = problem.inequality_jacobian(x).map_err(EvalError::Problem)?;
    check_jacobian(
        "inequality jacobian",
        &inequality_jacobian,
        inequalities.len(),
        n,
        x,
    )?;

    Ok(Evaluation {
        x: x.to_vec(),
        objective,
        gradient,
        equalities,
        equality_jacobian,
        inequalities,
        inequality_jacobian,
    })
}

fn check_shape<E>(what: &'static str, expected: usize, found: usize) -> Result<(), EvalError<E>> {
    if expected == found {
        Ok(())
    } else {
        Err(EvalError::Shape {
            what,
            expected,
            found,
        })
    }
}

fn check_finite<E>(what: &'static str, values: &[f64], x: &[f64]) -> Result<(), EvalError<E>> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(EvalError::NonFinite { what, x: x.to_vec() })
    }
}

fn check_jacobian<E>(
    what: &'static str,
    jacobian: &[Vec<f64>],
    rows: usize,
    cols: usize,
    x: &[f64],
) -> Result<(), EvalError<E>> {
    check_shape(what, rows, jacobian.len())?;
    for row in jacobian {
        check_shape(what, cols, row.len())?;
        check_finite(what, row, x)?;
    }
    Ok(())
}
