//! Sequential quadratic programming for constrained minimization.
//!
//! # Algorithm
//!
//! Each major iteration linearizes the constraints at the current iterate and
//! solves a [quadratic](super::quadratic) subproblem built from a damped BFGS
//! approximation of the Lagrangian Hessian. The resulting direction is
//! shortened by a backtracking line search on the L1 merit function
//! `f + μ·violation`, where the penalty `μ` tracks the largest constraint
//! multiplier seen so far.
//!
//! Box bounds are handled as linear rows of the subproblem, and every trial
//! point is clamped into the box, so iterates never leave the bounds.
//!
//! # Termination
//!
//! The solve converges at a feasible iterate when the search direction
//! vanishes, or when a full step changes the objective by no more than
//! [`Config::ftol`].
//!
//! If no step along a direction decreases the merit function, the Hessian
//! approximation is reset to the identity and the iteration is retried. A
//! second failure counts as convergence only when the point is feasible and
//! the projected gradient is negligible. Otherwise the solve stops with
//! [`Status::LineSearchFailed`].
//!
//! Numerical failures are reported through [`Status`] with the last iterate,
//! never as errors. [`Error`] is reserved for bad inputs and for failures of
//! the problem itself.
//!
//! # Observer Events
//!
//! The solver emits one [`Event`] per accepted step. Observers can return
//! [`Action::StopEarly`] to halt with [`Status::StoppedByObserver`].

mod action;
mod config;
mod error;
mod event;
mod search;
mod solution;
mod state;

#[cfg(test)]
mod tests;

pub use action::Action;
pub use config::{Config, ConfigError};
pub use error::Error;
pub use event::Event;
pub use solution::{Solution, Status};

use mixwise_core::{ConstrainedProblem, Observer};

use search::search;

/// Minimizes a constrained problem starting from `x0`.
///
/// `bounds` holds one `[lower, upper]` pair per variable. Either side may be
/// infinite. A starting point outside the bounds is clamped into them.
///
/// # Errors
///
/// Returns an error if `x0` or `bounds` do not match the problem dimension,
/// a bound or starting value is invalid, or the problem fails during
/// evaluation.
pub fn minimize<P, Obs>(
    problem: &P,
    x0: &[f64],
    bounds: &[[f64; 2]],
    config: &Config,
    observer: Obs,
) -> Result<Solution, Error>
where
    P: ConstrainedProblem,
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    search(problem, x0, bounds, config, observer)
}

/// Minimizes a constrained problem without observer support.
///
/// This is a convenience wrapper around [`minimize`] that uses a no-op observer.
///
/// # Errors
///
/// Returns an error if the inputs are invalid or the problem fails during
/// evaluation.
pub fn minimize_unobserved<P>(
    problem: &P,
    x0: &[f64],
    bounds: &[[f64; 2]],
    config: &Config,
) -> Result<Solution, Error>
where
    P: ConstrainedProblem,
{
    minimize(problem, x0, bounds, config, ())
}
