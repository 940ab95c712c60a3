//! Solvers for constrained optimization problems.
//!
//! A [`ConstrainedProblem`] supplies an objective, its gradient, and optional
//! equality and inequality constraints over `x: &[f64]`. Solvers in this
//! module search for the `x` that minimizes the objective subject to those
//! constraints and to box bounds.
//!
//! # Solvers
//!
//! - [`sqp`]: sequential quadratic programming with a quasi-Newton Hessian
//! - [`quadratic`]: the dense QP solver that [`sqp`] uses for its subproblems
//!
//! [`ConstrainedProblem`]: mixwise_core::ConstrainedProblem

mod evaluate;

pub use evaluate::{EvalError, Evaluation, evaluate};

pub mod quadratic;
pub mod sqp;
