//! Core traits for Mixwise.
//!
//! This crate defines the shared abstractions that solvers and problem
//! builders agree on:
//!
//! - [`ConstrainedProblem`]: an objective with optional equality and
//!   inequality constraints over a vector of solver variables
//! - [`Observer`]: receives solver events and optionally returns control actions
//! - [`difference`]: central-difference derivatives used when a problem does
//!   not supply analytic ones

mod observer;
mod problems;

pub mod difference;

pub use observer::Observer;
pub use problems::ConstrainedProblem;
