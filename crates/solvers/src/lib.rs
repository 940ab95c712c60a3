//! Numerical solvers for Mixwise.
//!
//! - [`optimization::quadratic`]: dense convex quadratic programming
//! - [`optimization::sqp`]: sequential quadratic programming for smooth (or
//!   piecewise smooth) objectives with bounds, equality and inequality
//!   constraints

pub mod optimization;
