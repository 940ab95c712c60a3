//! Blend optimization for material batches.
//!
//! Given measured parameters for a set of batches and a permitted range for
//! each regulated parameter, [`optimize`] finds the mixing ratios whose blend
//! lands closest to the middle of every range while staying inside the hard
//! limits. The result is judged against a strictness tolerance, and a relaxed
//! tolerance is suggested when the requested one cannot be met.
//!
//! The pipeline is:
//!
//! 1. [`ParameterSet`] validates the input and picks the active parameters.
//! 2. [`BlendProblem`] states the objective and constraints.
//! 3. The SQP solver from `mixwise-solvers` finds the ratios.
//! 4. [`interpret`] recomputes blends, residuals, and verdicts.
//!
//! [`MixRequest`] and [`MixResponse`] are the serde types for the JSON
//! boundary.

mod batch;
mod error;
mod interpret;
mod limits;
mod mix;
mod parameters;
mod problem;
mod request;
mod response;
mod settings;

pub mod ph;

pub use batch::Batch;
pub use error::{Error, InputError};
pub use interpret::{
    Interpretation, RELAX_FLOOR, RELAX_MAX_STEPS, RELAX_STEP, interpret, relax,
    suggested_tolerance, within_tolerance,
};
pub use limits::{IGNORE_SENTINEL, Limit, Limits, ZERO_RANGE_EPSILON};
pub use mix::{MixSolution, Verdict, optimize};
pub use parameters::{Column, ParameterSet, Target};
pub use problem::{BlendProblem, LimitConstraint, Side};
pub use request::{DEFAULT_TOLERANCE, MixRequest, RatioBound};
pub use response::{MixResponse, round4};
pub use settings::{Settings, SettingsError};
