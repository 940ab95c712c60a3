/// How an SQP solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Converged according to the configured tolerances.
    Converged,

    /// Reached the iteration limit without converging.
    MaxIters,

    /// The linearized constraints admit no step.
    Incompatible,

    /// The line search could not reduce the merit function from an
    /// infeasible point.
    LineSearchFailed,

    /// The quadratic subproblem could not be solved, even after resetting
    /// the Hessian approximation.
    SubproblemFailed,

    /// Stopped early due to an observer decision.
    StoppedByObserver,
}

impl Status {
    /// Returns a human-readable description of the status.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Converged => "Optimization terminated successfully",
            Self::MaxIters => "Iteration limit reached",
            Self::Incompatible => "Inequality constraints incompatible",
            Self::LineSearchFailed => "Positive directional derivative for linesearch",
            Self::SubproblemFailed => "Singular matrix in quadratic subproblem",
            Self::StoppedByObserver => "Stopped by observer",
        }
    }
}

/// The result of an SQP solve.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Final solver status.
    pub status: Status,

    /// The final iterate. Always within the bounds.
    pub x: Vec<f64>,

    /// Objective value at `x`.
    pub objective: f64,

    /// L1 constraint violation at `x`.
    pub violation: f64,

    /// Iteration count when the solver finished.
    pub iters: usize,
}

impl Solution {
    /// Returns `true` if the solver converged.
    #[must_use]
    pub fn converged(&self) -> bool {
        self.status == Status::Converged
    }

    /// Returns the status message.
    #[must_use]
    pub fn message(&self) -> &'static str {
        self.status.message()
    }
}
