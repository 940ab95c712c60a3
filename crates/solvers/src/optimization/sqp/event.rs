/// Emitted once per accepted step.
///
/// All values describe the new iterate.
#[derive(Debug, Clone, Copy)]
pub struct Event<'a> {
    /// Iteration number, starting at 1.
    pub iter: usize,

    pub x: &'a [f64],

    pub objective: f64,

    /// L1 constraint violation at `x`.
    pub violation: f64,

    /// Fraction of the search direction that was taken.
    pub step_length: f64,

    /// Current merit penalty weight.
    pub penalty: f64,
}
