use std::collections::BTreeMap;

use mixwise_solvers::optimization::sqp;
use tracing::{debug, info, trace};

use crate::{
    BlendProblem, Batch, Error, Interpretation, Limits, MixRequest, ParameterSet, Settings,
    interpret, ph, relax,
};

/// Overall outcome of a blend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The solver converged and every active blend is within its limits.
    Feasible,

    /// The solver did not converge.
    NonConvergence,

    /// The solver converged, but a blend violates a hard limit.
    InfeasibleRegion,
}

impl Verdict {
    fn new(converged: bool, within_limits: bool) -> Self {
        match (converged, within_limits) {
            (false, _) => Self::NonConvergence,
            (true, false) => Self::InfeasibleRegion,
            (true, true) => Self::Feasible,
        }
    }
}

/// The optimal blend and what it means, at full precision.
#[derive(Debug, Clone, PartialEq)]
pub struct MixSolution {
    /// One ratio per batch, in batch order.
    pub ratios: Vec<f64>,

    pub blended_values: BTreeMap<String, f64>,
    pub residuals: BTreeMap<String, f64>,
    pub total_residual: f64,
    pub within_limits: bool,
    pub within_tolerance: bool,
    pub suggested_tolerance: Option<f64>,

    /// Tolerance the result was judged against, after any auto-relax.
    pub tolerance: f64,

    pub verdict: Verdict,
    pub status: sqp::Status,
    pub message: String,
    pub iterations: usize,

    /// Parameters left out because a batch has no value for them.
    pub missing_data_params: Vec<String>,

    /// Limits replaced by their pH-dependent values.
    pub adjusted_limits: Limits,
}

impl MixSolution {
    /// Returns `true` if the solver converged within the hard limits.
    #[must_use]
    pub fn success(&self) -> bool {
        self.verdict == Verdict::Feasible
    }
}

/// One solve of the blend problem and the parameters it was built from.
struct Solved {
    params: ParameterSet,
    ratios: Vec<f64>,
    solution: sqp::Solution,
}

impl Solved {
    fn interpret(&self, tolerance: f64) -> Interpretation {
        interpret(
            &self.params,
            &self.ratios,
            tolerance,
            self.solution.converged(),
        )
    }
}

/// Finds the blend ratios for a request.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for a malformed request and
/// [`Error::Settings`] for out-of-range solver settings. Non-convergence and
/// limit violations are reported in the returned solution instead.
pub fn optimize(request: &MixRequest, settings: &Settings) -> Result<MixSolution, Error> {
    request.validate()?;
    let bounds = request.bounds()?;
    let config = settings.solver_config()?;

    let mut solved = solve(&request.batches, &request.limits, &bounds, &config)?;
    let mut adjusted_limits = Limits::new();

    if request.ph_dependent_limits {
        let changes = ph::adjustments(&solved.params, &solved.ratios);
        if !changes.is_empty() {
            info!(changed = changes.len(), "re-solving with pH-dependent limits");

            let mut limits = request.limits.clone();
            limits.extend(changes.iter().map(|(k, v)| (k.clone(), *v)));
            let second = solve(&request.batches, &limits, &bounds, &config)?;

            if second.interpret(request.tolerance).within_limits {
                solved = second;
                adjusted_limits = changes;
            } else {
                debug!("pH-adjusted solve violates limits, keeping first solve");
            }
        }
    }

    let converged = solved.solution.converged();
    let mut tolerance = request.tolerance;
    let mut outcome = solved.interpret(tolerance);

    if request.auto_relax && converged && outcome.within_limits && !outcome.within_tolerance {
        if let Some(relaxed) = relax(&solved.params, &solved.ratios, tolerance) {
            info!(from = tolerance, to = relaxed, "relaxed tolerance");
            tolerance = relaxed;
            outcome = solved.interpret(tolerance);
        } else {
            debug!("no relaxed tolerance passes");
        }
    }

    let verdict = Verdict::new(converged, outcome.within_limits);
    info!(
        ?verdict,
        status = ?solved.solution.status,
        iterations = solved.solution.iters,
        total_residual = outcome.total_residual,
        "blend optimized"
    );

    let Solved {
        params,
        ratios,
        solution,
    } = solved;
    Ok(MixSolution {
        ratios,
        blended_values: outcome.blended_values,
        residuals: outcome.residuals,
        total_residual: outcome.total_residual,
        within_limits: outcome.within_limits,
        within_tolerance: outcome.within_tolerance,
        suggested_tolerance: outcome.suggested_tolerance,
        tolerance,
        verdict,
        status: solution.status,
        message: solution.status.message().to_owned(),
        iterations: solution.iters,
        missing_data_params: params.missing().to_vec(),
        adjusted_limits,
    })
}

fn solve(
    batches: &[Batch],
    limits: &Limits,
    bounds: &[[f64; 2]],
    config: &sqp::Config,
) -> Result<Solved, Error> {
    let params = ParameterSet::new(batches, limits)?;
    let problem = BlendProblem::new(&params);

    let observer = |event: &sqp::Event<'_>| -> Option<sqp::Action> {
        trace!(
            iter = event.iter,
            objective = event.objective,
            violation = event.violation,
            step = event.step_length,
            "sqp step"
        );
        None
    };
    let x0 = problem.initial_guess(bounds);
    let solution = sqp::minimize(&problem, &x0, &problem.bounds(bounds), config, observer)?;
    let ratios = problem.ratios(&solution.x).to_vec();

    debug!(
        status = ?solution.status,
        iterations = solution.iters,
        total_residual = problem.total_residual(&ratios),
        violation = solution.violation,
        "solver finished"
    );

    Ok(Solved {
        params,
        ratios,
        solution,
    })
}
