use std::collections::BTreeMap;

use crate::{ParameterSet, Target};

/// How far the tolerance drops per auto-relax step.
pub const RELAX_STEP: f64 = 0.05;

/// Maximum number of auto-relax steps.
pub const RELAX_MAX_STEPS: usize = 20;

/// Auto-relax stops once the tolerance is at or below this value.
pub const RELAX_FLOOR: f64 = 0.01;

/// Relative slack allowed when checking a blend against its hard limits.
const LIMIT_SLACK: f64 = 1e-9;

/// Slack, as a fraction of the range, allowed at the tolerance threshold.
const TOLERANCE_SLACK: f64 = 1e-12;

/// Slack, in hundredths, before truncating a suggested tolerance.
const GRID_SLACK: f64 = 1e-6;

/// What a ratio vector means for the request's limits and tolerance.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpretation {
    /// Blended value of every reported parameter.
    pub blended_values: BTreeMap<String, f64>,

    /// Residual of every active parameter.
    pub residuals: BTreeMap<String, f64>,

    pub total_residual: f64,

    /// Largest single residual, zero without active parameters.
    pub max_residual: f64,

    pub within_limits: bool,
    pub within_tolerance: bool,

    /// Strictest tolerance the worst parameter still meets, offered when the
    /// solver converged but the requested tolerance was missed.
    pub suggested_tolerance: Option<f64>,
}

/// Evaluates `ratios` against the parameters' limits and `tolerance`.
#[must_use]
pub fn interpret(
    params: &ParameterSet,
    ratios: &[f64],
    tolerance: f64,
    converged: bool,
) -> Interpretation {
    let blended_values: BTreeMap<String, f64> = params
        .columns()
        .iter()
        .map(|c| (c.name.clone(), c.blend(ratios)))
        .collect();

    let mut residuals = BTreeMap::new();
    let mut within_limits = true;
    let mut passing = true;
    let mut worst: Option<(&Target, f64)> = None;
    let mut max_residual = 0.0;

    for target in params.targets() {
        let blended = target.column.blend(ratios);
        let residual = target.residual(blended);
        residuals.insert(target.name().to_owned(), residual);
        within_limits &= within_limit(target, blended);
        passing &= within_tolerance(target, blended, tolerance);

        if worst.is_none() || residual > max_residual {
            worst = Some((target, blended));
            max_residual = residual;
        }
    }

    let total_residual = residuals.values().sum();
    let suggested_tolerance = worst
        .filter(|_| !passing && converged)
        .map(|(target, blended)| suggested_tolerance(target, blended));

    Interpretation {
        blended_values,
        residuals,
        total_residual,
        max_residual,
        within_limits,
        within_tolerance: passing,
        suggested_tolerance,
    }
}

/// Returns `true` if `blended` lies within `range · (1 - tolerance) / 2` of
/// the target's midpoint.
///
/// Larger tolerances are stricter: `0` accepts the whole range and `1`
/// accepts only the midpoint. A blend exactly on the threshold passes, even
/// when rounding puts the computed threshold just below it.
#[must_use]
pub fn within_tolerance(target: &Target, blended: f64, tolerance: f64) -> bool {
    let threshold = target.range * ((1.0 - tolerance) / 2.0 + TOLERANCE_SLACK);
    (blended - target.midpoint).abs() <= threshold
}

/// Returns the largest tolerance on a two-decimal grid that `blended` still
/// meets for `target`.
///
/// This is `1 - 2 · residual` truncated to two decimals, so a residual that
/// lands on the grid keeps its grid point. Zero if even the whole range
/// misses.
#[must_use]
pub fn suggested_tolerance(target: &Target, blended: f64) -> f64 {
    let exact = (1.0 - 2.0 * target.residual(blended)).clamp(0.0, 1.0);
    let mut cents = (exact * 100.0 + GRID_SLACK).floor().min(100.0);
    while cents > 0.0 && !within_tolerance(target, blended, cents / 100.0) {
        cents -= 1.0;
    }
    cents / 100.0
}

/// Lowers `tolerance` in [`RELAX_STEP`] increments until every active
/// parameter of `ratios` passes.
///
/// Returns `None` if no step within [`RELAX_MAX_STEPS`] passes before the
/// tolerance reaches [`RELAX_FLOOR`].
#[must_use]
pub fn relax(params: &ParameterSet, ratios: &[f64], tolerance: f64) -> Option<f64> {
    for step in 1..=RELAX_MAX_STEPS {
        let relaxed = (tolerance - RELAX_STEP * step as f64).max(0.0);
        let passes = params
            .targets()
            .iter()
            .all(|t| within_tolerance(t, t.column.blend(ratios), relaxed));

        if passes {
            return Some(relaxed);
        }
        if relaxed <= RELAX_FLOOR {
            break;
        }
    }
    None
}

fn within_limit(target: &Target, blended: f64) -> bool {
    let Target { limit, .. } = target;
    let slack = LIMIT_SLACK * limit.lower.abs().max(limit.upper.abs()).max(1.0);
    blended >= limit.lower - slack && blended <= limit.upper + slack
}
