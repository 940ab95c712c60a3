//! Metal limits that depend on the blended pH.
//!
//! Soil guidance allows more zinc, copper, and nickel in alkaline soil. When
//! a blend's pH and any of those metals are active, the upper limits for the
//! metals follow the blended pH.

use crate::{Limit, Limits, ParameterSet};

pub const PH: &str = "pH";

/// Metals whose limits follow pH.
pub const PH_DEPENDENT: [&str; 3] = ["Zinc", "Copper", "Nickel"];

/// Returns the pH-dependent limit for a metal, or `None` if `parameter` is
/// not one of [`PH_DEPENDENT`].
#[must_use]
pub fn ph_dependent_limit(parameter: &str, ph: f64) -> Option<Limit> {
    let [acidic, neutral, alkaline] = match parameter {
        "Zinc" => [200.0, 200.0, 300.0],
        "Copper" => [100.0, 135.0, 200.0],
        "Nickel" => [60.0, 75.0, 110.0],
        _ => return None,
    };

    let upper = if ph < 6.0 {
        acidic
    } else if ph <= 7.0 {
        neutral
    } else {
        alkaline
    };
    Some(Limit::new(0.0, upper))
}

/// Returns the limits that change at the blended pH of `ratios`.
///
/// Empty if pH is not active, no pH-dependent metal is active, or every
/// active metal already has the right limit.
#[must_use]
pub fn adjustments(params: &ParameterSet, ratios: &[f64]) -> Limits {
    let Some(ph) = params.target(PH) else {
        return Limits::new();
    };
    let blended = ph.column.blend(ratios);

    PH_DEPENDENT
        .iter()
        .filter_map(|&metal| {
            let current = params.target(metal)?.limit;
            let limit = ph_dependent_limit(metal, blended)?;
            (limit != current).then(|| (metal.to_owned(), limit))
        })
        .collect()
}
