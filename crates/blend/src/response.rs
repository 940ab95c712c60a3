use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Limits, MixSolution};

/// The JSON shape of a [`MixSolution`], rounded for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixResponse {
    pub success: bool,
    pub ratios: Vec<f64>,
    pub blended_values: BTreeMap<String, f64>,
    pub residuals: BTreeMap<String, f64>,
    pub total_residual: f64,
    pub within_tolerance: bool,
    pub within_limits: bool,
    pub suggested_tolerance: Option<f64>,
    pub message: String,
    pub tolerance: f64,
    pub missing_data_params: Vec<String>,
    pub adjusted_limits: Limits,
    pub iterations: usize,
}

/// Rounds to four decimal places.
#[must_use]
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn round_all(values: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    values.iter().map(|(k, &v)| (k.clone(), round4(v))).collect()
}

impl From<&MixSolution> for MixResponse {
    fn from(solution: &MixSolution) -> Self {
        Self {
            success: solution.success(),
            ratios: solution.ratios.iter().copied().map(round4).collect(),
            blended_values: round_all(&solution.blended_values),
            residuals: round_all(&solution.residuals),
            total_residual: round4(solution.total_residual),
            within_tolerance: solution.within_tolerance,
            within_limits: solution.within_limits,
            suggested_tolerance: solution.suggested_tolerance,
            message: solution.message.clone(),
            tolerance: round4(solution.tolerance),
            missing_data_params: solution.missing_data_params.clone(),
            adjusted_limits: solution.adjusted_limits.clone(),
            iterations: solution.iterations,
        }
    }
}
