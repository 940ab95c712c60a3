use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Batch, InputError, Limit, Limits};

/// Tolerance used when a request does not give one.
pub const DEFAULT_TOLERANCE: f64 = 0.75;

/// A request to blend batches within limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixRequest {
    #[serde(default)]
    pub batches: Vec<Batch>,

    #[serde(default)]
    pub limits: Limits,

    /// Strictness in `[0, 1]`; larger values demand blends closer to the
    /// midpoints.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Optional share limits keyed by batch index.
    #[serde(default, alias = "material_constraints")]
    pub ratio_bounds: BTreeMap<usize, RatioBound>,

    /// Lower the tolerance until the optimal blend meets it.
    #[serde(default)]
    pub auto_relax: bool,

    /// Re-solve with metal limits chosen from the blended pH.
    #[serde(default)]
    pub ph_dependent_limits: bool,
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

/// Share limits for one batch, as fractions of the whole blend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioBound {
    #[serde(default)]
    pub min: f64,

    #[serde(default = "one")]
    pub max: f64,
}

fn one() -> f64 {
    1.0
}

impl RatioBound {
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

impl MixRequest {
    /// Creates a request with default options.
    #[must_use]
    pub fn new(batches: Vec<Batch>, limits: Limits) -> Self {
        Self {
            batches,
            limits,
            tolerance: DEFAULT_TOLERANCE,
            ratio_bounds: BTreeMap::new(),
            auto_relax: false,
            ph_dependent_limits: false,
        }
    }

    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn with_ratio_bound(mut self, batch: usize, bound: RatioBound) -> Self {
        self.ratio_bounds.insert(batch, bound);
        self
    }

    #[must_use]
    pub fn with_auto_relax(mut self, enabled: bool) -> Self {
        self.auto_relax = enabled;
        self
    }

    #[must_use]
    pub fn with_ph_dependent_limits(mut self, enabled: bool) -> Self {
        self.ph_dependent_limits = enabled;
        self
    }

    /// Adds or replaces a limit.
    #[must_use]
    pub fn with_limit(mut self, parameter: impl Into<String>, limit: Limit) -> Self {
        self.limits.insert(parameter.into(), limit);
        self
    }

    /// Checks the request-level options.
    ///
    /// Batch and limit contents are checked when parameters are prepared.
    ///
    /// # Errors
    ///
    /// Returns an error if batches or limits are empty or the tolerance is
    /// outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.batches.is_empty() {
            return Err(InputError::NoBatches);
        }
        if self.limits.is_empty() {
            return Err(InputError::NoLimits);
        }
        if !(0.0..=1.0).contains(&self.tolerance) {
            return Err(InputError::InvalidTolerance(self.tolerance));
        }
        Ok(())
    }

    /// Returns one `[min, max]` ratio bound per batch, `[0, 1]` unless
    /// overridden.
    ///
    /// # Errors
    ///
    /// Returns an error if a bound names a batch that does not exist or is
    /// not ordered within `[0, 1]`.
    pub fn bounds(&self) -> Result<Vec<[f64; 2]>, InputError> {
        let count = self.batches.len();
        let mut bounds = vec![[0.0, 1.0]; count];

        for (&index, &RatioBound { min, max }) in &self.ratio_bounds {
            let slot = bounds
                .get_mut(index)
                .ok_or(InputError::UnknownBatch { index, count })?;

            let valid = (0.0..=1.0).contains(&min) && (0.0..=1.0).contains(&max) && min <= max;
            if !valid {
                return Err(InputError::InvalidRatioBounds { index, min, max });
            }
            *slot = [min, max];
        }

        Ok(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_request_with_defaults() {
        let request: MixRequest = serde_json::from_str(
            r#"{
                "batches": [{"name": "A", "pH": 7.0}],
                "limits": {"pH": {"lower": 5.5, "upper": 8.5}}
            }"#,
        )
        .unwrap();

        assert_eq!(request.tolerance, DEFAULT_TOLERANCE);
        assert!(request.ratio_bounds.is_empty());
        assert!(!request.auto_relax);
        assert!(!request.ph_dependent_limits);
        assert_eq!(request.limits["pH"], Limit::new(5.5, 8.5));
    }

    #[test]
    fn accepts_material_constraints_alias() {
        let request: MixRequest = serde_json::from_str(
            r#"{
                "batches": [{"name": "A", "pH": 7.0}, {"name": "B", "pH": 6.0}],
                "limits": {"pH": {"lower": 5.5, "upper": 8.5}},
                "material_constraints": {"1": {"min": 0.2}}
            }"#,
        )
        .unwrap();

        assert_eq!(request.ratio_bounds[&1], RatioBound::new(0.2, 1.0));
        assert_eq!(request.bounds().unwrap(), vec![[0.0, 1.0], [0.2, 1.0]]);
    }

    #[test]
    fn missing_sections_fail_validation() {
        let request: MixRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.validate(), Err(InputError::NoBatches));

        let request = MixRequest::new(vec![Batch::new("A").with("pH", 7.0)], Limits::new());
        assert_eq!(request.validate(), Err(InputError::NoLimits));
    }

    #[test]
    fn rejects_out_of_range_tolerance() {
        let request = MixRequest::new(vec![Batch::new("A").with("pH", 7.0)], Limits::new())
            .with_limit("pH", Limit::new(5.5, 8.5))
            .with_tolerance(1.5);

        assert_eq!(request.validate(), Err(InputError::InvalidTolerance(1.5)));
    }

    #[test]
    fn rejects_bad_ratio_bounds() {
        let request = MixRequest::new(vec![Batch::new("A"), Batch::new("B")], Limits::new());

        let unknown = request.clone().with_ratio_bound(2, RatioBound::new(0.0, 0.5));
        assert_eq!(
            unknown.bounds(),
            Err(InputError::UnknownBatch { index: 2, count: 2 })
        );

        let reversed = request.with_ratio_bound(0, RatioBound::new(0.6, 0.4));
        assert_eq!(
            reversed.bounds(),
            Err(InputError::InvalidRatioBounds {
                index: 0,
                min: 0.6,
                max: 0.4
            })
        );
    }
}
