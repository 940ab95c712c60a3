use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::InputError;

/// Upper bound that marks a parameter as ignored.
pub const IGNORE_SENTINEL: f64 = 9999.0;

/// Range substituted for a limit whose bounds coincide.
pub const ZERO_RANGE_EPSILON: f64 = 1e-10;

/// Permitted ranges keyed by parameter name.
pub type Limits = BTreeMap<String, Limit>;

/// A permitted `[lower, upper]` range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Limit {
    pub lower: f64,
    pub upper: f64,
}

impl Limit {
    #[must_use]
    pub fn new(lower: f64, upper: f64) -> Self {
        Self { lower, upper }
    }

    /// Returns a limit that excludes its parameter from optimization.
    #[must_use]
    pub fn ignored() -> Self {
        Self::new(0.0, IGNORE_SENTINEL)
    }

    /// Returns `true` if the upper bound is the ignore sentinel.
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.upper == IGNORE_SENTINEL
    }

    #[must_use]
    pub fn midpoint(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }

    /// Returns `upper - lower`, or [`ZERO_RANGE_EPSILON`] if that is zero.
    #[must_use]
    pub fn range(&self) -> f64 {
        let range = self.upper - self.lower;
        if range == 0.0 {
            ZERO_RANGE_EPSILON
        } else {
            range
        }
    }

    /// Checks that both bounds are finite and ordered.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::InvalidLimit`] naming `parameter` otherwise.
    pub fn validate(&self, parameter: &str) -> Result<(), InputError> {
        if self.lower.is_finite() && self.upper.is_finite() && self.lower <= self.upper {
            Ok(())
        } else {
            Err(InputError::InvalidLimit {
                parameter: parameter.to_owned(),
                lower: self.lower,
                upper: self.upper,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn midpoint_and_range() {
        let limit = Limit::new(5.5, 8.5);

        assert_relative_eq!(limit.midpoint(), 7.0);
        assert_relative_eq!(limit.range(), 3.0);
        assert!(!limit.is_ignored());
    }

    #[test]
    fn zero_range_uses_epsilon() {
        let limit = Limit::new(4.0, 4.0);

        assert_eq!(limit.range(), ZERO_RANGE_EPSILON);
        assert!(limit.validate("P").is_ok());
    }

    #[test]
    fn sentinel_marks_ignored() {
        assert!(Limit::ignored().is_ignored());
        assert!(Limit::new(10.0, IGNORE_SENTINEL).is_ignored());
    }

    #[test]
    fn validation_rejects_reversed_and_non_finite_bounds() {
        assert_eq!(
            Limit::new(2.0, 1.0).validate("Lead"),
            Err(InputError::InvalidLimit {
                parameter: "Lead".into(),
                lower: 2.0,
                upper: 1.0
            })
        );
        assert!(Limit::new(f64::NAN, 1.0).validate("Lead").is_err());
        assert!(Limit::new(0.0, f64::INFINITY).validate("Lead").is_err());
    }
}
