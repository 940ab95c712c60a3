use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One candidate material source and its measured parameter values.
///
/// A `None` value marks missing data. In JSON a batch is a flat object:
///
/// ```json
/// { "name": "North pile", "pH": 7.2, "Lead": 85.0, "Zinc": null }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    #[serde(default)]
    pub name: String,

    #[serde(flatten)]
    pub values: BTreeMap<String, Option<f64>>,
}

impl Batch {
    /// Creates a batch with no measurements.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
        }
    }

    /// Adds a measured value.
    #[must_use]
    pub fn with(mut self, parameter: impl Into<String>, value: f64) -> Self {
        self.values.insert(parameter.into(), Some(value));
        self
    }

    /// Adds a parameter whose value was not measured.
    #[must_use]
    pub fn with_missing(mut self, parameter: impl Into<String>) -> Self {
        self.values.insert(parameter.into(), None);
        self
    }

    /// Returns the measured value, or `None` if the parameter is absent or
    /// missing.
    #[must_use]
    pub fn value(&self, parameter: &str) -> Option<f64> {
        self.values.get(parameter).copied().flatten()
    }

    /// Returns the parameter names in sorted order.
    pub fn parameters(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    #[must_use]
    pub fn has_parameter(&self, parameter: &str) -> bool {
        self.values.contains_key(parameter)
    }
}
