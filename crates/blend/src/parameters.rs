use tracing::debug;

use crate::{Batch, InputError, Limit, Limits};

/// A parameter with a value in every batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,

    /// One value per batch, in batch order.
    pub values: Vec<f64>,
}

impl Column {
    /// Returns the ratio-weighted blend of this parameter.
    #[must_use]
    pub fn blend(&self, ratios: &[f64]) -> f64 {
        self.values.iter().zip(ratios).map(|(v, r)| v * r).sum()
    }
}

/// An active parameter: limited, not ignored, and measured in every batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub column: Column,
    pub limit: Limit,
    pub midpoint: f64,

    /// Normalization range, never zero.
    pub range: f64,
}

impl Target {
    fn new(column: Column, limit: Limit) -> Self {
        Self {
            column,
            limit,
            midpoint: limit.midpoint(),
            range: limit.range(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.column.name
    }

    /// Returns the normalized deviation `|blended - midpoint| / range`.
    #[must_use]
    pub fn residual(&self, blended: f64) -> f64 {
        (blended - self.midpoint).abs() / self.range
    }
}

/// The parameters of a request, sorted by name and split by role.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    batch_count: usize,
    names: Vec<String>,
    columns: Vec<Column>,
    targets: Vec<Target>,
    missing: Vec<String>,
}

impl ParameterSet {
    /// Validates batches against limits and derives the active targets.
    ///
    /// Parameters are taken from the first batch. A parameter is active if it
    /// has a limit whose upper bound is not the ignore sentinel and a value in
    /// every batch. Parameters with a `null` value in any batch are reported
    /// as missing and left out of blending entirely.
    ///
    /// # Errors
    ///
    /// Returns an [`InputError`] if batches or limits are empty, a limit is
    /// invalid, batches disagree on their parameters, a limited parameter is
    /// absent, or a measured value is not finite.
    pub fn new(batches: &[Batch], limits: &Limits) -> Result<Self, InputError> {
        let first = batches.first().ok_or(InputError::NoBatches)?;
        if limits.is_empty() {
            return Err(InputError::NoLimits);
        }

        for (parameter, limit) in limits.iter().filter(|(_, l)| !l.is_ignored()) {
            limit.validate(parameter)?;
        }

        let names: Vec<String> = first.parameters().map(str::to_owned).collect();
        for (index, batch) in batches.iter().enumerate().skip(1) {
            if !batch.parameters().eq(first.parameters()) {
                return Err(InputError::InconsistentParameters {
                    index,
                    batch: batch.name.clone(),
                    expected: names.clone(),
                    found: batch.parameters().map(str::to_owned).collect(),
                });
            }
        }

        if let Some(parameter) = limits
            .iter()
            .find(|(p, l)| !l.is_ignored() && !first.has_parameter(p))
            .map(|(p, _)| p)
        {
            return Err(InputError::MissingParameter {
                batch: first.name.clone(),
                parameter: parameter.clone(),
            });
        }

        let mut columns = Vec::new();
        let mut missing = Vec::new();
        for name in &names {
            let mut values = Vec::with_capacity(batches.len());
            for batch in batches {
                match batch.value(name) {
                    Some(v) if !v.is_finite() => {
                        return Err(InputError::NonFiniteValue {
                            batch: batch.name.clone(),
                            parameter: name.clone(),
                        });
                    }
                    Some(v) => values.push(v),
                    None => {}
                }
            }

            if values.len() == batches.len() {
                columns.push(Column {
                    name: name.clone(),
                    values,
                });
            } else {
                missing.push(name.clone());
            }
        }

        let targets: Vec<Target> = columns
            .iter()
            .filter_map(|column| {
                limits
                    .get(&column.name)
                    .filter(|limit| !limit.is_ignored())
                    .map(|&limit| Target::new(column.clone(), limit))
            })
            .collect();

        debug!(
            batches = batches.len(),
            parameters = names.len(),
            active = targets.len(),
            missing = missing.len(),
            "prepared parameters"
        );

        Ok(Self {
            batch_count: batches.len(),
            names,
            columns,
            targets,
            missing,
        })
    }

    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.batch_count
    }

    /// Returns every parameter name from the first batch.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns the parameters that are blended and reported.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the active parameters.
    #[must_use]
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    #[must_use]
    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name() == name)
    }

    /// Returns the parameters left out because of missing data.
    #[must_use]
    pub fn missing(&self) -> &[String] {
        &self.missing
    }
}
