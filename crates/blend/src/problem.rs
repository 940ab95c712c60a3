use std::convert::Infallible;

use mixwise_core::ConstrainedProblem;

use crate::{ParameterSet, Target, ZERO_RANGE_EPSILON};

/// Which side of a limit a constraint enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// `upper - blend ≥ 0`.
    Upper,

    /// `blend - lower ≥ 0`.
    Lower,
}

/// One hard-limit inequality on an active parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitConstraint {
    pub side: Side,

    /// Index into [`ParameterSet::targets`].
    pub target: usize,

    pub bound: f64,
}

impl LimitConstraint {
    /// Returns the constraint value for a blended value; non-negative when
    /// satisfied.
    #[must_use]
    pub fn slack(&self, blended: f64) -> f64 {
        match self.side {
            Side::Upper => self.bound - blended,
            Side::Lower => blended - self.bound,
        }
    }
}

/// The blending problem over one ratio per batch.
///
/// Minimizes the summed residuals of the active parameters subject to the
/// ratios summing to one and every active blend staying within its limit.
///
/// The sum of absolute deviations has a kink at every midpoint, so the
/// solver sees it in linear form. Each scored target `j` gets a bound
/// variable `sⱼ` after the ratios, the objective is `Σ sⱼ`, and the rows
///
/// ```text
/// sⱼ - (blend - midpoint) / range ≥ 0
/// sⱼ + (blend - midpoint) / range ≥ 0
/// ```
///
/// hold each `sⱼ` at or above its residual. At the optimum every `sⱼ`
/// equals its residual. Targets whose limits pin a single value are not
/// scored; their limit rows already hold them at the midpoint.
#[derive(Debug, Clone)]
pub struct BlendProblem<'a> {
    batches: usize,
    targets: &'a [Target],
    constraints: Vec<LimitConstraint>,

    /// Indices into `targets` of the scored targets, one per bound variable.
    scored: Vec<usize>,
}

impl<'a> BlendProblem<'a> {
    #[must_use]
    pub fn new(params: &'a ParameterSet) -> Self {
        let targets = params.targets();
        let constraints = targets
            .iter()
            .enumerate()
            .flat_map(|(target, t)| {
                [
                    LimitConstraint {
                        side: Side::Upper,
                        target,
                        bound: t.limit.upper,
                    },
                    LimitConstraint {
                        side: Side::Lower,
                        target,
                        bound: t.limit.lower,
                    },
                ]
            })
            .collect();
        let scored = targets
            .iter()
            .enumerate()
            .filter(|(_, t)| t.limit.upper - t.limit.lower > ZERO_RANGE_EPSILON)
            .map(|(index, _)| index)
            .collect();

        Self {
            batches: params.batch_count(),
            targets,
            constraints,
            scored,
        }
    }

    #[must_use]
    pub fn constraints(&self) -> &[LimitConstraint] {
        &self.constraints
    }

    /// Returns the number of ratios, which lead every solver vector.
    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.batches
    }

    /// Returns the ratios part of a solver vector.
    #[must_use]
    pub fn ratios<'x>(&self, x: &'x [f64]) -> &'x [f64] {
        &x[..self.batches]
    }

    /// Returns the summed residuals of all active parameters at `ratios`.
    #[must_use]
    pub fn total_residual(&self, ratios: &[f64]) -> f64 {
        self.targets
            .iter()
            .map(|t| t.residual(t.column.blend(ratios)))
            .sum()
    }

    /// Extends per-batch ratio bounds with free bounds for the residual
    /// variables.
    #[must_use]
    pub fn bounds(&self, ratio_bounds: &[[f64; 2]]) -> Vec<[f64; 2]> {
        ratio_bounds
            .iter()
            .copied()
            .chain(std::iter::repeat_n(
                [f64::NEG_INFINITY, f64::INFINITY],
                self.scored.len(),
            ))
            .collect()
    }

    /// Returns equal ratios, clamped into `ratio_bounds`, followed by the
    /// residuals they produce.
    #[must_use]
    pub fn initial_guess(&self, ratio_bounds: &[[f64; 2]]) -> Vec<f64> {
        let even = 1.0 / self.batches as f64;
        let ratios: Vec<f64> = ratio_bounds
            .iter()
            .map(|&[lower, upper]| even.clamp(lower, upper))
            .collect();
        let residuals: Vec<f64> = self
            .scored
            .iter()
            .map(|&j| {
                let t = &self.targets[j];
                t.residual(t.column.blend(&ratios))
            })
            .collect();

        ratios.into_iter().chain(residuals).collect()
    }

    /// Returns `(blend - midpoint) / range` for each scored target.
    fn deviations(&self, ratios: &[f64]) -> impl Iterator<Item = f64> {
        self.scored.iter().map(move |&j| {
            let t = &self.targets[j];
            (t.column.blend(ratios) - t.midpoint) / t.range
        })
    }
}

impl ConstrainedProblem for BlendProblem<'_> {
    type Error = Infallible;

    fn dimension(&self) -> usize {
        self.batches + self.scored.len()
    }

    fn objective(&self, x: &[f64]) -> Result<f64, Self::Error> {
        Ok(x[self.batches..].iter().sum())
    }

    fn gradient(&self, _x: &[f64]) -> Result<Vec<f64>, Self::Error> {
        let mut grad = vec![0.0; self.batches];
        grad.resize(self.dimension(), 1.0);
        Ok(grad)
    }

    fn equalities(&self, x: &[f64]) -> Result<Vec<f64>, Self::Error> {
        Ok(vec![self.ratios(x).iter().sum::<f64>() - 1.0])
    }

    fn equality_jacobian(&self, _x: &[f64]) -> Result<Vec<Vec<f64>>, Self::Error> {
        let mut row = vec![1.0; self.batches];
        row.resize(self.dimension(), 0.0);
        Ok(vec![row])
    }

    fn inequalities(&self, x: &[f64]) -> Result<Vec<f64>, Self::Error> {
        let ratios = self.ratios(x);
        let limits = self
            .constraints
            .iter()
            .map(|c| c.slack(self.targets[c.target].column.blend(ratios)));
        let bounds = self
            .deviations(ratios)
            .zip(&x[self.batches..])
            .flat_map(|(deviation, s)| [s - deviation, s + deviation]);

        Ok(limits.chain(bounds).collect())
    }

    fn inequality_jacobian(&self, _x: &[f64]) -> Result<Vec<Vec<f64>>, Self::Error> {
        let n = self.dimension();
        let mut jacobian = Vec::with_capacity(self.constraints.len() + 2 * self.scored.len());

        for c in &self.constraints {
            let values = &self.targets[c.target].column.values;
            let mut row: Vec<f64> = match c.side {
                Side::Upper => values.iter().map(|v| -v).collect(),
                Side::Lower => values.clone(),
            };
            row.resize(n, 0.0);
            jacobian.push(row);
        }

        for (k, &j) in self.scored.iter().enumerate() {
            let t = &self.targets[j];
            let slope: Vec<f64> = t.column.values.iter().map(|v| v / t.range).collect();
            for sign in [-1.0, 1.0] {
                let mut row: Vec<f64> = slope.iter().map(|v| sign * v).collect();
                row.resize(n, 0.0);
                row[self.batches + k] = 1.0;
                jacobian.push(row);
            }
        }

        Ok(jacobian)
    }
}
