use nalgebra::{DMatrix, DVector};

use crate::optimization::Evaluation;

use super::{Solution, Status};

/// Powell damping threshold for the BFGS curvature condition.
const DAMPING: f64 = 0.2;

/// Safety factor applied to the largest multiplier when raising the penalty.
const PENALTY_MARGIN: f64 = 1.5;

/// The current iterate and everything the solver carries between steps.
pub(super) struct State {
    eval: Evaluation,
    hessian: DMatrix<f64>,

    /// `true` while `hessian` is the identity.
    fresh: bool,

    penalty: f64,
}

impl State {
    pub(super) fn new(eval: Evaluation) -> Self {
        let n = eval.x.len();
        Self {
            eval,
            hessian: DMatrix::identity(n, n),
            fresh: true,
            penalty: 0.0,
        }
    }

    pub(super) fn evaluation(&self) -> &Evaluation {
        &self.eval
    }

    pub(super) fn x(&self) -> &[f64] {
        &self.eval.x
    }

    pub(super) fn objective(&self) -> f64 {
        self.eval.objective
    }

    pub(super) fn violation(&self) -> f64 {
        self.eval.violation()
    }

    pub(super) fn hessian(&self) -> &DMatrix<f64> {
        &self.hessian
    }

    pub(super) fn penalty(&self) -> f64 {
        self.penalty
    }

    pub(super) fn is_fresh(&self) -> bool {
        self.fresh
    }

    pub(super) fn reset_hessian(&mut self) {
        let n = self.eval.x.len();
        self.hessian = DMatrix::identity(n, n);
        self.fresh = true;
    }

    /// Raises the penalty so it dominates the given constraint multipliers.
    ///
    /// The penalty never decreases.
    pub(super) fn raise_penalty(&mut self, multipliers: &[f64]) {
        let largest = multipliers.iter().fold(0.0_f64, |acc, m| acc.max(m.abs()));
        self.penalty = self.penalty.max(PENALTY_MARGIN * largest);
    }

    /// Returns the L1 merit `f + μ·violation` of an evaluation.
    pub(super) fn merit(&self, eval: &Evaluation) -> f64 {
        eval.objective + self.penalty * eval.violation()
    }

    /// Moves to `next` and updates the Hessian approximation.
    ///
    /// `multipliers` are the constraint multipliers from the step that led
    /// to `next`, equalities first.
    pub(super) fn advance(&mut self, next: Evaluation, multipliers: &[f64]) {
        let s = DVector::from_iterator(
            next.x.len(),
            next.x.iter().zip(&self.eval.x).map(|(new, old)| new - old),
        );
        let y = lagrangian_gradient(&next, multipliers) - lagrangian_gradient(&self.eval, multipliers);

        self.update_hessian(&s, &y);
        self.eval = next;
    }

    /// Damped BFGS update.
    fn update_hessian(&mut self, s: &DVector<f64>, y: &DVector<f64>) {
        let bs = &self.hessian * s;
        let s_bs = s.dot(&bs);
        if s_bs <= 0.0 {
            return;
        }

        let s_y = s.dot(y);
        let r = if s_y < DAMPING * s_bs {
            let theta = (1.0 - DAMPING) * s_bs / (s_bs - s_y);
            y * theta + &bs * (1.0 - theta)
        } else {
            y.clone()
        };
        let s_r = s.dot(&r);

        self.hessian -= &bs * bs.transpose() / s_bs;
        self.hessian += &r * r.transpose() / s_r;
        self.fresh = false;
    }

    pub(super) fn into_solution(self, status: Status, iters: usize) -> Solution {
        let violation = self.eval.violation();
        Solution {
            status,
            x: self.eval.x,
            objective: self.eval.objective,
            violation,
            iters,
        }
    }
}

/// Returns `∇f - Σ λⱼ ∇cⱼ`, with equality rows before inequality rows.
fn lagrangian_gradient(eval: &Evaluation, multipliers: &[f64]) -> DVector<f64> {
    let mut grad = DVector::from_column_slice(&eval.gradient);
    let rows = eval
        .equality_jacobian
        .iter()
        .chain(&eval.inequality_jacobian);

    for (row, &lambda) in rows.zip(multipliers) {
        for (g, &j) in grad.iter_mut().zip(row) {
            *g -= lambda * j;
        }
    }

    grad
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn eval_at(x: &[f64], gradient: &[f64]) -> Evaluation {
        Evaluation {
            x: x.to_vec(),
            objective: 0.0,
            gradient: gradient.to_vec(),
            equalities: vec![],
            equality_jacobian: vec![],
            inequalities: vec![-0.5],
            inequality_jacobian: vec![vec![1.0, 0.0]],
        }
    }

    #[test]
    fn penalty_only_grows() {
        let mut state = State::new(eval_at(&[0.0, 0.0], &[0.0, 0.0]));

        state.raise_penalty(&[-2.0, 1.0]);
        assert_relative_eq!(state.penalty(), 3.0);

        state.raise_penalty(&[0.5]);
        assert_relative_eq!(state.penalty(), 3.0);
    }

    #[test]
    fn merit_adds_weighted_violation() {
        let mut state = State::new(eval_at(&[0.0, 0.0], &[0.0, 0.0]));
        state.raise_penalty(&[2.0]);

        assert_relative_eq!(state.merit(state.evaluation()), 1.5);
    }

    #[test]
    fn bfgs_update_matches_curvature() {
        // Gradient of x² + 2y² moves from (2, 4) to (4, 8) when x goes (1, 1) → (2, 2).
        let mut state = State::new(eval_at(&[1.0, 1.0], &[2.0, 4.0]));
        state.advance(eval_at(&[2.0, 2.0], &[4.0, 8.0]), &[0.0]);

        assert!(!state.is_fresh());
        let s = DVector::from_column_slice(&[1.0, 1.0]);
        let bs = state.hessian() * &s;
        // Secant condition B s = y.
        assert_relative_eq!(bs[0], 2.0, epsilon = 1e-12);
        assert_relative_eq!(bs[1], 4.0, epsilon = 1e-12);
    }

    #[test]
    fn damped_update_stays_positive_definite() {
        // Zero curvature along s would make a plain BFGS update singular.
        let mut state = State::new(eval_at(&[0.0, 0.0], &[1.0, 1.0]));
        state.advance(eval_at(&[1.0, 0.0], &[1.0, 1.0]), &[0.0]);

        assert!(state.hessian().clone().cholesky().is_some());

        state.reset_hessian();
        assert!(state.is_fresh());
        assert_eq!(state.hessian(), &DMatrix::identity(2, 2));
    }
}
