use crate::difference;

/// Defines a constrained minimization problem over `dimension()` variables.
///
/// The problem is
///
/// ```text
/// minimize    f(x)
/// subject to  h(x) = 0
///             g(x) ≥ 0
/// ```
///
/// Box bounds on `x` are passed to the solver separately.
///
/// Only [`objective`](Self::objective) and [`dimension`](Self::dimension) are
/// required. Problems without constraints leave the constraint methods at
/// their defaults, and problems without analytic derivatives fall back to
/// central differences.
pub trait ConstrainedProblem {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the number of solver variables.
    fn dimension(&self) -> usize;

    /// Computes the objective `f(x)`.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the objective cannot be computed.
    fn objective(&self, x: &[f64]) -> Result<f64, Self::Error>;

    /// Computes the gradient of the objective.
    ///
    /// Defaults to a central-difference approximation.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the objective cannot be computed.
    fn gradient(&self, x: &[f64]) -> Result<Vec<f64>, Self::Error> {
        difference::gradient(x, |x| self.objective(x))
    }

    /// Computes the equality constraint values `h(x)`, which should be zero.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the constraints cannot be computed.
    fn equalities(&self, _x: &[f64]) -> Result<Vec<f64>, Self::Error> {
        Ok(Vec::new())
    }

    /// Computes the Jacobian of `h`, one row per equality constraint.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the constraints cannot be computed.
    fn equality_jacobian(&self, x: &[f64]) -> Result<Vec<Vec<f64>>, Self::Error> {
        difference::jacobian(x, |x| self.equalities(x))
    }

    /// Computes the inequality constraint values `g(x)`, which should be
    /// non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the constraints cannot be computed.
    fn inequalities(&self, _x: &[f64]) -> Result<Vec<f64>, Self::Error> {
        Ok(Vec::new())
    }

    /// Computes the Jacobian of `g`, one row per inequality constraint.
    ///
    /// # Errors
    ///
    /// Returns [`Self::Error`] if the constraints cannot be computed.
    fn inequality_jacobian(&self, x: &[f64]) -> Result<Vec<Vec<f64>>, Self::Error> {
        difference::jacobian(x, |x| self.inequalities(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    use approx::assert_relative_eq;

    /// `f(x, y) = x² + 3y`, subject to `x + y - 1 = 0` and `x ≥ 0`.
    struct Parabola;

    impl ConstrainedProblem for Parabola {
        type Error = Infallible;

        fn dimension(&self) -> usize {
            2
        }

        fn objective(&self, x: &[f64]) -> Result<f64, Self::Error> {
            Ok(x[0] * x[0] + 3.0 * x[1])
        }

        fn equalities(&self, x: &[f64]) -> Result<Vec<f64>, Self::Error> {
            Ok(vec![x[0] + x[1] - 1.0])
        }

        fn inequalities(&self, x: &[f64]) -> Result<Vec<f64>, Self::Error> {
            Ok(vec![x[0]])
        }
    }

    #[test]
    fn default_gradient_uses_differences() {
        let grad = Parabola.gradient(&[2.0, -1.0]).unwrap();

        assert_eq!(grad.len(), 2);
        assert_relative_eq!(grad[0], 4.0, epsilon = 1e-6);
        assert_relative_eq!(grad[1], 3.0, epsilon = 1e-6);
    }

    #[test]
    fn default_jacobians_match_linear_constraints() {
        let eq = Parabola.equality_jacobian(&[0.3, 0.7]).unwrap();
        let ineq = Parabola.inequality_jacobian(&[0.3, 0.7]).unwrap();

        assert_eq!(eq.len(), 1);
        assert_relative_eq!(eq[0][0], 1.0, epsilon = 1e-8);
        assert_relative_eq!(eq[0][1], 1.0, epsilon = 1e-8);

        assert_eq!(ineq.len(), 1);
        assert_relative_eq!(ineq[0][0], 1.0, epsilon = 1e-8);
        assert_relative_eq!(ineq[0][1], 0.0, epsilon = 1e-8);
    }

    struct Linear;

    impl ConstrainedProblem for Linear {
        type Error = Infallible;

        fn dimension(&self) -> usize {
            1
        }

        fn objective(&self, x: &[f64]) -> Result<f64, Self::Error> {
            Ok(x[0])
        }
    }

    #[test]
    fn constraints_default_to_empty() {
        assert!(Linear.equalities(&[1.0]).unwrap().is_empty());
        assert!(Linear.inequality_jacobian(&[1.0]).unwrap().is_empty());
    }
}
