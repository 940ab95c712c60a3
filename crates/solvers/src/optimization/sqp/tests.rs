use std::convert::Infallible;

use approx::assert_relative_eq;
use thiserror::Error;

use mixwise_core::ConstrainedProblem;

use super::{Action, Config, Error, Event, Status, minimize, minimize_unobserved};

const FREE: [f64; 2] = [f64::NEG_INFINITY, f64::INFINITY];

/// f(x, y) = (x - 1)² + (y + 2)².
struct Bowl;

impl ConstrainedProblem for Bowl {
    type Error = Infallible;

    fn dimension(&self) -> usize {
        2
    }

    fn objective(&self, x: &[f64]) -> Result<f64, Self::Error> {
        Ok((x[0] - 1.0).powi(2) + (x[1] + 2.0).powi(2))
    }
}

#[test]
fn minimizes_unconstrained_quadratic() {
    let solution = minimize_unobserved(&Bowl, &[0.0, 0.0], &[FREE; 2], &Config::default())
        .expect("should solve");

    assert_eq!(solution.status, Status::Converged);
    assert!(solution.converged());
    assert_relative_eq!(solution.x[0], 1.0, epsilon = 1e-8);
    assert_relative_eq!(solution.x[1], -2.0, epsilon = 1e-8);
    assert_relative_eq!(solution.objective, 0.0, epsilon = 1e-12);
}

/// min x² + y² subject to x + y = 1.
struct Circle;

impl ConstrainedProblem for Circle {
    type Error = Infallible;

    fn dimension(&self) -> usize {
        2
    }

    fn objective(&self, x: &[f64]) -> Result<f64, Self::Error> {
        Ok(x[0] * x[0] + x[1] * x[1])
    }

    fn gradient(&self, x: &[f64]) -> Result<Vec<f64>, Self::Error> {
        Ok(vec![2.0 * x[0], 2.0 * x[1]])
    }

    fn equalities(&self, x: &[f64]) -> Result<Vec<f64>, Self::Error> {
        Ok(vec![x[0] + x[1] - 1.0])
    }
}

#[test]
fn satisfies_equality_constraint() {
    let solution = minimize_unobserved(&Circle, &[0.0, 0.0], &[FREE; 2], &Config::default())
        .expect("should solve");

    assert_eq!(solution.status, Status::Converged);
    assert_relative_eq!(solution.x[0], 0.5, epsilon = 1e-8);
    assert_relative_eq!(solution.x[1], 0.5, epsilon = 1e-8);
    assert!(solution.violation < 1e-10);
}

/// f(x, y) = -x - y, which only bounds can stop.
struct Tilted;

impl ConstrainedProblem for Tilted {
    type Error = Infallible;

    fn dimension(&self) -> usize {
        2
    }

    fn objective(&self, x: &[f64]) -> Result<f64, Self::Error> {
        Ok(-x[0] - x[1])
    }
}

#[test]
fn stops_at_bounds() {
    let bounds = [[0.0, 1.0]; 2];
    let solution = minimize_unobserved(&Tilted, &[0.5, 0.5], &bounds, &Config::default())
        .expect("should solve");

    assert_eq!(solution.status, Status::Converged);
    assert_relative_eq!(solution.x[0], 1.0, epsilon = 1e-12);
    assert_relative_eq!(solution.x[1], 1.0, epsilon = 1e-12);
}

#[test]
fn clamps_starting_point_into_bounds() {
    let bounds = [[0.0, 1.0]; 2];
    let solution = minimize_unobserved(&Tilted, &[5.0, -3.0], &bounds, &Config::default())
        .expect("should solve");

    assert!(solution.x.iter().all(|&x| (0.0..=1.0).contains(&x)));
    assert_relative_eq!(solution.objective, -2.0, epsilon = 1e-12);
}

/// A classic test problem with three linear inequalities and non-negative
/// variables. The optimum is (1.4, 1.7).
struct Classic;

impl ConstrainedProblem for Classic {
    type Error = Infallible;

    fn dimension(&self) -> usize {
        2
    }

    fn objective(&self, x: &[f64]) -> Result<f64, Self::Error> {
        Ok((x[0] - 1.0).powi(2) + (x[1] - 2.5).powi(2))
    }

    fn inequalities(&self, x: &[f64]) -> Result<Vec<f64>, Self::Error> {
        Ok(vec![
            x[0] - 2.0 * x[1] + 2.0,
            -x[0] - 2.0 * x[1] + 6.0,
            -x[0] + 2.0 * x[1] + 2.0,
        ])
    }
}

#[test]
fn solves_inequality_constrained_problem() {
    let bounds = [[0.0, f64::INFINITY]; 2];
    let solution = minimize_unobserved(&Classic, &[2.0, 0.0], &bounds, &Config::default())
        .expect("should solve");

    assert_eq!(solution.status, Status::Converged);
    assert_relative_eq!(solution.x[0], 1.4, epsilon = 1e-4);
    assert_relative_eq!(solution.x[1], 1.7, epsilon = 1e-4);
}

/// min -x - 2y subject to x + y ≤ 1 with non-negative variables.
struct Corner;

impl ConstrainedProblem for Corner {
    type Error = Infallible;

    fn dimension(&self) -> usize {
        2
    }

    fn objective(&self, x: &[f64]) -> Result<f64, Self::Error> {
        Ok(-x[0] - 2.0 * x[1])
    }

    fn gradient(&self, _x: &[f64]) -> Result<Vec<f64>, Self::Error> {
        Ok(vec![-1.0, -2.0])
    }

    fn inequalities(&self, x: &[f64]) -> Result<Vec<f64>, Self::Error> {
        Ok(vec![1.0 - x[0] - x[1]])
    }

    fn inequality_jacobian(&self, _x: &[f64]) -> Result<Vec<Vec<f64>>, Self::Error> {
        Ok(vec![vec![-1.0, -1.0]])
    }
}

#[test]
fn linear_program_stops_at_optimal_vertex() {
    let bounds = [[0.0, f64::INFINITY]; 2];
    let solution = minimize_unobserved(&Corner, &[0.0, 0.0], &bounds, &Config::default())
        .expect("should solve");

    assert_eq!(solution.status, Status::Converged);
    assert_relative_eq!(solution.x[0], 0.0, epsilon = 1e-10);
    assert_relative_eq!(solution.x[1], 1.0, epsilon = 1e-10);
    assert_relative_eq!(solution.objective, -2.0, epsilon = 1e-10);
}

/// f(x) = x, but the gradient claims the objective falls as x grows.
struct Misleading;

impl ConstrainedProblem for Misleading {
    type Error = Infallible;

    fn dimension(&self) -> usize {
        1
    }

    fn objective(&self, x: &[f64]) -> Result<f64, Self::Error> {
        Ok(x[0])
    }

    fn gradient(&self, _x: &[f64]) -> Result<Vec<f64>, Self::Error> {
        Ok(vec![-1.0])
    }
}

#[test]
fn failed_line_search_away_from_stationarity_is_not_convergence() {
    let solution =
        minimize_unobserved(&Misleading, &[0.0], &[FREE], &Config::default()).expect("ok");

    assert_eq!(solution.status, Status::LineSearchFailed);
    assert!(!solution.converged());
    assert_eq!(solution.message(), "Positive directional derivative for linesearch");
    assert_relative_eq!(solution.x[0], 0.0);
}

/// Requires x ≥ 2 and x ≤ 1.
struct Contradiction;

impl ConstrainedProblem for Contradiction {
    type Error = Infallible;

    fn dimension(&self) -> usize {
        1
    }

    fn objective(&self, x: &[f64]) -> Result<f64, Self::Error> {
        Ok(x[0] * x[0])
    }

    fn inequalities(&self, x: &[f64]) -> Result<Vec<f64>, Self::Error> {
        Ok(vec![x[0] - 2.0, 1.0 - x[0]])
    }
}

#[test]
fn reports_incompatible_constraints() {
    let solution =
        minimize_unobserved(&Contradiction, &[0.0], &[FREE], &Config::default()).expect("ok");

    assert_eq!(solution.status, Status::Incompatible);
    assert!(!solution.converged());
    assert_eq!(solution.message(), "Inequality constraints incompatible");
    assert_relative_eq!(solution.x[0], 0.0);
}

#[test]
fn observer_sees_each_step_and_can_stop() {
    let mut seen = Vec::new();
    let solution = minimize(
        &Bowl,
        &[0.0, 0.0],
        &[FREE; 2],
        &Config::default(),
        |event: &Event<'_>| {
            seen.push((event.iter, event.x.to_vec()));
            Some(Action::StopEarly)
        },
    )
    .expect("should stop cleanly");

    assert_eq!(solution.status, Status::StoppedByObserver);
    assert_eq!(solution.iters, 1);
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, 1);
    assert_eq!(seen[0].1, solution.x);
}

#[test]
fn iteration_limit_is_reported() {
    let config = Config::new(1, 1e-9).unwrap();
    let solution =
        minimize_unobserved(&Classic, &[2.0, 0.0], &[[0.0, f64::INFINITY]; 2], &config).unwrap();

    assert_eq!(solution.status, Status::MaxIters);
    assert_eq!(solution.iters, 1);
}

#[test]
fn rejects_mismatched_inputs() {
    let config = Config::default();

    let err = minimize_unobserved(&Bowl, &[0.0], &[FREE; 2], &config).unwrap_err();
    assert!(matches!(
        err,
        Error::DimensionMismatch {
            what: "initial guess",
            expected: 2,
            found: 1
        }
    ));

    let err = minimize_unobserved(&Bowl, &[0.0, 0.0], &[FREE], &config).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { what: "bounds", .. }));
}

#[test]
fn rejects_invalid_bounds_and_guesses() {
    let config = Config::default();

    let err = minimize_unobserved(&Bowl, &[0.0, 0.0], &[FREE, [1.0, 0.0]], &config).unwrap_err();
    assert!(matches!(err, Error::InvalidBound { index: 1, .. }));

    let err =
        minimize_unobserved(&Bowl, &[0.0, 0.0], &[[f64::NAN, 1.0], FREE], &config).unwrap_err();
    assert!(matches!(err, Error::InvalidBound { index: 0, .. }));

    let err = minimize_unobserved(&Bowl, &[0.0, f64::NAN], &[FREE; 2], &config).unwrap_err();
    assert!(matches!(err, Error::NonFiniteGuess { index: 1 }));
}

#[derive(Debug, Error)]
#[error("refusing to evaluate at {0}")]
struct Refusal(f64);

/// Fails for any x above 0.5.
struct Fragile;

impl ConstrainedProblem for Fragile {
    type Error = Refusal;

    fn dimension(&self) -> usize {
        1
    }

    fn objective(&self, x: &[f64]) -> Result<f64, Self::Error> {
        if x[0] > 0.5 {
            Err(Refusal(x[0]))
        } else {
            Ok(-x[0])
        }
    }
}

#[test]
fn problem_errors_propagate() {
    let err = minimize_unobserved(&Fragile, &[0.0], &[FREE], &Config::default()).unwrap_err();

    assert!(matches!(err, Error::Problem(_)));
    assert!(err.to_string().contains("refusing to evaluate"));
}
