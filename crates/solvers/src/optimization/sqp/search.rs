use nalgebra::DVector;

use mixwise_core::{ConstrainedProblem, Observer};

use crate::optimization::{Evaluation, evaluate, quadratic};

use super::{Action, Config, Error, Event, Solution, Status, state::State};

/// Sufficient decrease constant for the Armijo condition.
const ARMIJO: f64 = 1e-4;

/// A search direction and the constraint multipliers that came with it.
struct Step {
    direction: Vec<f64>,

    /// Equality multipliers followed by inequality multipliers.
    multipliers: Vec<f64>,
}

pub(super) fn search<P, Obs>(
    problem: &P,
    x0: &[f64],
    bounds: &[[f64; 2]],
    config: &Config,
    mut observer: Obs,
) -> Result<Solution, Error>
where
    P: ConstrainedProblem,
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    validate(problem.dimension(), x0, bounds)?;

    let start: Vec<f64> = x0
        .iter()
        .zip(bounds)
        .map(|(&x, &[lower, upper])| x.clamp(lower, upper))
        .collect();
    let mut state = State::new(evaluate(problem, &start)?);

    for iter in 1..=config.max_iters() {
        let step = match direction(&mut state, bounds) {
            Ok(step) => step,
            Err(quadratic::Error::Infeasible) => {
                return Ok(state.into_solution(Status::Incompatible, iter));
            }
            Err(_) => return Ok(state.into_solution(Status::SubproblemFailed, iter)),
        };

        let feasible = state.violation() <= config.feasibility_tol();
        let norm = step.direction.iter().map(|d| d * d).sum::<f64>().sqrt();
        if feasible && norm <= config.step_tol() {
            return Ok(state.into_solution(Status::Converged, iter));
        }

        state.raise_penalty(&step.multipliers);
        let slope = merit_slope(&state, &step.direction);

        let Some((next, step_length)) =
            line_search(problem, &state, &step.direction, slope, bounds, config)?
        else {
            if !state.is_fresh() {
                state.reset_hessian();
                continue;
            }
            // With an identity Hessian the step is the projected gradient.
            let stationary = norm * norm <= config.ftol() * (1.0 + state.objective().abs());
            let status = if feasible && stationary {
                Status::Converged
            } else {
                Status::LineSearchFailed
            };
            return Ok(state.into_solution(status, iter));
        };

        let change = (next.objective - state.objective()).abs();
        state.advance(next, &step.multipliers);

        let event = Event {
            iter,
            x: state.x(),
            objective: state.objective(),
            violation: state.violation(),
            step_length,
            penalty: state.penalty(),
        };
        if let Some(Action::StopEarly) = observer.observe(&event) {
            return Ok(state.into_solution(Status::StoppedByObserver, iter));
        }

        // Only a full step counts toward the objective-change test.
        let full_step = step_length >= 1.0;
        if full_step && change <= config.ftol() && state.violation() <= config.feasibility_tol() {
            return Ok(state.into_solution(Status::Converged, iter));
        }
    }

    Ok(state.into_solution(Status::MaxIters, config.max_iters()))
}

fn validate(n: usize, x0: &[f64], bounds: &[[f64; 2]]) -> Result<(), Error> {
    if x0.len() != n {
        return Err(Error::DimensionMismatch {
            what: "initial guess",
            expected: n,
            found: x0.len(),
        });
    }
    if bounds.len() != n {
        return Err(Error::DimensionMismatch {
            what: "bounds",
            expected: n,
            found: bounds.len(),
        });
    }

    for (index, &[lower, upper]) in bounds.iter().enumerate() {
        let invalid = lower.is_nan()
            || upper.is_nan()
            || lower > upper
            || lower == f64::INFINITY
            || upper == f64::NEG_INFINITY;
        if invalid {
            return Err(Error::InvalidBound {
                index,
                lower,
                upper,
            });
        }
    }

    match x0.iter().position(|x| !x.is_finite()) {
        Some(index) => Err(Error::NonFiniteGuess { index }),
        None => Ok(()),
    }
}

/// Solves the quadratic subproblem, retrying once from an identity Hessian
/// if the current approximation breaks down.
fn direction(state: &mut State, bounds: &[[f64; 2]]) -> Result<Step, quadratic::Error> {
    match subproblem(state, bounds) {
        Err(quadratic::Error::Infeasible) => Err(quadratic::Error::Infeasible),
        Err(_) if !state.is_fresh() => {
            state.reset_hessian();
            subproblem(state, bounds)
        }
        result => result,
    }
}

/// Builds and solves
///
/// ```text
/// minimize    ½ dᵀBd + ∇f·d
/// subject to  ∇h·d = -h
///             ∇g·d ≥ -g
///             lower ≤ x + d ≤ upper
/// ```
fn subproblem(state: &State, bounds: &[[f64; 2]]) -> Result<Step, quadratic::Error> {
    let eval = state.evaluation();
    let n = eval.x.len();

    let mut qp = quadratic::Problem::new(
        state.hessian().clone(),
        DVector::from_column_slice(&eval.gradient),
    );
    for (row, &h) in eval.equality_jacobian.iter().zip(&eval.equalities) {
        qp.equality(DVector::from_column_slice(row), -h);
    }
    for (row, &g) in eval.inequality_jacobian.iter().zip(&eval.inequalities) {
        qp.inequality(DVector::from_column_slice(row), -g);
    }
    for (i, (&[lower, upper], &xi)) in bounds.iter().zip(&eval.x).enumerate() {
        if lower.is_finite() {
            qp.inequality(unit(n, i, 1.0), lower - xi);
        }
        if upper.is_finite() {
            qp.inequality(unit(n, i, -1.0), xi - upper);
        }
    }

    let solution = quadratic::solve(&qp)?;
    let constraints = eval.equalities.len() + eval.inequalities.len();

    Ok(Step {
        direction: solution.x.iter().copied().collect(),
        multipliers: solution.multipliers[..constraints].to_vec(),
    })
}

fn unit(n: usize, i: usize, value: f64) -> DVector<f64> {
    let mut v = DVector::zeros(n);
    v[i] = value;
    v
}

/// Returns the directional derivative of the merit function along
/// `direction`.
fn merit_slope(state: &State, direction: &[f64]) -> f64 {
    let current = state.evaluation();
    current
        .gradient
        .iter()
        .zip(direction)
        .map(|(g, d)| g * d)
        .sum::<f64>()
        - state.penalty() * current.violation()
}

/// Backtracks along `direction` until the merit function decreases enough.
///
/// Returns `None` if `slope` shows the direction is not a descent direction
/// for the merit function, or no acceptable step is found.
fn line_search<P>(
    problem: &P,
    state: &State,
    direction: &[f64],
    slope: f64,
    bounds: &[[f64; 2]],
    config: &Config,
) -> Result<Option<(Evaluation, f64)>, Error>
where
    P: ConstrainedProblem,
{
    if slope >= 0.0 {
        return Ok(None);
    }

    let current = state.evaluation();
    let merit = state.merit(current);

    let mut step_length = 1.0;
    for _ in 0..config.max_backtracks() {
        let trial: Vec<f64> = current
            .x
            .iter()
            .zip(direction)
            .zip(bounds)
            .map(|((x, d), &[lower, upper])| (x + step_length * d).clamp(lower, upper))
            .collect();

        let next = evaluate(problem, &trial)?;
        if state.merit(&next) <= merit + ARMIJO * step_length * slope {
            return Ok(Some((next, step_length)));
        }

        step_length *= 0.5;
    }

    Ok(None)
}
