//! Dense convex quadratic programming.
//!
//! Solves
//!
//! ```text
//! minimize    ½ xᵀGx + aᵀx
//! subject to  nᵢᵀx = bᵢ   (equality rows)
//!             nⱼᵀx ≥ bⱼ   (inequality rows)
//! ```
//!
//! for symmetric positive definite `G`.
//!
//! # Algorithm
//!
//! The dual active-set method of Goldfarb and Idnani. It starts from the
//! unconstrained minimizer `-G⁻¹a`, which is dual feasible, and repeatedly
//! adds the most violated constraint to the active set. Adding a constraint
//! may require dropping others whose multipliers would turn negative. Each
//! addition strictly increases the objective, so the method terminates, and
//! it recognizes incompatible constraints when no step can satisfy the chosen
//! row.
//!
//! Projections onto the active set are recomputed from `G⁻¹` and the active
//! normals whenever the set changes. That is `O(n³)` per change, which is
//! fine for the small problems this module targets.

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

/// Relative size below which a projected step counts as zero, meaning the
/// candidate normal is linearly dependent on the active normals.
const DEPENDENCE_TOL: f64 = 1e-10;

/// Dual step components at or below this value are treated as zero.
const DUAL_TOL: f64 = 1e-12;

/// Relative feasibility tolerance for inequality rows.
const FEASIBILITY_TOL: f64 = 1e-10;

/// Whether a row is an equality or an inequality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Equality,
    Inequality,
}

#[derive(Debug, Clone)]
struct Row {
    normal: DVector<f64>,
    rhs: f64,
    kind: Kind,
}

/// A quadratic program.
#[derive(Debug, Clone)]
pub struct Problem {
    hessian: DMatrix<f64>,
    linear: DVector<f64>,
    rows: Vec<Row>,
}

/// Errors that can occur when solving a quadratic program.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("hessian is not symmetric positive definite")]
    NotPositiveDefinite,

    #[error("constraints are incompatible")]
    Infeasible,

    #[error("active constraints are numerically dependent")]
    Degenerate,

    #[error("active-set iteration limit reached")]
    MaxIters,

    /// The hessian or a constraint row does not match the problem size.
    #[error("{what} has size {found}, expected {expected}")]
    Shape {
        what: &'static str,
        expected: usize,
        found: usize,
    },
}

/// The minimizer of a quadratic program.
#[derive(Debug, Clone)]
pub struct Solution {
    /// The minimizer.
    pub x: DVector<f64>,

    /// One Lagrange multiplier per row, indexed like the rows.
    ///
    /// Inequality multipliers are non-negative. Rows that are not active at
    /// the solution have a zero multiplier.
    pub multipliers: Vec<f64>,

    /// Number of active-set steps taken.
    pub iters: usize,
}

impl Problem {
    /// Creates an unconstrained problem `½ xᵀGx + aᵀx`.
    ///
    /// Shapes are checked by [`solve`].
    #[must_use]
    pub fn new(hessian: DMatrix<f64>, linear: DVector<f64>) -> Self {
        Self {
            hessian,
            linear,
            rows: Vec::new(),
        }
    }

    /// Returns the number of variables.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.linear.len()
    }

    /// Adds the row `normalᵀx = rhs`.
    pub fn equality(&mut self, normal: DVector<f64>, rhs: f64) -> &mut Self {
        self.push(normal, rhs, Kind::Equality)
    }

    /// Adds the row `normalᵀx ≥ rhs`.
    pub fn inequality(&mut self, normal: DVector<f64>, rhs: f64) -> &mut Self {
        self.push(normal, rhs, Kind::Inequality)
    }

    fn push(&mut self, normal: DVector<f64>, rhs: f64, kind: Kind) -> &mut Self {
        self.rows.push(Row { normal, rhs, kind });
        self
    }
}

/// A row in the active set.
#[derive(Debug, Clone, Copy)]
struct Active {
    row: usize,

    /// `-1.0` when an equality row was added with its sign flipped.
    sign: f64,

    multiplier: f64,
}

/// Solves the quadratic program.
///
/// # Errors
///
/// Returns an error if the shapes disagree, the hessian is not positive
/// definite, the constraints cannot all be satisfied, or the active-set
/// iteration does not finish.
pub fn solve(problem: &Problem) -> Result<Solution, Error> {
    check_shapes(problem)?;

    let n = problem.dimension();
    let g_inv = problem
        .hessian
        .clone()
        .cholesky()
        .ok_or(Error::NotPositiveDefinite)?
        .inverse();

    let mut x = -(&g_inv * &problem.linear);
    let mut active: Vec<Active> = Vec::new();
    let max_iters = 10 * (problem.rows.len() + n) + 50;
    let mut iters = 0;

    while let Some((p, sign)) = select(problem, &x, &active) {
        let normal = &problem.rows[p].normal * sign;
        let rhs = problem.rows[p].rhs * sign;
        let mut added = 0.0;

        loop {
            iters += 1;
            if iters > max_iters {
                return Err(Error::MaxIters);
            }

            let normals: Vec<DVector<f64>> = active
                .iter()
                .map(|a| &problem.rows[a.row].normal * a.sign)
                .collect();
            let (z, w_norm, r) = directions(&g_inv, &normals, &normal)?;

            // Largest dual step before an active inequality multiplier hits zero.
            let mut partial: Option<(usize, f64)> = None;
            for (i, (a, &ri)) in active.iter().zip(r.iter()).enumerate() {
                if problem.rows[a.row].kind == Kind::Inequality && ri > DUAL_TOL {
                    let t = a.multiplier / ri;
                    if partial.is_none_or(|(_, best)| t < best) {
                        partial = Some((i, t));
                    }
                }
            }

            let slack = normal.dot(&x) - rhs;
            let full = (z.norm() > DEPENDENCE_TOL * w_norm).then(|| -slack / z.dot(&normal));

            match (partial, full) {
                (None, None) => return Err(Error::Infeasible),
                (Some((k, t)), None) => {
                    for (a, ri) in active.iter_mut().zip(r.iter()) {
                        a.multiplier -= t * ri;
                    }
                    added += t;
                    active.remove(k);
                }
                (partial, Some(t_full)) => {
                    let t = partial.map_or(t_full, |(_, t_partial)| t_partial.min(t_full));
                    x += &z * t;
                    for (a, ri) in active.iter_mut().zip(r.iter()) {
                        a.multiplier -= t * ri;
                    }
                    added += t;

                    match partial {
                        Some((k, t_partial)) if t_partial < t_full => {
                            active.remove(k);
                        }
                        _ => {
                            active.push(Active {
                                row: p,
                                sign,
                                multiplier: added,
                            });
                            break;
                        }
                    }
                }
            }
        }
    }

    let mut multipliers = vec![0.0; problem.rows.len()];
    for a in &active {
        multipliers[a.row] = a.multiplier * a.sign;
    }

    Ok(Solution {
        x,
        multipliers,
        iters,
    })
}

fn check_shapes(problem: &Problem) -> Result<(), Error> {
    let n = problem.dimension();
    let shape = |what, found| {
        if found == n {
            Ok(())
        } else {
            Err(Error::Shape {
                what,
                expected: n,
                found,
            })
        }
    };

    shape("hessian rows", problem.hessian.nrows())?;
    shape("hessian columns", problem.hessian.ncols())?;
    for row in &problem.rows {
        shape("constraint row", row.normal.len())?;
    }
    Ok(())
}

/// Picks the next row to add, with the sign to add it under.
///
/// Equality rows come first, oriented so they read as a violated `≥` row.
/// After that the inequality with the largest scaled violation is chosen.
fn select(problem: &Problem, x: &DVector<f64>, active: &[Active]) -> Option<(usize, f64)> {
    let is_active = |j: usize| active.iter().any(|a| a.row == j);

    for (j, row) in problem.rows.iter().enumerate() {
        if row.kind == Kind::Equality && !is_active(j) {
            let slack = row.normal.dot(x) - row.rhs;
            return Some((j, if slack > 0.0 { -1.0 } else { 1.0 }));
        }
    }

    let mut worst: Option<(usize, f64)> = None;
    for (j, row) in problem.rows.iter().enumerate() {
        if row.kind != Kind::Inequality || is_active(j) {
            continue;
        }
        let norm = row.normal.norm();
        if norm == 0.0 {
            if row.rhs > FEASIBILITY_TOL {
                // 0 ≥ rhs can never hold; let the solve loop report it.
                return Some((j, 1.0));
            }
            continue;
        }
        let scaled = (row.normal.dot(x) - row.rhs) / norm;
        let tol = FEASIBILITY_TOL * (1.0 + row.rhs.abs() / norm);
        if scaled < -tol && worst.is_none_or(|(_, s)| scaled < s) {
            worst = Some((j, scaled));
        }
    }

    worst.map(|(j, _)| (j, 1.0))
}

/// Computes the primal step direction `z = H n` and dual step direction
/// `r = N* n` for adding `normal` to the active set spanned by `normals`.
///
/// Also returns `‖G⁻¹n‖`, the scale against which `z` is judged to vanish.
fn directions(
    g_inv: &DMatrix<f64>,
    normals: &[DVector<f64>],
    normal: &DVector<f64>,
) -> Result<(DVector<f64>, f64, DVector<f64>), Error> {
    let w = g_inv * normal;
    let w_norm = w.norm();

    if normals.is_empty() {
        return Ok((w, w_norm, DVector::zeros(0)));
    }

    let n_mat = DMatrix::from_columns(normals);
    let g_inv_n = g_inv * &n_mat;
    let gram = n_mat.transpose() * &g_inv_n;
    let r = gram
        .cholesky()
        .ok_or(Error::Degenerate)?
        .solve(&(n_mat.transpose() * &w));
    let z = w - g_inv_n * &r;

    Ok((z, w_norm, r))
}
