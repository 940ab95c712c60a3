//! Central-difference derivatives.
//!
//! The step for coordinate `i` is `ε^(1/3) · max(1, |xᵢ|)`, which balances
//! truncation and round-off error for central differences.

/// Returns the central-difference step for a coordinate value.
fn step(value: f64) -> f64 {
    f64::EPSILON.cbrt() * value.abs().max(1.0)
}

/// Approximates the gradient of a scalar function at `x`.
///
/// # Errors
///
/// Returns the first error produced by `f`.
pub fn gradient<E, F>(x: &[f64], mut f: F) -> Result<Vec<f64>, E>
where
    F: FnMut(&[f64]) -> Result<f64, E>,
{
    let mut point = x.to_vec();
    let mut grad = Vec::with_capacity(x.len());

    for (i, &xi) in x.iter().enumerate() {
        let h = step(xi);

        point[i] = xi + h;
        let forward = f(&point)?;
        point[i] = xi - h;
        let backward = f(&point)?;
        point[i] = xi;

        grad.push((forward - backward) / (2.0 * h));
    }

    Ok(grad)
}

/// Approximates the Jacobian of a vector function at `x`.
///
/// The result has one row per output of `f` and one column per entry of `x`.
///
/// # Errors
///
/// Returns the first error produced by `f`.
pub fn jacobian<E, F>(x: &[f64], mut f: F) -> Result<Vec<Vec<f64>>, E>
where
    F: FnMut(&[f64]) -> Result<Vec<f64>, E>,
{
    let rows = f(x)?.len();
    let mut jac = vec![vec![0.0; x.len()]; rows];
    let mut point = x.to_vec();

    for (i, &xi) in x.iter().enumerate() {
        let h = step(xi);

        point[i] = xi + h;
        let forward = f(&point)?;
        point[i] = xi - h;
        let backward = f(&point)?;
        point[i] = xi;

        for (row, (fwd, bwd)) in jac.iter_mut().zip(forward.iter().zip(&backward)) {
            row[i] = (fwd - bwd) / (2.0 * h);
        }
    }

    Ok(jac)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::convert::Infallible;

    use approx::assert_relative_eq;

    #[test]
    fn gradient_of_smooth_function() {
        let grad = gradient(&[1.0, 2.0], |x| {
            Ok::<_, Infallible>(x[0].powi(3) + x[0] * x[1])
        })
        .unwrap();

        assert_relative_eq!(grad[0], 5.0, epsilon = 1e-6);
        assert_relative_eq!(grad[1], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn jacobian_has_one_row_per_output() {
        let jac = jacobian(&[1.0, -2.0, 0.5], |x| {
            Ok::<_, Infallible>(vec![x[0] + 2.0 * x[1], x[2] * x[2]])
        })
        .unwrap();

        assert_eq!(jac.len(), 2);
        assert_relative_eq!(jac[0][0], 1.0, epsilon = 1e-8);
        assert_relative_eq!(jac[0][1], 2.0, epsilon = 1e-8);
        assert_relative_eq!(jac[0][2], 0.0, epsilon = 1e-8);
        assert_relative_eq!(jac[1][2], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn errors_propagate() {
        #[derive(Debug, PartialEq)]
        struct Boom;

        let result = gradient(&[1.0], |_| Err::<f64, _>(Boom));

        assert_eq!(result, Err(Boom));
    }
}
