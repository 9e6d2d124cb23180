//! Finite difference Jacobian computation.

use crate::error::SolverResult;
use nalgebra::{DMatrix, DVector};

/// Difference formula used per column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DifferenceScheme {
    /// `(f(x+e) - f(x)) / e`: one extra evaluation per column.
    #[default]
    Forward,
    /// `(f(x+e) - f(x-e)) / 2e`: more accurate, two evaluations per column.
    Central,
}

/// Dense Jacobian of `f` at `x`.
///
/// Column `j` is perturbed by `epsilon * max(|x_j|, 1)`.
pub fn finite_difference_jacobian<F>(
    x: &DVector<f64>,
    f: F,
    scheme: DifferenceScheme,
    epsilon: f64,
) -> SolverResult<DMatrix<f64>>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
{
    let n = x.len();
    let f_x = f(x)?;
    let mut jac = DMatrix::zeros(f_x.len(), n);

    let mut probe = x.clone();
    for j in 0..n {
        let step = epsilon * x[j].abs().max(1.0);

        probe[j] = x[j] + step;
        let f_plus = f(&probe)?;

        let column = match scheme {
            DifferenceScheme::Forward => (f_plus - &f_x) / step,
            DifferenceScheme::Central => {
                probe[j] = x[j] - step;
                let f_minus = f(&probe)?;
                (f_plus - f_minus) / (2.0 * step)
            }
        };
        probe[j] = x[j];

        jac.set_column(j, &column);
    }

    Ok(jac)
}
