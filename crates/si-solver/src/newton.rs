//! Damped Newton iteration with bound projection.

use crate::error::{SolverError, SolverResult};
use nalgebra::{DMatrix, DVector};
use tracing::trace;

/// Newton solver configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct NewtonConfig {
    /// Maximum Newton iterations
    pub max_iterations: usize,
    /// Absolute tolerance on the residual inf-norm
    pub abs_tol: f64,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            abs_tol: 1e-8,
            line_search_beta: 0.5,
            max_line_search_iters: 20,
        }
    }
}

/// Why the iteration stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewtonTermination {
    Converged,
    MaxIterations,
    /// No backtracked step reduced the residual norm.
    LineSearchFailed,
}

/// Newton iteration result.
#[derive(Debug, Clone)]
pub struct NewtonResult {
    /// Last accepted iterate
    pub x: DVector<f64>,
    /// Residual inf-norm at `x`
    pub residual_norm: f64,
    /// Number of Jacobian factorizations performed
    pub iterations: usize,
    pub termination: NewtonTermination,
}

impl NewtonResult {
    pub fn converged(&self) -> bool {
        self.termination == NewtonTermination::Converged
    }
}

/// Newton solver with backtracking line search.
///
/// `project` is applied to the starting point and to every trial step, so
/// iterates never leave the feasible box. A trial step is accepted when its
/// residual is finite and its 2-norm is strictly smaller than the current one.
pub fn newton_solve<F, J, P>(
    x0: DVector<f64>,
    residual_fn: F,
    jacobian_fn: J,
    project: P,
    config: &NewtonConfig,
) -> SolverResult<NewtonResult>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
    J: Fn(&DVector<f64>) -> SolverResult<DMatrix<f64>>,
    P: Fn(&mut DVector<f64>),
{
    let mut x = x0;
    project(&mut x);

    let mut r = residual_fn(&x)?;
    if !all_finite(&r) {
        return Err(SolverError::Numeric {
            what: "residual is not finite at the starting point".to_string(),
        });
    }

    for iter in 0..config.max_iterations {
        if r.amax() <= config.abs_tol {
            return Ok(NewtonResult {
                residual_norm: r.amax(),
                x,
                iterations: iter,
                termination: NewtonTermination::Converged,
            });
        }

        let jac = jacobian_fn(&x)?;
        let dx = jac
            .lu()
            .solve(&(-r.clone()))
            .ok_or_else(|| SolverError::Numeric {
                what: format!("singular Jacobian at iteration {iter}"),
            })?;
        if !all_finite(&dx) {
            return Err(SolverError::Numeric {
                what: format!("non-finite Newton step at iteration {iter}"),
            });
        }

        let r_norm = r.norm();
        let mut alpha = 1.0;
        let mut accepted = None;
        for _ in 0..config.max_line_search_iters {
            let mut x_new = &x + alpha * &dx;
            project(&mut x_new);
            let r_new = residual_fn(&x_new)?;
            if all_finite(&r_new) && r_new.norm() < r_norm {
                accepted = Some((x_new, r_new));
                break;
            }
            alpha *= config.line_search_beta;
        }

        match accepted {
            Some((x_new, r_new)) => {
                trace!(iter, alpha, residual = r_new.amax(), "newton step accepted");
                x = x_new;
                r = r_new;
            }
            None => {
                return Ok(NewtonResult {
                    residual_norm: r.amax(),
                    x,
                    iterations: iter + 1,
                    termination: NewtonTermination::LineSearchFailed,
                });
            }
        }
    }

    let residual_norm = r.amax();
    let termination = if residual_norm <= config.abs_tol {
        NewtonTermination::Converged
    } else {
        NewtonTermination::MaxIterations
    };
    Ok(NewtonResult {
        x,
        residual_norm,
        iterations: config.max_iterations,
        termination,
    })
}

fn all_finite(v: &DVector<f64>) -> bool {
    v.iter().all(|x| x.is_finite())
}
