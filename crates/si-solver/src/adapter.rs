//! Solver adapter interface and the bundled Newton adapter.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{SolverError, SolverResult};
use crate::jacobian::{DifferenceScheme, finite_difference_jacobian};
use crate::newton::{NewtonConfig, NewtonTermination, newton_solve};
use crate::subproblem::Subproblem;
use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use si_model::Model;
use tracing::{debug, warn};

/// Options forwarded to a solver on every call.
///
/// `solver_specific` carries tuning knobs by name; adapters ignore keys they
/// do not recognise. [`NewtonAdapter`] reads `line_search_beta`,
/// `max_line_search_iters`, `fd_epsilon` and `central_jacobian` (non-zero
/// selects central differences).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolveOptions {
    pub tolerance: f64,
    pub max_iterations: usize,
    pub solver_specific: BTreeMap<String, f64>,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 50,
            solver_specific: BTreeMap::new(),
        }
    }
}

impl SolveOptions {
    pub fn specific(&self, key: &str) -> Option<f64> {
        self.solver_specific.get(key).copied()
    }

    pub fn with_specific(mut self, key: impl Into<String>, value: f64) -> Self {
        self.solver_specific.insert(key.into(), value);
        self
    }
}

/// Outcome classification reported by a solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationStatus {
    Optimal,
    MaxIterations,
    Infeasible,
    NumericalFailure,
}

impl TerminationStatus {
    pub fn is_optimal(self) -> bool {
        self == TerminationStatus::Optimal
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TerminationStatus::Optimal => "optimal",
            TerminationStatus::MaxIterations => "max_iterations",
            TerminationStatus::Infeasible => "infeasible",
            TerminationStatus::NumericalFailure => "numerical_failure",
        }
    }
}

impl fmt::Display for TerminationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Anything that can solve a model's active sub-problem in place.
///
/// Implementations update the values of unfixed variables referenced by
/// active constraints and must leave fixed flags and activity untouched.
pub trait SolverAdapter {
    fn solve(&mut self, model: &mut Model, options: &SolveOptions) -> TerminationStatus;
}

impl<S: SolverAdapter + ?Sized> SolverAdapter for &mut S {
    fn solve(&mut self, model: &mut Model, options: &SolveOptions) -> TerminationStatus {
        (**self).solve(model, options)
    }
}

impl<S: SolverAdapter + ?Sized> SolverAdapter for Box<S> {
    fn solve(&mut self, model: &mut Model, options: &SolveOptions) -> TerminationStatus {
        (**self).solve(model, options)
    }
}

/// Statistics of the most recent [`NewtonAdapter`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveReport {
    pub termination: TerminationStatus,
    pub iterations: usize,
    pub residual_norm: f64,
    pub unknowns: usize,
}

/// Damped Newton on the active sub-problem.
#[derive(Debug, Clone, Default)]
pub struct NewtonAdapter {
    last: Option<SolveReport>,
    calls: usize,
}

impl NewtonAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_report(&self) -> Option<&SolveReport> {
        self.last.as_ref()
    }

    /// Number of `solve` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls
    }

    fn try_solve(&self, model: &mut Model, options: &SolveOptions) -> SolverResult<SolveReport> {
        let sub = Subproblem::from_model(model);
        if !sub.is_square() {
            return Err(SolverError::ProblemSetup {
                what: format!(
                    "{} unknowns but {} active equations",
                    sub.vars().len(),
                    sub.cons().len()
                ),
            });
        }

        if sub.is_empty() {
            return Ok(SolveReport {
                termination: TerminationStatus::Optimal,
                iterations: 0,
                residual_norm: 0.0,
                unknowns: 0,
            });
        }

        let config = newton_config(options);
        let scheme = match options.specific("central_jacobian") {
            Some(flag) if flag != 0.0 => DifferenceScheme::Central,
            _ => DifferenceScheme::Forward,
        };
        let epsilon = options.specific("fd_epsilon").unwrap_or(1e-7);

        let result = {
            let frozen: &Model = model;
            let residual_fn = |x: &DVector<f64>| sub.residuals(frozen, x);
            let jacobian_fn =
                |x: &DVector<f64>| finite_difference_jacobian(x, residual_fn, scheme, epsilon);
            newton_solve(sub.pack(), residual_fn, jacobian_fn, |x| sub.project(x), &config)?
        };

        sub.unpack(model, &result.x)?;

        let termination = match result.termination {
            NewtonTermination::Converged => TerminationStatus::Optimal,
            NewtonTermination::MaxIterations => TerminationStatus::MaxIterations,
            NewtonTermination::LineSearchFailed => TerminationStatus::Infeasible,
        };
        Ok(SolveReport {
            termination,
            iterations: result.iterations,
            residual_norm: result.residual_norm,
            unknowns: sub.vars().len(),
        })
    }
}

impl SolverAdapter for NewtonAdapter {
    fn solve(&mut self, model: &mut Model, options: &SolveOptions) -> TerminationStatus {
        self.calls += 1;
        match self.try_solve(model, options) {
            Ok(report) => {
                debug!(
                    status = %report.termination,
                    iterations = report.iterations,
                    residual = report.residual_norm,
                    unknowns = report.unknowns,
                    "newton solve finished"
                );
                let status = report.termination;
                self.last = Some(report);
                status
            }
            Err(e) => {
                warn!(error = %e, "newton solve aborted");
                self.last = None;
                TerminationStatus::NumericalFailure
            }
        }
    }
}

fn newton_config(options: &SolveOptions) -> NewtonConfig {
    let defaults = NewtonConfig::default();
    NewtonConfig {
        max_iterations: options.max_iterations,
        abs_tol: options.tolerance,
        line_search_beta: options
            .specific("line_search_beta")
            .unwrap_or(defaults.line_search_beta),
        max_line_search_iters: options
            .specific("max_line_search_iters")
            .map(|n| n.max(1.0) as usize)
            .unwrap_or(defaults.max_line_search_iters),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solver_specific_keys_override_defaults() {
        let options = SolveOptions::default()
            .with_specific("line_search_beta", 0.25)
            .with_specific("max_line_search_iters", 3.0)
            .with_specific("unknown_knob", 1.0);
        let config = newton_config(&options);

        assert_eq!(config.line_search_beta, 0.25);
        assert_eq!(config.max_line_search_iters, 3);
        assert_eq!(config.max_iterations, 50);
    }

    #[test]
    fn termination_names() {
        assert_eq!(TerminationStatus::Optimal.to_string(), "optimal");
        assert_eq!(
            TerminationStatus::NumericalFailure.as_str(),
            "numerical_failure"
        );
        assert!(TerminationStatus::Optimal.is_optimal());
        assert!(!TerminationStatus::Infeasible.is_optimal());
    }
}
