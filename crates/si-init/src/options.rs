//! Initializer options.

use serde::{Deserialize, Serialize};
use si_core::Tolerances;
use si_solver::SolveOptions;

/// Knobs for [`initialize`](crate::initialize).
///
/// Deserializes from partial documents; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitOptions {
    /// Forwarded untouched to the solver adapter on every element.
    pub solve: SolveOptions,
    /// Used to match element boundaries against time points.
    pub time_tol: Tolerances,
    /// Seed each element from the converged state at its left boundary.
    pub propagate_guess: bool,
    /// On failure, restore every variable flag instead of only the
    /// time-invariant ones.
    pub restore_flags_on_failure: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            solve: SolveOptions::default(),
            time_tol: Tolerances::default(),
            propagate_guess: true,
            restore_flags_on_failure: false,
        }
    }
}
