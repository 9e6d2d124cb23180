//! Initializer error types.

use si_model::ModelError;
use si_solver::TerminationStatus;
use si_time::TimeError;
use thiserror::Error;

pub type InitResult<T> = Result<T, InitError>;

/// Structural defects found before a solver is called.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error(
        "Model is not square: {free_variables} free variables, {active_equations} active equations"
    )]
    NonSquareModel {
        free_variables: usize,
        active_equations: usize,
    },

    #[error("Element {element} [{t_start}, {t_end}] is not square: {dof} degrees of freedom")]
    NonSquareElement {
        element: usize,
        t_start: f64,
        t_end: f64,
        dof: i64,
    },

    #[error("Invalid element boundaries: {0}")]
    Partition(#[from] TimeError),
}

/// Why `initialize` stopped.
///
/// Values computed for elements before the failing one are left in the
/// model; only flags are (partly) restored.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InitError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Element {element} [{t_start}, {t_end}] solve terminated with {termination}")]
    Solver {
        element: usize,
        t_start: f64,
        t_end: f64,
        termination: TerminationStatus,
    },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

impl From<TimeError> for InitError {
    fn from(e: TimeError) -> Self {
        InitError::Configuration(ConfigurationError::Partition(e))
    }
}

impl InitError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, InitError::Configuration(_))
    }

    pub fn is_solver(&self) -> bool {
        matches!(self, InitError::Solver { .. })
    }

    /// Index of the element the failure belongs to, if any.
    pub fn element(&self) -> Option<usize> {
        match self {
            InitError::Configuration(ConfigurationError::NonSquareElement { element, .. })
            | InitError::Solver { element, .. } => Some(*element),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_helper() {
        let err = InitError::Solver {
            element: 3,
            t_start: 1.0,
            t_end: 2.0,
            termination: TerminationStatus::Infeasible,
        };
        assert!(err.is_solver());
        assert!(!err.is_configuration());
        assert_eq!(err.element(), Some(3));
        assert_eq!(
            err.to_string(),
            "Element 3 [1, 2] solve terminated with infeasible"
        );

        let err: InitError = TimeError::NoElements.into();
        assert!(err.is_configuration());
        assert_eq!(err.element(), None);
    }
}
