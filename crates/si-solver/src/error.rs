//! Error types for solver operations.

use si_model::ModelError;
use thiserror::Error;

/// Errors that stop a solve before a termination status can be reported.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    #[error("Numeric error: {what}")]
    Numeric { what: String },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

pub type SolverResult<T> = Result<T, SolverError>;
