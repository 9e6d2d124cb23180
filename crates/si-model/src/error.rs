//! Error types for model construction and mutation.

use si_core::{ConId, CoreError, VarId};
use si_time::TimeError;
use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Variable {key} already exists")]
    DuplicateVariable { key: String },

    #[error("No variable with key {key}")]
    UnknownKey { key: String },

    #[error("Variable id {id} does not belong to this model")]
    UnknownVariable { id: VarId },

    #[error("Constraint id {id} does not belong to this model")]
    UnknownConstraint { id: ConId },

    #[error("Invalid bounds for {key}: lower {lower} > upper {upper}")]
    InvalidBounds { key: String, lower: f64, upper: f64 },

    #[error("Model is full: {what}")]
    Capacity { what: &'static str },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Time error: {0}")]
    Time(#[from] TimeError),
}
