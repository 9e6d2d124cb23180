use si_init::InitError;
use si_model::ModelError;
use si_time::TimeError;
use thiserror::Error;

pub type DemoResult<T> = Result<T, DemoError>;

#[derive(Error, Debug)]
pub enum DemoError {
    #[error("Invalid parameter: {what}")]
    InvalidParams { what: String },

    #[error("Time discretization error: {0}")]
    Time(#[from] TimeError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Initialization error: {0}")]
    Init(#[from] InitError),
}
