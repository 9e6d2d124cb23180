//! Time-set and partition error types.

use thiserror::Error;

pub type TimeResult<T> = Result<T, TimeError>;

/// Errors raised while building time sets or splitting them into elements.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimeError {
    #[error("Time set is empty")]
    EmptyTimeSet,

    #[error("Time point {index} is not finite: {value}")]
    NonFinitePoint { index: usize, value: f64 },

    #[error("Time points not strictly increasing at index {index}: {prev} then {next}")]
    PointsNotIncreasing { index: usize, prev: f64, next: f64 },

    #[error("At least two element boundaries are required, got {count}")]
    TooFewBoundaries { count: usize },

    #[error("Element boundaries not strictly increasing at position {index}: {prev} then {next}")]
    BoundariesNotIncreasing { index: usize, prev: f64, next: f64 },

    #[error("Element boundary {value} is not a point of the time set")]
    BoundaryNotInTimeSet { value: f64 },

    #[error("First element boundary {first} does not match horizon start {start}")]
    HorizonStartMismatch { first: f64, start: f64 },

    #[error("Last element boundary {last} does not match horizon end {end}")]
    HorizonEndMismatch { last: f64, end: f64 },

    #[error("Invalid horizon [{start}, {end}]")]
    InvalidHorizon { start: f64, end: f64 },

    #[error("Number of finite elements must be positive")]
    NoElements,

    #[error("Lagrange-Radau collocation supports 1 to 5 points per element, got {ncp}")]
    UnsupportedCollocation { ncp: usize },

    #[error("Collocation point {point} out of range for {ncp} points per element")]
    PointOutOfRange { point: usize, ncp: usize },
}
