//! si-time: time horizon layer for seqinit.
//!
//! Provides:
//! - `TimeSet`: validated, strictly increasing time points addressed by `TimeIdx`
//! - `partition`: splits a time set into contiguous finite elements
//! - `Discretization`: uniform Lagrange-Radau collocation grids
//!
//! # Example
//!
//! ```
//! use si_time::{Discretization, partition};
//! use si_core::Tolerances;
//!
//! let disc = Discretization::lagrange_radau(0.0, 2.0, 2, 3).unwrap();
//! let elements = partition(disc.time(), disc.boundaries(), Tolerances::default()).unwrap();
//!
//! assert_eq!(disc.time().len(), 7);
//! assert_eq!(elements.len(), 2);
//! ```

pub mod collocation;
pub mod error;
pub mod partition;
pub mod time_set;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use collocation::{Discretization, lagrange_derivative_matrix, radau_points};
pub use error::{TimeError, TimeResult};
pub use partition::{FiniteElement, partition};
pub use time_set::{TimeIdx, TimeSet};
