//! Nonlinear solver adapter for seqinit.
//!
//! The initializer only talks to the [`SolverAdapter`] trait: hand it a model,
//! get back a [`TerminationStatus`]. The problem an adapter solves is the
//! model's *active sub-problem*: every active constraint, over the unfixed
//! variables those constraints reference.
//!
//! [`NewtonAdapter`] is the bundled implementation: damped Newton with a
//! finite-difference Jacobian, backtracking line search and projection onto
//! variable bounds.

pub mod adapter;
pub mod error;
pub mod jacobian;
pub mod newton;
pub mod subproblem;

pub use adapter::{NewtonAdapter, SolveOptions, SolveReport, SolverAdapter, TerminationStatus};
pub use error::{SolverError, SolverResult};
pub use jacobian::{DifferenceScheme, finite_difference_jacobian};
pub use newton::{NewtonConfig, NewtonResult, NewtonTermination, newton_solve};
pub use subproblem::Subproblem;
