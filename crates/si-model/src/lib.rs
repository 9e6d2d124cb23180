//! si-model: numeric model store for seqinit.
//!
//! A `Model` owns scalar variables (keyed by `VarKey`, each with a value, a
//! fixed flag and optional bounds) and equality constraints (a residual
//! closure over an ordered list of variables, with an active flag).
//!
//! On top of the store:
//! - `snapshot`: capture/restore of fixed flags, values and active flags
//! - `dof`: degrees-of-freedom accounting
//! - `view`: the per-element projection used by sequential initialization
//! - `dae`: collocation equations for differential states

pub mod dae;
pub mod dof;
pub mod error;
pub mod key;
pub mod model;
pub mod snapshot;
pub mod view;

pub use dae::add_collocation_equations;
pub use dof::{Balance, DofSummary, degrees_of_freedom};
pub use error::{ModelError, ModelResult};
pub use key::VarKey;
pub use model::{Constraint, Model, ResidualFn, Variable};
pub use snapshot::{ActivitySnapshot, VarSnapshot, VarState};
pub use view::ElementView;
