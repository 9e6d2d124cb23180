//! Sequential time-element initialization of discretized DAE models.
//!
//! Rather than handing a large collocated model to a solver cold, walk the
//! horizon one finite element at a time: everything downstream is frozen at
//! its placeholder values, the current element is released and solved as a
//! small square system, then re-fixed at the converged values before moving
//! on. Afterwards every fixed flag is restored, leaving the model with its
//! degrees of freedom it started with and a good starting point.
//!
//! # Example
//!
//! ```
//! use si_init::{InitOptions, initialize};
//! use si_model::{Model, VarKey, add_collocation_equations};
//! use si_solver::NewtonAdapter;
//! use si_time::Discretization;
//!
//! let disc = Discretization::lagrange_radau(0.0, 2.0, 2, 3).unwrap();
//! let mut model = Model::new();
//! for t in disc.time().indices() {
//!     let x = model.add_var(VarKey::new("x").at(t), 1.0).unwrap();
//!     let dxdt = model.add_var(VarKey::new("dxdt").at(t), 0.0).unwrap();
//!     model
//!         .add_constraint("ode", Some(t), vec![x, dxdt], |v| v[1] + v[0])
//!         .unwrap();
//! }
//! add_collocation_equations(&mut model, &disc, &VarKey::new("x"), &VarKey::new("dxdt")).unwrap();
//! let x0 = model.var_id(&VarKey::new("x").at(disc.time().start_idx())).unwrap();
//! model.fix(x0).unwrap();
//!
//! let mut solver = NewtonAdapter::new();
//! initialize(&mut model, disc.time(), disc.boundaries(), &mut solver, &InitOptions::default()).unwrap();
//! assert!(model.max_infeasibility() < 1e-6);
//! ```

pub mod error;
pub mod initializer;
pub mod options;
pub mod plan;
pub mod progress;

pub use error::{ConfigurationError, InitError, InitResult};
pub use initializer::{initialize, initialize_with_progress};
pub use options::InitOptions;
pub use plan::{ElementPlan, plan};
pub use progress::{ElementEvent, ElementStage};
