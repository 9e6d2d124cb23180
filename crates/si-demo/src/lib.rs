//! Demonstration models for the sequential initializer.
//!
//! - [`decay`]: `dx/dt = -k x`, small enough to check against the analytic
//!   solution
//! - [`enzyme`]: a non-isothermal CSTR running the enzyme reaction
//!   `S + E <-> C -> P + E` under a piecewise feed schedule

pub mod case;
pub mod decay;
pub mod enzyme;
pub mod error;

pub use case::{DemoCase, RunSummary, Sample, Trajectory};
pub use decay::DecayParams;
pub use enzyme::{Component, EnzymeParams, FeedSegment, Reaction};
pub use error::{DemoError, DemoResult};
