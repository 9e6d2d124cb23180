//! si-core: shared foundation for seqinit.
//!
//! Contains:
//! - ids (compact handles for model variables and constraints)
//! - numeric (Real + tolerances + float helpers)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;

// Re-exports: nice ergonomics for downstream crates
pub use error::CoreError;
pub use ids::*;
pub use numeric::*;
