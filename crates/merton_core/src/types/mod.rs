//! Core error types.
//!
//! # Re-exports
//!
//! [`MertonError`] and [`SolverError`] from `error`.

pub mod error;

pub use error::{MertonError, SolverError};
