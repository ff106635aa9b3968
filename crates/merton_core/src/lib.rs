//! # merton_core: Numerical Foundation for Structural Credit Models
//!
//! ## Layer 1 (Foundation) Role
//!
//! merton_core is the bottom layer of the workspace and provides:
//! - Standard normal distribution functions (`math::distributions`)
//! - Small dense linear algebra (`math::linalg`)
//! - Derivative-free Powell hybrid root finder for square systems (`math::solvers`)
//! - Seeded, splittable random number generation (`rng`)
//! - The shared error taxonomy: `MertonError`, `SolverError` (`types::error`)
//!
//! ## Minimal Dependency Principle
//!
//! Layer 1 has no dependencies on other merton_* crates:
//! - num-traits: generic floating-point bounds for the distribution functions
//! - statrs: full-precision complementary error function
//! - rand / rand_distr: reproducible pseudo-random streams
//! - thiserror: error derivation
//! - serde: serialisation support (optional)
//!
//! ## Usage Examples
//!
//! ```rust
//! use merton_core::math::distributions::norm_cdf;
//! use merton_core::math::solvers::{HybridConfig, HybridSolver};
//!
//! assert!((norm_cdf(0.0_f64) - 0.5).abs() < 1e-15);
//!
//! // x² = 2, y = x + 1
//! let solver = HybridSolver::with_defaults();
//! let result = solver
//!     .solve(|x: &[f64]| vec![x[0] * x[0] - 2.0, x[1] - x[0] - 1.0], vec![1.0, 1.0])
//!     .unwrap();
//! assert!(result.converged);
//! assert!((result.x[0] - std::f64::consts::SQRT_2).abs() < 1e-10);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialisation for configuration and error types

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod math;
pub mod rng;
pub mod types;
