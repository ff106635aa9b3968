//! Root-finding solvers for numerical computation.
//!
//! ## Available Solvers
//!
//! - [`HybridSolver`]: Powell hybrid (dogleg trust region) method for square
//!   nonlinear systems `F(x) = 0` with a forward-difference Jacobian. This is
//!   the workhorse behind the Merton asset-value inversion.
//!
//! ## Configuration
//!
//! [`HybridConfig`] controls:
//! - `xtol`: relative step tolerance (default: 1e-12)
//! - `max_evaluations`: residual evaluation budget (default: 2000)
//! - `ftol`: residual norm a terminated iterate must reach (default: 1e-8)
//!
//! ## Examples
//!
//! ```
//! use merton_core::math::solvers::{HybridSolver, Termination};
//!
//! let solver = HybridSolver::with_defaults();
//! let result = solver.solve(|x: &[f64]| vec![x[0].exp() - 2.0], vec![0.0]).unwrap();
//!
//! assert_eq!(result.termination, Termination::Converged);
//! assert!((result.x[0] - std::f64::consts::LN_2).abs() < 1e-10);
//! ```

mod config;
mod hybrid;

pub use config::HybridConfig;
pub use hybrid::{HybridResult, HybridSolver, Termination};
