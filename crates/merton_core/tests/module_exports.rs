//! Integration tests for module exports.
//!
//! Verifies that the public modules and types are reachable via absolute
//! paths and interoperate.

use approx::assert_relative_eq;

#[test]
fn test_distribution_exports() {
    use merton_core::math::distributions::{norm_cdf, norm_pdf, norm_sf};

    assert_relative_eq!(norm_cdf(0.0_f64), 0.5);
    assert_relative_eq!(norm_sf(0.0_f64), 0.5);
    assert!(norm_pdf(0.0_f64) > 0.39);
}

#[test]
fn test_solver_exports() {
    use merton_core::math::solvers::{HybridConfig, HybridResult, HybridSolver, Termination};

    let solver = HybridSolver::new(HybridConfig::fast());
    let result: HybridResult = solver
        .solve(|x: &[f64]| vec![x[0] - 1.0, x[1] + 1.0], vec![0.0, 0.0])
        .unwrap();
    assert_eq!(result.termination, Termination::Converged);
}

#[test]
fn test_error_exports() {
    use merton_core::types::{MertonError, SolverError};

    let err: MertonError = SolverError::NumericalInstability("nan".to_string()).into();
    assert!(matches!(err, MertonError::NonConvergence(_)));
}

#[test]
fn test_rng_exports() {
    use merton_core::rng::{derive_seed, SeededRng};

    let mut a = SeededRng::for_stream(11, 0);
    let mut b = SeededRng::from_seed(derive_seed(11, 0));
    assert_eq!(a.gen_uniform(), b.gen_uniform());
}
