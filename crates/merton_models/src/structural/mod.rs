//! Merton structural model.
//!
//! - [`input`]: observation types
//! - [`solver`]: equity-to-asset inversion
//! - [`metrics`]: distance to default and default probability
//! - [`drift`]: real-world drift estimation and shrinkage
//! - [`batch`]: parallel row-wise solving and annotation

pub mod batch;
pub mod drift;
pub mod input;
pub mod metrics;
pub mod solver;

pub use batch::{annotate, AnnotatedRow, SolvedRow};
pub use drift::{estimate_drift, shrink_drift, Frequency, DEFAULT_SHRINKAGE_TAU};
pub use input::{MertonInput, MertonParams};
pub use metrics::{
    dd_real_world, dd_risk_neutral, pd_from_dd, pd_from_optional_dd, risk_metric, Measure,
    RiskMetric,
};
pub use solver::{
    d1_d2, equity_from_assets, merton_residuals, AssetSolution, FailureKind, InitialGuess,
    MertonSolver, MertonSolverConfig, SolveFailure, SolverOutcome, GUARD_RESIDUAL, SOLVER_METHOD,
};
