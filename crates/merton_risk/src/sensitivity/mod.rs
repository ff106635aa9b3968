//! Parameter sensitivity analysis.
//!
//! Re-solves the model along a grid of one input while holding the others at
//! their base values. Non-converged grid points stay in the curve as
//! [`PointOutcome::Failed`] so every curve has the shape of its grid.

mod engine;
mod grid;

pub use engine::{
    PointOutcome, SensitivityConfig, SensitivityCurve, SensitivityEngine, SensitivityParam,
    SensitivityPoint,
};
pub use grid::{default_debt_changes, linspace, Grid};
