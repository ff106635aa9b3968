//! Sensitivity command implementation
//!
//! Runs the volatility, debt and rate sweeps around one observation.

use std::path::Path;

use merton_models::structural::Measure;
use merton_risk::config::EngineConfig;
use tracing::info;

use super::BaseArgs;
use crate::output::write_json;
use crate::Result;

/// Run the sensitivity command
pub fn run(config: &EngineConfig, base: &BaseArgs, measure: Measure, output: Option<&Path>) -> Result<()> {
    let params = base.params()?;
    let engine = config.sensitivity_engine()?;
    let curves = engine.comprehensive(&params, measure)?;
    for (name, curve) in &curves {
        info!(
            sweep = %name,
            points = curve.len(),
            converged = curve.converged_count(),
            "sweep complete"
        );
    }
    write_json(&curves, output)
}
