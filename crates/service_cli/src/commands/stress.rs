//! Stress command implementation
//!
//! Evaluates preset and configured scenarios against one observation.

use std::path::Path;

use merton_risk::config::EngineConfig;
use merton_risk::scenarios::{StressEngine, StressResult};
use serde::Serialize;
use tracing::info;

use super::BaseArgs;
use crate::output::{format_pct, write_json};
use crate::Result;

#[derive(Debug, Serialize)]
struct StressReport {
    results: Vec<StressResult>,
    worst_case: Option<String>,
}

/// Run the stress command
pub fn run(config: &EngineConfig, base: &BaseArgs, scenarios: &[String], output: Option<&Path>) -> Result<()> {
    let params = base.params()?;
    let engine = config.stress_engine()?;
    let selection = if scenarios.is_empty() {
        config.stress.selection()
    } else {
        Some(scenarios)
    };

    let results = engine.test_all(&params, selection);
    let worst_case = StressEngine::worst_case(&results).map(|r| r.scenario.key.clone());
    for r in &results {
        match (r.base.probability_of_default(), r.stressed.probability_of_default()) {
            (Some(b), Some(s)) => info!(
                scenario = %r.scenario.key,
                base_pd = %format_pct(b),
                stressed_pd = %format_pct(s),
                "scenario evaluated"
            ),
            _ => info!(scenario = %r.scenario.key, "scenario did not converge"),
        }
    }

    write_json(&StressReport { results, worst_case }, output)
}
