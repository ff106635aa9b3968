//! Solve command implementation
//!
//! Runs the batch pipeline over every entity of a panel file.

use std::path::Path;

use merton_models::structural::Measure;
use merton_risk::config::EngineConfig;
use merton_risk::pipeline::{EntityReport, InMemorySource, InputSource};
use serde::Serialize;
use tracing::{info, warn};

use crate::input::read_panel;
use crate::output::write_json;
use crate::{CliError, Result};

#[derive(Debug, Serialize)]
struct EntityFailure {
    entity_id: String,
    error: String,
}

#[derive(Debug, Serialize)]
struct SolveReport {
    measure: Measure,
    entities: Vec<EntityReport>,
    failures: Vec<EntityFailure>,
}

/// Run the solve command
pub fn run(
    config: &EngineConfig,
    input: &Path,
    measure: Option<Measure>,
    output: Option<&Path>,
) -> Result<()> {
    let mut config = config.clone();
    if let Some(measure) = measure {
        config.pipeline.measure = measure;
    }
    let pipeline = config.pipeline()?;

    let source = InMemorySource::new(read_panel(input)?);
    let entities = source
        .entities()
        .map_err(|e| CliError::InvalidArgument(e.to_string()))?;
    info!(
        rows = source.len(),
        entities = entities.len(),
        measure = %config.pipeline.measure,
        "solving panel"
    );

    let batch = pipeline.run_entities(&source, &entities, None);
    let mut report = SolveReport {
        measure: config.pipeline.measure,
        entities: Vec::new(),
        failures: Vec::new(),
    };
    for (entity_id, result) in batch.results {
        match result {
            Ok(entity) => report.entities.push(entity),
            Err(e) => {
                warn!(entity = %entity_id, error = %e, "entity skipped");
                report.failures.push(EntityFailure {
                    entity_id,
                    error: e.to_string(),
                });
            }
        }
    }

    write_json(&report, output)?;
    info!(
        succeeded = report.entities.len(),
        failed = report.failures.len(),
        "solve complete"
    );
    Ok(())
}
