//! Bootstrap command implementation
//!
//! Bootstraps confidence intervals for the most recent rows of each entity.

use std::path::Path;

use merton_core::rng::derive_seed;
use merton_risk::bootstrap::{BootstrapEngine, BootstrapRow, RowSelection};
use merton_risk::config::EngineConfig;
use merton_risk::pipeline::{InMemorySource, InputSource};
use tracing::{info, warn};

use crate::input::read_panel;
use crate::output::write_json;
use crate::{CliError, Result};

/// Overrides taken from the command line.
#[derive(Debug, Default, Clone, Copy)]
pub struct BootstrapOverrides {
    /// Rows kept per entity; 0 keeps every row.
    pub most_recent: Option<usize>,
    /// Draws per row.
    pub iterations: Option<usize>,
    /// Master seed.
    pub seed: Option<u64>,
}

/// Run the bootstrap command
pub fn run(
    config: &EngineConfig,
    input: &Path,
    overrides: BootstrapOverrides,
    output: Option<&Path>,
) -> Result<()> {
    let mut settings = config.bootstrap;
    if let Some(k) = overrides.most_recent {
        settings.row_selection = match k {
            0 => RowSelection::All,
            k => RowSelection::MostRecent(k),
        };
    }
    if let Some(n) = overrides.iterations {
        settings.n_iterations = n;
    }
    if let Some(seed) = overrides.seed {
        settings.seed = Some(seed);
    }
    let engine = EngineConfig {
        bootstrap: settings,
        ..config.clone()
    }
    .bootstrap_engine()?;

    let source = InMemorySource::new(read_panel(input)?);
    let rows = bootstrap_entities(&engine, &source)?;
    write_json(&rows, output)
}

/// Bootstrap every entity of `source`.
///
/// With a configured seed, entity `i` runs on `derive_seed(seed, i)`.
fn bootstrap_entities(engine: &BootstrapEngine, source: &InMemorySource) -> Result<Vec<BootstrapRow>> {
    let entities = source
        .entities()
        .map_err(|e| CliError::InvalidArgument(e.to_string()))?;

    let mut rows: Vec<BootstrapRow> = Vec::new();
    for (idx, entity) in entities.iter().enumerate() {
        let panel = source
            .load(entity)
            .map_err(|e| CliError::InvalidArgument(e.to_string()))?;
        let results = match engine.config().seed {
            Some(seed) => engine.reseeded(derive_seed(seed, idx as u64)).run_batch(&panel),
            None => engine.run_batch(&panel),
        };
        let skipped = results.iter().filter(|r| !r.is_ok()).count();
        if skipped > 0 {
            warn!(entity = %entity, skipped, "rows could not be bootstrapped");
        }
        info!(entity = %entity, rows = results.len(), "bootstrapped");
        rows.extend(results);
    }
    Ok(rows)
}
