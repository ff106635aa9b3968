//! Entity-level orchestration: load, solve, annotate, validate, store.

use merton_core::types::MertonError;
use merton_models::structural::{annotate, Measure, MertonInput, MertonSolver, MertonSolverConfig};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::PipelineError;
use super::io::{InputSource, ResultSink};
use super::output::{OutputRow, ValidationReport};

/// Pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Root-finder settings.
    pub solver: MertonSolverConfig,
    /// Measure of the reported DD/PD.
    pub measure: Measure,
    /// Drift applied to real-world rows that carry none.
    pub default_drift: f64,
    /// Run output validation per entity.
    pub validate: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            solver: MertonSolverConfig::default(),
            measure: Measure::RiskNeutral,
            default_drift: 0.02,
            validate: true,
        }
    }
}

impl PipelineConfig {
    /// Validate the settings.
    pub fn validate(&self) -> Result<(), MertonError> {
        self.solver.validate()?;
        if !self.default_drift.is_finite() {
            return Err(MertonError::invalid_input(format!(
                "default_drift must be finite, got {}",
                self.default_drift
            )));
        }
        Ok(())
    }
}

/// Output of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityReport {
    /// Entity identifier.
    pub entity_id: String,
    /// One row per input observation, in date order.
    pub rows: Vec<OutputRow>,
    /// Validation findings, when enabled.
    pub validation: Option<ValidationReport>,
}

impl EntityReport {
    /// Number of converged rows.
    pub fn converged_count(&self) -> usize {
        self.rows.iter().filter(|r| r.converged).count()
    }
}

/// Per-entity results of a multi-entity run, in request order.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// `(entity, result)` pairs.
    pub results: Vec<(String, Result<EntityReport, PipelineError>)>,
}

impl BatchReport {
    /// Entities that completed.
    pub fn succeeded(&self) -> impl Iterator<Item = &EntityReport> {
        self.results.iter().filter_map(|(_, r)| r.as_ref().ok())
    }

    /// Entities that failed.
    pub fn failed(&self) -> impl Iterator<Item = &PipelineError> {
        self.results.iter().filter_map(|(_, r)| r.as_ref().err())
    }

    /// Number of failed entities.
    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }
}

/// Batch pipeline over one or many entities.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use merton_models::structural::{MertonInput, MertonParams};
/// use merton_risk::pipeline::{MertonPipeline, PipelineConfig};
///
/// let pipeline = MertonPipeline::new(PipelineConfig::default()).unwrap();
/// let date = NaiveDate::from_ymd_opt(2024, 3, 28).unwrap();
/// let rows = vec![MertonInput::new("ACME", date, MertonParams::new(100.0, 0.3, 50.0, 0.04, 1.0))];
///
/// let report = pipeline.run_rows("ACME", rows).unwrap();
/// assert_eq!(report.rows.len(), 1);
/// assert!(report.rows[0].converged);
/// ```
#[derive(Debug, Clone)]
pub struct MertonPipeline {
    config: PipelineConfig,
    solver: MertonSolver,
}

impl MertonPipeline {
    /// Create a pipeline after validating `config`.
    pub fn new(config: PipelineConfig) -> Result<Self, MertonError> {
        config.validate()?;
        Ok(Self {
            solver: MertonSolver::new(config.solver),
            config,
        })
    }

    /// Active settings.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process one entity's rows.
    pub fn run_rows(
        &self,
        entity: &str,
        mut rows: Vec<MertonInput>,
    ) -> Result<EntityReport, PipelineError> {
        rows.sort_by_key(|r| r.date);
        if self.config.measure == Measure::RealWorld {
            for row in &mut rows {
                row.params = row.params.with_default_drift(self.config.default_drift);
            }
        }
        let equity_vols: Vec<f64> = rows.iter().map(|r| r.params.equity_vol).collect();

        let solved = self.solver.solve_batch(&rows);
        let annotated = annotate(solved, self.config.measure).map_err(|source| {
            PipelineError::Model {
                entity: entity.to_string(),
                source,
            }
        })?;
        let output: Vec<OutputRow> = annotated.iter().map(OutputRow::from).collect();

        let report = EntityReport {
            entity_id: entity.to_string(),
            validation: self
                .config
                .validate
                .then(|| ValidationReport::check(&output, &equity_vols)),
            rows: output,
        };

        info!(
            entity,
            converged = report.converged_count(),
            total = report.rows.len(),
            measure = %self.config.measure,
            "entity processed"
        );
        if let Some(validation) = &report.validation {
            for warning in &validation.warnings {
                warn!(entity, "{warning}");
            }
            for issue in &validation.issues {
                warn!(entity, issue = %issue, "validation failed");
            }
        }
        Ok(report)
    }

    fn run_entity(
        &self,
        source: &dyn InputSource,
        entity: &str,
        sink: Option<&dyn ResultSink>,
    ) -> Result<EntityReport, PipelineError> {
        let rows = source.load(entity).map_err(|e| PipelineError::Source {
            entity: entity.to_string(),
            message: e.to_string(),
        })?;
        info!(entity, rows = rows.len(), "loaded inputs");

        let report = self.run_rows(entity, rows)?;
        if let Some(sink) = sink {
            let written = sink
                .replace(entity, &report.rows)
                .map_err(|e| PipelineError::Sink {
                    entity: entity.to_string(),
                    message: e.to_string(),
                })?;
            info!(entity, written, "stored results");
        }
        Ok(report)
    }

    /// Process many entities in parallel.
    ///
    /// Each entity gets its own result; a failing entity never stops the
    /// others. Results follow the order of `entities`.
    pub fn run_entities(
        &self,
        source: &dyn InputSource,
        entities: &[String],
        sink: Option<&dyn ResultSink>,
    ) -> BatchReport {
        let results: Vec<(String, Result<EntityReport, PipelineError>)> = entities
            .par_iter()
            .map(|entity| {
                let result = self.run_entity(source, entity, sink);
                if let Err(e) = &result {
                    warn!(entity = %entity, error = %e, "entity failed");
                }
                (entity.clone(), result)
            })
            .collect();

        let report = BatchReport { results };
        info!(
            entities = entities.len(),
            failed = report.failure_count(),
            "pipeline run complete"
        );
        report
    }
}
