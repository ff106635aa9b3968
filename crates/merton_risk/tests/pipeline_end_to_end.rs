//! End-to-end tests of the batch pipeline.
//!
//! A synthetic panel is generated from known asset values, pushed through
//! source → pipeline → sink, and checked against the generating parameters.

use approx::assert_relative_eq;
use chrono::{Days, NaiveDate};
use merton_models::structural::{equity_from_assets, Measure, MertonInput, MertonParams};
use merton_risk::config::EngineConfig;
use merton_risk::pipeline::{
    BoxError, InMemorySink, InMemorySource, InputSource, MertonPipeline, OutputRow,
    PipelineConfig,
};

const ASSET_VALUES: [f64; 5] = [150.0, 152.0, 149.0, 155.0, 158.0];
const ASSET_VOL: f64 = 0.25;
const DEBT: f64 = 80.0;
const RATE: f64 = 0.03;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
}

/// Panel for `entity` generated from `ASSET_VALUES`.
fn synthetic_panel(entity: &str) -> Vec<MertonInput> {
    ASSET_VALUES
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let (e, sigma_e) = equity_from_assets(v, ASSET_VOL, DEBT, RATE, 1.0);
            MertonInput::new(
                entity,
                start() + Days::new(i as u64),
                MertonParams::new(e, sigma_e, DEBT, RATE, 1.0),
            )
        })
        .collect()
}

struct BrokenSource;

impl InputSource for BrokenSource {
    fn entities(&self) -> Result<Vec<String>, BoxError> {
        Ok(vec!["X".to_string()])
    }

    fn load(&self, _entity_id: &str) -> Result<Vec<MertonInput>, BoxError> {
        Err("connection refused".into())
    }
}

// ============================================================================
// Single entity
// ============================================================================

#[test]
fn test_pipeline_recovers_generating_assets() {
    let pipeline = MertonPipeline::new(PipelineConfig::default()).unwrap();
    let report = pipeline.run_rows("ACME", synthetic_panel("ACME")).unwrap();

    assert_eq!(report.rows.len(), ASSET_VALUES.len());
    for (row, &v) in report.rows.iter().zip(ASSET_VALUES.iter()) {
        assert!(row.converged);
        assert_relative_eq!(row.asset_value.unwrap(), v, max_relative = 1e-6);
        assert_relative_eq!(row.asset_volatility.unwrap(), ASSET_VOL, max_relative = 1e-6);
        assert_relative_eq!(row.leverage.unwrap(), DEBT / v, max_relative = 1e-6);
        assert!(row.equity_ratio.unwrap() < 1.0);
        let pd = row.probability_of_default.unwrap();
        assert!((0.0..=1.0).contains(&pd));
    }
    assert!(report.validation.unwrap().passed);
}

#[test]
fn test_output_rows_serialise_with_null_metrics() {
    let pipeline = MertonPipeline::new(PipelineConfig::default()).unwrap();
    let mut rows = synthetic_panel("ACME");
    rows[2].params.equity_vol = -0.1;

    let report = pipeline.run_rows("ACME", rows).unwrap();
    let failed: &OutputRow = &report.rows[2];
    assert!(!failed.converged);

    let json = serde_json::to_value(failed).unwrap();
    assert!(json["probability_of_default"].is_null());
    assert_eq!(json["measure"], "risk_neutral");
    assert!(json["reason"].is_string());
}

// ============================================================================
// Multiple entities
// ============================================================================

#[test]
fn test_run_entities_from_config() {
    let config = EngineConfig::from_toml_str(
        r#"
        [pipeline]
        measure = "real_world"
        default_drift = 0.05
        "#,
    )
    .unwrap();
    let pipeline = config.pipeline().unwrap();

    let source = InMemorySource::new(synthetic_panel("A").into_iter().chain(synthetic_panel("B")));
    let entities = source.entities().unwrap();
    let sink = InMemorySink::new();

    let report = pipeline.run_entities(&source, &entities, Some(&sink));
    assert_eq!(report.failure_count(), 0);
    assert_eq!(report.succeeded().count(), 2);
    assert_eq!(sink.all_rows().len(), 2 * ASSET_VALUES.len());
    assert!(sink.rows("B").iter().all(|r| r.measure == Measure::RealWorld));

    // Rerunning replaces rather than appends
    pipeline.run_entities(&source, &entities, Some(&sink));
    assert_eq!(sink.all_rows().len(), 2 * ASSET_VALUES.len());
}

#[test]
fn test_source_failure_is_per_entity() {
    let pipeline = MertonPipeline::new(PipelineConfig::default()).unwrap();
    let report = pipeline.run_entities(&BrokenSource, &["X".to_string()], None);

    let (entity, result) = &report.results[0];
    assert_eq!(entity, "X");
    let err = result.as_ref().unwrap_err();
    assert!(err.is_source());
    assert!(err.to_string().contains("connection refused"));
}
