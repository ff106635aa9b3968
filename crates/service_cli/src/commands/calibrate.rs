//! Calibrate command implementation
//!
//! Fits the logistic DD → PD mapping from a training file or a synthetic
//! sample and prints it next to the raw model PD.

use std::path::Path;

use merton_models::calibration::{synthetic_training_data, CalibrationModel, PdCalibrator, PdComparison};
use serde::Serialize;
use tracing::info;

use crate::input::read_defaults;
use crate::output::{format_pct, write_json};
use crate::Result;

/// DD points of the comparison table.
const TABLE_DD: [f64; 9] = [-1.0, 0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 8.0];

/// Where the training sample comes from.
#[derive(Debug, Clone, Copy)]
pub enum TrainingSource<'a> {
    /// `dd,default` CSV file.
    File(&'a Path),
    /// Synthetic sample.
    Synthetic {
        /// Sample size.
        n: usize,
        /// Share of defaulters.
        default_rate: f64,
        /// Generator seed.
        seed: u64,
    },
}

#[derive(Debug, Serialize)]
struct CalibrationReport {
    model: CalibrationModel,
    comparison: Vec<PdComparison>,
}

/// Run the calibrate command
pub fn run(source: TrainingSource<'_>, output: Option<&Path>) -> Result<()> {
    let (dd, defaults) = match source {
        TrainingSource::File(path) => read_defaults(path)?,
        TrainingSource::Synthetic { n, default_rate, seed } => {
            info!(n, default_rate, seed, "generating synthetic training sample");
            synthetic_training_data(n, default_rate, seed)?
        }
    };

    let mut calibrator = PdCalibrator::new();
    let model = calibrator.fit(&dd, &defaults)?;
    info!(
        intercept = model.intercept,
        slope = model.slope,
        n_obs = model.n_obs,
        default_rate = model.default_rate,
        "calibration complete"
    );
    if model.monotone_constrained {
        info!("slope pinned at zero to keep PD non-increasing in DD");
    }

    let comparison = calibrator.compare_methods(&TABLE_DD, None)?;
    print_table(&model, &comparison);

    if output.is_some() {
        write_json(&CalibrationReport { model, comparison }, output)?;
    }
    Ok(())
}

fn print_table(model: &CalibrationModel, rows: &[PdComparison]) {
    println!("PD = 1 / (1 + exp(-({:.4} + {:.4} * DD)))", model.intercept, model.slope);
    println!("┌────────┬──────────────┬──────────────┐");
    println!("│ DD     │ Merton PD    │ Calibrated   │");
    println!("├────────┼──────────────┼──────────────┤");
    for row in rows {
        println!(
            "│ {:>6.2} │ {:>12} │ {:>12} │",
            row.dd,
            format_pct(row.pd_raw),
            format_pct(row.pd_calibrated)
        );
    }
    println!("└────────┴──────────────┴──────────────┘");
}
