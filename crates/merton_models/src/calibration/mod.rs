//! Empirical PD calibration.
//!
//! - [`PdCalibrator`]: logistic mapping from distance to default onto
//!   observed default frequency
//! - [`synthetic_training_data`]: seeded demonstration sample
//!
//! ```text
//! DD values ─┐
//!            ├─→ PdCalibrator::fit ─→ CalibrationModel ─→ predict / compare
//! defaults  ─┘        (penalised Newton)     (a, b ≤ 0)
//! ```

mod logistic;
mod synthetic;

pub use logistic::{CalibrationModel, LogisticConfig, PdCalibrator, PdComparison};
pub use synthetic::synthetic_training_data;
