//! Logistic DD → PD calibration.
//!
//! Fits `PD(DD) = 1 / (1 + exp(−(a + b·DD)))` to observed default flags by
//! Newton–Raphson on the L2-penalised log-likelihood. The penalty applies to
//! the slope only, with strength `1/C`, which keeps the fit finite on
//! perfectly separated samples.

use merton_core::math::distributions::norm_sf;
use merton_core::math::linalg::solve_linear;
use merton_core::types::MertonError;
use tracing::debug;

const MODEL_NAME: &str = "PD calibrator";

/// Newton iteration settings.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LogisticConfig {
    /// Inverse regularisation strength C (> 0).
    pub regularization_c: f64,
    /// Newton iteration cap.
    pub max_iterations: usize,
    /// Convergence threshold on the largest coefficient step.
    pub tolerance: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            regularization_c: 1.0,
            max_iterations: 100,
            tolerance: 1e-10,
        }
    }
}

impl LogisticConfig {
    /// Check the settings.
    pub fn validate(&self) -> Result<(), MertonError> {
        if !(self.regularization_c.is_finite() && self.regularization_c > 0.0) {
            return Err(MertonError::invalid_input(format!(
                "regularization_c must be positive, got {}",
                self.regularization_c
            )));
        }
        if self.max_iterations == 0 {
            return Err(MertonError::invalid_input("max_iterations must be greater than 0"));
        }
        if !(self.tolerance > 0.0) {
            return Err(MertonError::invalid_input("tolerance must be positive"));
        }
        Ok(())
    }
}

/// A fitted DD → PD mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalibrationModel {
    /// Intercept a.
    pub intercept: f64,
    /// Slope b (≤ 0).
    pub slope: f64,
    /// Training observations.
    pub n_obs: usize,
    /// Observed default rate of the training sample.
    pub default_rate: f64,
    /// Unpenalised training log-likelihood at the fitted coefficients.
    pub log_likelihood: f64,
    /// Newton iterations used.
    pub iterations: usize,
    /// Whether the slope was pinned at zero to keep PD non-increasing in DD.
    pub monotone_constrained: bool,
}

impl CalibrationModel {
    /// Calibrated PD at `dd`.
    #[inline]
    pub fn predict(&self, dd: f64) -> f64 {
        sigmoid(self.intercept + self.slope * dd)
    }
}

/// Raw and calibrated PD side by side.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PdComparison {
    /// Distance to default.
    pub dd: f64,
    /// Model PD `Φ(−DD)`.
    pub pd_raw: f64,
    /// Logistic-calibrated PD.
    pub pd_calibrated: f64,
    /// Observed default flag, when supplied.
    pub default_flag: Option<bool>,
}

/// Logistic calibrator mapping distance to default onto empirical PD.
///
/// # Examples
/// ```
/// use merton_models::calibration::{synthetic_training_data, PdCalibrator};
///
/// let (dd, flags) = synthetic_training_data(1000, 0.02, 42).unwrap();
/// let mut calibrator = PdCalibrator::new();
/// assert!(calibrator.predict(2.0).is_err());
///
/// let model = calibrator.fit(&dd, &flags).unwrap();
/// assert!(model.slope < 0.0);
/// assert!(calibrator.predict(1.0).unwrap() > calibrator.predict(8.0).unwrap());
/// ```
#[derive(Debug, Clone, Default)]
pub struct PdCalibrator {
    config: LogisticConfig,
    model: Option<CalibrationModel>,
}

impl PdCalibrator {
    /// Create an unfitted calibrator with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an unfitted calibrator with the given settings.
    pub fn with_config(config: LogisticConfig) -> Self {
        Self { config, model: None }
    }

    /// Settings in use.
    pub fn config(&self) -> &LogisticConfig {
        &self.config
    }

    /// Whether [`fit`](Self::fit) has succeeded.
    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    /// The fitted model.
    pub fn model(&self) -> Result<&CalibrationModel, MertonError> {
        self.model.as_ref().ok_or_else(|| MertonError::not_fitted(MODEL_NAME))
    }

    /// Fitted `(intercept, slope)`.
    pub fn coefficients(&self) -> Result<(f64, f64), MertonError> {
        self.model().map(|m| (m.intercept, m.slope))
    }

    /// Fit the mapping to `(dd, defaulted)` pairs.
    ///
    /// A failed fit leaves any previous model in place.
    ///
    /// # Errors
    /// - [`MertonError::InvalidInput`] for empty or mismatched inputs, or
    ///   non-finite DD values
    /// - [`MertonError::InsufficientData`] if only one class is present
    /// - [`MertonError::NonConvergence`] if the Newton iteration fails
    pub fn fit(&mut self, dd_values: &[f64], defaults: &[bool]) -> Result<CalibrationModel, MertonError> {
        self.config.validate()?;
        if dd_values.is_empty() {
            return Err(MertonError::invalid_input("no calibration observations"));
        }
        if dd_values.len() != defaults.len() {
            return Err(MertonError::invalid_input(format!(
                "{} DD values but {} default flags",
                dd_values.len(),
                defaults.len()
            )));
        }
        if let Some(bad) = dd_values.iter().find(|v| !v.is_finite()) {
            return Err(MertonError::invalid_input(format!("non-finite DD value {bad}")));
        }

        let n = dd_values.len();
        let n_defaults = defaults.iter().filter(|d| **d).count();
        let classes = usize::from(n_defaults > 0) + usize::from(n_defaults < n);
        if classes < 2 {
            return Err(MertonError::insufficient_data(classes, 2));
        }
        let default_rate = n_defaults as f64 / n as f64;
        let base_logit = (default_rate / (1.0 - default_rate)).ln();

        let (mut intercept, mut slope, iterations) = self.newton(dd_values, defaults, base_logit)?;
        let monotone_constrained = slope > 0.0;
        if monotone_constrained {
            // Intercept-only maximum likelihood
            intercept = base_logit;
            slope = 0.0;
        }

        let model = CalibrationModel {
            intercept,
            slope,
            n_obs: n,
            default_rate,
            log_likelihood: log_likelihood(dd_values, defaults, intercept, slope),
            iterations,
            monotone_constrained,
        };
        debug!(
            n_obs = n,
            default_rate,
            intercept,
            slope,
            iterations,
            monotone_constrained,
            "fitted PD calibration"
        );
        self.model = Some(model);
        Ok(model)
    }

    /// Damped Newton iteration from `(base_logit, 0)`.
    fn newton(&self, x: &[f64], y: &[bool], base_logit: f64) -> Result<(f64, f64, usize), MertonError> {
        let penalty = 1.0 / self.config.regularization_c;
        let objective = |a: f64, b: f64| -log_likelihood(x, y, a, b) + 0.5 * penalty * b * b;

        let (mut a, mut b) = (base_logit, 0.0);
        let mut current = objective(a, b);

        for iteration in 1..=self.config.max_iterations {
            let (mut g0, mut g1) = (0.0, penalty * b);
            let (mut h00, mut h01, mut h11) = (0.0, 0.0, penalty);
            for (&xi, &yi) in x.iter().zip(y) {
                let p = sigmoid(a + b * xi);
                let r = p - if yi { 1.0 } else { 0.0 };
                let w = p * (1.0 - p);
                g0 += r;
                g1 += r * xi;
                h00 += w;
                h01 += w * xi;
                h11 += w * xi * xi;
            }

            let hessian = vec![vec![h00, h01], vec![h01, h11]];
            let step = solve_linear(&hessian, &[g0, g1]).ok_or_else(|| {
                MertonError::non_convergence(format!("singular Hessian at iteration {iteration}"))
            })?;

            // Halve the step until the penalised objective does not increase
            let mut scale = 1.0;
            let (mut next_a, mut next_b, mut next) = (a, b, current);
            for _ in 0..30 {
                let (ta, tb) = (a - scale * step[0], b - scale * step[1]);
                let value = objective(ta, tb);
                if value.is_finite() && value <= current {
                    (next_a, next_b, next) = (ta, tb, value);
                    break;
                }
                scale *= 0.5;
            }

            let moved = (next_a - a).abs().max((next_b - b).abs());
            (a, b, current) = (next_a, next_b, next);
            if moved < self.config.tolerance {
                return Ok((a, b, iteration));
            }
        }

        Err(MertonError::non_convergence(format!(
            "logistic fit did not converge in {} iterations",
            self.config.max_iterations
        )))
    }

    /// Calibrated PD for one DD.
    pub fn predict(&self, dd: f64) -> Result<f64, MertonError> {
        Ok(self.model()?.predict(dd))
    }

    /// Calibrated PD for each DD.
    pub fn predict_batch(&self, dd_values: &[f64]) -> Result<Vec<f64>, MertonError> {
        let model = self.model()?;
        Ok(dd_values.iter().map(|&dd| model.predict(dd)).collect())
    }

    /// Raw `Φ(−DD)` against calibrated PD, optionally with observed flags.
    pub fn compare_methods(
        &self,
        dd_values: &[f64],
        defaults: Option<&[bool]>,
    ) -> Result<Vec<PdComparison>, MertonError> {
        let model = self.model()?;
        if let Some(flags) = defaults {
            if flags.len() != dd_values.len() {
                return Err(MertonError::invalid_input(format!(
                    "{} DD values but {} default flags",
                    dd_values.len(),
                    flags.len()
                )));
            }
        }
        Ok(dd_values
            .iter()
            .enumerate()
            .map(|(i, &dd)| PdComparison {
                dd,
                pd_raw: norm_sf(dd),
                pd_calibrated: model.predict(dd),
                default_flag: defaults.map(|flags| flags[i]),
            })
            .collect())
    }
}

#[inline]
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^z)` without overflow.
#[inline]
fn softplus(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

fn log_likelihood(x: &[f64], y: &[bool], a: f64, b: f64) -> f64 {
    x.iter()
        .zip(y)
        .map(|(&xi, &yi)| {
            let z = a + b * xi;
            // ln p = −softplus(−z), ln(1 − p) = −softplus(z)
            if yi {
                -softplus(-z)
            } else {
                -softplus(z)
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Overlapping classes: defaults concentrated at low DD.
    fn overlapping_sample() -> (Vec<f64>, Vec<bool>) {
        let mut dd = Vec::new();
        let mut flags = Vec::new();
        for i in 0..200 {
            let x = i as f64 * 0.05;
            dd.push(x);
            // Default every 2nd obs below DD 2, every 10th up to 5, none above
            flags.push((x < 2.0 && i % 2 == 0) || (x < 5.0 && i % 10 == 0));
        }
        (dd, flags)
    }

    // ========================================
    // Fit
    // ========================================

    #[test]
    fn test_fit_overlapping_sample() {
        let (dd, flags) = overlapping_sample();
        let mut calibrator = PdCalibrator::new();
        let model = calibrator.fit(&dd, &flags).unwrap();
        assert!(model.slope < 0.0);
        assert!(!model.monotone_constrained);
        assert_eq!(model.n_obs, 200);
        assert!(model.log_likelihood < 0.0);
        assert!(calibrator.is_fitted());
    }

    #[test]
    fn test_fit_is_stationary() {
        let (dd, flags) = overlapping_sample();
        let mut calibrator = PdCalibrator::new();
        let model = calibrator.fit(&dd, &flags).unwrap();
        // Gradient of the penalised objective vanishes at the optimum
        let (mut g0, mut g1) = (0.0, model.slope);
        for (&x, &y) in dd.iter().zip(&flags) {
            let r = model.predict(x) - if y { 1.0 } else { 0.0 };
            g0 += r;
            g1 += r * x;
        }
        assert!(g0.abs() < 1e-6);
        assert!(g1.abs() < 1e-6);
    }

    #[test]
    fn test_fit_separable_sample_is_finite() {
        let dd = vec![0.5, 1.0, 1.5, 4.0, 5.0, 6.0, 7.0, 8.0];
        let flags = vec![true, true, true, false, false, false, false, false];
        let mut calibrator = PdCalibrator::new();
        let model = calibrator.fit(&dd, &flags).unwrap();
        assert!(model.intercept.is_finite() && model.slope.is_finite());
        assert!(model.slope < 0.0);
    }

    #[test]
    fn test_monotone_constraint() {
        // Defaults at high DD would give a positive slope
        let dd = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let flags = vec![false, false, false, false, true, false, true, true];
        let mut calibrator = PdCalibrator::new();
        let model = calibrator.fit(&dd, &flags).unwrap();
        assert!(model.monotone_constrained);
        assert_eq!(model.slope, 0.0);
        assert_relative_eq!(model.predict(0.0), 3.0 / 8.0, epsilon = 1e-12);
        assert_relative_eq!(model.predict(10.0), 3.0 / 8.0, epsilon = 1e-12);
    }

    // ========================================
    // Errors
    // ========================================

    #[test]
    fn test_fit_errors() {
        let mut calibrator = PdCalibrator::new();
        assert!(calibrator.fit(&[], &[]).unwrap_err().is_invalid_input());
        assert!(calibrator
            .fit(&[1.0, 2.0], &[true])
            .unwrap_err()
            .is_invalid_input());
        assert!(calibrator
            .fit(&[1.0, f64::NAN], &[true, false])
            .unwrap_err()
            .is_invalid_input());
        assert!(calibrator
            .fit(&[1.0, 2.0, 3.0], &[false, false, false])
            .unwrap_err()
            .is_insufficient_data());
        assert!(!calibrator.is_fitted());
    }

    #[test]
    fn test_not_fitted() {
        let calibrator = PdCalibrator::new();
        assert!(calibrator.predict(1.0).unwrap_err().is_not_fitted());
        assert!(calibrator.predict_batch(&[1.0]).unwrap_err().is_not_fitted());
        assert!(calibrator.coefficients().unwrap_err().is_not_fitted());
        assert!(calibrator.compare_methods(&[1.0], None).is_err());
    }

    #[test]
    fn test_invalid_config() {
        let mut calibrator = PdCalibrator::with_config(LogisticConfig {
            regularization_c: 0.0,
            ..Default::default()
        });
        assert!(calibrator.fit(&[1.0, 2.0], &[true, false]).is_err());
    }

    // ========================================
    // Prediction
    // ========================================

    #[test]
    fn test_predict_monotone_and_bounded() {
        let (dd, flags) = overlapping_sample();
        let mut calibrator = PdCalibrator::new();
        calibrator.fit(&dd, &flags).unwrap();
        let grid: Vec<f64> = (-20..=60).map(|i| i as f64 * 0.5).collect();
        let pds = calibrator.predict_batch(&grid).unwrap();
        for w in pds.windows(2) {
            assert!(w[1] <= w[0]);
        }
        assert!(pds.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_compare_methods() {
        let (dd, flags) = overlapping_sample();
        let mut calibrator = PdCalibrator::new();
        calibrator.fit(&dd, &flags).unwrap();

        let rows = calibrator.compare_methods(&[2.0, 4.0], Some(&[true, false])).unwrap();
        assert_eq!(rows.len(), 2);
        assert_relative_eq!(rows[0].pd_raw, norm_sf(2.0));
        assert_eq!(rows[1].default_flag, Some(false));

        assert!(calibrator.compare_methods(&[2.0], Some(&[true, false])).is_err());
        let rows = calibrator.compare_methods(&[2.0], None).unwrap();
        assert_eq!(rows[0].default_flag, None);
    }

    #[test]
    fn test_stable_helpers() {
        assert_relative_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(-800.0) >= 0.0 && sigmoid(800.0) <= 1.0);
        assert!(softplus(800.0).is_finite());
        assert_relative_eq!(softplus(0.0), 2.0_f64.ln());
    }
}
