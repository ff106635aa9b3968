//! Sample statistics for bootstrap draws.

use serde::{Deserialize, Serialize};

/// Location, spread and percentile bounds of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatSummary {
    /// Sample median.
    pub median: f64,
    /// Sample mean.
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    /// Lower percentile bound, `(1 − c)/2`.
    pub lower: f64,
    /// Upper percentile bound, `(1 + c)/2`.
    pub upper: f64,
}

impl StatSummary {
    /// Summarise `samples` for confidence level `confidence`.
    ///
    /// Returns `None` for an empty sample. Non-finite values are ignored.
    pub fn from_samples(samples: &[f64], confidence: f64) -> Option<Self> {
        let mut sorted: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len() as f64;
        let mean = sorted.iter().sum::<f64>() / n;
        let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let alpha = 1.0 - confidence;

        Some(Self {
            median: percentile(&sorted, 0.5)?,
            mean,
            std: variance.sqrt(),
            lower: percentile(&sorted, alpha / 2.0)?,
            upper: percentile(&sorted, 1.0 - alpha / 2.0)?,
        })
    }

    /// Whether `value` lies within `[lower, upper]`.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    /// Width of the percentile interval.
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Linear-interpolation percentile of a sorted sample (`q` in [0, 1]).
///
/// Returns `None` for an empty sample.
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let position = q.clamp(0.0, 1.0) * last as f64;
    let below = position.floor() as usize;
    let above = (below + 1).min(last);
    let frac = position - below as f64;
    Some(sorted[below] + frac * (sorted[above] - sorted[below]))
}
