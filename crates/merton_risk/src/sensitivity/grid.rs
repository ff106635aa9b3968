//! Parameter grids.

use serde::{Deserialize, Serialize};

/// `n` evenly spaced values from `start` to `end` inclusive.
///
/// # Examples
/// ```
/// use merton_risk::sensitivity::linspace;
///
/// assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
/// assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
/// assert!(linspace(0.0, 1.0, 0).is_empty());
/// ```
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// A linear grid specification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    /// First value.
    pub start: f64,
    /// Last value.
    pub end: f64,
    /// Number of points.
    pub points: usize,
}

impl Grid {
    /// Create a grid.
    pub fn new(start: f64, end: f64, points: usize) -> Self {
        Self { start, end, points }
    }

    /// Grid values.
    pub fn values(&self) -> Vec<f64> {
        linspace(self.start, self.end, self.points)
    }

    /// Check the grid is usable.
    pub fn validate(&self, name: &str) -> Result<(), String> {
        if !(self.start.is_finite() && self.end.is_finite()) {
            return Err(format!("{name}: grid bounds must be finite"));
        }
        if self.points == 0 {
            return Err(format!("{name}: grid needs at least one point"));
        }
        Ok(())
    }
}

/// Relative debt changes from −50% to +50% in 10% steps.
pub fn default_debt_changes() -> Vec<f64> {
    (0..=10).map(|i| (i as f64 - 5.0) / 10.0).collect()
}
