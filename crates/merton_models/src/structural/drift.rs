//! Real-world asset drift estimation.

use std::fmt;
use std::str::FromStr;

use merton_core::types::MertonError;

/// Default shrinkage strength τ, in years.
pub const DEFAULT_SHRINKAGE_TAU: f64 = 2.0;

/// Sampling frequency of an asset-value series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Frequency {
    /// Trading days (252 per year).
    Daily,
    /// Months (12 per year).
    Monthly,
    /// Years.
    #[default]
    Annual,
}

impl Frequency {
    /// Observations per year.
    pub fn periods_per_year(&self) -> f64 {
        match self {
            Self::Daily => 252.0,
            Self::Monthly => 12.0,
            Self::Annual => 1.0,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Monthly => write!(f, "monthly"),
            Self::Annual => write!(f, "annual"),
        }
    }
}

impl FromStr for Frequency {
    type Err = MertonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" | "d" => Ok(Self::Daily),
            "monthly" | "m" => Ok(Self::Monthly),
            "annual" | "yearly" | "a" | "y" => Ok(Self::Annual),
            other => Err(MertonError::invalid_input(format!(
                "frequency must be daily, monthly or annual, got '{other}'"
            ))),
        }
    }
}

/// Annualised mean log return of a chronological asset-value series.
///
/// # Errors
/// - [`MertonError::InsufficientData`] with fewer than two observations
/// - [`MertonError::InvalidInput`] if any value is non-positive or non-finite
///
/// # Examples
/// ```
/// use merton_models::structural::{estimate_drift, Frequency};
///
/// let series = [100.0, 110.0, 121.0];
/// let mu = estimate_drift(&series, Frequency::Annual).unwrap();
/// assert!((mu - 1.1_f64.ln()).abs() < 1e-12);
///
/// assert!(estimate_drift(&[100.0], Frequency::Daily).is_err());
/// ```
pub fn estimate_drift(asset_values: &[f64], frequency: Frequency) -> Result<f64, MertonError> {
    if asset_values.len() < 2 {
        return Err(MertonError::insufficient_data(asset_values.len(), 2));
    }
    if let Some(bad) = asset_values.iter().find(|v| !(v.is_finite() && **v > 0.0)) {
        return Err(MertonError::invalid_input(format!(
            "asset values must be positive and finite, got {bad}"
        )));
    }
    let n = (asset_values.len() - 1) as f64;
    let mean_log_return = asset_values
        .windows(2)
        .map(|w| (w[1] / w[0]).ln())
        .sum::<f64>()
        / n;
    Ok(mean_log_return * frequency.periods_per_year())
}

/// Blend a company drift with its sector drift.
///
/// `w = years / (years + τ)` and the result is `w·company + (1 − w)·sector`.
/// Negative `years` is treated as zero history; a non-positive τ disables
/// shrinkage.
///
/// # Examples
/// ```
/// use merton_models::structural::{shrink_drift, DEFAULT_SHRINKAGE_TAU};
///
/// // Two years of history against τ = 2 gives equal weights
/// let mu = shrink_drift(0.10, 0.04, 2.0, DEFAULT_SHRINKAGE_TAU);
/// assert!((mu - 0.07).abs() < 1e-12);
/// ```
pub fn shrink_drift(company: f64, sector: f64, years: f64, tau: f64) -> f64 {
    let years = years.max(0.0);
    let weight = if tau > 0.0 { years / (years + tau) } else { 1.0 };
    weight * company + (1.0 - weight) * sector
}
