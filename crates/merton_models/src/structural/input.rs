//! Observation inputs for the structural model.

use chrono::NaiveDate;
use merton_core::types::MertonError;

/// The numeric inputs of one Merton inversion.
///
/// Fields are public so that analysis engines can override a single
/// parameter on a copy; [`MertonParams::validate`] checks the model
/// preconditions.
///
/// # Examples
/// ```
/// use merton_models::structural::MertonParams;
///
/// let params = MertonParams::new(100.0, 0.4, 60.0, 0.03, 1.0).with_drift(0.06);
/// assert!(params.validate().is_ok());
/// assert_eq!(params.drift, Some(0.06));
///
/// let bad = MertonParams::new(-1.0, 0.4, 60.0, 0.03, 1.0);
/// assert!(bad.validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MertonParams {
    /// Market value of equity E (> 0).
    pub equity_value: f64,
    /// Annualised equity volatility σE (> 0).
    pub equity_vol: f64,
    /// Default point D (≥ 0).
    pub debt: f64,
    /// Continuously compounded risk-free rate r.
    pub risk_free_rate: f64,
    /// Horizon T in years (> 0).
    pub maturity: f64,
    /// Real-world asset drift μ, when known.
    #[cfg_attr(feature = "serde", serde(default))]
    pub drift: Option<f64>,
}

impl MertonParams {
    /// Create a parameter set without a drift.
    pub fn new(equity_value: f64, equity_vol: f64, debt: f64, risk_free_rate: f64, maturity: f64) -> Self {
        Self {
            equity_value,
            equity_vol,
            debt,
            risk_free_rate,
            maturity,
            drift: None,
        }
    }

    /// Attach a real-world drift.
    pub fn with_drift(mut self, drift: f64) -> Self {
        self.drift = Some(drift);
        self
    }

    /// Attach a drift only if none is present.
    pub fn with_default_drift(mut self, drift: f64) -> Self {
        self.drift.get_or_insert(drift);
        self
    }

    /// Check the model preconditions.
    ///
    /// Requires E > 0, σE > 0, D ≥ 0, T > 0 and every value finite.
    pub fn validate(&self) -> Result<(), MertonError> {
        let fields = [
            ("equity_value", self.equity_value),
            ("equity_vol", self.equity_vol),
            ("debt", self.debt),
            ("risk_free_rate", self.risk_free_rate),
            ("maturity", self.maturity),
        ];
        if let Some((name, value)) = fields.iter().find(|(_, v)| !v.is_finite()) {
            return Err(MertonError::invalid_input(format!("{name} is not finite ({value})")));
        }
        if let Some(mu) = self.drift {
            if !mu.is_finite() {
                return Err(MertonError::invalid_input(format!("drift is not finite ({mu})")));
            }
        }
        if self.equity_value <= 0.0 {
            return Err(MertonError::invalid_input(format!(
                "equity value must be positive, got {}",
                self.equity_value
            )));
        }
        if self.equity_vol <= 0.0 {
            return Err(MertonError::invalid_input(format!(
                "equity volatility must be positive, got {}",
                self.equity_vol
            )));
        }
        if self.debt < 0.0 {
            return Err(MertonError::invalid_input(format!(
                "debt must be non-negative, got {}",
                self.debt
            )));
        }
        if self.maturity <= 0.0 {
            return Err(MertonError::invalid_input(format!(
                "maturity must be positive, got {}",
                self.maturity
            )));
        }
        Ok(())
    }
}

/// One panel observation: an entity on a date with its model inputs.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use merton_models::structural::{MertonInput, MertonParams};
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 28).unwrap();
/// let row = MertonInput::new("AAPL", date, MertonParams::new(2.6e12, 0.22, 1.1e11, 0.05, 1.0));
/// assert_eq!(row.entity_id, "AAPL");
/// assert_eq!(row.label(), "AAPL on 2024-03-28");
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MertonInput {
    /// Entity (ticker) identifier.
    pub entity_id: String,
    /// Observation date.
    pub date: NaiveDate,
    /// Model inputs.
    pub params: MertonParams,
}

impl MertonInput {
    /// Create a new observation.
    pub fn new(entity_id: impl Into<String>, date: NaiveDate, params: MertonParams) -> Self {
        Self {
            entity_id: entity_id.into(),
            date,
            params,
        }
    }

    /// Human-readable observation label used in diagnostics.
    pub fn label(&self) -> String {
        format!("{} on {}", self.entity_id, self.date)
    }
}
