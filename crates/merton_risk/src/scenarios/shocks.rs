//! Scenario shock definitions.

use merton_core::types::MertonError;
use merton_models::structural::MertonParams;
use serde::{Deserialize, Serialize};

/// A named bundle of input shocks.
///
/// ```text
/// E'  = E · (1 + equity_shock)
/// σE' = σE · volatility_multiplier
/// D'  = D · (1 + debt_shock)
/// r'  = r + rate_shock
/// ```
///
/// Maturity and drift are left unchanged.
///
/// # Examples
/// ```
/// use merton_models::structural::MertonParams;
/// use merton_risk::scenarios::StressScenario;
///
/// let scenario = StressScenario::new("TEST", "Test", 2.0, 0.1, -0.01, -0.2);
/// let shocked = scenario.apply(&MertonParams::new(100.0, 0.3, 50.0, 0.04, 1.0));
/// assert!((shocked.equity_value - 80.0).abs() < 1e-12);
/// assert!((shocked.equity_vol - 0.6).abs() < 1e-12);
/// assert!((shocked.debt - 55.0).abs() < 1e-12);
/// assert!((shocked.risk_free_rate - 0.03).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressScenario {
    /// Lookup key (e.g. `GFC_2008`).
    pub key: String,
    /// Display name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Multiplier on equity volatility.
    #[serde(default = "unit")]
    pub volatility_multiplier: f64,
    /// Relative debt change.
    #[serde(default)]
    pub debt_shock: f64,
    /// Additive rate change.
    #[serde(default)]
    pub rate_shock: f64,
    /// Relative equity change.
    #[serde(default)]
    pub equity_shock: f64,
}

fn unit() -> f64 {
    1.0
}

impl StressScenario {
    /// Create a scenario with an empty description.
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        volatility_multiplier: f64,
        debt_shock: f64,
        rate_shock: f64,
        equity_shock: f64,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: String::new(),
            volatility_multiplier,
            debt_shock,
            rate_shock,
            equity_shock,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// The scenario that changes nothing.
    pub fn null(key: impl Into<String>) -> Self {
        let key = key.into();
        Self::new(key.clone(), key, 1.0, 0.0, 0.0, 0.0)
    }

    /// Shocked copy of `base`.
    pub fn apply(&self, base: &MertonParams) -> MertonParams {
        MertonParams {
            equity_value: base.equity_value * (1.0 + self.equity_shock),
            equity_vol: base.equity_vol * self.volatility_multiplier,
            debt: base.debt * (1.0 + self.debt_shock),
            risk_free_rate: base.risk_free_rate + self.rate_shock,
            ..*base
        }
    }

    /// Check that the shocks keep valid inputs valid.
    pub fn validate(&self) -> Result<(), MertonError> {
        if self.key.trim().is_empty() {
            return Err(MertonError::invalid_input("scenario key must not be empty"));
        }
        let shocks = [
            self.volatility_multiplier,
            self.debt_shock,
            self.rate_shock,
            self.equity_shock,
        ];
        if shocks.iter().any(|s| !s.is_finite()) {
            return Err(MertonError::invalid_input(format!("scenario {}: shocks must be finite", self.key)));
        }
        if self.volatility_multiplier <= 0.0 {
            return Err(MertonError::invalid_input(format!(
                "scenario {}: volatility multiplier must be positive",
                self.key
            )));
        }
        if self.equity_shock <= -1.0 || self.debt_shock < -1.0 {
            return Err(MertonError::invalid_input(format!(
                "scenario {}: equity shock must exceed -100% and debt shock must be at least -100%",
                self.key
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_scenario_is_identity() {
        let base = MertonParams::new(100.0, 0.3, 50.0, 0.04, 2.0).with_drift(0.06);
        assert_eq!(StressScenario::null("NONE").apply(&base), base);
    }

    #[test]
    fn test_apply_keeps_maturity_and_drift() {
        let base = MertonParams::new(100.0, 0.3, 50.0, 0.04, 2.0).with_drift(0.06);
        let shocked = StressScenario::new("X", "X", 1.5, 0.2, 0.01, -0.5).apply(&base);
        assert_eq!(shocked.maturity, 2.0);
        assert_eq!(shocked.drift, Some(0.06));
        assert_eq!(shocked.equity_value, 50.0);
    }

    #[test]
    fn test_validate() {
        assert!(StressScenario::null("OK").validate().is_ok());
        assert!(StressScenario::new("", "n", 1.0, 0.0, 0.0, 0.0).validate().is_err());
        assert!(StressScenario::new("V", "n", 0.0, 0.0, 0.0, 0.0).validate().is_err());
        assert!(StressScenario::new("E", "n", 1.0, 0.0, 0.0, -1.0).validate().is_err());
        assert!(StressScenario::new("N", "n", f64::NAN, 0.0, 0.0, 0.0).validate().is_err());
    }
}
