//! Stress scenario execution.

use merton_core::types::MertonError;
use merton_models::structural::{
    dd_risk_neutral, pd_from_dd, MertonParams, MertonSolver, MertonSolverConfig, SolverOutcome,
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::presets::preset_scenarios;
use super::shocks::StressScenario;

/// Risk-neutral result of one leg (base or stressed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LegOutcome {
    /// Solver converged.
    Converged {
        /// Asset value V.
        asset_value: f64,
        /// Asset volatility σV.
        asset_vol: f64,
        /// Distance to default.
        distance_to_default: f64,
        /// Default probability.
        probability_of_default: f64,
    },
    /// No usable solution for this leg.
    Failed {
        /// Diagnostic.
        reason: String,
    },
}

impl LegOutcome {
    /// Distance to default, if converged.
    pub fn distance_to_default(&self) -> Option<f64> {
        match self {
            Self::Converged {
                distance_to_default, ..
            } => Some(*distance_to_default),
            Self::Failed { .. } => None,
        }
    }

    /// Default probability, if converged.
    pub fn probability_of_default(&self) -> Option<f64> {
        match self {
            Self::Converged {
                probability_of_default,
                ..
            } => Some(*probability_of_default),
            Self::Failed { .. } => None,
        }
    }

    /// Whether the leg converged.
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged { .. })
    }
}

/// Base versus stressed comparison for one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressResult {
    /// Scenario applied.
    pub scenario: StressScenario,
    /// Unshocked leg.
    pub base: LegOutcome,
    /// Shocked leg.
    pub stressed: LegOutcome,
    /// Stressed DD − base DD.
    pub dd_change: Option<f64>,
    /// Stressed PD − base PD.
    pub pd_change: Option<f64>,
    /// PD change as a percentage of base PD (undefined when base PD is 0).
    pub pd_change_pct: Option<f64>,
}

impl StressResult {
    fn new(scenario: StressScenario, base: LegOutcome, stressed: LegOutcome) -> Self {
        let dd_change = base
            .distance_to_default()
            .zip(stressed.distance_to_default())
            .map(|(b, s)| s - b);
        let base_pd = base.probability_of_default();
        let pd_change = base_pd
            .zip(stressed.probability_of_default())
            .map(|(b, s)| s - b);
        let pd_change_pct = base_pd
            .zip(pd_change)
            .filter(|(b, _)| *b > 0.0)
            .map(|(b, change)| change / b * 100.0);
        Self {
            scenario,
            base,
            stressed,
            dd_change,
            pd_change,
            pd_change_pct,
        }
    }
}

/// Registry of scenarios evaluated against base inputs.
///
/// # Examples
/// ```
/// use merton_models::structural::MertonParams;
/// use merton_risk::scenarios::StressEngine;
///
/// let engine = StressEngine::with_presets();
/// let base = MertonParams::new(100.0, 0.3, 50.0, 0.04, 1.0);
/// let results = engine.test_all(&base, None);
/// assert_eq!(results.len(), 5);
///
/// let gfc = &results[0];
/// assert_eq!(gfc.scenario.key, "GFC_2008");
/// assert!(gfc.pd_change.unwrap() > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct StressEngine {
    solver: MertonSolver,
    scenarios: Vec<StressScenario>,
}

impl Default for StressEngine {
    fn default() -> Self {
        Self::with_presets()
    }
}

impl StressEngine {
    /// Engine with no scenarios.
    pub fn new(solver: MertonSolverConfig) -> Result<Self, MertonError> {
        solver.validate()?;
        Ok(Self {
            solver: MertonSolver::new(solver),
            scenarios: Vec::new(),
        })
    }

    /// Engine with the preset library and the default solver.
    pub fn with_presets() -> Self {
        Self {
            solver: MertonSolver::with_defaults(),
            scenarios: preset_scenarios(),
        }
    }

    /// Register a scenario, replacing any with the same key.
    pub fn register(&mut self, scenario: StressScenario) -> Result<(), MertonError> {
        scenario.validate()?;
        match self.scenarios.iter_mut().find(|s| s.key == scenario.key) {
            Some(existing) => *existing = scenario,
            None => self.scenarios.push(scenario),
        }
        Ok(())
    }

    /// Registered scenarios in registration order.
    pub fn scenarios(&self) -> &[StressScenario] {
        &self.scenarios
    }

    /// Look up a scenario by key (case-insensitive).
    pub fn get(&self, key: &str) -> Option<&StressScenario> {
        self.scenarios.iter().find(|s| s.key.eq_ignore_ascii_case(key))
    }

    fn leg(&self, params: &MertonParams) -> LegOutcome {
        match self.solver.solve(params) {
            SolverOutcome::Converged(s) => {
                match dd_risk_neutral(
                    s.asset_value,
                    params.debt,
                    s.asset_vol,
                    params.risk_free_rate,
                    params.maturity,
                ) {
                    Some(dd) => LegOutcome::Converged {
                        asset_value: s.asset_value,
                        asset_vol: s.asset_vol,
                        distance_to_default: dd,
                        probability_of_default: pd_from_dd(dd),
                    },
                    None => LegOutcome::Failed {
                        reason: "distance to default undefined".to_string(),
                    },
                }
            }
            SolverOutcome::Failed(failure) => LegOutcome::Failed {
                reason: failure.reason,
            },
        }
    }

    /// Evaluate one scenario against `base`.
    pub fn test_scenario(&self, scenario: &StressScenario, base: &MertonParams) -> StressResult {
        let base_leg = self.leg(base);
        let stressed_leg = self.leg(&scenario.apply(base));
        debug!(
            scenario = %scenario.key,
            base_converged = base_leg.is_converged(),
            stressed_converged = stressed_leg.is_converged(),
            "stress scenario evaluated"
        );
        StressResult::new(scenario.clone(), base_leg, stressed_leg)
    }

    /// Evaluate the named scenarios, or every registered one.
    ///
    /// Unknown names are logged and skipped. Results follow the order of
    /// `names` (or registration order).
    pub fn test_all(&self, base: &MertonParams, names: Option<&[String]>) -> Vec<StressResult> {
        let selected: Vec<&StressScenario> = match names {
            None => self.scenarios.iter().collect(),
            Some(names) => names
                .iter()
                .filter_map(|name| {
                    let found = self.get(name);
                    if found.is_none() {
                        warn!(scenario = %name, "unknown stress scenario, skipping");
                    }
                    found
                })
                .collect(),
        };
        selected
            .par_iter()
            .map(|scenario| self.test_scenario(scenario, base))
            .collect()
    }

    /// The result with the largest PD increase.
    pub fn worst_case(results: &[StressResult]) -> Option<&StressResult> {
        results
            .iter()
            .filter(|r| r.pd_change.is_some())
            .max_by(|a, b| {
                let (a, b) = (a.pd_change.unwrap_or(f64::MIN), b.pd_change.unwrap_or(f64::MIN));
                a.total_cmp(&b)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn base() -> MertonParams {
        MertonParams::new(100.0, 0.3, 50.0, 0.04, 1.0)
    }

    #[test]
    fn test_null_scenario_has_zero_deltas() {
        let engine = StressEngine::with_presets();
        let result = engine.test_scenario(&StressScenario::null("NONE"), &base());
        assert_eq!(result.base, result.stressed);
        assert_eq!(result.dd_change, Some(0.0));
        assert_eq!(result.pd_change, Some(0.0));
    }

    #[test]
    fn test_severe_scenarios_raise_pd() {
        let results = StressEngine::with_presets().test_all(&base(), None);
        let keys: Vec<&str> = results.iter().map(|r| r.scenario.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["GFC_2008", "COVID_2020", "RATES_2022", "MILD_RECESSION", "SEVERE_RECESSION"]
        );
        for r in &results {
            assert!(r.dd_change.unwrap() < 0.0, "{}", r.scenario.key);
            assert!(r.pd_change.unwrap() > 0.0, "{}", r.scenario.key);
        }
    }

    #[test]
    fn test_pd_change_pct() {
        let result = StressEngine::with_presets().test_scenario(
            &StressScenario::new("V", "vol", 1.5, 0.0, 0.0, 0.0),
            &base(),
        );
        let b = result.base.probability_of_default().unwrap();
        let s = result.stressed.probability_of_default().unwrap();
        assert_relative_eq!(result.pd_change_pct.unwrap(), (s - b) / b * 100.0);
    }

    #[test]
    fn test_failed_leg_is_isolated() {
        // Equity wiped out: shocked leg fails, base leg does not
        let scenario = StressScenario {
            equity_shock: -1.0,
            ..StressScenario::null("WIPEOUT")
        };
        let result = StressEngine::with_presets().test_scenario(&scenario, &base());
        assert!(result.base.is_converged());
        assert!(!result.stressed.is_converged());
        assert_eq!(result.dd_change, None);
        assert_eq!(result.pd_change_pct, None);
    }

    #[test]
    fn test_named_subset_skips_unknown() {
        let names = vec![
            "SEVERE_RECESSION".to_string(),
            "DOTCOM_2000".to_string(),
            "gfc_2008".to_string(),
        ];
        let results = StressEngine::with_presets().test_all(&base(), Some(&names));
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].scenario.key, "SEVERE_RECESSION");
        assert_eq!(results[1].scenario.key, "GFC_2008");
    }

    #[test]
    fn test_register_and_worst_case() {
        let mut engine = StressEngine::new(MertonSolverConfig::default()).unwrap();
        engine
            .register(StressScenario::new("SMALL", "small", 1.1, 0.0, 0.0, 0.0))
            .unwrap();
        engine
            .register(StressScenario::new("BIG", "big", 3.0, 0.3, 0.0, -0.5))
            .unwrap();
        assert!(engine
            .register(StressScenario::new("BAD", "bad", -1.0, 0.0, 0.0, 0.0))
            .is_err());
        assert_eq!(engine.scenarios().len(), 2);

        let results = engine.test_all(&base(), None);
        let worst = StressEngine::worst_case(&results).unwrap();
        assert_eq!(worst.scenario.key, "BIG");
        assert!(StressEngine::worst_case(&[]).is_none());
    }

    #[test]
    fn test_register_replaces_same_key() {
        let mut engine = StressEngine::with_presets();
        engine
            .register(StressScenario::new("GFC_2008", "custom", 3.0, 0.0, 0.0, 0.0))
            .unwrap();
        assert_eq!(engine.scenarios().len(), 5);
        assert_eq!(engine.get("GFC_2008").unwrap().name, "custom");
    }
}
