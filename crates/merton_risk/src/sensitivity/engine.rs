//! One-at-a-time parameter sweeps.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use merton_core::types::MertonError;
use merton_models::structural::{
    risk_metric, Measure, MertonParams, MertonSolver, MertonSolverConfig, SolverOutcome,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::grid::{default_debt_changes, Grid};
use crate::parallel::ParallelConfig;

/// A swept model input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityParam {
    /// Equity value E.
    Equity,
    /// Equity volatility σE.
    EquityVolatility,
    /// Default point D.
    Debt,
    /// Risk-free rate r.
    Rate,
    /// Horizon T.
    Maturity,
    /// Real-world drift μ.
    Drift,
}

impl SensitivityParam {
    /// Copy of `base` with this parameter set to `value`.
    pub fn apply(&self, base: &MertonParams, value: f64) -> MertonParams {
        let mut params = *base;
        match self {
            Self::Equity => params.equity_value = value,
            Self::EquityVolatility => params.equity_vol = value,
            Self::Debt => params.debt = value,
            Self::Rate => params.risk_free_rate = value,
            Self::Maturity => params.maturity = value,
            Self::Drift => params.drift = Some(value),
        }
        params
    }
}

impl fmt::Display for SensitivityParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Equity => "equity",
            Self::EquityVolatility => "equity_volatility",
            Self::Debt => "debt",
            Self::Rate => "rate",
            Self::Maturity => "maturity",
            Self::Drift => "drift",
        };
        write!(f, "{name}")
    }
}

impl FromStr for SensitivityParam {
    type Err = MertonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "equity" | "e" => Ok(Self::Equity),
            "equity_volatility" | "equity_vol" | "sigma_e" | "volatility" => Ok(Self::EquityVolatility),
            "debt" | "d" => Ok(Self::Debt),
            "rate" | "r" => Ok(Self::Rate),
            "maturity" | "t" => Ok(Self::Maturity),
            "drift" | "mu" => Ok(Self::Drift),
            other => Err(MertonError::invalid_input(format!("unknown sensitivity parameter '{other}'"))),
        }
    }
}

/// Outcome at one grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PointOutcome {
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
        /// D / V.
        leverage: f64,
    },
    /// No usable solution at this point.
    Failed {
        /// Diagnostic.
        reason: String,
    },
}

impl PointOutcome {
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

    /// Distance to default, if converged.
    pub fn distance_to_default(&self) -> Option<f64> {
        match self {
            Self::Converged {
                distance_to_default, ..
            } => Some(*distance_to_default),
            Self::Failed { .. } => None,
        }
    }

    /// Whether the point converged.
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged { .. })
    }
}

/// One point of a sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityPoint {
    /// Parameter value.
    pub value: f64,
    /// Percentage change from the base value, for relative sweeps.
    pub change_pct: Option<f64>,
    /// Result at this value.
    pub outcome: PointOutcome,
}

/// Ordered results of one sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityCurve {
    /// Swept parameter.
    pub parameter: SensitivityParam,
    /// Measure of the DD/PD values.
    pub measure: Measure,
    /// Points in grid order.
    pub points: Vec<SensitivityPoint>,
}

impl SensitivityCurve {
    /// Parameter values in grid order.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Default probabilities in grid order.
    pub fn probabilities(&self) -> Vec<Option<f64>> {
        self.points.iter().map(|p| p.outcome.probability_of_default()).collect()
    }

    /// Number of converged points.
    pub fn converged_count(&self) -> usize {
        self.points.iter().filter(|p| p.outcome.is_converged()).count()
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the curve has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Grids for the named sweeps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensitivityConfig {
    /// Equity volatility grid.
    pub volatility: Grid,
    /// Relative debt changes (0.1 = +10%).
    pub debt_changes: Vec<f64>,
    /// Risk-free rate grid.
    pub rate: Grid,
    /// Point-level parallelism.
    pub parallel: ParallelConfig,
}

impl Default for SensitivityConfig {
    fn default() -> Self {
        Self {
            volatility: Grid::new(0.1, 1.0, 20),
            debt_changes: default_debt_changes(),
            rate: Grid::new(0.01, 0.10, 20),
            parallel: ParallelConfig::default(),
        }
    }
}

impl SensitivityConfig {
    /// Check the grids.
    pub fn validate(&self) -> Result<(), MertonError> {
        self.volatility.validate("volatility").map_err(MertonError::invalid_input)?;
        self.rate.validate("rate").map_err(MertonError::invalid_input)?;
        if self.debt_changes.is_empty() {
            return Err(MertonError::invalid_input("debt_changes must not be empty"));
        }
        if let Some(bad) = self.debt_changes.iter().find(|c| !(c.is_finite() && **c > -1.0)) {
            return Err(MertonError::invalid_input(format!(
                "debt change {bad} must be finite and greater than -100%"
            )));
        }
        Ok(())
    }
}

/// Sweeps one input at a time and records DD/PD along the grid.
///
/// # Examples
/// ```
/// use merton_models::structural::{Measure, MertonParams};
/// use merton_risk::sensitivity::SensitivityEngine;
///
/// let engine = SensitivityEngine::with_defaults();
/// let base = MertonParams::new(100.0, 0.4, 60.0, 0.03, 1.0);
/// let curve = engine.volatility_sweep(&base, Measure::RiskNeutral).unwrap();
/// assert_eq!(curve.len(), 20);
/// ```
#[derive(Debug, Clone)]
pub struct SensitivityEngine {
    solver: MertonSolver,
    config: SensitivityConfig,
}

impl Default for SensitivityEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl SensitivityEngine {
    /// Create an engine.
    pub fn new(config: SensitivityConfig, solver: MertonSolverConfig) -> Result<Self, MertonError> {
        config.validate()?;
        solver.validate()?;
        Ok(Self {
            solver: MertonSolver::new(solver),
            config,
        })
    }

    /// Engine with default grids and solver.
    pub fn with_defaults() -> Self {
        Self {
            solver: MertonSolver::with_defaults(),
            config: SensitivityConfig::default(),
        }
    }

    /// Get the sweep configuration.
    pub fn config(&self) -> &SensitivityConfig {
        &self.config
    }

    /// Sweep `param` over `values` around `base`.
    ///
    /// # Errors
    /// [`MertonError::MissingDrift`] for the real-world measure when `base`
    /// has no drift (unless the drift itself is swept).
    pub fn sweep(
        &self,
        param: SensitivityParam,
        values: &[f64],
        base: &MertonParams,
        measure: Measure,
    ) -> Result<SensitivityCurve, MertonError> {
        self.sweep_with_changes(param, values, None, base, measure)
    }

    fn sweep_with_changes(
        &self,
        param: SensitivityParam,
        values: &[f64],
        changes: Option<&[f64]>,
        base: &MertonParams,
        measure: Measure,
    ) -> Result<SensitivityCurve, MertonError> {
        if measure == Measure::RealWorld && base.drift.is_none() && param != SensitivityParam::Drift {
            return Err(MertonError::missing_drift(format!("{param} sensitivity")));
        }

        let outcomes = self
            .config
            .parallel
            .map(values, |&value| self.evaluate(&param.apply(base, value), measure));
        let points = values
            .iter()
            .zip(outcomes)
            .enumerate()
            .map(|(i, (&value, outcome))| SensitivityPoint {
                value,
                change_pct: changes.and_then(|c| c.get(i)).map(|c| c * 100.0),
                outcome,
            })
            .collect();

        let curve = SensitivityCurve {
            parameter: param,
            measure,
            points,
        };
        debug!(
            parameter = %param,
            points = curve.len(),
            converged = curve.converged_count(),
            "sensitivity sweep complete"
        );
        Ok(curve)
    }

    fn evaluate(&self, params: &MertonParams, measure: Measure) -> PointOutcome {
        let outcome = self.solver.solve(params);
        let solution = match &outcome {
            SolverOutcome::Converged(solution) => solution,
            SolverOutcome::Failed(failure) => {
                return PointOutcome::Failed {
                    reason: failure.reason.clone(),
                }
            }
        };
        let metric = match risk_metric(solution, params, measure) {
            Ok(metric) => metric,
            Err(err) => return PointOutcome::Failed { reason: err.to_string() },
        };
        match (metric.distance_to_default, metric.probability_of_default) {
            (Some(dd), Some(pd)) => PointOutcome::Converged {
                asset_value: solution.asset_value,
                asset_vol: solution.asset_vol,
                distance_to_default: dd,
                probability_of_default: pd,
                leverage: solution.leverage(params.debt),
            },
            _ => PointOutcome::Failed {
                reason: "distance to default undefined".to_string(),
            },
        }
    }

    /// Equity volatility sweep over the configured grid.
    pub fn volatility_sweep(&self, base: &MertonParams, measure: Measure) -> Result<SensitivityCurve, MertonError> {
        self.sweep(
            SensitivityParam::EquityVolatility,
            &self.config.volatility.values(),
            base,
            measure,
        )
    }

    /// Debt sweep over the configured relative changes.
    pub fn debt_sweep(&self, base: &MertonParams, measure: Measure) -> Result<SensitivityCurve, MertonError> {
        let changes = &self.config.debt_changes;
        let values: Vec<f64> = changes.iter().map(|c| base.debt * (1.0 + c)).collect();
        self.sweep_with_changes(SensitivityParam::Debt, &values, Some(changes), base, measure)
    }

    /// Risk-free rate sweep over the configured grid.
    pub fn rate_sweep(&self, base: &MertonParams, measure: Measure) -> Result<SensitivityCurve, MertonError> {
        self.sweep(SensitivityParam::Rate, &self.config.rate.values(), base, measure)
    }

    /// All named sweeps keyed `"volatility"`, `"debt"` and `"rate"`.
    pub fn comprehensive(
        &self,
        base: &MertonParams,
        measure: Measure,
    ) -> Result<BTreeMap<String, SensitivityCurve>, MertonError> {
        let mut curves = BTreeMap::new();
        curves.insert("volatility".to_string(), self.volatility_sweep(base, measure)?);
        curves.insert("debt".to_string(), self.debt_sweep(base, measure)?);
        curves.insert("rate".to_string(), self.rate_sweep(base, measure)?);
        Ok(curves)
    }
}
