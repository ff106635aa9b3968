//! Parametric bootstrap of the Merton inversion.

use chrono::NaiveDate;
use merton_core::rng::{derive_seed, entropy_seed, SeededRng};
use merton_core::types::MertonError;
use merton_models::structural::{
    dd_real_world, pd_from_dd, MertonInput, MertonParams, MertonSolver, MertonSolverConfig,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::stats::StatSummary;
use crate::parallel::parallel_map_indices;

/// Which rows of a panel to resample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowSelection {
    /// Every row.
    All,
    /// The `k` latest rows by date.
    MostRecent(usize),
}

impl Default for RowSelection {
    fn default() -> Self {
        Self::MostRecent(10)
    }
}

impl RowSelection {
    /// Select rows, returned in chronological order.
    pub fn select<'a>(&self, rows: &'a [MertonInput]) -> Vec<&'a MertonInput> {
        let mut ordered: Vec<&MertonInput> = rows.iter().collect();
        ordered.sort_by_key(|row| row.date);
        match *self {
            Self::All => ordered,
            Self::MostRecent(k) => {
                let skip = ordered.len().saturating_sub(k);
                ordered.split_off(skip)
            }
        }
    }
}

/// Bootstrap settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Draws per observation.
    pub n_iterations: usize,
    /// Two-sided percentile interval level.
    pub confidence_level: f64,
    /// Master seed; drawn from OS entropy when absent.
    pub seed: Option<u64>,
    /// Standard deviation of the log-normal debt noise.
    pub pct_noise_debt: f64,
    /// Rows resampled by [`BootstrapEngine::run_batch`].
    pub row_selection: RowSelection,
    /// Drift assumed for batch rows without one.
    pub default_drift: f64,
    /// Redraw cap for the truncated σE draw.
    pub max_redraws: usize,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            n_iterations: 2000,
            confidence_level: 0.95,
            seed: None,
            pct_noise_debt: 0.03,
            row_selection: RowSelection::default(),
            default_drift: 0.02,
            max_redraws: 1000,
        }
    }
}

impl BootstrapConfig {
    /// Seeded configuration with `n_iterations` draws.
    pub fn seeded(n_iterations: usize, seed: u64) -> Self {
        Self {
            n_iterations,
            seed: Some(seed),
            ..Default::default()
        }
    }

    /// Check the settings.
    pub fn validate(&self) -> Result<(), MertonError> {
        if self.n_iterations == 0 {
            return Err(MertonError::invalid_input("n_iterations must be greater than 0"));
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(MertonError::invalid_input(format!(
                "confidence_level must lie in (0, 1), got {}",
                self.confidence_level
            )));
        }
        if !(self.pct_noise_debt.is_finite() && self.pct_noise_debt >= 0.0) {
            return Err(MertonError::invalid_input(format!(
                "pct_noise_debt must be non-negative, got {}",
                self.pct_noise_debt
            )));
        }
        if self.row_selection == RowSelection::MostRecent(0) {
            return Err(MertonError::invalid_input("row selection must keep at least one row"));
        }
        if !self.default_drift.is_finite() {
            return Err(MertonError::invalid_input("default_drift must be finite"));
        }
        if self.max_redraws == 0 {
            return Err(MertonError::invalid_input("max_redraws must be greater than 0"));
        }
        Ok(())
    }
}

/// Bootstrap statistics for one observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapSummary {
    /// Asset value V.
    pub asset_value: Option<StatSummary>,
    /// Asset volatility σV.
    pub asset_vol: Option<StatSummary>,
    /// Real-world distance to default.
    pub distance_to_default: Option<StatSummary>,
    /// Real-world default probability.
    pub probability_of_default: Option<StatSummary>,
    /// Accepted draws / requested draws.
    pub convergence_rate: f64,
    /// Accepted draws.
    pub n_samples: usize,
    /// Requested draws.
    pub n_iterations: usize,
    /// Confidence level of the percentile bounds.
    pub confidence_level: f64,
    /// Master seed used.
    pub seed: u64,
}

impl BootstrapSummary {
    /// Summary with no accepted draws.
    pub fn empty(n_iterations: usize, confidence_level: f64, seed: u64) -> Self {
        Self {
            asset_value: None,
            asset_vol: None,
            distance_to_default: None,
            probability_of_default: None,
            convergence_rate: 0.0,
            n_samples: 0,
            n_iterations,
            confidence_level,
            seed,
        }
    }
}

/// Bootstrap result for one panel row.
///
/// A row that cannot be bootstrapped carries an empty summary and the
/// reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapRow {
    /// Entity identifier.
    pub entity_id: String,
    /// Observation date.
    pub date: NaiveDate,
    /// Bootstrap statistics.
    pub summary: BootstrapSummary,
    /// Why the row was skipped.
    pub reason: Option<String>,
}

impl BootstrapRow {
    /// Whether the row was bootstrapped.
    pub fn is_ok(&self) -> bool {
        self.reason.is_none()
    }
}

/// One accepted draw.
#[derive(Debug, Clone, Copy)]
struct Draw {
    asset_value: f64,
    asset_vol: f64,
    dd: f64,
    pd: f64,
}

/// Parametric bootstrap over equity volatility, debt and drift.
///
/// Each draw perturbs the inputs (E held fixed):
///
/// ```text
/// σE_b ~ N(σE, seσE) truncated to σE_b > 0
/// D_b  = D · exp(N(0, pct_noise_debt))
/// μ_b  ~ N(μ, seμ)
/// ```
///
/// re-solves, and keeps the real-world DD/PD of converged draws. Draw `i`
/// uses its own generator seeded from `(seed, i)`, so summaries depend only
/// on the seed.
///
/// # Examples
/// ```
/// use merton_models::structural::MertonParams;
/// use merton_risk::bootstrap::{BootstrapConfig, BootstrapEngine};
///
/// let engine = BootstrapEngine::new(BootstrapConfig::seeded(200, 42)).unwrap();
/// let params = MertonParams::new(100.0, 0.4, 60.0, 0.03, 1.0).with_drift(0.05);
/// let a = engine.run_one(&params, None, None).unwrap();
/// let b = engine.run_one(&params, None, None).unwrap();
/// assert_eq!(a, b);
/// assert!(a.convergence_rate > 0.9);
/// ```
#[derive(Debug, Clone)]
pub struct BootstrapEngine {
    config: BootstrapConfig,
    solver: MertonSolver,
}

impl BootstrapEngine {
    /// Create an engine with the default solver.
    pub fn new(config: BootstrapConfig) -> Result<Self, MertonError> {
        Self::with_solver(config, MertonSolverConfig::default())
    }

    /// Create an engine with an explicit solver configuration.
    pub fn with_solver(config: BootstrapConfig, solver: MertonSolverConfig) -> Result<Self, MertonError> {
        config.validate()?;
        solver.validate()?;
        Ok(Self {
            config,
            solver: MertonSolver::new(solver),
        })
    }

    /// Get the bootstrap configuration.
    pub fn config(&self) -> &BootstrapConfig {
        &self.config
    }

    /// Bootstrap one observation.
    ///
    /// `se_equity_vol` defaults to `0.1·σE`; `se_drift` defaults to `0.5·|μ|`
    /// (0.01 when μ = 0). A missing drift is taken as 0.
    pub fn run_one(
        &self,
        params: &MertonParams,
        se_equity_vol: Option<f64>,
        se_drift: Option<f64>,
    ) -> Result<BootstrapSummary, MertonError> {
        self.run_seeded(params, se_equity_vol, se_drift, self.master_seed())
    }

    fn master_seed(&self) -> u64 {
        self.config.seed.unwrap_or_else(entropy_seed)
    }

    fn run_seeded(
        &self,
        params: &MertonParams,
        se_equity_vol: Option<f64>,
        se_drift: Option<f64>,
        seed: u64,
    ) -> Result<BootstrapSummary, MertonError> {
        params.validate()?;
        let drift = params.drift.unwrap_or(0.0);
        let se_vol = non_negative("se_equity_vol", se_equity_vol.unwrap_or(0.1 * params.equity_vol))?;
        let se_mu = non_negative(
            "se_drift",
            se_drift.unwrap_or(if drift == 0.0 { 0.01 } else { 0.5 * drift.abs() }),
        )?;

        let n = self.config.n_iterations;
        let draws: Vec<Option<Draw>> = parallel_map_indices(n, |i| {
            let mut rng = SeededRng::for_stream(seed, i as u64);
            self.draw(params, drift, se_vol, se_mu, &mut rng)
        });
        let accepted: Vec<Draw> = draws.into_iter().flatten().collect();

        let confidence = self.config.confidence_level;
        let column = |f: fn(&Draw) -> f64| {
            let values: Vec<f64> = accepted.iter().map(f).collect();
            StatSummary::from_samples(&values, confidence)
        };

        let summary = BootstrapSummary {
            asset_value: column(|d| d.asset_value),
            asset_vol: column(|d| d.asset_vol),
            distance_to_default: column(|d| d.dd),
            probability_of_default: column(|d| d.pd),
            convergence_rate: accepted.len() as f64 / n as f64,
            n_samples: accepted.len(),
            n_iterations: n,
            confidence_level: confidence,
            seed,
        };
        debug!(
            n_iterations = n,
            n_samples = summary.n_samples,
            convergence_rate = summary.convergence_rate,
            "bootstrap complete"
        );
        Ok(summary)
    }

    fn draw(
        &self,
        params: &MertonParams,
        drift: f64,
        se_vol: f64,
        se_mu: f64,
        rng: &mut SeededRng,
    ) -> Option<Draw> {
        let equity_vol = rng.gen_positive_gaussian(params.equity_vol, se_vol, self.config.max_redraws)?;
        let debt = params.debt * rng.gen_gaussian(0.0, self.config.pct_noise_debt).exp();
        let mu = rng.gen_gaussian(drift, se_mu);

        let perturbed = MertonParams {
            equity_vol,
            debt,
            drift: Some(mu),
            ..*params
        };
        let outcome = self.solver.solve(&perturbed);
        let solution = outcome.solution()?;
        let dd = dd_real_world(solution.asset_value, debt, solution.asset_vol, mu, params.maturity)?;
        Some(Draw {
            asset_value: solution.asset_value,
            asset_vol: solution.asset_vol,
            dd,
            pd: pd_from_dd(dd),
        })
    }

    /// Bootstrap the rows chosen by the configured [`RowSelection`].
    ///
    /// Rows without a drift use `default_drift`. Row `j` of the selection
    /// is seeded from `(seed, j)`. An invalid row yields an empty summary
    /// with a reason; the other rows are unaffected.
    pub fn run_batch(&self, rows: &[MertonInput]) -> Vec<BootstrapRow> {
        let selected = self.config.row_selection.select(rows);
        let master = self.master_seed();
        info!(
            rows = rows.len(),
            selected = selected.len(),
            n_iterations = self.config.n_iterations,
            "running bootstrap batch"
        );

        selected
            .into_iter()
            .enumerate()
            .map(|(j, row)| {
                let seed = derive_seed(master, j as u64);
                let params = row.params.with_default_drift(self.config.default_drift);
                let (summary, reason) = match self.run_seeded(&params, None, None, seed) {
                    Ok(summary) => (summary, None),
                    Err(e) => {
                        warn!(entity = %row.entity_id, date = %row.date, error = %e, "bootstrap row skipped");
                        (
                            BootstrapSummary::empty(self.config.n_iterations, self.config.confidence_level, seed),
                            Some(e.to_string()),
                        )
                    }
                };
                BootstrapRow {
                    entity_id: row.entity_id.clone(),
                    date: row.date,
                    summary,
                    reason,
                }
            })
            .collect()
    }

    /// Copy of this engine with a different master seed.
    pub fn reseeded(&self, seed: u64) -> Self {
        Self {
            config: BootstrapConfig {
                seed: Some(seed),
                ..self.config
            },
            solver: self.solver.clone(),
        }
    }
}

fn non_negative(name: &str, value: f64) -> Result<f64, MertonError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(MertonError::invalid_input(format!(
            "{name} must be non-negative and finite, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> MertonParams {
        MertonParams::new(100.0, 0.4, 60.0, 0.03, 1.0).with_drift(0.05)
    }

    fn engine(n: usize, seed: u64) -> BootstrapEngine {
        BootstrapEngine::new(BootstrapConfig::seeded(n, seed)).unwrap()
    }

    fn panel(n: usize) -> Vec<MertonInput> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| {
                MertonInput::new(
                    "ACME",
                    start + chrono::Days::new(i as u64),
                    MertonParams::new(100.0 + i as f64, 0.35, 50.0, 0.03, 1.0),
                )
            })
            .rev()
            .collect()
    }

    // ========================================
    // Configuration
    // ========================================

    #[test]
    fn test_config_defaults() {
        let config = BootstrapConfig::default();
        assert_eq!(config.n_iterations, 2000);
        assert_eq!(config.confidence_level, 0.95);
        assert_eq!(config.pct_noise_debt, 0.03);
        assert_eq!(config.row_selection, RowSelection::MostRecent(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let bad = BootstrapConfig {
            confidence_level: 1.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let bad = BootstrapConfig {
            row_selection: RowSelection::MostRecent(0),
            ..Default::default()
        };
        assert!(BootstrapEngine::new(bad).is_err());
    }

    // ========================================
    // Single observation
    // ========================================

    #[test]
    fn test_same_seed_same_summary() {
        let a = engine(300, 7).run_one(&params(), None, None).unwrap();
        let b = engine(300, 7).run_one(&params(), None, None).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.seed, 7);

        let c = engine(300, 8).run_one(&params(), None, None).unwrap();
        assert_ne!(a.distance_to_default, c.distance_to_default);
    }

    #[test]
    fn test_summary_shape() {
        let s = engine(500, 1).run_one(&params(), None, None).unwrap();
        assert_eq!(s.n_iterations, 500);
        assert!(s.n_samples <= 500);
        assert!((s.convergence_rate - s.n_samples as f64 / 500.0).abs() < 1e-15);

        let dd = s.distance_to_default.unwrap();
        assert!(dd.lower <= dd.median && dd.median <= dd.upper);
        let pd = s.probability_of_default.unwrap();
        assert!(pd.lower >= 0.0 && pd.upper <= 1.0);
    }

    #[test]
    fn test_zero_noise_collapses_interval() {
        let config = BootstrapConfig {
            pct_noise_debt: 0.0,
            ..BootstrapConfig::seeded(50, 3)
        };
        let s = BootstrapEngine::new(config)
            .unwrap()
            .run_one(&params(), Some(0.0), Some(0.0))
            .unwrap();
        let v = s.asset_value.unwrap();
        assert!(v.width() < 1e-6 * v.median);
        assert!(v.std < 1e-6 * v.median);
    }

    #[test]
    fn test_invalid_inputs() {
        let e = engine(10, 1);
        assert!(e
            .run_one(&MertonParams::new(-1.0, 0.4, 60.0, 0.03, 1.0), None, None)
            .unwrap_err()
            .is_invalid_input());
        assert!(e.run_one(&params(), Some(-0.1), None).is_err());
    }

    // ========================================
    // Batch
    // ========================================

    #[test]
    fn test_row_selection() {
        let rows = panel(15);
        let recent = RowSelection::MostRecent(10).select(&rows);
        assert_eq!(recent.len(), 10);
        assert!(recent.windows(2).all(|w| w[0].date < w[1].date));
        assert_eq!(recent[9].date, rows[0].date);
        assert_eq!(RowSelection::All.select(&rows).len(), 15);
        assert_eq!(RowSelection::MostRecent(50).select(&rows).len(), 15);
    }

    #[test]
    fn test_run_batch_default_selection() {
        let out = engine(100, 11).run_batch(&panel(12));
        assert_eq!(out.len(), 10);
        assert!(out.iter().all(|r| r.entity_id == "ACME" && r.is_ok()));
        assert!(out.iter().all(|r| r.summary.n_iterations == 100));

        let again = engine(100, 11).run_batch(&panel(12));
        assert_eq!(out, again);
    }

    #[test]
    fn test_run_batch_keeps_valid_rows() {
        let mut rows = panel(3);
        rows[1].params.equity_value = -1.0;
        let out = BootstrapEngine::new(BootstrapConfig {
            row_selection: RowSelection::All,
            ..BootstrapConfig::seeded(50, 1)
        })
        .unwrap()
        .run_batch(&rows);

        assert_eq!(out.len(), 3);
        let bad: Vec<&BootstrapRow> = out.iter().filter(|r| !r.is_ok()).collect();
        assert_eq!(bad.len(), 1);
        assert_eq!(bad[0].date, rows[1].date);
        assert_eq!(bad[0].summary.n_samples, 0);
        assert_eq!(bad[0].summary.convergence_rate, 0.0);
        assert!(bad[0].summary.distance_to_default.is_none());
        assert!(bad[0].reason.as_deref().unwrap().contains("equity"));

        assert!(out
            .iter()
            .filter(|r| r.is_ok())
            .all(|r| r.summary.n_samples > 0 && r.summary.distance_to_default.is_some()));
    }

    #[test]
    fn test_reseeded_engine() {
        let base = engine(50, 1);
        let other = base.reseeded(2);
        assert_eq!(other.config().seed, Some(2));
        assert_eq!(other.config().n_iterations, 50);
        assert_ne!(
            base.run_one(&params(), None, None).unwrap().distance_to_default,
            other.run_one(&params(), None, None).unwrap().distance_to_default
        );
    }
}
