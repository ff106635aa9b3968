//! Equity-to-asset inversion of the Merton model.
//!
//! Given observed equity value E and equity volatility σE, the solver finds
//! the unobservable asset value V and asset volatility σV satisfying
//!
//! ```text
//! E  = V·N(d1) − D·e^{−rT}·N(d2)
//! σE = (V/E)·N(d1)·σV
//!
//! d1 = [ln(V/D) + (r + ½σV²)T] / (σV√T),   d2 = d1 − σV√T
//! ```
//!
//! The system is handed to the Powell hybrid root finder in scaled form
//! (unknowns V/(E+D) and σV, residuals divided by E and σE). Failures of any
//! kind are reported in the returned [`SolverOutcome`]; `solve` never errors
//! and never panics on numeric input.

use std::fmt;

use merton_core::math::distributions::norm_cdf;
use merton_core::math::solvers::{HybridConfig, HybridSolver};
use merton_core::types::MertonError;

use super::input::MertonParams;

/// Residual returned for any point outside the admissible region
/// (V ≤ 0, σV ≤ 0 or V ≤ D).
pub const GUARD_RESIDUAL: f64 = 1e9;

/// Label recorded on output rows for this solver.
pub const SOLVER_METHOD: &str = "powell_hybrid";

/// Policy for the starting asset volatility.
///
/// The starting asset value is always `V0 = E + D`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum InitialGuess {
    /// `σV0 = σE·E/V0` (equity volatility de-levered).
    #[default]
    Scaled,
    /// `σV0 = 0.5·σE`.
    Half,
    /// `σV0 = 0.2`.
    Fixed,
}

impl InitialGuess {
    /// Starting point `(V0, σV0)` before clamping.
    fn raw(&self, params: &MertonParams) -> (f64, f64) {
        let v0 = params.equity_value + params.debt;
        let sigma0 = match self {
            Self::Scaled => params.equity_vol * params.equity_value / v0,
            Self::Half => 0.5 * params.equity_vol,
            Self::Fixed => 0.2,
        };
        (v0, sigma0)
    }
}

impl std::str::FromStr for InitialGuess {
    type Err = MertonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scaled" => Ok(Self::Scaled),
            "half" => Ok(Self::Half),
            "fixed" => Ok(Self::Fixed),
            other => Err(MertonError::invalid_input(format!(
                "unknown initial guess method '{other}' (expected scaled, half or fixed)"
            ))),
        }
    }
}

/// Configuration for [`MertonSolver`].
///
/// # Example
/// ```
/// use merton_models::structural::{InitialGuess, MertonSolverConfig};
///
/// let config = MertonSolverConfig::default();
/// assert_eq!(config.max_evaluations, 2000);
/// assert_eq!(config.tolerance, 1e-12);
/// assert_eq!(config.initial_guess, InitialGuess::Scaled);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MertonSolverConfig {
    /// Residual evaluation budget of the root finder.
    #[cfg_attr(feature = "serde", serde(alias = "max_iterations"))]
    pub max_evaluations: usize,
    /// Relative step tolerance of the root finder.
    pub tolerance: f64,
    /// Smallest admissible asset volatility.
    pub min_sigma: f64,
    /// Largest admissible asset volatility.
    pub max_sigma: f64,
    /// Starting volatility policy.
    #[cfg_attr(feature = "serde", serde(alias = "initial_guess_method"))]
    pub initial_guess: InitialGuess,
}

impl Default for MertonSolverConfig {
    fn default() -> Self {
        Self {
            max_evaluations: 2000,
            tolerance: 1e-12,
            min_sigma: 1e-4,
            max_sigma: 3.0,
            initial_guess: InitialGuess::Scaled,
        }
    }
}

impl MertonSolverConfig {
    /// Check bounds and tolerances.
    pub fn validate(&self) -> Result<(), MertonError> {
        if self.max_evaluations == 0 {
            return Err(MertonError::invalid_input("max_evaluations must be greater than 0"));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(MertonError::invalid_input(format!(
                "tolerance must be positive, got {}",
                self.tolerance
            )));
        }
        if !(self.min_sigma > 0.0 && self.min_sigma < self.max_sigma && self.max_sigma.is_finite()) {
            return Err(MertonError::invalid_input(format!(
                "sigma bounds must satisfy 0 < min_sigma < max_sigma, got [{}, {}]",
                self.min_sigma, self.max_sigma
            )));
        }
        Ok(())
    }

    fn hybrid_config(&self) -> HybridConfig {
        HybridConfig {
            xtol: self.tolerance,
            max_evaluations: self.max_evaluations,
            ..HybridConfig::default()
        }
    }
}

/// A converged inversion.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssetSolution {
    /// Asset value V.
    pub asset_value: f64,
    /// Asset volatility σV.
    pub asset_vol: f64,
    /// d1 at the solution.
    pub d1: f64,
    /// d2 at the solution.
    pub d2: f64,
    /// Residual function evaluations spent.
    pub evaluations: usize,
}

impl AssetSolution {
    /// Leverage D / V.
    pub fn leverage(&self, debt: f64) -> f64 {
        debt / self.asset_value
    }
}

/// Category of a failed inversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FailureKind {
    /// Inputs violate the model preconditions.
    InvalidInput,
    /// The root finder did not reach tolerance.
    NonConvergence,
    /// A root was found but lies outside the admissible region.
    OutOfBounds,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput => write!(f, "invalid input"),
            Self::NonConvergence => write!(f, "non-convergence"),
            Self::OutOfBounds => write!(f, "out of bounds"),
        }
    }
}

/// A failed inversion with its diagnostic.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolveFailure {
    /// Failure category.
    pub kind: FailureKind,
    /// Human-readable reason.
    pub reason: String,
    /// Residual function evaluations spent before failing.
    pub evaluations: usize,
}

impl SolveFailure {
    fn new(kind: FailureKind, reason: impl Into<String>, evaluations: usize) -> Self {
        Self {
            kind,
            reason: reason.into(),
            evaluations,
        }
    }
}

/// Result of one solve attempt.
///
/// # Examples
/// ```
/// use merton_models::structural::{FailureKind, MertonParams, MertonSolver};
///
/// let solver = MertonSolver::with_defaults();
/// let outcome = solver.solve(&MertonParams::new(-5.0, 0.3, 10.0, 0.02, 1.0));
/// assert!(!outcome.converged());
/// assert_eq!(outcome.failure().unwrap().kind, FailureKind::InvalidInput);
/// assert!(outcome.asset_value().is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverOutcome {
    /// Root found and accepted.
    Converged(AssetSolution),
    /// No acceptable root.
    Failed(SolveFailure),
}

impl SolverOutcome {
    /// Whether a root was found and accepted.
    pub fn converged(&self) -> bool {
        matches!(self, Self::Converged(_))
    }

    /// The solution, if converged.
    pub fn solution(&self) -> Option<&AssetSolution> {
        match self {
            Self::Converged(s) => Some(s),
            Self::Failed(_) => None,
        }
    }

    /// The failure, if not converged.
    pub fn failure(&self) -> Option<&SolveFailure> {
        match self {
            Self::Converged(_) => None,
            Self::Failed(f) => Some(f),
        }
    }

    /// Asset value V, if converged.
    pub fn asset_value(&self) -> Option<f64> {
        self.solution().map(|s| s.asset_value)
    }

    /// Asset volatility σV, if converged.
    pub fn asset_vol(&self) -> Option<f64> {
        self.solution().map(|s| s.asset_vol)
    }

    /// d1, if converged.
    pub fn d1(&self) -> Option<f64> {
        self.solution().map(|s| s.d1)
    }

    /// d2, if converged.
    pub fn d2(&self) -> Option<f64> {
        self.solution().map(|s| s.d2)
    }

    /// Function evaluations spent, whether or not the solve succeeded.
    pub fn iterations(&self) -> usize {
        match self {
            Self::Converged(s) => s.evaluations,
            Self::Failed(f) => f.evaluations,
        }
    }

    /// Failure reason, if not converged.
    pub fn reason(&self) -> Option<&str> {
        self.failure().map(|f| f.reason.as_str())
    }
}

/// `(d1, d2)` of the Merton model.
#[inline]
pub fn d1_d2(asset_value: f64, asset_vol: f64, debt: f64, rate: f64, maturity: f64) -> (f64, f64) {
    let vol_sqrt_t = asset_vol * maturity.sqrt();
    let d1 = ((asset_value / debt).ln() + (rate + 0.5 * asset_vol * asset_vol) * maturity) / vol_sqrt_t;
    (d1, d1 - vol_sqrt_t)
}

/// Forward model: equity value and volatility implied by `(V, σV)`.
///
/// # Examples
/// ```
/// use merton_models::structural::equity_from_assets;
///
/// let (e, sigma_e) = equity_from_assets(150.0, 0.25, 100.0, 0.05, 1.0);
/// assert!(e > 150.0 - 100.0 && e < 150.0);
/// assert!(sigma_e > 0.25);
/// ```
pub fn equity_from_assets(
    asset_value: f64,
    asset_vol: f64,
    debt: f64,
    rate: f64,
    maturity: f64,
) -> (f64, f64) {
    let (d1, d2) = d1_d2(asset_value, asset_vol, debt, rate, maturity);
    let nd1 = norm_cdf(d1);
    let equity = asset_value * nd1 - debt * (-rate * maturity).exp() * norm_cdf(d2);
    let equity_vol = asset_value / equity * nd1 * asset_vol;
    (equity, equity_vol)
}

/// Residuals of the two Merton equations at `(V, σV)`.
///
/// Returns `[GUARD_RESIDUAL; 2]` outside the admissible region.
pub fn merton_residuals(asset_value: f64, asset_vol: f64, params: &MertonParams) -> [f64; 2] {
    if asset_value <= 0.0 || asset_vol <= 0.0 || asset_value <= params.debt {
        return [GUARD_RESIDUAL; 2];
    }
    let (equity, equity_vol) = equity_from_assets(
        asset_value,
        asset_vol,
        params.debt,
        params.risk_free_rate,
        params.maturity,
    );
    [
        equity - params.equity_value,
        // σE·E = V·N(d1)·σV, written without dividing by the observed E
        equity_vol * equity / params.equity_value - params.equity_vol,
    ]
}

/// Merton equity-to-asset solver.
///
/// # Examples
/// ```
/// use merton_models::structural::{equity_from_assets, MertonParams, MertonSolver};
///
/// // Round trip from known asset parameters
/// let (e, sigma_e) = equity_from_assets(150.0, 0.25, 100.0, 0.05, 1.0);
/// let outcome = MertonSolver::with_defaults().solve(&MertonParams::new(e, sigma_e, 100.0, 0.05, 1.0));
///
/// let v = outcome.asset_value().unwrap();
/// assert!((v - 150.0).abs() / 150.0 < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct MertonSolver {
    config: MertonSolverConfig,
    hybrid: HybridSolver,
}

impl Default for MertonSolver {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl MertonSolver {
    /// Create a solver with the given configuration.
    pub fn new(config: MertonSolverConfig) -> Self {
        Self {
            hybrid: HybridSolver::new(config.hybrid_config()),
            config,
        }
    }

    /// Create a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(MertonSolverConfig::default())
    }

    /// Get the solver configuration.
    pub fn config(&self) -> &MertonSolverConfig {
        &self.config
    }

    /// Starting point `(V0, σV0)` under the configured policy, σV0 clamped to
    /// `[min_sigma, max_sigma]`.
    pub fn initial_guess(&self, params: &MertonParams) -> (f64, f64) {
        let (v0, sigma0) = self.config.initial_guess.raw(params);
        (v0, sigma0.clamp(self.config.min_sigma, self.config.max_sigma))
    }

    /// Solve for `(V, σV)` from the configured starting point.
    pub fn solve(&self, params: &MertonParams) -> SolverOutcome {
        self.solve_with_guess(params, None)
    }

    /// Solve for `(V, σV)`, optionally from a caller-supplied starting point.
    pub fn solve_with_guess(&self, params: &MertonParams, guess: Option<(f64, f64)>) -> SolverOutcome {
        if let Err(err) = params.validate() {
            return SolverOutcome::Failed(SolveFailure::new(FailureKind::InvalidInput, err.to_string(), 0));
        }
        if params.debt == 0.0 {
            return SolverOutcome::Failed(SolveFailure::new(
                FailureKind::OutOfBounds,
                "zero default point leaves distance to default unbounded",
                0,
            ));
        }

        let (v0, sigma0) = guess.unwrap_or_else(|| self.initial_guess(params));
        let scale = params.equity_value + params.debt;
        let equity = params.equity_value;
        let equity_vol = params.equity_vol;

        let residuals = |x: &[f64]| {
            let r = merton_residuals(x[0] * scale, x[1], params);
            if r[0] == GUARD_RESIDUAL && r[1] == GUARD_RESIDUAL {
                return r.to_vec();
            }
            vec![r[0] / equity, r[1] / equity_vol]
        };

        let result = match self.hybrid.solve(residuals, vec![v0 / scale, sigma0]) {
            Ok(result) => result,
            Err(err) => {
                let err: MertonError = err.into();
                return SolverOutcome::Failed(SolveFailure::new(
                    FailureKind::NonConvergence,
                    err.to_string(),
                    0,
                ));
            }
        };
        let evaluations = result.evaluations;

        if !result.converged {
            return SolverOutcome::Failed(SolveFailure::new(
                FailureKind::NonConvergence,
                format!(
                    "{} (residual norm {:.3e})",
                    result.termination, result.residual_norm
                ),
                evaluations,
            ));
        }

        let asset_value = result.x[0] * scale;
        let asset_vol = result.x[1];
        self.accept(params, asset_value, asset_vol, evaluations)
    }

    /// Post-solve sanity checks.
    fn accept(&self, params: &MertonParams, asset_value: f64, asset_vol: f64, evaluations: usize) -> SolverOutcome {
        if !(asset_value > 0.0 && asset_value > params.debt) {
            return SolverOutcome::Failed(SolveFailure::new(
                FailureKind::OutOfBounds,
                format!(
                    "asset value {asset_value:.6e} does not exceed default point {:.6e}",
                    params.debt
                ),
                evaluations,
            ));
        }
        if !(asset_vol >= self.config.min_sigma && asset_vol <= self.config.max_sigma) {
            return SolverOutcome::Failed(SolveFailure::new(
                FailureKind::OutOfBounds,
                format!(
                    "asset volatility {asset_vol:.6} outside [{}, {}]",
                    self.config.min_sigma, self.config.max_sigma
                ),
                evaluations,
            ));
        }
        let (d1, d2) = d1_d2(asset_value, asset_vol, params.debt, params.risk_free_rate, params.maturity);
        if !(d1.is_finite() && d2.is_finite()) {
            return SolverOutcome::Failed(SolveFailure::new(
                FailureKind::OutOfBounds,
                "d1/d2 not finite at the solution",
                evaluations,
            ));
        }
        SolverOutcome::Converged(AssetSolution {
            asset_value,
            asset_vol,
            d1,
            d2,
            evaluations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn round_trip(v: f64, sigma_v: f64, d: f64, r: f64, t: f64) -> (MertonParams, SolverOutcome) {
        let (e, sigma_e) = equity_from_assets(v, sigma_v, d, r, t);
        let params = MertonParams::new(e, sigma_e, d, r, t);
        (params, MertonSolver::with_defaults().solve(&params))
    }

    // ========================================
    // Configuration
    // ========================================

    #[test]
    fn test_config_validate() {
        assert!(MertonSolverConfig::default().validate().is_ok());
        let bad = MertonSolverConfig {
            min_sigma: 0.5,
            max_sigma: 0.1,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let bad = MertonSolverConfig {
            max_evaluations: 0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_initial_guess_policies() {
        let params = MertonParams::new(80.0, 0.5, 20.0, 0.03, 1.0);
        let scaled = MertonSolver::with_defaults().initial_guess(&params);
        assert_relative_eq!(scaled.0, 100.0);
        assert_relative_eq!(scaled.1, 0.4);

        let half = MertonSolver::new(MertonSolverConfig {
            initial_guess: InitialGuess::Half,
            ..Default::default()
        })
        .initial_guess(&params);
        assert_relative_eq!(half.1, 0.25);

        let fixed = MertonSolver::new(MertonSolverConfig {
            initial_guess: InitialGuess::Fixed,
            ..Default::default()
        })
        .initial_guess(&params);
        assert_relative_eq!(fixed.1, 0.2);
    }

    #[test]
    fn test_initial_guess_is_clamped() {
        let params = MertonParams::new(100.0, 9.0, 1.0, 0.03, 1.0);
        let (_, sigma0) = MertonSolver::with_defaults().initial_guess(&params);
        assert_eq!(sigma0, 3.0);
    }

    #[test]
    fn test_initial_guess_from_str() {
        assert_eq!("Half".parse::<InitialGuess>().unwrap(), InitialGuess::Half);
        assert!("newton".parse::<InitialGuess>().is_err());
    }

    // ========================================
    // Residuals
    // ========================================

    #[test]
    fn test_residuals_guard() {
        let params = MertonParams::new(100.0, 0.3, 50.0, 0.02, 1.0);
        assert_eq!(merton_residuals(40.0, 0.2, &params), [GUARD_RESIDUAL; 2]);
        assert_eq!(merton_residuals(150.0, 0.0, &params), [GUARD_RESIDUAL; 2]);
        assert_eq!(merton_residuals(-1.0, 0.2, &params), [GUARD_RESIDUAL; 2]);
    }

    #[test]
    fn test_residuals_vanish_at_forward_values() {
        let (e, sigma_e) = equity_from_assets(150.0, 0.25, 100.0, 0.05, 1.0);
        let params = MertonParams::new(e, sigma_e, 100.0, 0.05, 1.0);
        let r = merton_residuals(150.0, 0.25, &params);
        assert!(r[0].abs() < 1e-12);
        assert!(r[1].abs() < 1e-12);
    }

    // ========================================
    // Solve
    // ========================================

    #[test]
    fn test_round_trip_moderate_leverage() {
        let (_, outcome) = round_trip(150.0, 0.25, 100.0, 0.05, 1.0);
        let s = outcome.solution().expect("converged");
        assert_relative_eq!(s.asset_value, 150.0, max_relative = 1e-6);
        assert_relative_eq!(s.asset_vol, 0.25, max_relative = 1e-6);
        assert!(s.evaluations > 0);
    }

    #[test]
    fn test_round_trip_high_leverage() {
        let (_, outcome) = round_trip(110.0, 0.15, 100.0, 0.03, 2.0);
        assert_relative_eq!(outcome.asset_value().unwrap(), 110.0, max_relative = 1e-6);
        assert_relative_eq!(outcome.asset_vol().unwrap(), 0.15, max_relative = 1e-6);
    }

    #[test]
    fn test_large_cap_low_leverage() {
        let params = MertonParams::new(230e9, 0.23, 3e9, 0.04, 1.0);
        let outcome = MertonSolver::with_defaults().solve(&params);
        let s = outcome.solution().expect("converged");
        assert!(s.asset_value > params.equity_value);
        assert!(s.asset_vol > 0.0 && s.asset_vol < params.equity_vol);
        assert!(s.d1.is_finite() && s.d2.is_finite());
        assert!(s.leverage(params.debt) < 0.02);
    }

    #[test]
    fn test_d1_d2_consistent_with_solution() {
        let (params, outcome) = round_trip(150.0, 0.25, 100.0, 0.05, 1.0);
        let s = outcome.solution().unwrap();
        let (d1, d2) = d1_d2(s.asset_value, s.asset_vol, params.debt, 0.05, 1.0);
        assert_relative_eq!(s.d1, d1);
        assert_relative_eq!(s.d2, d2);
        assert_relative_eq!(s.d1 - s.d2, s.asset_vol, epsilon = 1e-12);
    }

    #[test]
    fn test_explicit_guess() {
        let (params, _) = round_trip(150.0, 0.25, 100.0, 0.05, 1.0);
        let outcome = MertonSolver::with_defaults().solve_with_guess(&params, Some((200.0, 0.1)));
        assert_relative_eq!(outcome.asset_value().unwrap(), 150.0, max_relative = 1e-6);
    }

    // ========================================
    // Failures
    // ========================================

    #[test]
    fn test_invalid_inputs_do_not_panic() {
        let solver = MertonSolver::with_defaults();
        for params in [
            MertonParams::new(0.0, 0.3, 10.0, 0.02, 1.0),
            MertonParams::new(100.0, -0.3, 10.0, 0.02, 1.0),
            MertonParams::new(100.0, 0.3, -10.0, 0.02, 1.0),
            MertonParams::new(100.0, 0.3, 10.0, 0.02, 0.0),
            MertonParams::new(f64::NAN, 0.3, 10.0, 0.02, 1.0),
        ] {
            let outcome = solver.solve(&params);
            assert_eq!(outcome.failure().unwrap().kind, FailureKind::InvalidInput);
            assert!(outcome.reason().is_some());
        }
    }

    #[test]
    fn test_zero_debt_is_out_of_bounds() {
        let outcome = MertonSolver::with_defaults().solve(&MertonParams::new(100.0, 0.3, 0.0, 0.02, 1.0));
        assert_eq!(outcome.failure().unwrap().kind, FailureKind::OutOfBounds);
    }

    #[test]
    fn test_volatility_bound_violation() {
        // True σV of 0.25 lies above a 0.2 ceiling
        let (params, _) = round_trip(150.0, 0.25, 100.0, 0.05, 1.0);
        let solver = MertonSolver::new(MertonSolverConfig {
            max_sigma: 0.2,
            ..Default::default()
        });
        let outcome = solver.solve(&params);
        assert!(!outcome.converged());
        assert!(outcome.asset_value().is_none());
    }

    #[test]
    fn test_tiny_budget_reports_non_convergence() {
        let (params, _) = round_trip(150.0, 0.25, 100.0, 0.05, 1.0);
        let solver = MertonSolver::new(MertonSolverConfig {
            max_evaluations: 3,
            ..Default::default()
        });
        let outcome = solver.solve_with_guess(&params, Some((300.0, 0.05)));
        let failure = outcome.failure().expect("budget too small");
        assert_eq!(failure.kind, FailureKind::NonConvergence);
        assert!(failure.evaluations <= 3);
    }
}
