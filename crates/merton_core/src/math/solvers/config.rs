//! Solver configuration types.

/// Configuration for the Powell hybrid root finder.
///
/// # Example
///
/// ```
/// use merton_core::math::solvers::HybridConfig;
///
/// let config = HybridConfig::default();
/// assert_eq!(config.max_evaluations, 2000);
/// assert!(config.xtol <= 1e-12);
///
/// let custom = HybridConfig::new(1e-10, 500);
/// assert_eq!(custom.max_evaluations, 500);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HybridConfig {
    /// Relative step tolerance.
    ///
    /// Iteration stops once the trust region radius falls below
    /// `xtol * ||D x||`, i.e. the relative error between two consecutive
    /// iterates is at most `xtol`.
    pub xtol: f64,

    /// Maximum number of residual function evaluations, including those
    /// spent on finite-difference Jacobians.
    pub max_evaluations: usize,

    /// Residual norm a terminated iterate must reach to be reported as a root.
    pub ftol: f64,

    /// Initial trust region radius as a multiple of `||D x0||`.
    pub step_factor: f64,

    /// Relative forward-difference step for the Jacobian.
    pub fd_epsilon: f64,
}

impl Default for HybridConfig {
    /// Default values:
    /// - `xtol`: 1e-12
    /// - `max_evaluations`: 2000
    /// - `ftol`: 1e-8
    /// - `step_factor`: 100
    /// - `fd_epsilon`: √ε ≈ 1.49e-8
    fn default() -> Self {
        Self {
            xtol: 1e-12,
            max_evaluations: 2000,
            ftol: 1e-8,
            step_factor: 100.0,
            fd_epsilon: f64::EPSILON.sqrt(),
        }
    }
}

impl HybridConfig {
    /// Create a configuration with the given step tolerance and evaluation budget.
    pub fn new(xtol: f64, max_evaluations: usize) -> Self {
        Self {
            xtol,
            max_evaluations,
            ..Default::default()
        }
    }

    /// Create a fast configuration with relaxed tolerances.
    pub fn fast() -> Self {
        Self {
            xtol: 1e-8,
            max_evaluations: 200,
            ftol: 1e-6,
            ..Default::default()
        }
    }

    /// Create a high precision configuration.
    pub fn high_precision() -> Self {
        Self {
            xtol: 1e-14,
            max_evaluations: 10_000,
            ftol: 1e-11,
            ..Default::default()
        }
    }

    /// Check that every field is usable.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.xtol.is_finite() && self.xtol > 0.0) {
            return Err(format!("xtol must be positive, got {}", self.xtol));
        }
        if self.max_evaluations == 0 {
            return Err("max_evaluations must be greater than 0".to_string());
        }
        if !(self.ftol.is_finite() && self.ftol > 0.0) {
            return Err(format!("ftol must be positive, got {}", self.ftol));
        }
        if !(self.step_factor.is_finite() && self.step_factor > 0.0) {
            return Err(format!("step_factor must be positive, got {}", self.step_factor));
        }
        if !(self.fd_epsilon.is_finite() && self.fd_epsilon > 0.0) {
            return Err(format!("fd_epsilon must be positive, got {}", self.fd_epsilon));
        }
        Ok(())
    }
}
