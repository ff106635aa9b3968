//! Powell hybrid root finder for square nonlinear systems.
//!
//! This module provides the [`HybridSolver`] for solving `F(x) = 0` where
//! `F: ℝⁿ → ℝⁿ`, without analytic derivatives.
//!
//! # Algorithm
//!
//! A trust-region dogleg iteration in the manner of MINPACK `hybrd`:
//!
//! ```text
//! J δ_N = -F                        (Newton step)
//! δ_C   = -α D⁻² Jᵀ F               (Cauchy step along scaled gradient)
//! δ     = dogleg(δ_C, δ_N, Δ)       (‖D δ‖ ≤ Δ)
//! ```
//!
//! where:
//! - `J` is a forward-difference Jacobian
//! - `D` is a diagonal scaling built from the running maximum of Jacobian column norms
//! - `Δ` is the trust region radius, grown or shrunk from the ratio of actual
//!   to predicted reduction in `‖F‖²`
//!
//! Termination is declared when `Δ ≤ xtol·‖D x‖`. A terminated iterate is only
//! reported as converged when its residual norm is at most `ftol`, so a
//! collapsed trust region away from a root is never mistaken for success.
//!
//! # Example
//!
//! ```
//! use merton_core::math::solvers::{HybridConfig, HybridSolver};
//!
//! // Intersection of the unit circle with y = x
//! let residuals = |x: &[f64]| vec![x[0] * x[0] + x[1] * x[1] - 1.0, x[1] - x[0]];
//!
//! let solver = HybridSolver::new(HybridConfig::default());
//! let result = solver.solve(residuals, vec![1.0, 0.5]).unwrap();
//!
//! assert!(result.converged);
//! assert!((result.x[0] - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-10);
//! ```

use std::fmt;

use super::config::HybridConfig;
use crate::math::linalg::{mat_t_vec, mat_vec, norm2, solve_linear};
use crate::types::SolverError;

/// Why the iteration stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Termination {
    /// Relative step below `xtol` with residual norm within `ftol`.
    Converged,
    /// Residual evaluation budget spent.
    MaxEvaluations,
    /// Trust region collapsed while the residual is still above `ftol`.
    NoProgress,
    /// Neither a Newton nor a gradient direction is available.
    Stationary,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Converged => write!(f, "relative step below tolerance"),
            Self::MaxEvaluations => write!(f, "function evaluation budget exhausted"),
            Self::NoProgress => write!(f, "iteration is not making good progress"),
            Self::Stationary => write!(f, "stationary point of the residual norm"),
        }
    }
}

/// Result of a hybrid solve.
#[derive(Debug, Clone, PartialEq)]
pub struct HybridResult {
    /// Final iterate.
    pub x: Vec<f64>,
    /// Residual vector at `x`.
    pub residuals: Vec<f64>,
    /// Euclidean norm of `residuals`.
    pub residual_norm: f64,
    /// Residual function evaluations spent.
    pub evaluations: usize,
    /// Accepted steps.
    pub iterations: usize,
    /// Whether `x` is reported as a root.
    pub converged: bool,
    /// Stopping reason.
    pub termination: Termination,
}

/// Powell hybrid (dogleg trust region) solver.
#[derive(Debug, Clone)]
pub struct HybridSolver {
    config: HybridConfig,
}

/// Residual function wrapper counting evaluations.
struct Counted<F> {
    f: F,
    evaluations: usize,
}

impl<F> Counted<F>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    fn eval(&mut self, x: &[f64]) -> Vec<f64> {
        self.evaluations += 1;
        (self.f)(x)
    }
}

impl HybridSolver {
    /// Create a new solver with the given configuration.
    pub fn new(config: HybridConfig) -> Self {
        Self { config }
    }

    /// Create a solver with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(HybridConfig::default())
    }

    /// Get the solver configuration.
    pub fn config(&self) -> &HybridConfig {
        &self.config
    }

    /// Solve `F(x) = 0` starting from `x0`.
    ///
    /// # Returns
    ///
    /// * `Ok(HybridResult)` - Final iterate; inspect `converged`
    /// * `Err(SolverError)` - Empty system, dimension mismatch, or non-finite
    ///   residuals at the starting point
    pub fn solve<F>(&self, residuals: F, x0: Vec<f64>) -> Result<HybridResult, SolverError>
    where
        F: Fn(&[f64]) -> Vec<f64>,
    {
        let n = x0.len();
        if n == 0 {
            return Err(SolverError::NumericalInstability(
                "Empty parameter vector".to_string(),
            ));
        }

        let mut func = Counted {
            f: residuals,
            evaluations: 0,
        };
        let mut x = x0;
        let mut fvec = func.eval(&x);
        if fvec.len() != n {
            return Err(SolverError::DimensionMismatch {
                unknowns: n,
                residuals: fvec.len(),
            });
        }
        if fvec.iter().any(|v| !v.is_finite()) || x.iter().any(|v| !v.is_finite()) {
            return Err(SolverError::NumericalInstability(
                "Non-finite residual at the initial point".to_string(),
            ));
        }
        let mut fnorm = norm2(&fvec);

        let cfg = &self.config;
        let mut diag = vec![0.0; n];
        let mut jac: Vec<Vec<f64>> = Vec::new();
        let mut delta = 0.0;
        let mut xnorm = 0.0;
        let mut iterations = 0usize;
        let mut first = true;
        let mut refresh_jacobian = true;

        let finish = |x: Vec<f64>,
                      fvec: Vec<f64>,
                      fnorm: f64,
                      evals: usize,
                      iters: usize,
                      term: Termination| HybridResult {
            x,
            residuals: fvec,
            residual_norm: fnorm,
            evaluations: evals,
            iterations: iters,
            converged: term == Termination::Converged,
            termination: term,
        };

        if fnorm == 0.0 {
            let evals = func.evaluations;
            return Ok(finish(x, fvec, fnorm, evals, 0, Termination::Converged));
        }

        loop {
            if refresh_jacobian {
                if func.evaluations + n > cfg.max_evaluations {
                    let evals = func.evaluations;
                    return Ok(finish(x, fvec, fnorm, evals, iterations, Termination::MaxEvaluations));
                }
                jac = forward_jacobian(&mut func, &x, &fvec, cfg.fd_epsilon);

                for (j, d) in diag.iter_mut().enumerate() {
                    let col_norm = jac.iter().map(|row| row[j] * row[j]).sum::<f64>().sqrt();
                    let col_norm = if col_norm.is_finite() && col_norm > 0.0 {
                        col_norm
                    } else {
                        1.0
                    };
                    *d = if first { col_norm } else { (*d).max(col_norm) };
                }
                xnorm = scaled_norm(&diag, &x);
                if first {
                    delta = cfg.step_factor * xnorm;
                    if delta == 0.0 {
                        delta = cfg.step_factor;
                    }
                }
            }

            let step = match dogleg(&jac, &fvec, &diag, delta) {
                Some(step) => step,
                None => {
                    let evals = func.evaluations;
                    return Ok(finish(x, fvec, fnorm, evals, iterations, Termination::Stationary));
                }
            };
            let pnorm = scaled_norm(&diag, &step);
            if first {
                delta = delta.min(pnorm);
                first = false;
            }

            if func.evaluations >= cfg.max_evaluations {
                let evals = func.evaluations;
                return Ok(finish(x, fvec, fnorm, evals, iterations, Termination::MaxEvaluations));
            }
            let x_trial: Vec<f64> = x.iter().zip(&step).map(|(xi, pi)| xi + pi).collect();
            let f_trial = func.eval(&x_trial);
            let ftnorm = if f_trial.len() == n && f_trial.iter().all(|v| v.is_finite()) {
                norm2(&f_trial)
            } else {
                f64::INFINITY
            };

            // Reductions in ‖F‖², actual versus linear model
            let actred = if ftnorm < fnorm * 1e10 {
                1.0 - (ftnorm / fnorm).powi(2)
            } else {
                -1.0
            };
            let linear: Vec<f64> = mat_vec(&jac, &step)
                .iter()
                .zip(&fvec)
                .map(|(jp, fi)| jp + fi)
                .collect();
            let prered = 1.0 - (norm2(&linear) / fnorm).powi(2);
            let ratio = if prered > 0.0 { actred / prered } else { 0.0 };

            if ratio < 0.1 {
                delta *= 0.5;
            } else if ratio >= 0.5 {
                delta = delta.max(2.0 * pnorm);
                if (ratio - 1.0).abs() <= 0.1 {
                    delta = 2.0 * pnorm;
                }
            }

            if ratio >= 1e-4 {
                x = x_trial;
                fvec = f_trial;
                fnorm = ftnorm;
                xnorm = scaled_norm(&diag, &x);
                iterations += 1;
                refresh_jacobian = true;
            } else {
                refresh_jacobian = false;
            }

            if fnorm == 0.0 || delta <= cfg.xtol * xnorm {
                let term = if fnorm <= cfg.ftol {
                    Termination::Converged
                } else {
                    Termination::NoProgress
                };
                let evals = func.evaluations;
                return Ok(finish(x, fvec, fnorm, evals, iterations, term));
            }
            if delta <= f64::EPSILON * xnorm.max(f64::MIN_POSITIVE) {
                let evals = func.evaluations;
                return Ok(finish(x, fvec, fnorm, evals, iterations, Termination::NoProgress));
            }
        }
    }
}

/// `‖D v‖` for diagonal scaling `D`.
#[inline]
fn scaled_norm(diag: &[f64], v: &[f64]) -> f64 {
    diag.iter()
        .zip(v)
        .map(|(d, x)| (d * x) * (d * x))
        .sum::<f64>()
        .sqrt()
}

/// Forward-difference Jacobian, one residual evaluation per column.
fn forward_jacobian<F>(func: &mut Counted<F>, x: &[f64], f0: &[f64], eps: f64) -> Vec<Vec<f64>>
where
    F: Fn(&[f64]) -> Vec<f64>,
{
    let n = x.len();
    let mut jac = vec![vec![0.0; n]; f0.len()];
    for j in 0..n {
        let h = if x[j] == 0.0 { eps } else { eps * x[j].abs() };
        let mut x_plus = x.to_vec();
        x_plus[j] += h;
        let f_plus = func.eval(&x_plus);
        for (i, row) in jac.iter_mut().enumerate() {
            row[j] = f_plus.get(i).map_or(f64::NAN, |fp| (fp - f0[i]) / h);
        }
    }
    jac
}

/// Dogleg step inside the scaled trust region `‖D p‖ ≤ Δ`.
///
/// Returns `None` when both the Newton step and the gradient vanish.
fn dogleg(jac: &[Vec<f64>], fvec: &[f64], diag: &[f64], delta: f64) -> Option<Vec<f64>> {
    let neg_f: Vec<f64> = fvec.iter().map(|v| -v).collect();
    let newton = solve_linear(jac, &neg_f);

    if let Some(ref p) = newton {
        if scaled_norm(diag, p) <= delta {
            return Some(p.clone());
        }
    }

    // Scaled gradient of ½‖F‖²
    let grad = mat_t_vec(jac, fvec);
    let gs: Vec<f64> = grad.iter().zip(diag).map(|(g, d)| g / d).collect();
    let gs_norm = norm2(&gs);
    if !(gs_norm.is_finite() && gs_norm > 0.0) {
        return newton.filter(|p| p.iter().any(|v| *v != 0.0));
    }

    // Steepest descent direction in unscaled coordinates
    let dir: Vec<f64> = gs.iter().zip(diag).map(|(g, d)| -g / d).collect();
    let jdir_norm = norm2(&mat_vec(jac, &dir));
    let alpha = if jdir_norm > 0.0 {
        (gs_norm / jdir_norm).powi(2)
    } else {
        f64::INFINITY
    };
    let cauchy_len = alpha * gs_norm;

    let newton = match newton {
        Some(p) if cauchy_len < delta => p,
        _ => {
            let t = (delta / gs_norm).min(alpha);
            return Some(dir.iter().map(|d| t * d).collect());
        }
    };

    // Interpolate between the Cauchy point and the Newton point in scaled space
    let s_c: Vec<f64> = dir.iter().zip(diag).map(|(d, dj)| alpha * d * dj).collect();
    let s_n: Vec<f64> = newton.iter().zip(diag).map(|(p, dj)| p * dj).collect();
    let diff: Vec<f64> = s_n.iter().zip(&s_c).map(|(n, c)| n - c).collect();
    let a = diff.iter().map(|v| v * v).sum::<f64>();
    let b = 2.0 * s_c.iter().zip(&diff).map(|(c, d)| c * d).sum::<f64>();
    let c = s_c.iter().map(|v| v * v).sum::<f64>() - delta * delta;
    let disc = (b * b - 4.0 * a * c).max(0.0);
    let tau = if a > 0.0 {
        ((-b + disc.sqrt()) / (2.0 * a)).clamp(0.0, 1.0)
    } else {
        0.0
    };

    Some(
        s_c.iter()
            .zip(&diff)
            .zip(diag)
            .map(|((c, d), dj)| (c + tau * d) / dj)
            .collect(),
    )
}
