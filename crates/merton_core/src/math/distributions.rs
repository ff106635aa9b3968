//! Standard normal distribution functions.
//!
//! This module provides:
//! - `norm_cdf`: Cumulative distribution function Φ
//! - `norm_sf`: Survival function 1 − Φ, evaluated without cancellation
//! - `norm_pdf`: Probability density function φ
//!
//! The CDF is computed from the full-precision complementary error function
//! in `statrs`, so deep tails (e.g. Φ(−20) ≈ 2.8e-89) stay strictly positive
//! rather than collapsing to a polynomial-approximation floor.

use num_traits::Float;
use statrs::function::erf::erfc;

/// Square root of 2.
const SQRT_2: f64 = std::f64::consts::SQRT_2;

/// 1 / sqrt(2 * pi)
const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// Evaluate an `f64` kernel on a generic float, mapping conversion failures to NaN.
#[inline]
fn lift<T: Float>(x: T, kernel: impl Fn(f64) -> f64) -> T {
    match x.to_f64() {
        Some(v) => T::from(kernel(v)).unwrap_or_else(T::nan),
        None => T::nan(),
    }
}

/// Standard normal cumulative distribution function.
///
/// Computes P(X <= x) where X ~ N(0, 1).
///
/// # Mathematical Definition
/// Φ(x) = (1/2) * erfc(-x / sqrt(2))
///
/// # Examples
/// ```
/// use merton_core::math::distributions::norm_cdf;
///
/// assert!((norm_cdf(0.0_f64) - 0.5).abs() < 1e-15);
/// assert!(norm_cdf(-3.0_f64) < 0.01);
/// assert!(norm_cdf(3.0_f64) > 0.99);
///
/// // Deep tail remains representable
/// assert!(norm_cdf(-20.0_f64) > 0.0);
/// ```
#[inline]
pub fn norm_cdf<T: Float>(x: T) -> T {
    lift(x, |v| {
        if v.is_nan() {
            f64::NAN
        } else {
            0.5 * erfc(-v / SQRT_2)
        }
    })
}

/// Standard normal survival function, `1 − Φ(x) = Φ(−x)`.
///
/// # Examples
/// ```
/// use merton_core::math::distributions::{norm_cdf, norm_sf};
///
/// assert!((norm_sf(1.3_f64) - norm_cdf(-1.3_f64)).abs() < 1e-16);
/// ```
#[inline]
pub fn norm_sf<T: Float>(x: T) -> T {
    norm_cdf(-x)
}

/// Standard normal probability density function.
///
/// # Mathematical Definition
/// φ(x) = (1 / sqrt(2π)) * exp(-x² / 2)
///
/// # Examples
/// ```
/// use merton_core::math::distributions::norm_pdf;
///
/// assert!((norm_pdf(0.0_f64) - 0.3989422804).abs() < 1e-9);
/// assert!((norm_pdf(1.0_f64) - 0.2419707245).abs() < 1e-9);
/// ```
#[inline]
pub fn norm_pdf<T: Float>(x: T) -> T {
    let frac_1_sqrt_2pi = T::from(FRAC_1_SQRT_2PI).unwrap_or_else(T::nan);
    let half = T::from(0.5).unwrap_or_else(T::nan);
    frac_1_sqrt_2pi * (-half * x * x).exp()
}
