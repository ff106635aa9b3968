//! Distance to default and default probability.
//!
//! ```text
//! DD = [ln(V/D) + (m − ½σV²)T] / (σV√T)      m = r (risk-neutral) or μ (real-world)
//! PD = Φ(−DD)
//! ```
//!
//! Undefined inputs produce `None` rather than a sentinel number.

use std::fmt;
use std::str::FromStr;

use merton_core::math::distributions::norm_sf;
use merton_core::types::MertonError;

use super::input::MertonParams;
use super::solver::AssetSolution;

/// Probability measure under which DD and PD are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Measure {
    /// Asset drift equal to the risk-free rate.
    #[default]
    RiskNeutral,
    /// Asset drift equal to an empirical estimate μ.
    RealWorld,
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RiskNeutral => write!(f, "risk_neutral"),
            Self::RealWorld => write!(f, "real_world"),
        }
    }
}

impl FromStr for Measure {
    type Err = MertonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "risk_neutral" | "rn" | "q" => Ok(Self::RiskNeutral),
            "real_world" | "rw" | "p" | "physical" => Ok(Self::RealWorld),
            other => Err(MertonError::invalid_input(format!(
                "unknown measure '{other}' (expected risk_neutral or real_world)"
            ))),
        }
    }
}

fn distance(asset_value: f64, debt: f64, asset_vol: f64, drift: f64, maturity: f64) -> Option<f64> {
    if !(asset_value > 0.0 && debt > 0.0 && asset_vol > 0.0 && maturity > 0.0) {
        return None;
    }
    let dd = ((asset_value / debt).ln() + (drift - 0.5 * asset_vol * asset_vol) * maturity)
        / (asset_vol * maturity.sqrt());
    dd.is_finite().then_some(dd)
}

/// Risk-neutral distance to default (equals d2).
///
/// Returns `None` if V, D, σV or T is non-positive or the result is not finite.
///
/// # Examples
/// ```
/// use merton_models::structural::dd_risk_neutral;
///
/// let dd = dd_risk_neutral(150.0, 100.0, 0.25, 0.05, 1.0).unwrap();
/// assert!((dd - 1.696).abs() < 1e-3);
/// assert!(dd_risk_neutral(150.0, 0.0, 0.25, 0.05, 1.0).is_none());
/// ```
pub fn dd_risk_neutral(asset_value: f64, debt: f64, asset_vol: f64, rate: f64, maturity: f64) -> Option<f64> {
    distance(asset_value, debt, asset_vol, rate, maturity)
}

/// Real-world distance to default with asset drift `drift`.
pub fn dd_real_world(asset_value: f64, debt: f64, asset_vol: f64, drift: f64, maturity: f64) -> Option<f64> {
    distance(asset_value, debt, asset_vol, drift, maturity)
}

/// Default probability `Φ(−DD)`.
///
/// # Examples
/// ```
/// use merton_models::structural::pd_from_dd;
///
/// assert!((pd_from_dd(0.0) - 0.5).abs() < 1e-15);
/// assert!(pd_from_dd(3.0) < 0.002);
/// ```
#[inline]
pub fn pd_from_dd(dd: f64) -> f64 {
    norm_sf(dd)
}

/// [`pd_from_dd`] lifted over an undefined DD.
#[inline]
pub fn pd_from_optional_dd(dd: Option<f64>) -> Option<f64> {
    dd.map(pd_from_dd)
}

/// A (DD, PD) pair under one measure.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RiskMetric {
    /// Measure used.
    pub measure: Measure,
    /// Distance to default, `None` when undefined.
    pub distance_to_default: Option<f64>,
    /// Default probability in [0, 1], `None` when undefined.
    pub probability_of_default: Option<f64>,
}

impl RiskMetric {
    /// Both metrics undefined.
    pub fn undefined(measure: Measure) -> Self {
        Self {
            measure,
            distance_to_default: None,
            probability_of_default: None,
        }
    }

    /// Build from an optional DD.
    pub fn from_dd(measure: Measure, dd: Option<f64>) -> Self {
        Self {
            measure,
            distance_to_default: dd,
            probability_of_default: pd_from_optional_dd(dd),
        }
    }

    /// Whether DD (and hence PD) is defined.
    pub fn is_defined(&self) -> bool {
        self.distance_to_default.is_some()
    }
}

/// DD/PD for a converged solution.
///
/// The real-world measure uses `params.drift` and fails with
/// [`MertonError::MissingDrift`] if none is set.
pub fn risk_metric(
    solution: &AssetSolution,
    params: &MertonParams,
    measure: Measure,
) -> Result<RiskMetric, MertonError> {
    let dd = match measure {
        Measure::RiskNeutral => dd_risk_neutral(
            solution.asset_value,
            params.debt,
            solution.asset_vol,
            params.risk_free_rate,
            params.maturity,
        ),
        Measure::RealWorld => {
            let drift = params
                .drift
                .ok_or_else(|| MertonError::missing_drift("real-world risk metric"))?;
            dd_real_world(
                solution.asset_value,
                params.debt,
                solution.asset_vol,
                drift,
                params.maturity,
            )
        }
    };
    Ok(RiskMetric::from_dd(measure, dd))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structural::solver::d1_d2;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn solution(v: f64, sigma: f64, params: &MertonParams) -> AssetSolution {
        let (d1, d2) = d1_d2(v, sigma, params.debt, params.risk_free_rate, params.maturity);
        AssetSolution {
            asset_value: v,
            asset_vol: sigma,
            d1,
            d2,
            evaluations: 1,
        }
    }

    #[test]
    fn test_risk_neutral_dd_equals_d2() {
        let params = MertonParams::new(60.0, 0.4, 100.0, 0.05, 2.0);
        let s = solution(150.0, 0.25, &params);
        let dd = dd_risk_neutral(150.0, 100.0, 0.25, 0.05, 2.0).unwrap();
        assert_relative_eq!(dd, s.d2, epsilon = 1e-12);
    }

    #[test]
    fn test_real_world_with_rate_drift_matches_risk_neutral() {
        let rn = dd_risk_neutral(120.0, 80.0, 0.3, 0.04, 1.0).unwrap();
        let rw = dd_real_world(120.0, 80.0, 0.3, 0.04, 1.0).unwrap();
        assert_eq!(rn, rw);
        let higher = dd_real_world(120.0, 80.0, 0.3, 0.10, 1.0).unwrap();
        assert!(higher > rn);
    }

    #[test]
    fn test_undefined_inputs() {
        assert!(dd_risk_neutral(0.0, 80.0, 0.3, 0.04, 1.0).is_none());
        assert!(dd_risk_neutral(120.0, 80.0, 0.0, 0.04, 1.0).is_none());
        assert!(dd_risk_neutral(120.0, 80.0, 0.3, 0.04, 0.0).is_none());
        assert!(dd_risk_neutral(f64::INFINITY, 80.0, 0.3, 0.04, 1.0).is_none());
        assert!(pd_from_optional_dd(None).is_none());
        assert!(!RiskMetric::undefined(Measure::RealWorld).is_defined());
    }

    #[test]
    fn test_risk_metric_measures() {
        let params = MertonParams::new(60.0, 0.4, 100.0, 0.05, 1.0);
        let s = solution(150.0, 0.25, &params);

        let rn = risk_metric(&s, &params, Measure::RiskNeutral).unwrap();
        assert_eq!(rn.measure, Measure::RiskNeutral);
        assert_relative_eq!(rn.probability_of_default.unwrap(), pd_from_dd(s.d2), max_relative = 1e-10);

        let err = risk_metric(&s, &params, Measure::RealWorld).unwrap_err();
        assert!(err.is_missing_drift());

        let rw = risk_metric(&s, &params.with_drift(0.08), Measure::RealWorld).unwrap();
        assert!(rw.distance_to_default.unwrap() > rn.distance_to_default.unwrap());
    }

    #[test]
    fn test_measure_parse_and_display() {
        assert_eq!("risk-neutral".parse::<Measure>().unwrap(), Measure::RiskNeutral);
        assert_eq!("REAL_WORLD".parse::<Measure>().unwrap(), Measure::RealWorld);
        assert!("martingale".parse::<Measure>().is_err());
        assert_eq!(Measure::RealWorld.to_string(), "real_world");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_pd_in_unit_interval(dd in -40.0f64..40.0) {
            let pd = pd_from_dd(dd);
            prop_assert!((0.0..=1.0).contains(&pd));
        }

        #[test]
        fn prop_pd_decreasing(dd in -6.0f64..6.0, step in 0.01f64..2.0) {
            prop_assert!(pd_from_dd(dd + step) < pd_from_dd(dd));
        }

        #[test]
        fn prop_dd_decreasing_in_debt(d in 10.0f64..90.0, bump in 0.5f64..9.0) {
            let lo = dd_risk_neutral(100.0, d, 0.3, 0.03, 1.0).unwrap();
            let hi = dd_risk_neutral(100.0, d + bump, 0.3, 0.03, 1.0).unwrap();
            prop_assert!(hi < lo);
        }
    }
}
