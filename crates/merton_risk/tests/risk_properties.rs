//! Property tests for the analysis engines.
//!
//! # Test Categories
//!
//! 1. **Bootstrap**: ordered interval bounds, independence from row order
//! 2. **Stress**: null scenario identity, PD response to harsher volatility

use chrono::NaiveDate;
use merton_models::structural::{MertonInput, MertonParams};
use merton_risk::bootstrap::{BootstrapConfig, BootstrapEngine, RowSelection};
use merton_risk::scenarios::{StressEngine, StressScenario};
use proptest::prelude::*;

fn params_strategy() -> impl Strategy<Value = MertonParams> {
    (50.0f64..500.0, 0.15f64..0.6, 0.2f64..1.5, 0.0f64..0.05, 0.5f64..3.0, -0.05f64..0.12).prop_map(
        |(equity, equity_vol, leverage, rate, maturity, drift)| {
            MertonParams::new(equity, equity_vol, equity * leverage, rate, maturity).with_drift(drift)
        },
    )
}

// ============================================================================
// Bootstrap
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_bootstrap_bounds_ordered(params in params_strategy(), seed in any::<u64>()) {
        let engine = BootstrapEngine::new(BootstrapConfig::seeded(60, seed)).unwrap();
        let summary = engine.run_one(&params, None, None).unwrap();

        prop_assert!(summary.n_samples <= summary.n_iterations);
        for stat in [
            summary.asset_value,
            summary.asset_vol,
            summary.distance_to_default,
            summary.probability_of_default,
        ]
        .into_iter()
        .flatten()
        {
            prop_assert!(stat.lower <= stat.median && stat.median <= stat.upper);
            prop_assert!(stat.std >= 0.0);
        }
        if let Some(pd) = summary.probability_of_default {
            prop_assert!(pd.lower >= 0.0 && pd.upper <= 1.0);
        }
    }

    #[test]
    fn prop_bootstrap_batch_ignores_row_order(
        params in params_strategy(),
        n_rows in 2usize..6,
        seed in any::<u64>(),
    ) {
        let start = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        let rows: Vec<MertonInput> = (0..n_rows)
            .map(|i| {
                let shifted = MertonParams {
                    equity_value: params.equity_value * (1.0 + 0.02 * i as f64),
                    ..params
                };
                MertonInput::new("PROP", start + chrono::Days::new(i as u64), shifted)
            })
            .collect();
        let mut reversed = rows.clone();
        reversed.reverse();

        let config = BootstrapConfig {
            row_selection: RowSelection::All,
            ..BootstrapConfig::seeded(30, seed)
        };
        let engine = BootstrapEngine::new(config).unwrap();
        let forward = engine.run_batch(&rows);
        let backward = engine.run_batch(&reversed);

        prop_assert_eq!(forward.len(), n_rows);
        prop_assert_eq!(forward, backward);
    }
}

// ============================================================================
// Stress
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_null_scenario_is_identity(params in params_strategy()) {
        let result = StressEngine::with_presets().test_scenario(&StressScenario::null("NONE"), &params);

        prop_assert_eq!(&result.base, &result.stressed);
        if result.base.is_converged() {
            prop_assert_eq!(result.dd_change, Some(0.0));
            prop_assert_eq!(result.pd_change, Some(0.0));
        }
    }

    #[test]
    fn prop_harsher_volatility_raises_pd(
        params in params_strategy(),
        mild in 1.05f64..1.6,
        extra in 0.1f64..0.9,
    ) {
        let engine = StressEngine::with_presets();
        let milder = StressScenario::new("VOL_MILD", "Volatility up", mild, 0.0, 0.0, 0.0);
        let harsher = StressScenario::new("VOL_HARSH", "Volatility up more", mild + extra, 0.0, 0.0, 0.0);
        let a = engine.test_scenario(&milder, &params);
        let b = engine.test_scenario(&harsher, &params);

        if let (Some(pd_a), Some(pd_b)) = (a.pd_change, b.pd_change) {
            prop_assert!(pd_a >= -1e-9, "volatility increase lowered PD by {}", pd_a);
            prop_assert!(pd_b >= pd_a - 1e-9, "harsher shock {} below milder {}", pd_b, pd_a);
        }
        if let (Some(dd_a), Some(dd_b)) = (a.dd_change, b.dd_change) {
            prop_assert!(dd_a <= 1e-9);
            prop_assert!(dd_b <= dd_a + 1e-9);
        }
    }
}
