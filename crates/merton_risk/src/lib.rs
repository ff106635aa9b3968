//! # Merton Risk (L3: Application)
//!
//! Uncertainty, scenario analysis and batch orchestration on top of the
//! structural model.
//!
//! This crate provides:
//! - Bootstrap confidence intervals for V, σV, DD and PD
//! - One-at-a-time sensitivity sweeps over the model inputs
//! - Stress testing against a library of historical scenarios
//! - The entity-level batch pipeline with pluggable input and output seams
//! - TOML engine configuration with environment overrides
//! - Rayon-based parallelisation helpers
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            merton_risk (L3)             │
//! ├─────────────────────────────────────────┤
//! │  bootstrap/   - BootstrapEngine, CIs    │
//! │  sensitivity/ - grids and sweeps        │
//! │  scenarios/   - StressEngine, presets   │
//! │  pipeline/    - MertonPipeline, seams   │
//! │  config       - EngineConfig (TOML)     │
//! │  parallel/    - Rayon utilities         │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │           merton_models (L2)            │
//! │  MertonSolver, DD/PD, calibration       │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use merton_models::structural::MertonParams;
//! use merton_risk::bootstrap::{BootstrapConfig, BootstrapEngine};
//! use merton_risk::scenarios::StressEngine;
//!
//! let params = MertonParams::new(100.0, 0.35, 60.0, 0.03, 1.0).with_drift(0.06);
//!
//! let engine = BootstrapEngine::new(BootstrapConfig::seeded(200, 7)).unwrap();
//! let summary = engine.run_one(&params, None, None).unwrap();
//! let dd = summary.distance_to_default.unwrap();
//! assert!(dd.lower <= dd.median && dd.median <= dd.upper);
//!
//! let results = StressEngine::with_presets().test_all(&params, None);
//! let worst = StressEngine::worst_case(&results).unwrap();
//! assert!(worst.pd_change.unwrap() > 0.0);
//! ```

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod bootstrap;
pub mod config;
pub mod parallel;
pub mod pipeline;
pub mod scenarios;
pub mod sensitivity;
