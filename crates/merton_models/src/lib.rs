//! # Merton Models (L2: Business Logic)
//!
//! The structural credit model and its empirical calibration.
//!
//! This crate provides:
//! - Observation types: [`structural::MertonParams`], [`structural::MertonInput`]
//! - The equity-to-asset inversion: [`structural::MertonSolver`]
//! - Distance-to-default and default probability under risk-neutral and
//!   real-world measures: [`structural::metrics`]
//! - Asset drift estimation and shrinkage: [`structural::drift`]
//! - Row-wise batch solving and annotation: [`structural::batch`]
//! - Logistic DD → PD calibration: [`calibration::PdCalibrator`]
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │              merton_models (L2)               │
//! ├───────────────────────────────────────────────┤
//! │  structural/  - MertonSolver, metrics, drift  │
//! │                 batch solve + annotate        │
//! │  calibration/ - logistic PD calibrator        │
//! └───────────────────────────────────────────────┘
//!          ↓
//! ┌───────────────────────────────────────────────┐
//! │               merton_core (L1)                │
//! │  norm_cdf, HybridSolver, SeededRng, errors    │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use merton_models::structural::{MertonParams, MertonSolver, Measure, risk_metric};
//!
//! let params = MertonParams::new(230e9, 0.23, 3e9, 0.04, 1.0);
//! let outcome = MertonSolver::with_defaults().solve(&params);
//! assert!(outcome.converged());
//!
//! let solution = outcome.solution().unwrap();
//! let metric = risk_metric(solution, &params, Measure::RiskNeutral).unwrap();
//! assert!(metric.distance_to_default.unwrap() > 0.0);
//! assert!(metric.probability_of_default.unwrap() < 0.01);
//! ```

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod calibration;
pub mod structural;
