//! Bootstrap uncertainty quantification.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │               BootstrapEngine                │
//! ├──────────────────────────────────────────────┤
//! │  draw i: SeededRng(seed, i) → perturb inputs │
//! │          → MertonSolver → real-world DD/PD   │
//! │  accepted draws → StatSummary per metric     │
//! │  RowSelection → run_batch over a panel       │
//! └──────────────────────────────────────────────┘
//! ```

mod engine;
mod stats;

pub use engine::{BootstrapConfig, BootstrapEngine, BootstrapRow, BootstrapSummary, RowSelection};
pub use stats::{percentile, StatSummary};
