//! Scenario-based stress testing.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 StressEngine                 │
//! ├──────────────────────────────────────────────┤
//! │  StressScenario     - named shock bundle     │
//! │  PresetScenarioType - historical library     │
//! │  test_scenario      - base vs stressed legs  │
//! │  test_all           - ordered, parallel      │
//! └──────────────────────────────────────────────┘
//! ```

mod engine;
mod presets;
mod shocks;

pub use engine::{LegOutcome, StressEngine, StressResult};
pub use presets::{preset_scenarios, PresetScenarioType};
pub use shocks::StressScenario;
