//! Historical and hypothetical preset scenarios.
//!
//! | Key | vol× | debt | rate | equity |
//! |-----|------|------|------|--------|
//! | `GFC_2008` | 2.5 | 0% | −4.0pp | −45% |
//! | `COVID_2020` | 2.0 | +15% | −1.5pp | −30% |
//! | `RATES_2022` | 1.3 | +5% | +4.0pp | −15% |
//! | `MILD_RECESSION` | 1.5 | +10% | 0 | −20% |
//! | `SEVERE_RECESSION` | 2.0 | +15% | −2.0pp | −40% |

use std::fmt;
use std::str::FromStr;

use merton_core::types::MertonError;

use super::shocks::StressScenario;

/// Preset scenario identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PresetScenarioType {
    /// 2008 global financial crisis
    Gfc2008,
    /// 2020 pandemic shock
    Covid2020,
    /// 2022-2023 rate hiking cycle
    Rates2022,
    /// Generic mild recession
    MildRecession,
    /// Generic severe recession
    SevereRecession,
}

impl PresetScenarioType {
    /// Every preset, in library order.
    pub fn all() -> [Self; 5] {
        [
            Self::Gfc2008,
            Self::Covid2020,
            Self::Rates2022,
            Self::MildRecession,
            Self::SevereRecession,
        ]
    }

    /// Lookup key.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Gfc2008 => "GFC_2008",
            Self::Covid2020 => "COVID_2020",
            Self::Rates2022 => "RATES_2022",
            Self::MildRecession => "MILD_RECESSION",
            Self::SevereRecession => "SEVERE_RECESSION",
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gfc2008 => "Global Financial Crisis (2008)",
            Self::Covid2020 => "COVID-19 Pandemic (2020)",
            Self::Rates2022 => "Rate Hikes (2022-2023)",
            Self::MildRecession => "Mild Recession",
            Self::SevereRecession => "Severe Recession",
        }
    }

    /// Description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Gfc2008 => "2008 financial crisis - extreme volatility and equity decline",
            Self::Covid2020 => "COVID-19 pandemic - sharp volatility spike and market decline",
            Self::Rates2022 => "2022-2023 rate hiking cycle - rising rates and inflation",
            Self::MildRecession => "Generic mild recession scenario",
            Self::SevereRecession => "Severe recession with deep market decline",
        }
    }

    /// `(volatility multiplier, debt shock, rate shock, equity shock)`.
    fn shocks(&self) -> (f64, f64, f64, f64) {
        match self {
            Self::Gfc2008 => (2.5, 0.0, -0.04, -0.45),
            Self::Covid2020 => (2.0, 0.15, -0.015, -0.30),
            Self::Rates2022 => (1.3, 0.05, 0.04, -0.15),
            Self::MildRecession => (1.5, 0.10, 0.0, -0.20),
            Self::SevereRecession => (2.0, 0.15, -0.02, -0.40),
        }
    }

    /// Build the scenario.
    pub fn scenario(&self) -> StressScenario {
        let (vol, debt, rate, equity) = self.shocks();
        StressScenario::new(self.key(), self.name(), vol, debt, rate, equity)
            .with_description(self.description())
    }
}

impl fmt::Display for PresetScenarioType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for PresetScenarioType {
    type Err = MertonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_uppercase();
        Self::all()
            .into_iter()
            .find(|preset| preset.key() == key)
            .ok_or_else(|| MertonError::invalid_input(format!("unknown preset scenario '{s}'")))
    }
}

/// All preset scenarios, in library order.
pub fn preset_scenarios() -> Vec<StressScenario> {
    PresetScenarioType::all().iter().map(|p| p.scenario()).collect()
}
