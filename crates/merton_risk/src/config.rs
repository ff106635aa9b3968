//! Engine configuration.
//!
//! Loaded from a TOML file with one table per component. Every table and
//! every key is optional; missing values take their defaults.
//!
//! ```toml
//! [solver]
//! max_evaluations = 2000
//! tolerance = 1e-12
//!
//! [bootstrap]
//! n_iterations = 2000
//! seed = 42
//! row_selection = { most_recent = 10 }
//!
//! [stress]
//! scenarios = ["GFC_2008", "RATES_2022"]
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Priority, highest first: environment (`MERTON_LOG_LEVEL`,
//! `MERTON_BOOTSTRAP_SEED`, `MERTON_BOOTSTRAP_ITERATIONS`, `MERTON_MEASURE`),
//! then the file, then defaults.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use merton_core::types::MertonError;
use merton_models::structural::{Measure, MertonSolverConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bootstrap::{BootstrapConfig, BootstrapEngine};
use crate::pipeline::{MertonPipeline, PipelineConfig};
use crate::scenarios::{preset_scenarios, StressEngine, StressScenario};
use crate::sensitivity::{SensitivityConfig, SensitivityEngine};

/// Log level environment variable.
pub const ENV_LOG_LEVEL: &str = "MERTON_LOG_LEVEL";
/// Bootstrap seed environment variable.
pub const ENV_BOOTSTRAP_SEED: &str = "MERTON_BOOTSTRAP_SEED";
/// Bootstrap iteration count environment variable.
pub const ENV_BOOTSTRAP_ITERATIONS: &str = "MERTON_BOOTSTRAP_ITERATIONS";
/// Pipeline measure environment variable.
pub const ENV_MEASURE: &str = "MERTON_MEASURE";

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// One or more values are out of range.
    #[error("invalid configuration: {}", .0.join("; "))]
    Validation(Vec<String>),
}

/// Log levels accepted by the CLI subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Everything.
    Trace,
    /// Per-row and per-scenario detail.
    Debug,
    /// Per-entity progress.
    #[default]
    Info,
    /// Warnings only.
    Warn,
    /// Errors only.
    Error,
}

impl LogLevel {
    /// Filter directive for `tracing_subscriber::EnvFilter`.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!(
                "invalid log level '{s}', expected one of: trace, debug, info, warn, error"
            )),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_filter_str())
    }
}

/// `[logging]` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level.
    pub level: LogLevel,
}

/// `[stress]` table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StressConfig {
    /// Scenario keys to run; empty runs every registered scenario.
    pub scenarios: Vec<String>,
    /// Extra scenarios registered after the presets.
    pub custom: Vec<StressScenario>,
}

impl StressConfig {
    /// Selected scenario keys, or `None` for all.
    pub fn selection(&self) -> Option<&[String]> {
        (!self.scenarios.is_empty()).then_some(self.scenarios.as_slice())
    }
}

/// `[pipeline]` table. The root finder comes from `[solver]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSection {
    /// Measure of the reported DD/PD.
    pub measure: Measure,
    /// Drift for real-world rows without one.
    pub default_drift: f64,
    /// Run output validation.
    pub validate: bool,
}

impl Default for PipelineSection {
    fn default() -> Self {
        let defaults = PipelineConfig::default();
        Self {
            measure: defaults.measure,
            default_drift: defaults.default_drift,
            validate: defaults.validate,
        }
    }
}

impl PipelineSection {
    /// Check the settings.
    pub fn validate(&self) -> Result<(), MertonError> {
        if !self.default_drift.is_finite() {
            return Err(MertonError::invalid_input(format!(
                "default_drift must be finite, got {}",
                self.default_drift
            )));
        }
        Ok(())
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Root-finder settings shared by every component.
    pub solver: MertonSolverConfig,
    /// Bootstrap settings.
    pub bootstrap: BootstrapConfig,
    /// Sensitivity grids.
    pub sensitivity: SensitivityConfig,
    /// Stress scenario selection.
    pub stress: StressConfig,
    /// Pipeline settings.
    pub pipeline: PipelineSection,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Parse a TOML document and validate it.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load `path` if given, otherwise start from defaults, then apply
    /// environment overrides.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.with_env_override()
    }

    /// Apply overrides from the process environment.
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut errors = Vec::new();

        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            match level.parse() {
                Ok(level) => self.logging.level = level,
                Err(e) => errors.push(format!("{ENV_LOG_LEVEL}: {e}")),
            }
        }
        if let Some(seed) = lookup(ENV_BOOTSTRAP_SEED) {
            match seed.trim().parse() {
                Ok(seed) => self.bootstrap.seed = Some(seed),
                Err(_) => errors.push(format!("{ENV_BOOTSTRAP_SEED}: invalid seed '{seed}'")),
            }
        }
        if let Some(n) = lookup(ENV_BOOTSTRAP_ITERATIONS) {
            match n.trim().parse() {
                Ok(n) => self.bootstrap.n_iterations = n,
                Err(_) => errors.push(format!("{ENV_BOOTSTRAP_ITERATIONS}: invalid count '{n}'")),
            }
        }
        if let Some(measure) = lookup(ENV_MEASURE) {
            match measure.parse() {
                Ok(measure) => self.pipeline.measure = measure,
                Err(e) => errors.push(format!("{ENV_MEASURE}: {e}")),
            }
        }

        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors));
        }
        self.validate()?;
        Ok(self)
    }

    /// Check every section, reporting all violations at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: [(&str, Result<(), MertonError>); 4] = [
            ("solver", self.solver.validate()),
            ("bootstrap", self.bootstrap.validate()),
            ("sensitivity", self.sensitivity.validate()),
            ("pipeline", self.pipeline.validate()),
        ];
        let mut errors: Vec<String> = checks
            .into_iter()
            .filter_map(|(section, result)| result.err().map(|e| format!("[{section}] {e}")))
            .collect();

        for scenario in &self.stress.custom {
            if let Err(e) = scenario.validate() {
                errors.push(format!("[stress] {}: {e}", scenario.key));
            }
        }
        let known: Vec<String> = preset_scenarios()
            .into_iter()
            .chain(self.stress.custom.iter().cloned())
            .map(|s| s.key)
            .collect();
        for name in &self.stress.scenarios {
            if !known.iter().any(|k| k.eq_ignore_ascii_case(name)) {
                errors.push(format!("[stress] unknown scenario '{name}'"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Pipeline settings with the shared solver.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            solver: self.solver,
            measure: self.pipeline.measure,
            default_drift: self.pipeline.default_drift,
            validate: self.pipeline.validate,
        }
    }

    /// Build the batch pipeline.
    pub fn pipeline(&self) -> Result<MertonPipeline, MertonError> {
        MertonPipeline::new(self.pipeline_config())
    }

    /// Build the bootstrap engine.
    pub fn bootstrap_engine(&self) -> Result<BootstrapEngine, MertonError> {
        BootstrapEngine::with_solver(self.bootstrap, self.solver)
    }

    /// Build the sensitivity engine.
    pub fn sensitivity_engine(&self) -> Result<SensitivityEngine, MertonError> {
        SensitivityEngine::new(self.sensitivity.clone(), self.solver)
    }

    /// Build the stress engine: presets first, then custom scenarios.
    pub fn stress_engine(&self) -> Result<StressEngine, MertonError> {
        let mut engine = StressEngine::new(self.solver)?;
        for scenario in preset_scenarios().into_iter().chain(self.stress.custom.iter().cloned()) {
            engine.register(scenario)?;
        }
        Ok(engine)
    }
}
