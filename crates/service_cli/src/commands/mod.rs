//! CLI command implementations
//!
//! Each submodule implements a specific CLI command.

use clap::Args;
use merton_models::structural::MertonParams;

pub mod bootstrap;
pub mod calibrate;
pub mod sensitivity;
pub mod solve;
pub mod stress;

/// Inputs of a single observation, shared by the scenario commands.
#[derive(Args, Debug, Clone)]
pub struct BaseArgs {
    /// Market value of equity E
    #[arg(long)]
    pub equity: f64,

    /// Annualised equity volatility σE (0.3 = 30%)
    #[arg(long)]
    pub equity_vol: f64,

    /// Default barrier D (face value of debt)
    #[arg(long)]
    pub debt: f64,

    /// Continuously compounded risk-free rate
    #[arg(long)]
    pub rate: f64,

    /// Horizon in years
    #[arg(long, default_value = "1.0")]
    pub maturity: f64,

    /// Annual asset drift μ (required for real-world metrics)
    #[arg(long)]
    pub drift: Option<f64>,
}

impl BaseArgs {
    /// Model parameters, validated.
    pub fn params(&self) -> crate::Result<MertonParams> {
        let mut params = MertonParams::new(self.equity, self.equity_vol, self.debt, self.rate, self.maturity);
        params.drift = self.drift;
        params.validate()?;
        Ok(params)
    }
}
