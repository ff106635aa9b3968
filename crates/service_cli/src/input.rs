//! CSV input readers.
//!
//! Panel files carry one observation per line:
//!
//! ```text
//! entity_id,date,equity_value,equity_vol,debt,risk_free_rate,maturity,drift
//! ACME,2024-03-28,230000000000,0.23,3000000000,0.04,1.0,0.06
//! ```
//!
//! `maturity` defaults to 1 year and `drift` may be left empty.

use std::path::Path;

use chrono::NaiveDate;
use merton_models::structural::{MertonInput, MertonParams};
use serde::{Deserialize, Deserializer};

use crate::{CliError, Result};

#[derive(Debug, Deserialize)]
struct PanelRecord {
    entity_id: String,
    date: NaiveDate,
    equity_value: f64,
    equity_vol: f64,
    debt: f64,
    risk_free_rate: f64,
    #[serde(default = "one_year")]
    maturity: f64,
    #[serde(default)]
    drift: Option<f64>,
}

fn one_year() -> f64 {
    1.0
}

impl From<PanelRecord> for MertonInput {
    fn from(r: PanelRecord) -> Self {
        let mut params = MertonParams::new(r.equity_value, r.equity_vol, r.debt, r.risk_free_rate, r.maturity);
        params.drift = r.drift;
        MertonInput::new(r.entity_id, r.date, params)
    }
}

#[derive(Debug, Deserialize)]
struct DefaultRecord {
    dd: f64,
    #[serde(deserialize_with = "flag")]
    default: bool,
}

fn flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Ok(true),
        "0" | "false" | "no" | "n" => Ok(false),
        other => Err(serde::de::Error::custom(format!("invalid default flag '{other}'"))),
    }
}

fn open(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    if !path.exists() {
        return Err(CliError::FileNotFound(path.display().to_string()));
    }
    Ok(csv::ReaderBuilder::new().trim(csv::Trim::All).from_path(path)?)
}

/// Read a panel file.
pub fn read_panel(path: &Path) -> Result<Vec<MertonInput>> {
    let rows = open(path)?
        .deserialize::<PanelRecord>()
        .map(|record| record.map(MertonInput::from))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    if rows.is_empty() {
        return Err(CliError::InvalidArgument(format!("{} contains no rows", path.display())));
    }
    Ok(rows)
}

/// Read a `dd,default` training file.
pub fn read_defaults(path: &Path) -> Result<(Vec<f64>, Vec<bool>)> {
    let mut dd = Vec::new();
    let mut defaults = Vec::new();
    for record in open(path)?.deserialize::<DefaultRecord>() {
        let record = record?;
        dd.push(record.dd);
        defaults.push(record.default);
    }
    Ok((dd, defaults))
}
