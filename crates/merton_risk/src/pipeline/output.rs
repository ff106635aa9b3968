//! Output rows and their validation.

use chrono::NaiveDate;
use merton_models::structural::{AnnotatedRow, Measure, SOLVER_METHOD};
use serde::{Deserialize, Serialize};

/// One result row as handed to a [`ResultSink`](super::ResultSink).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRow {
    /// Entity identifier.
    pub entity_id: String,
    /// Observation date.
    pub date: NaiveDate,
    /// Asset value V.
    pub asset_value: Option<f64>,
    /// Asset volatility σV.
    pub asset_volatility: Option<f64>,
    /// Distance to default.
    pub distance_to_default: Option<f64>,
    /// Default probability.
    pub probability_of_default: Option<f64>,
    /// d1 at the solution.
    pub d1: Option<f64>,
    /// d2 at the solution.
    pub d2: Option<f64>,
    /// Whether the solver converged.
    pub converged: bool,
    /// Residual evaluations spent.
    pub iterations: usize,
    /// Measure of DD/PD.
    pub measure: Measure,
    /// D / V.
    pub leverage: Option<f64>,
    /// E / V.
    pub equity_ratio: Option<f64>,
    /// Root finder used.
    pub solver_method: String,
    /// Failure reason for non-converged rows.
    pub reason: Option<String>,
}

impl From<&AnnotatedRow> for OutputRow {
    fn from(row: &AnnotatedRow) -> Self {
        let params = &row.input.params;
        let solution = row.outcome.solution();
        Self {
            entity_id: row.input.entity_id.clone(),
            date: row.input.date,
            asset_value: solution.map(|s| s.asset_value),
            asset_volatility: solution.map(|s| s.asset_vol),
            distance_to_default: row.metric.distance_to_default,
            probability_of_default: row.metric.probability_of_default,
            d1: solution.map(|s| s.d1),
            d2: solution.map(|s| s.d2),
            converged: row.outcome.converged(),
            iterations: row.outcome.iterations(),
            measure: row.metric.measure,
            leverage: solution.map(|s| params.debt / s.asset_value),
            equity_ratio: solution.map(|s| params.equity_value / s.asset_value),
            solver_method: SOLVER_METHOD.to_string(),
            reason: row.outcome.reason().map(str::to_string),
        }
    }
}

/// Sanity checks over one entity's output.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    /// No hard issues found.
    pub passed: bool,
    /// Rows checked.
    pub n_rows: usize,
    /// Converged rows.
    pub n_converged: usize,
    /// Suspicious but tolerated findings.
    pub warnings: Vec<String>,
    /// Findings that fail validation.
    pub issues: Vec<String>,
}

impl ValidationReport {
    /// Validate output rows against the model's expected ranges.
    ///
    /// Warnings: non-converged rows, V ≤ E, σV ≥ σE, max PD above 50%,
    /// min DD below −5, max DD above 10. Issues: PD outside [0, 1].
    pub fn check(rows: &[OutputRow], equity_vols: &[f64]) -> Self {
        let mut warnings = Vec::new();
        let mut issues = Vec::new();
        let n_rows = rows.len();
        let n_converged = rows.iter().filter(|r| r.converged).count();

        let failed = n_rows - n_converged;
        if failed > 0 {
            let pct = failed as f64 / n_rows as f64 * 100.0;
            warnings.push(format!("Non-converged: {failed} rows ({pct:.1}%)"));
        }

        // E / V ≥ 1 means V ≤ E
        let low_assets = rows
            .iter()
            .filter(|r| r.equity_ratio.is_some_and(|ratio| ratio >= 1.0))
            .count();
        if low_assets > 0 {
            warnings.push(format!("V <= E: {low_assets} rows (unexpected)"));
        }

        let high_vol = rows
            .iter()
            .zip(equity_vols)
            .filter(|(r, sigma_e)| r.asset_volatility.is_some_and(|sigma_v| sigma_v >= **sigma_e))
            .count();
        if high_vol > 0 {
            warnings.push(format!("sigma_V >= sigma_E: {high_vol} rows (unexpected)"));
        }

        let pds: Vec<f64> = rows.iter().filter_map(|r| r.probability_of_default).collect();
        if let Some((min, max)) = min_max(&pds) {
            if max > 0.5 {
                warnings.push(format!("High PD detected: max={:.2}%", max * 100.0));
            }
            if min < 0.0 || max > 1.0 {
                issues.push(format!("PD out of range [0,1]: [{min:.4}, {max:.4}]"));
            }
        }

        let dds: Vec<f64> = rows.iter().filter_map(|r| r.distance_to_default).collect();
        if let Some((min, max)) = min_max(&dds) {
            if min < -5.0 {
                warnings.push(format!("Very low DD: min={min:.2}"));
            }
            if max > 10.0 {
                warnings.push(format!("Very high DD: max={max:.2}"));
            }
        }

        Self {
            passed: issues.is_empty(),
            n_rows,
            n_converged,
            warnings,
            issues,
        }
    }
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    values.iter().fold(None, |acc, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pd: Option<f64>, dd: Option<f64>) -> OutputRow {
        OutputRow {
            entity_id: "T".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            asset_value: Some(200.0),
            asset_volatility: Some(0.2),
            distance_to_default: dd,
            probability_of_default: pd,
            d1: dd.map(|d| d + 0.2),
            d2: dd,
            converged: pd.is_some(),
            iterations: 10,
            measure: Measure::RiskNeutral,
            leverage: Some(0.4),
            equity_ratio: Some(0.6),
            solver_method: SOLVER_METHOD.to_string(),
            reason: None,
        }
    }

    #[test]
    fn test_clean_rows_pass() {
        let rows = vec![row(Some(0.01), Some(2.3)), row(Some(0.02), Some(2.0))];
        let report = ValidationReport::check(&rows, &[0.3, 0.3]);
        assert!(report.passed);
        assert!(report.warnings.is_empty());
        assert_eq!(report.n_converged, 2);
    }

    #[test]
    fn test_warnings() {
        let mut high_vol = row(Some(0.7), Some(-6.0));
        high_vol.asset_volatility = Some(0.5);
        high_vol.equity_ratio = Some(1.2);
        let rows = vec![high_vol, row(None, None), row(Some(1e-30), Some(11.0))];

        let report = ValidationReport::check(&rows, &[0.4, 0.4, 0.4]);
        assert!(report.passed);
        let text = report.warnings.join("\n");
        assert!(text.contains("Non-converged: 1 rows (33.3%)"));
        assert!(text.contains("V <= E: 1 rows"));
        assert!(text.contains("sigma_V >= sigma_E: 1 rows"));
        assert!(text.contains("High PD detected"));
        assert!(text.contains("Very low DD"));
        assert!(text.contains("Very high DD"));
    }

    #[test]
    fn test_pd_out_of_range_is_issue() {
        let rows = vec![row(Some(1.2), Some(0.0))];
        let report = ValidationReport::check(&rows, &[0.3]);
        assert!(!report.passed);
        assert_eq!(report.issues.len(), 1);
    }

    #[test]
    fn test_empty_rows() {
        let report = ValidationReport::check(&[], &[]);
        assert!(report.passed);
        assert_eq!(report.n_rows, 0);
    }
}
