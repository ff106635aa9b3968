//! Row-wise batch solving and risk-metric annotation.
//!
//! Rows are independent, so both stages run on the Rayon pool. Output order
//! always matches input order and a failed row never aborts the batch.

use merton_core::types::MertonError;
use rayon::prelude::*;

use super::input::MertonInput;
use super::metrics::{risk_metric, Measure, RiskMetric};
use super::solver::{MertonSolver, SolverOutcome};

/// An input row together with its solver outcome.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolvedRow {
    /// The observation.
    pub input: MertonInput,
    /// Result of the inversion.
    pub outcome: SolverOutcome,
}

/// A solved row with DD/PD attached.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnnotatedRow {
    /// The observation.
    pub input: MertonInput,
    /// Result of the inversion.
    pub outcome: SolverOutcome,
    /// Risk metrics (undefined for failed rows).
    pub metric: RiskMetric,
}

impl MertonSolver {
    /// Solve every row independently, in parallel, preserving order.
    ///
    /// # Examples
    /// ```
    /// use chrono::NaiveDate;
    /// use merton_models::structural::{MertonInput, MertonParams, MertonSolver};
    ///
    /// let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
    /// let rows = vec![
    ///     MertonInput::new("A", date, MertonParams::new(80.0, 0.35, 50.0, 0.03, 1.0)),
    ///     MertonInput::new("B", date, MertonParams::new(-1.0, 0.35, 50.0, 0.03, 1.0)),
    /// ];
    /// let solved = MertonSolver::with_defaults().solve_batch(&rows);
    /// assert_eq!(solved.len(), 2);
    /// assert!(solved[0].outcome.converged());
    /// assert!(!solved[1].outcome.converged());
    /// ```
    pub fn solve_batch(&self, rows: &[MertonInput]) -> Vec<SolvedRow> {
        rows.par_iter()
            .map(|input| SolvedRow {
                input: input.clone(),
                outcome: self.solve(&input.params),
            })
            .collect()
    }
}

/// Attach DD/PD to solved rows under `measure`.
///
/// Real-world annotation requires a drift on every row; the first row
/// without one fails the call with [`MertonError::MissingDrift`] naming the
/// entity and date.
pub fn annotate(rows: Vec<SolvedRow>, measure: Measure) -> Result<Vec<AnnotatedRow>, MertonError> {
    if measure == Measure::RealWorld {
        if let Some(row) = rows.iter().find(|r| r.input.params.drift.is_none()) {
            return Err(MertonError::missing_drift(row.input.label()));
        }
    }
    rows.into_par_iter()
        .map(|row| -> Result<AnnotatedRow, MertonError> {
            let metric = match row.outcome.solution() {
                Some(solution) => risk_metric(solution, &row.input.params, measure)?,
                None => RiskMetric::undefined(measure),
            };
            Ok(AnnotatedRow {
                input: row.input,
                outcome: row.outcome,
                metric,
            })
        })
        .collect()
}
