//! Error types for structured error handling.
//!
//! This module provides:
//! - `MertonError`: the credit-engine taxonomy shared by every layer
//! - `SolverError`: failures raised by the numerical root finders

use thiserror::Error;

/// Credit-engine error taxonomy.
///
/// Per-observation numerical failures are *not* reported through this type;
/// the solver encodes them in its outcome so that batches never abort. This
/// enum is returned for data-shape problems (missing drift, empty fits,
/// mismatched lengths) and for misuse such as predicting before fitting.
///
/// # Examples
/// ```
/// use merton_core::types::MertonError;
///
/// let err = MertonError::insufficient_data(1, 2);
/// assert!(format!("{}", err).contains("need at least 2"));
///
/// let err = MertonError::missing_drift("AAPL on 2024-03-28");
/// assert!(err.is_missing_drift());
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MertonError {
    /// Inputs violate a precondition (non-positive equity, non-finite value, length mismatch).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An iterative procedure failed to reach its tolerance.
    #[error("did not converge: {0}")]
    NonConvergence(String),

    /// A computed quantity lies outside its admissible range.
    #[error("out of bounds: {0}")]
    OutOfBounds(String),

    /// Too few observations (or classes) to estimate a quantity.
    #[error("insufficient data: need at least {need}, got {got}")]
    InsufficientData {
        /// Number of usable observations provided.
        got: usize,
        /// Minimum required.
        need: usize,
    },

    /// Real-world measure requested for an observation without a drift.
    #[error("real-world measure requires a drift for {0}")]
    MissingDrift(String),

    /// A model was used before being fitted.
    #[error("{0} has not been fitted")]
    NotFitted(String),
}

impl MertonError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a non-convergence error.
    pub fn non_convergence(message: impl Into<String>) -> Self {
        Self::NonConvergence(message.into())
    }

    /// Create an out-of-bounds error.
    pub fn out_of_bounds(message: impl Into<String>) -> Self {
        Self::OutOfBounds(message.into())
    }

    /// Create an insufficient data error.
    ///
    /// # Arguments
    /// * `got` - Number of observations provided
    /// * `need` - Minimum required
    pub fn insufficient_data(got: usize, need: usize) -> Self {
        Self::InsufficientData { got, need }
    }

    /// Create a missing drift error naming the observation (e.g. `"AAPL on 2024-03-28"`).
    pub fn missing_drift(context: impl Into<String>) -> Self {
        Self::MissingDrift(context.into())
    }

    /// Create a not-fitted error naming the model.
    pub fn not_fitted(model: impl Into<String>) -> Self {
        Self::NotFitted(model.into())
    }

    /// Check if the error is due to invalid input.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Check if the error is due to insufficient data.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }

    /// Check if the error is due to a missing drift.
    pub fn is_missing_drift(&self) -> bool {
        matches!(self, Self::MissingDrift(_))
    }

    /// Check if the error is due to use before fitting.
    pub fn is_not_fitted(&self) -> bool {
        matches!(self, Self::NotFitted(_))
    }
}

/// Root-finding solver errors.
///
/// # Examples
/// ```
/// use merton_core::types::SolverError;
///
/// let err = SolverError::MaxEvaluationsExceeded { evaluations: 2000 };
/// assert!(format!("{}", err).contains("2000 function evaluations"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SolverError {
    /// Evaluation budget exhausted before convergence.
    #[error("Failed to converge within {evaluations} function evaluations")]
    MaxEvaluationsExceeded {
        /// Number of function evaluations spent.
        evaluations: usize,
    },

    /// Dimension of the residual vector does not match the unknowns.
    #[error("Residual dimension {residuals} does not match {unknowns} unknowns")]
    DimensionMismatch {
        /// Number of unknowns.
        unknowns: usize,
        /// Number of residuals returned.
        residuals: usize,
    },

    /// Numerical instability during computation.
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),
}

impl From<SolverError> for MertonError {
    fn from(err: SolverError) -> Self {
        match err {
            SolverError::MaxEvaluationsExceeded { .. } => Self::NonConvergence(err.to_string()),
            SolverError::DimensionMismatch { .. } => Self::InvalidInput(err.to_string()),
            SolverError::NumericalInstability(msg) => Self::NonConvergence(msg),
        }
    }
}
