//! Pipeline error types.

use merton_core::types::MertonError;
use thiserror::Error;

/// Per-entity pipeline failure.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Input rows could not be loaded.
    #[error("failed to load inputs for {entity}: {message}")]
    Source {
        /// Entity identifier.
        entity: String,
        /// Source diagnostic.
        message: String,
    },

    /// The model rejected the batch (e.g. missing drift under the real-world measure).
    #[error("model error for {entity}: {source}")]
    Model {
        /// Entity identifier.
        entity: String,
        /// Underlying model error.
        source: MertonError,
    },

    /// Results could not be stored.
    #[error("failed to store results for {entity}: {message}")]
    Sink {
        /// Entity identifier.
        entity: String,
        /// Sink diagnostic.
        message: String,
    },
}

impl PipelineError {
    /// Entity the error refers to.
    pub fn entity(&self) -> &str {
        match self {
            Self::Source { entity, .. } | Self::Model { entity, .. } | Self::Sink { entity, .. } => entity,
        }
    }

    /// Check if the error came from the input source.
    pub fn is_source(&self) -> bool {
        matches!(self, Self::Source { .. })
    }

    /// Check if the error came from the model.
    pub fn is_model(&self) -> bool {
        matches!(self, Self::Model { .. })
    }

    /// Check if the error came from the sink.
    pub fn is_sink(&self) -> bool {
        matches!(self, Self::Sink { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_source() {
        let err = PipelineError::Model {
            entity: "AAPL".to_string(),
            source: MertonError::missing_drift("AAPL on 2024-03-28"),
        };
        assert!(err.to_string().starts_with("model error for AAPL"));
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.entity(), "AAPL");
        assert!(err.is_model());
    }
}
