//! Input and output seams of the pipeline.
//!
//! The pipeline never talks to storage directly. Panels arrive through an
//! [`InputSource`] and results leave through a [`ResultSink`]; the in-memory
//! implementations here back the tests and the CLI.

use std::collections::BTreeMap;
use std::sync::RwLock;

use merton_models::structural::MertonInput;

use super::output::OutputRow;

/// Boxed error returned by source and sink implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Provides model inputs per entity.
pub trait InputSource: Send + Sync {
    /// Entities available from this source.
    fn entities(&self) -> Result<Vec<String>, BoxError>;

    /// Panel rows for one entity, in any order.
    fn load(&self, entity_id: &str) -> Result<Vec<MertonInput>, BoxError>;
}

/// Receives pipeline output per entity.
pub trait ResultSink: Send + Sync {
    /// Replace the stored rows of `entity_id` over the dates covered by
    /// `rows`, returning the number of rows written.
    fn replace(&self, entity_id: &str, rows: &[OutputRow]) -> Result<usize, BoxError>;
}

/// Source backed by a vector of rows.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    rows: BTreeMap<String, Vec<MertonInput>>,
}

impl InMemorySource {
    /// Group `rows` by entity.
    pub fn new(rows: impl IntoIterator<Item = MertonInput>) -> Self {
        let mut grouped: BTreeMap<String, Vec<MertonInput>> = BTreeMap::new();
        for row in rows {
            grouped.entry(row.entity_id.clone()).or_default().push(row);
        }
        Self { rows: grouped }
    }

    /// Total number of rows.
    pub fn len(&self) -> usize {
        self.rows.values().map(Vec::len).sum()
    }

    /// Whether the source holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl InputSource for InMemorySource {
    fn entities(&self) -> Result<Vec<String>, BoxError> {
        Ok(self.rows.keys().cloned().collect())
    }

    fn load(&self, entity_id: &str) -> Result<Vec<MertonInput>, BoxError> {
        Ok(self.rows.get(entity_id).cloned().unwrap_or_default())
    }
}

/// Sink that keeps results in memory, keyed by entity.
#[derive(Debug, Default)]
pub struct InMemorySink {
    stored: RwLock<BTreeMap<String, Vec<OutputRow>>>,
}

impl InMemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored rows of one entity, ordered by date.
    pub fn rows(&self, entity_id: &str) -> Vec<OutputRow> {
        self.stored
            .read()
            .map(|stored| stored.get(entity_id).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Every stored row.
    pub fn all_rows(&self) -> Vec<OutputRow> {
        self.stored
            .read()
            .map(|stored| stored.values().flatten().cloned().collect())
            .unwrap_or_default()
    }
}

impl ResultSink for InMemorySink {
    fn replace(&self, entity_id: &str, rows: &[OutputRow]) -> Result<usize, BoxError> {
        let (Some(first), Some(last)) = (
            rows.iter().map(|r| r.date).min(),
            rows.iter().map(|r| r.date).max(),
        ) else {
            return Ok(0);
        };

        let mut stored = self
            .stored
            .write()
            .map_err(|_| "result store lock poisoned")?;
        let entry = stored.entry(entity_id.to_string()).or_default();
        entry.retain(|r| r.date < first || r.date > last);
        entry.extend(rows.iter().cloned());
        entry.sort_by_key(|r| r.date);
        Ok(rows.len())
    }
}
