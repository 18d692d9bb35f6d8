//! Per-run vector memory: what the generation step may retrieve from.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shelfwise_core::EntityId;

use crate::error::ReportError;

pub const TEXT_MIME: &str = "text/plain";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Specifications,
    Metadata,
    Review,
}

impl EntryKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Specifications => "specifications",
            EntryKind::Metadata => "metadata",
            EntryKind::Review => "review",
        }
    }
}

/// One retrievable text with its provenance.
///
/// `metadata` always carries `type` and `entityId`; review chunks add
/// `reviewIndex` and `chunkIndex`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryEntry {
    pub content: String,
    pub mime_type: String,
    pub metadata: BTreeMap<String, String>,
}

impl MemoryEntry {
    #[must_use]
    pub fn text(kind: EntryKind, entity_id: EntityId, content: impl Into<String>) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert("type".to_string(), kind.as_str().to_string());
        metadata.insert("entityId".to_string(), entity_id.to_string());
        Self {
            content: content.into(),
            mime_type: TEXT_MIME.to_string(),
            metadata,
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, key: &str, value: impl ToString) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }

    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.metadata.get("type").map(String::as_str)
    }
}

/// Scoped retrieval store. One instance belongs to one generation run at a
/// time; callers clear it before ingesting.
#[async_trait]
pub trait VectorMemory: Send + Sync {
    async fn clear(&mut self) -> Result<(), ReportError>;

    async fn add(&mut self, entry: MemoryEntry) -> Result<(), ReportError>;

    /// Up to `k` entries most relevant to `text`, best first.
    async fn query(&self, text: &str, k: usize) -> Result<Vec<MemoryEntry>, ReportError>;
}

/// Process-local memory ranking entries by shared terms with the query.
#[derive(Debug, Default)]
pub struct InMemoryVectorMemory {
    entries: Vec<MemoryEntry>,
}

impl InMemoryVectorMemory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entries(&self) -> &[MemoryEntry] {
        &self.entries
    }
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 1)
        .map(str::to_lowercase)
        .collect()
}

#[async_trait]
impl VectorMemory for InMemoryVectorMemory {
    async fn clear(&mut self) -> Result<(), ReportError> {
        self.entries.clear();
        Ok(())
    }

    async fn add(&mut self, entry: MemoryEntry) -> Result<(), ReportError> {
        self.entries.push(entry);
        Ok(())
    }

    async fn query(&self, text: &str, k: usize) -> Result<Vec<MemoryEntry>, ReportError> {
        let wanted = terms(text);
        let mut scored: Vec<(usize, &MemoryEntry)> = self
            .entries
            .iter()
            .map(|entry| (terms(&entry.content).intersection(&wanted).count(), entry))
            .collect();
        // Stable: equal overlap keeps ingestion order.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(scored
            .into_iter()
            .take(k)
            .map(|(_, entry)| entry.clone())
            .collect())
    }
}
