//! Token-window chunking and per-entity ingestion into vector memory.

use serde_json::json;
use shelfwise_core::{EntityId, ScrapedRecord};
use shelfwise_db::{latest_scraped_record, DocumentStore};

use crate::error::ReportError;
use crate::memory::{EntryKind, MemoryEntry, VectorMemory};
use crate::tokenizer::Tokenizer;

pub const DEFAULT_MAX_TOKENS: usize = 400;

/// Split `text` into contiguous, non-overlapping windows of `max_tokens`
/// tokens, decoded back to text. The last window may be shorter.
///
/// A window boundary can fall inside a multi-byte character; those bytes are
/// carried into the next window, so the chunks concatenate back to `text`.
///
/// # Errors
///
/// Returns [`ReportError::Tokenizer`] if the tokenizer rejects a window.
pub fn chunk(
    tokenizer: &dyn Tokenizer,
    text: &str,
    max_tokens: usize,
) -> Result<Vec<String>, ReportError> {
    let tokens = tokenizer.encode(text);
    let window = max_tokens.max(1);
    let mut chunks: Vec<String> = Vec::with_capacity(tokens.len().div_ceil(window));
    let mut pending: Vec<u8> = Vec::new();

    for window_tokens in tokens.chunks(window) {
        pending.extend(tokenizer.decode_bytes(window_tokens)?);
        let carried = pending.split_off(pending.len() - incomplete_suffix_len(&pending));
        chunks.push(String::from_utf8_lossy(&pending).into_owned());
        pending = carried;
    }

    if let Some(last) = chunks.last_mut() {
        last.push_str(&String::from_utf8_lossy(&pending));
    }
    Ok(chunks)
}

/// Length of a trailing UTF-8 sequence that is cut short, or 0.
fn incomplete_suffix_len(bytes: &[u8]) -> usize {
    for (back, byte) in bytes.iter().rev().take(3).enumerate() {
        if byte & 0b1100_0000 == 0b1000_0000 {
            continue;
        }
        let width = match byte {
            0xC0..=0xDF => 2,
            0xE0..=0xEF => 3,
            0xF0..=0xF7 => 4,
            _ => 1,
        };
        return if width > back + 1 { back + 1 } else { 0 };
    }
    0
}

/// Loads one entity's latest scrape into a vector memory.
pub struct ChunkingIngestor<'a> {
    store: &'a dyn DocumentStore,
    tokenizer: &'a dyn Tokenizer,
    max_tokens: usize,
}

impl<'a> ChunkingIngestor<'a> {
    #[must_use]
    pub fn new(store: &'a dyn DocumentStore, tokenizer: &'a dyn Tokenizer) -> Self {
        Self {
            store,
            tokenizer,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens.max(1);
        self
    }

    /// Clear `memory`, then ingest the entity's specifications, metadata, and
    /// chunked reviews. Returns the number of entries added.
    ///
    /// # Errors
    ///
    /// - [`ReportError::NotFound`] if the entity has no scraped record.
    /// - [`ReportError::Persistence`] if the lookup fails.
    /// - Any memory or tokenizer failure.
    ///
    /// A review window that holds only part of a character adds no entry.
    pub async fn load_entity(
        &self,
        memory: &mut dyn VectorMemory,
        entity_id: EntityId,
    ) -> Result<usize, ReportError> {
        memory.clear().await?;

        let record = latest_scraped_record(self.store, entity_id)
            .await?
            .ok_or_else(|| ReportError::NotFound(format!("scraped record for entity {entity_id}")))?;

        let entries = self.entries_for(entity_id, &record)?;
        let added = entries.len();
        for entry in entries {
            memory.add(entry).await?;
        }

        tracing::debug!(%entity_id, platform = %record.platform, added, "entity loaded into memory");
        Ok(added)
    }

    fn entries_for(
        &self,
        entity_id: EntityId,
        record: &ScrapedRecord,
    ) -> Result<Vec<MemoryEntry>, ReportError> {
        let mut entries = Vec::new();

        if !record.specifications.is_empty() {
            let rendered = serde_json::to_string(&record.specifications)
                .map_err(shelfwise_db::DbError::from)?;
            entries.push(MemoryEntry::text(
                EntryKind::Specifications,
                entity_id,
                rendered,
            ));
        }

        let metadata = json!({
            "title": record.title,
            "brand": record.brand.as_deref().unwrap_or_default(),
            "price": record.price,
            "rating": record.rating,
        });
        entries.push(MemoryEntry::text(
            EntryKind::Metadata,
            entity_id,
            metadata.to_string(),
        ));

        for (review_index, review) in record.reviews.iter().enumerate() {
            for (chunk_index, text) in chunk(self.tokenizer, &review.body, self.max_tokens)?
                .into_iter()
                .enumerate()
                .filter(|(_, text)| !text.is_empty())
            {
                entries.push(
                    MemoryEntry::text(EntryKind::Review, entity_id, text)
                        .with_metadata("reviewIndex", review_index)
                        .with_metadata("chunkIndex", chunk_index),
                );
            }
        }

        Ok(entries)
    }
}

#[cfg(test)]
#[path = "chunking_test.rs"]
mod tests;
