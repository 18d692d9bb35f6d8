use chrono::Utc;
use shelfwise_core::{EntityId, ReportRecord};
use shelfwise_db::{upsert_report, DocumentStore};

use crate::chunking::{ChunkingIngestor, DEFAULT_MAX_TOKENS};
use crate::coerce::coerce;
use crate::error::{GenerateError, ReportError};
use crate::generation::GroundedGenerationClient;
use crate::memory::VectorMemory;
use crate::tokenizer::Tokenizer;

pub const DEFAULT_TOP_K: usize = 3;

/// Generates and stores the competitive-analysis report for one entity.
pub struct ReportStage<'a> {
    store: &'a dyn DocumentStore,
    tokenizer: &'a dyn Tokenizer,
    max_tokens: usize,
    top_k: usize,
}

impl<'a> ReportStage<'a> {
    #[must_use]
    pub fn new(store: &'a dyn DocumentStore, tokenizer: &'a dyn Tokenizer) -> Self {
        Self {
            store,
            tokenizer,
            max_tokens: DEFAULT_MAX_TOKENS,
            top_k: DEFAULT_TOP_K,
        }
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Re-ingest the entity into `memory`, answer `query` from the retrieved
    /// context, coerce the answer into a report, and upsert it.
    ///
    /// `client.close()` runs exactly once on every path.
    ///
    /// # Errors
    ///
    /// Every failure is wrapped in [`GenerateError`]; use
    /// [`GenerateError::is_not_found`] to tell a missing scrape apart.
    pub async fn generate(
        &self,
        query: &str,
        entity_id: EntityId,
        memory: &mut dyn VectorMemory,
        client: &dyn GroundedGenerationClient,
    ) -> Result<ReportRecord, GenerateError> {
        let result = self.run(query, entity_id, memory, client).await;
        client.close().await;

        result.map_err(|e| {
            tracing::warn!(%entity_id, error = %e, "report generation failed");
            GenerateError(e)
        })
    }

    async fn run(
        &self,
        query: &str,
        entity_id: EntityId,
        memory: &mut dyn VectorMemory,
        client: &dyn GroundedGenerationClient,
    ) -> Result<ReportRecord, ReportError> {
        ChunkingIngestor::new(self.store, self.tokenizer)
            .with_max_tokens(self.max_tokens)
            .load_entity(memory, entity_id)
            .await?;

        let context = memory.query(query, self.top_k).await?;
        let response = client.run(query, &context).await?;

        let mut report = coerce(response, entity_id, Utc::now(), client.model());
        report.id = upsert_report(self.store, &report).await?;

        tracing::info!(
            %entity_id,
            verdict = ?report.buy_or_skip,
            context = context.len(),
            "report stored"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[path = "stage_test.rs"]
mod tests;
