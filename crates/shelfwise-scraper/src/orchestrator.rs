//! Per-platform scrape runs: shape routing, persistence, and run logging.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shelfwise_core::{
    CompetitorBundle, EntityId, ProductSnapshot, RunLog, RunStatus, ScrapedRecord,
};
use shelfwise_db::{append_run_log, insert_competitor_bundle, insert_scraped_record, DocumentStore};

use crate::error::ScrapeError;
use crate::extractor::ExtractorRegistry;
use crate::platform::Platform;
use crate::result::ScrapeResult;

pub const UNSUPPORTED_PLATFORM: &str = "unsupported platform";

/// What one platform run hands back to the caller.
///
/// Serializes as the bare product array, or as `{"error": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunOutcome {
    Products(Vec<ProductSnapshot>),
    Failed { error: String },
}

impl RunOutcome {
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        RunOutcome::Failed {
            error: message.into(),
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, RunOutcome::Failed { .. })
    }
}

/// Drives extractors and persists what they return.
///
/// Borrowed collaborators only; construct one per request.
pub struct ScrapeOrchestrator<'a> {
    pub(crate) store: &'a dyn DocumentStore,
    extractors: &'a ExtractorRegistry,
    pub(crate) max_concurrent_platforms: usize,
}

impl<'a> ScrapeOrchestrator<'a> {
    #[must_use]
    pub fn new(store: &'a dyn DocumentStore, extractors: &'a ExtractorRegistry) -> Self {
        Self {
            store,
            extractors,
            max_concurrent_platforms: 1,
        }
    }

    /// Number of platforms scraped in parallel by the entity driver (min 1).
    #[must_use]
    pub fn with_max_concurrent_platforms(mut self, max: usize) -> Self {
        self.max_concurrent_platforms = max.max(1);
        self
    }

    /// Scrape one platform for `query` and persist the result.
    ///
    /// Extractor failures never escape: they are logged as failed runs and
    /// returned as [`RunOutcome::Failed`]. An unsupported platform returns
    /// [`UNSUPPORTED_PLATFORM`] without writing a run log.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Persistence`] if the scraped record or bundle
    /// cannot be stored. The failed run is still logged.
    pub async fn run(
        &self,
        entity_id: EntityId,
        platform: &str,
        query: &str,
        desired_count: usize,
    ) -> Result<RunOutcome, ScrapeError> {
        let Some((platform, extractor)) = self.extractors.get(platform) else {
            tracing::warn!(%entity_id, platform, "unsupported platform requested");
            return Ok(RunOutcome::failed(UNSUPPORTED_PLATFORM));
        };

        let products = match extractor.scrape(query, desired_count).await {
            Ok(products) => products,
            Err(err) => {
                let message = err.to_string();
                tracing::warn!(%entity_id, %platform, query, error = %message, "extractor failed");
                self.log_run(
                    entity_id,
                    platform,
                    query,
                    json!({ "error": message }),
                    RunStatus::Failed,
                )
                .await;
                return Ok(RunOutcome::failed(message));
            }
        };

        let Some(result) = ScrapeResult::from_products(products) else {
            tracing::info!(%entity_id, %platform, query, "extractor returned no products");
            self.log_run(entity_id, platform, query, json!([]), RunStatus::Failed)
                .await;
            return Ok(RunOutcome::Products(Vec::new()));
        };

        if let Err(err) = self.persist(entity_id, platform, &result).await {
            self.log_run(
                entity_id,
                platform,
                query,
                json!({ "error": err.to_string() }),
                RunStatus::Failed,
            )
            .await;
            return Err(err.into());
        }

        let status = if result.has_item_error() {
            RunStatus::Failed
        } else {
            RunStatus::Success
        };
        let products = result.into_products();
        tracing::info!(
            %entity_id,
            %platform,
            products = products.len(),
            %status,
            "scrape run complete"
        );
        self.log_run(
            entity_id,
            platform,
            query,
            serde_json::to_value(&products).unwrap_or_default(),
            status,
        )
        .await;

        Ok(RunOutcome::Products(products))
    }

    async fn persist(
        &self,
        entity_id: EntityId,
        platform: Platform,
        result: &ScrapeResult,
    ) -> Result<EntityId, shelfwise_db::DbError> {
        let scraped_at = Utc::now();
        match result {
            ScrapeResult::Single(product) => {
                let record = ScrapedRecord::from_snapshot(
                    entity_id,
                    platform.as_str(),
                    product.clone(),
                    scraped_at,
                );
                insert_scraped_record(self.store, &record).await
            }
            ScrapeResult::Bundle(products) => {
                let bundle = CompetitorBundle {
                    id: EntityId::at(scraped_at),
                    entity_id,
                    platform: platform.to_string(),
                    products: products.clone(),
                    scraped_at,
                };
                insert_competitor_bundle(self.store, &bundle).await
            }
        }
    }

    /// Append a run log; a failed write is reported but never fails the run.
    async fn log_run(
        &self,
        entity_id: EntityId,
        platform: Platform,
        query: &str,
        result: Value,
        status: RunStatus,
    ) {
        let log = RunLog {
            entity_id: Some(entity_id),
            platform: platform.to_string(),
            query: query.to_string(),
            result,
            status,
            ran_at: Utc::now(),
        };
        if let Err(err) = append_run_log(self.store, &log).await {
            tracing::error!(%entity_id, %platform, error = %err, "failed to write run log");
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
