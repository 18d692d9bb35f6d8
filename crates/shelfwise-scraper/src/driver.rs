//! Multi-platform scrape for one tracked entity.

use std::collections::BTreeMap;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use shelfwise_core::EntityId;
use shelfwise_db::{get_entity, mark_entity_scraped};

use crate::error::ScrapeError;
use crate::orchestrator::{RunOutcome, ScrapeOrchestrator};

/// Per-platform results of scraping one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResponse {
    pub entity_id: EntityId,
    pub entity_name: String,
    pub results: BTreeMap<String, RunOutcome>,
}

impl ScrapeResponse {
    #[must_use]
    pub fn failed_platforms(&self) -> usize {
        self.results.values().filter(|o| o.is_error()).count()
    }
}

impl ScrapeOrchestrator<'_> {
    /// Scrape every configured platform of an entity, using its name as the
    /// query. `desired_count` is 1 for a plain scrape and N for competitors.
    ///
    /// A failing platform becomes an `{error}` entry and never aborts the
    /// others. The entity is marked scraped once all platforms finish.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::EntityNotFound`] before any scrape if the entity
    /// does not exist, or [`ScrapeError::Persistence`] if loading or marking
    /// the entity fails.
    pub async fn scrape_entity(
        &self,
        entity_id: EntityId,
        desired_count: usize,
    ) -> Result<ScrapeResponse, ScrapeError> {
        let entity = get_entity(self.store, entity_id)
            .await?
            .ok_or(ScrapeError::EntityNotFound(entity_id))?;
        let query = entity.name.as_str();

        let results: BTreeMap<String, RunOutcome> = stream::iter(entity.platforms.iter())
            .map(|platform| async move {
                let outcome = match self.run(entity_id, platform, query, desired_count).await {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        tracing::warn!(
                            %entity_id,
                            platform = %platform,
                            error = %err,
                            "platform scrape failed"
                        );
                        RunOutcome::failed(err.to_string())
                    }
                };
                (platform.clone(), outcome)
            })
            .buffer_unordered(self.max_concurrent_platforms)
            .collect()
            .await;

        mark_entity_scraped(self.store, entity_id, Utc::now()).await?;

        let response = ScrapeResponse {
            entity_id,
            entity_name: entity.name.clone(),
            results,
        };
        if response.failed_platforms() > 0 {
            tracing::warn!(
                %entity_id,
                failed = response.failed_platforms(),
                total = response.results.len(),
                "some platforms failed during scrape"
            );
        }
        Ok(response)
    }
}
