use serde::Serialize;
use shelfwise_core::{EntityId, ReportRecord, SentimentRecord};
use shelfwise_db::{get_report, latest_sentiment_for_entity, DocumentStore};

use crate::error::AssembleError;

/// The stored report and the latest sentiment snapshot, side by side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnifiedReport {
    pub summary: ReportRecord,
    pub sentiment: SentimentRecord,
}

pub struct UnifiedReportAssembler<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> UnifiedReportAssembler<'a> {
    #[must_use]
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Join the entity's report with its most recent sentiment snapshot.
    ///
    /// The report is checked first. Both records are returned unchanged.
    ///
    /// # Errors
    ///
    /// - [`AssembleError::ReportNotFound`] if no report exists.
    /// - [`AssembleError::SentimentNotFound`] if no sentiment exists.
    /// - [`AssembleError::Persistence`] if a lookup fails.
    pub async fn assemble(&self, entity_id: EntityId) -> Result<UnifiedReport, AssembleError> {
        let summary = get_report(self.store, entity_id)
            .await?
            .ok_or(AssembleError::ReportNotFound)?;
        let sentiment = latest_sentiment_for_entity(self.store, entity_id)
            .await?
            .ok_or(AssembleError::SentimentNotFound)?;

        Ok(UnifiedReport { summary, sentiment })
    }
}
