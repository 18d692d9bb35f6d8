//! Competitive-analysis reports, at most one per entity.

use shelfwise_core::{EntityId, ReportRecord};

use crate::collections::REPORTS;
use crate::store::{DocumentStore, Filter, FindOptions};
use crate::DbError;

/// Replace the entity's report or insert it. Last writer wins.
///
/// # Errors
///
/// Returns [`DbError`] if serialization or the write fails.
pub async fn upsert_report(
    store: &dyn DocumentStore,
    report: &ReportRecord,
) -> Result<EntityId, DbError> {
    store
        .replace_upsert(
            REPORTS,
            &Filter::new().id("entityId", report.entity_id),
            serde_json::to_value(report)?,
        )
        .await
}

/// Fetch the live report for an entity.
///
/// # Errors
///
/// Returns [`DbError`] if the lookup fails or the document is malformed.
pub async fn get_report(
    store: &dyn DocumentStore,
    entity_id: EntityId,
) -> Result<Option<ReportRecord>, DbError> {
    store
        .find_one(
            REPORTS,
            &Filter::new().id("entityId", entity_id),
            &FindOptions::default(),
        )
        .await?
        .map(serde_json::from_value)
        .transpose()
        .map_err(DbError::from)
}
