//! Sentiment snapshots, unique per `(entityId, platform)`.

use shelfwise_core::{EntityId, SentimentRecord};

use crate::collections::SENTIMENTS;
use crate::store::{DocumentStore, Filter, FindOptions};
use crate::DbError;

fn key(entity_id: EntityId, platform: &str) -> Filter {
    Filter::new()
        .id("entityId", entity_id)
        .eq("platform", platform)
}

/// Replace the snapshot for the record's `(entity, platform)` or insert it.
///
/// Returns the stored document id, which is the pre-existing id on replace.
///
/// # Errors
///
/// Returns [`DbError`] if serialization or the write fails.
pub async fn upsert_sentiment(
    store: &dyn DocumentStore,
    record: &SentimentRecord,
) -> Result<EntityId, DbError> {
    store
        .replace_upsert(
            SENTIMENTS,
            &key(record.entity_id, &record.platform),
            serde_json::to_value(record)?,
        )
        .await
}

/// Fetch the snapshot for one `(entity, platform)`.
///
/// # Errors
///
/// Returns [`DbError`] if the lookup fails or the document is malformed.
pub async fn get_sentiment(
    store: &dyn DocumentStore,
    entity_id: EntityId,
    platform: &str,
) -> Result<Option<SentimentRecord>, DbError> {
    store
        .find_one(SENTIMENTS, &key(entity_id, platform), &FindOptions::default())
        .await?
        .map(serde_json::from_value)
        .transpose()
        .map_err(DbError::from)
}

/// The most recently processed snapshot for an entity, on any platform.
///
/// # Errors
///
/// Returns [`DbError`] if the lookup fails or the document is malformed.
pub async fn latest_sentiment_for_entity(
    store: &dyn DocumentStore,
    entity_id: EntityId,
) -> Result<Option<SentimentRecord>, DbError> {
    store
        .find_one(
            SENTIMENTS,
            &Filter::new().id("entityId", entity_id),
            &FindOptions::newest_first("processedAt"),
        )
        .await?
        .map(serde_json::from_value)
        .transpose()
        .map_err(DbError::from)
}
