//! Operations on `scraped_results` and `scraped_competitors`.

use shelfwise_core::{CompetitorBundle, EntityId, ScrapedRecord};

use crate::collections::{SCRAPED_COMPETITORS, SCRAPED_RESULTS};
use crate::store::{DocumentStore, Filter, FindOptions};
use crate::DbError;

const SCRAPED_AT: &str = "scrapedAt";

/// Insert a single-product scrape result. Records are never updated.
///
/// # Errors
///
/// Returns [`DbError`] if serialization or the insert fails.
pub async fn insert_scraped_record(
    store: &dyn DocumentStore,
    record: &ScrapedRecord,
) -> Result<EntityId, DbError> {
    store
        .insert(SCRAPED_RESULTS, serde_json::to_value(record)?)
        .await
}

/// Insert a multi-product competitor bundle as one document.
///
/// # Errors
///
/// Returns [`DbError`] if serialization or the insert fails.
pub async fn insert_competitor_bundle(
    store: &dyn DocumentStore,
    bundle: &CompetitorBundle,
) -> Result<EntityId, DbError> {
    store
        .insert(SCRAPED_COMPETITORS, serde_json::to_value(bundle)?)
        .await
}

/// Fetch a scraped record by its own id.
///
/// # Errors
///
/// Returns [`DbError`] if the lookup fails or the document is malformed.
pub async fn get_scraped_record(
    store: &dyn DocumentStore,
    id: EntityId,
) -> Result<Option<ScrapedRecord>, DbError> {
    store
        .find_one(
            SCRAPED_RESULTS,
            &Filter::new().id("_id", id),
            &FindOptions::default(),
        )
        .await?
        .map(serde_json::from_value)
        .transpose()
        .map_err(DbError::from)
}

/// The most recently scraped single-product record for an entity, across platforms.
///
/// # Errors
///
/// Returns [`DbError`] if the lookup fails or the document is malformed.
pub async fn latest_scraped_record(
    store: &dyn DocumentStore,
    entity_id: EntityId,
) -> Result<Option<ScrapedRecord>, DbError> {
    store
        .find_one(
            SCRAPED_RESULTS,
            &Filter::new().id("entityId", entity_id),
            &FindOptions::newest_first(SCRAPED_AT),
        )
        .await?
        .map(serde_json::from_value)
        .transpose()
        .map_err(DbError::from)
}

/// Every single-product record for an entity, newest first.
///
/// # Errors
///
/// Returns [`DbError`] if the lookup fails or a document is malformed.
pub async fn list_scraped_records(
    store: &dyn DocumentStore,
    entity_id: EntityId,
) -> Result<Vec<ScrapedRecord>, DbError> {
    store
        .find(
            SCRAPED_RESULTS,
            &Filter::new().id("entityId", entity_id),
            &FindOptions::newest_first(SCRAPED_AT),
        )
        .await?
        .into_iter()
        .map(|doc| serde_json::from_value(doc).map_err(DbError::from))
        .collect()
}

/// The most recent competitor bundle for an entity on one platform.
///
/// # Errors
///
/// Returns [`DbError`] if the lookup fails or the document is malformed.
pub async fn latest_competitor_bundle(
    store: &dyn DocumentStore,
    entity_id: EntityId,
    platform: &str,
) -> Result<Option<CompetitorBundle>, DbError> {
    store
        .find_one(
            SCRAPED_COMPETITORS,
            &Filter::new()
                .id("entityId", entity_id)
                .eq("platform", platform),
            &FindOptions::newest_first(SCRAPED_AT),
        )
        .await?
        .map(serde_json::from_value)
        .transpose()
        .map_err(DbError::from)
}
