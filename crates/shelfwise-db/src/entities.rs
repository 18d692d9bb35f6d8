//! Operations on the tracked-entity collection.

use chrono::{DateTime, Utc};
use serde_json::{json, Map};
use shelfwise_core::{EntityId, EntityKind, EntityStatus, TrackedEntity};

use crate::collections::ENTITIES;
use crate::store::{DocumentStore, Filter, FindOptions};
use crate::DbError;

fn by_id(id: EntityId) -> Filter {
    Filter::new().id("_id", id)
}

/// Persist a newly registered entity.
///
/// # Errors
///
/// Returns [`DbError`] if serialization or the insert fails.
pub async fn insert_entity(
    store: &dyn DocumentStore,
    entity: &TrackedEntity,
) -> Result<EntityId, DbError> {
    store.insert(ENTITIES, serde_json::to_value(entity)?).await
}

/// Fetch one entity, or `None` if it does not exist.
///
/// # Errors
///
/// Returns [`DbError`] if the lookup fails or the stored document is malformed.
pub async fn get_entity(
    store: &dyn DocumentStore,
    id: EntityId,
) -> Result<Option<TrackedEntity>, DbError> {
    store
        .find_one(ENTITIES, &by_id(id), &FindOptions::default())
        .await?
        .map(serde_json::from_value)
        .transpose()
        .map_err(DbError::from)
}

/// List every tracked entity in registration order.
///
/// # Errors
///
/// Returns [`DbError`] if the lookup fails or a stored document is malformed.
pub async fn list_entities(store: &dyn DocumentStore) -> Result<Vec<TrackedEntity>, DbError> {
    store
        .find(ENTITIES, &Filter::new(), &FindOptions::default())
        .await?
        .into_iter()
        .map(|doc| serde_json::from_value(doc).map_err(DbError::from))
        .collect()
}

/// Apply an explicit update of the mutable registration fields.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no entity matched, or [`DbError`] on
/// store failure.
pub async fn update_entity(
    store: &dyn DocumentStore,
    id: EntityId,
    name: &str,
    kind: EntityKind,
    platforms: &[String],
    now: DateTime<Utc>,
) -> Result<TrackedEntity, DbError> {
    let mut fields = Map::new();
    fields.insert("name".to_string(), json!(name));
    fields.insert("kind".to_string(), json!(kind));
    fields.insert("platforms".to_string(), json!(platforms));
    fields.insert("lastUpdated".to_string(), json!(now));

    if store.update_fields(ENTITIES, &by_id(id), fields).await? == 0 {
        return Err(DbError::NotFound);
    }
    get_entity(store, id).await?.ok_or(DbError::NotFound)
}

/// Record that a scrape attempt completed for the entity.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no entity matched, or [`DbError`] on
/// store failure.
pub async fn mark_entity_scraped(
    store: &dyn DocumentStore,
    id: EntityId,
    now: DateTime<Utc>,
) -> Result<(), DbError> {
    let mut fields = Map::new();
    fields.insert("status".to_string(), json!(EntityStatus::Scraped));
    fields.insert("lastUpdated".to_string(), json!(now));

    if store.update_fields(ENTITIES, &by_id(id), fields).await? == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Delete an entity registration. Derived records are left in place.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if nothing was deleted.
pub async fn delete_entity(store: &dyn DocumentStore, id: EntityId) -> Result<(), DbError> {
    if store.delete(ENTITIES, &by_id(id)).await? == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
