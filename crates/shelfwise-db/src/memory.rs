//! In-process [`DocumentStore`] used by tests and offline runs.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use shelfwise_core::EntityId;

use crate::store::{prepare_document, set_document_id, DocumentStore, Filter, FindOptions};
use crate::DbError;

/// A [`DocumentStore`] backed by a mutex-guarded map of collections.
///
/// Insertion order is preserved within a collection; the lock is never held
/// across an await point.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<HashMap<String, Vec<Value>>>,
}

impl MemoryDocumentStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently stored in `collection`.
    #[must_use]
    pub fn count(&self, collection: &str) -> usize {
        self.lock().get(collection).map_or(0, Vec::len)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Value>>> {
        // A poisoned lock only means another test thread panicked mid-write;
        // the map itself is still usable.
        self.collections
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Value>, DbError> {
        let guard = self.lock();
        let mut docs: Vec<Value> = guard
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| filter.matches(doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        drop(guard);

        if let Some(field) = &options.newest_first_by {
            // Stable sort: ties keep insertion order, newest insert last, so
            // reverse the tie order to favour the most recent write.
            docs.reverse();
            docs.sort_by(|a, b| compare_timestamps(b.get(field), a.get(field)));
        }
        if let Some(limit) = options.limit {
            docs.truncate(limit);
        }
        Ok(docs)
    }

    async fn insert(&self, collection: &str, doc: Value) -> Result<EntityId, DbError> {
        let (id, doc) = prepare_document(collection, doc)?;
        let mut guard = self.lock();
        let docs = guard.entry(collection.to_string()).or_default();
        let id_value = Value::String(id.to_string());
        if docs.iter().any(|d| d.get("_id") == Some(&id_value)) {
            return Err(DbError::InvalidDocument {
                collection: collection.to_string(),
                reason: format!("duplicate _id {id}"),
            });
        }
        docs.push(doc);
        Ok(id)
    }

    async fn replace_upsert(
        &self,
        collection: &str,
        filter: &Filter,
        doc: Value,
    ) -> Result<EntityId, DbError> {
        let (id, mut doc) = prepare_document(collection, doc)?;
        let mut guard = self.lock();
        let docs = guard.entry(collection.to_string()).or_default();

        if let Some(existing) = docs.iter_mut().find(|d| filter.matches(d)) {
            let kept_id = existing
                .get("_id")
                .and_then(Value::as_str)
                .and_then(|raw| raw.parse::<EntityId>().ok())
                .unwrap_or(id);
            set_document_id(&mut doc, kept_id);
            *existing = doc;
            return Ok(kept_id);
        }

        docs.push(doc);
        Ok(id)
    }

    async fn update_fields(
        &self,
        collection: &str,
        filter: &Filter,
        fields: Map<String, Value>,
    ) -> Result<u64, DbError> {
        let mut guard = self.lock();
        let mut touched = 0u64;
        if let Some(docs) = guard.get_mut(collection) {
            for doc in docs.iter_mut().filter(|d| filter.matches(d)) {
                if let Some(object) = doc.as_object_mut() {
                    for (key, value) in &fields {
                        if key != "_id" {
                            object.insert(key.clone(), value.clone());
                        }
                    }
                    touched += 1;
                }
            }
        }
        Ok(touched)
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> Result<u64, DbError> {
        let mut guard = self.lock();
        let Some(docs) = guard.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|d| !filter.matches(d));
        Ok((before - docs.len()) as u64)
    }
}

/// Order two optional timestamp values; RFC 3339 strings are compared as
/// instants, anything else falls back to string order, missing sorts last.
fn compare_timestamps(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn parse(v: &Value) -> Option<DateTime<Utc>> {
        v.as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (parse(a), parse(b)) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => a.to_string().cmp(&b.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn insert_then_find_by_filter() {
        let store = MemoryDocumentStore::new();
        store
            .insert("c", json!({"platform": "amazon"}))
            .await
            .unwrap();
        store.insert("c", json!({"platform": "ebay"})).await.unwrap();

        let found = store
            .find(
                "c",
                &Filter::new().eq("platform", "ebay"),
                &FindOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["platform"], "ebay");
    }

    #[tokio::test]
    async fn find_sorts_newest_first_and_limits() {
        let store = MemoryDocumentStore::new();
        for ts in [
            "2026-01-01T00:00:00Z",
            "2026-03-01T00:00:00.5Z",
            "2026-02-01T00:00:00Z",
        ] {
            store.insert("c", json!({"at": ts})).await.unwrap();
        }

        let found = store
            .find("c", &Filter::new(), &FindOptions::newest_first("at").limit(2))
            .await
            .unwrap();
        let order: Vec<&str> = found.iter().filter_map(|d| d["at"].as_str()).collect();
        assert_eq!(order, vec!["2026-03-01T00:00:00.5Z", "2026-02-01T00:00:00Z"]);
    }

    #[tokio::test]
    async fn newest_first_ties_prefer_latest_insert() {
        let store = MemoryDocumentStore::new();
        store
            .insert("c", json!({"at": "2026-01-01T00:00:00Z", "n": 1}))
            .await
            .unwrap();
        store
            .insert("c", json!({"at": "2026-01-01T00:00:00Z", "n": 2}))
            .await
            .unwrap();

        let latest = store
            .find_one("c", &Filter::new(), &FindOptions::newest_first("at"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest["n"], 2);
    }

    #[tokio::test]
    async fn replace_upsert_keeps_single_document_and_original_id() {
        let store = MemoryDocumentStore::new();
        let filter = Filter::new().eq("key", "k");

        let first = store
            .replace_upsert("c", &filter, json!({"key": "k", "v": 1}))
            .await
            .unwrap();
        let second = store
            .replace_upsert("c", &filter, json!({"key": "k", "v": 2}))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(store.count("c"), 1);
        let doc = store
            .find_one("c", &filter, &FindOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["v"], 2);
    }

    #[tokio::test]
    async fn update_fields_sets_top_level_values_but_not_id() {
        let store = MemoryDocumentStore::new();
        let id = store
            .insert("c", json!({"status": "pending"}))
            .await
            .unwrap();

        let mut fields = Map::new();
        fields.insert("status".to_string(), json!("scraped"));
        fields.insert("_id".to_string(), json!("ffffffffffffffffffffffff"));
        let touched = store
            .update_fields("c", &Filter::new().id("_id", id), fields)
            .await
            .unwrap();

        assert_eq!(touched, 1);
        let doc = store
            .find_one("c", &Filter::new(), &FindOptions::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["status"], "scraped");
        assert_eq!(doc["_id"], json!(id.to_string()));
    }

    #[tokio::test]
    async fn delete_reports_removed_count() {
        let store = MemoryDocumentStore::new();
        store.insert("c", json!({"a": 1})).await.unwrap();
        store.insert("c", json!({"a": 1})).await.unwrap();
        store.insert("c", json!({"a": 2})).await.unwrap();

        let removed = store.delete("c", &Filter::new().eq("a", 1)).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.count("c"), 1);
        assert_eq!(store.delete("missing", &Filter::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_id_insert_is_rejected() {
        let store = MemoryDocumentStore::new();
        let id = EntityId::new();
        store
            .insert("c", json!({"_id": id.to_string()}))
            .await
            .unwrap();
        let err = store
            .insert("c", json!({"_id": id.to_string()}))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidDocument { .. }));
    }
}
