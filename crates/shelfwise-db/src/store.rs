//! The document-store capability consumed by every pipeline stage.

use async_trait::async_trait;
use serde_json::{Map, Value};
use shelfwise_core::EntityId;

use crate::DbError;

/// Top-level equality filter over document fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter(Map<String, Value>);

impl Filter {
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Add an equality condition on `field`.
    #[must_use]
    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    /// Shorthand for an equality condition on an [`EntityId`] field.
    #[must_use]
    pub fn id(self, field: &str, id: EntityId) -> Self {
        self.eq(field, id.to_string())
    }

    /// `true` when every condition equals the document's top-level field.
    #[must_use]
    pub fn matches(&self, doc: &Value) -> bool {
        self.0
            .iter()
            .all(|(field, expected)| doc.get(field) == Some(expected))
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::Object(self.0.clone())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// Ordering and paging for [`DocumentStore::find`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Timestamp field to sort on, newest first.
    pub newest_first_by: Option<String>,
    pub limit: Option<usize>,
}

impl FindOptions {
    #[must_use]
    pub fn newest_first(field: &str) -> Self {
        Self {
            newest_first_by: Some(field.to_string()),
            limit: None,
        }
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Keyed JSON-document persistence.
///
/// Documents are JSON objects carrying their id under `_id` as 24 hex chars.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Return every document in `collection` matching `filter`.
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Value>, DbError>;

    /// Insert `doc`, assigning an `_id` when absent. Returns the stored id.
    async fn insert(&self, collection: &str, doc: Value) -> Result<EntityId, DbError>;

    /// Replace the single document matching `filter`, or insert `doc` when none
    /// matches. The existing `_id` is kept on replace. Returns the stored id.
    async fn replace_upsert(
        &self,
        collection: &str,
        filter: &Filter,
        doc: Value,
    ) -> Result<EntityId, DbError>;

    /// Overwrite top-level `fields` on every matching document. Returns the
    /// number of documents touched.
    async fn update_fields(
        &self,
        collection: &str,
        filter: &Filter,
        fields: Map<String, Value>,
    ) -> Result<u64, DbError>;

    /// Delete every matching document. Returns the number removed.
    async fn delete(&self, collection: &str, filter: &Filter) -> Result<u64, DbError>;

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Option<Value>, DbError> {
        let options = FindOptions {
            limit: Some(1),
            ..options.clone()
        };
        Ok(self
            .find(collection, filter, &options)
            .await?
            .into_iter()
            .next())
    }
}

/// Ensure `doc` is an object with a valid `_id`, generating one if missing.
pub(crate) fn prepare_document(
    collection: &str,
    mut doc: Value,
) -> Result<(EntityId, Value), DbError> {
    let Some(object) = doc.as_object_mut() else {
        return Err(DbError::InvalidDocument {
            collection: collection.to_string(),
            reason: "document must be a JSON object".to_string(),
        });
    };

    let id = match object.get("_id") {
        Some(Value::String(raw)) => raw.parse().map_err(|e| DbError::InvalidDocument {
            collection: collection.to_string(),
            reason: format!("{e}"),
        })?,
        Some(other) => {
            return Err(DbError::InvalidDocument {
                collection: collection.to_string(),
                reason: format!("_id must be a string, got {other}"),
            })
        }
        None => {
            let id = EntityId::new();
            object.insert("_id".to_string(), Value::String(id.to_string()));
            id
        }
    };

    Ok((id, doc))
}

/// Overwrite the `_id` of an already-validated object document.
pub(crate) fn set_document_id(doc: &mut Value, id: EntityId) {
    if let Some(object) = doc.as_object_mut() {
        object.insert("_id".to_string(), Value::String(id.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn filter_matches_on_all_conditions() {
        let filter = Filter::new().eq("platform", "amazon").eq("n", 3);
        assert!(filter.matches(&json!({"platform": "amazon", "n": 3, "x": true})));
        assert!(!filter.matches(&json!({"platform": "amazon", "n": 4})));
        assert!(!filter.matches(&json!({"platform": "amazon"})));
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::new().matches(&json!({"a": 1})));
    }

    #[test]
    fn prepare_document_assigns_missing_id() {
        let (id, doc) = prepare_document("c", json!({"a": 1})).unwrap();
        assert_eq!(doc["_id"], json!(id.to_string()));
    }

    #[test]
    fn prepare_document_rejects_non_objects() {
        assert!(matches!(
            prepare_document("c", json!([1, 2])),
            Err(DbError::InvalidDocument { .. })
        ));
    }

    #[test]
    fn prepare_document_rejects_malformed_id() {
        assert!(matches!(
            prepare_document("c", json!({"_id": "nope"})),
            Err(DbError::InvalidDocument { .. })
        ));
    }
}
