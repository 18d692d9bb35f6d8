//! Postgres-backed [`DocumentStore`] over the `documents` JSONB table.

use async_trait::async_trait;
use serde_json::{Map, Value};
use shelfwise_core::EntityId;
use sqlx::PgPool;

use crate::store::{prepare_document, set_document_id, DocumentStore, Filter, FindOptions};
use crate::DbError;

/// Stores every collection in one `documents(collection, id, body)` table.
///
/// Filters use JSONB containment (`body @> filter`), which is equality for the
/// scalar top-level fields the pipeline filters on.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Value>, DbError> {
        let limit = options
            .limit
            .map_or(i64::MAX, |l| i64::try_from(l).unwrap_or(i64::MAX));

        // An empty sort field keeps insertion order.
        let rows: Vec<Value> = sqlx::query_scalar::<_, Value>(
            "SELECT body FROM documents \
             WHERE collection = $1 AND body @> $2 \
             ORDER BY \
                 CASE WHEN $3 = '' THEN NULL ELSE (body->>$3)::timestamptz END DESC NULLS LAST, \
                 CASE WHEN $3 = '' THEN created_at END ASC, \
                 created_at DESC \
             LIMIT $4",
        )
        .bind(collection)
        .bind(filter.to_json())
        .bind(options.newest_first_by.as_deref().unwrap_or(""))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn insert(&self, collection: &str, doc: Value) -> Result<EntityId, DbError> {
        let (id, doc) = prepare_document(collection, doc)?;
        sqlx::query("INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(id.to_string())
            .bind(doc)
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    async fn replace_upsert(
        &self,
        collection: &str,
        filter: &Filter,
        doc: Value,
    ) -> Result<EntityId, DbError> {
        let (id, mut doc) = prepare_document(collection, doc)?;
        let mut tx = self.pool.begin().await?;

        // Serialize writers for the same key; the lock is released at commit.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(format!("{collection}:{filter}"))
            .execute(&mut *tx)
            .await?;

        let existing: Option<String> = sqlx::query_scalar(
            "SELECT id FROM documents \
             WHERE collection = $1 AND body @> $2 \
             ORDER BY created_at ASC \
             LIMIT 1",
        )
        .bind(collection)
        .bind(filter.to_json())
        .fetch_optional(&mut *tx)
        .await?;

        let stored_id = if let Some(existing) = existing {
            let kept: EntityId = existing.parse().map_err(|e| DbError::InvalidDocument {
                collection: collection.to_string(),
                reason: format!("{e}"),
            })?;
            set_document_id(&mut doc, kept);
            sqlx::query(
                "UPDATE documents SET body = $3, updated_at = NOW() \
                 WHERE collection = $1 AND id = $2",
            )
            .bind(collection)
            .bind(&existing)
            .bind(doc)
            .execute(&mut *tx)
            .await?;
            kept
        } else {
            sqlx::query("INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)")
                .bind(collection)
                .bind(id.to_string())
                .bind(doc)
                .execute(&mut *tx)
                .await?;
            id
        };

        tx.commit().await?;
        tracing::debug!(collection, id = %stored_id, "document upserted");
        Ok(stored_id)
    }

    async fn update_fields(
        &self,
        collection: &str,
        filter: &Filter,
        mut fields: Map<String, Value>,
    ) -> Result<u64, DbError> {
        fields.remove("_id");
        let result = sqlx::query(
            "UPDATE documents SET body = body || $3, updated_at = NOW() \
             WHERE collection = $1 AND body @> $2",
        )
        .bind(collection)
        .bind(filter.to_json())
        .bind(Value::Object(fields))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND body @> $2")
            .bind(collection)
            .bind(filter.to_json())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
