//! Qdrant-backed [`VectorMemory`], embedding through TEI.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shelfwise_core::EntityId;

use crate::embeddings::TeiClient;
use crate::error::ReportError;
use crate::http::build_client;
use crate::memory::{MemoryEntry, VectorMemory};

pub const DEFAULT_SCORE_THRESHOLD: f32 = 0.4;

/// One Qdrant collection per memory; clearing drops the collection.
///
/// The collection is created lazily on the first `add`, sized to the
/// embedding dimension TEI returns.
#[derive(Debug)]
pub struct QdrantVectorMemory {
    client: reqwest::Client,
    base_url: String,
    collection: String,
    tei: TeiClient,
    score_threshold: f32,
    collection_ready: bool,
    added: u64,
}

#[derive(Serialize)]
struct CreateCollectionRequest {
    vectors: VectorsConfig,
}

#[derive(Serialize)]
struct VectorsConfig {
    size: usize,
    distance: &'static str,
}

#[derive(Serialize)]
struct UpsertPointsRequest<'a> {
    points: [Point<'a>; 1],
}

#[derive(Serialize)]
struct Point<'a> {
    id: u64,
    vector: Vec<f32>,
    payload: &'a MemoryEntry,
}

#[derive(Serialize)]
struct SearchRequest {
    vector: Vec<f32>,
    limit: usize,
    score_threshold: f32,
    with_payload: bool,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    result: Vec<ScoredPoint>,
}

#[derive(Deserialize)]
struct ScoredPoint {
    payload: MemoryEntry,
}

impl QdrantVectorMemory {
    /// Requests to both services are abandoned after `timeout_secs`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Upstream`] if the HTTP client cannot be built.
    pub fn new(
        qdrant_url: &str,
        tei_url: &str,
        collection: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, ReportError> {
        let client = build_client(timeout_secs)?;
        Ok(Self {
            tei: TeiClient::new(client.clone(), tei_url),
            client,
            base_url: qdrant_url.trim_end_matches('/').to_string(),
            collection: collection.into(),
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            collection_ready: false,
            added: 0,
        })
    }

    /// Memory scoped to one entity's collection.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Upstream`] if the HTTP client cannot be built.
    pub fn for_entity(
        qdrant_url: &str,
        tei_url: &str,
        entity_id: EntityId,
        timeout_secs: u64,
    ) -> Result<Self, ReportError> {
        Self::new(
            qdrant_url,
            tei_url,
            format!("shelfwise_{entity_id}"),
            timeout_secs,
        )
    }

    #[must_use]
    pub fn with_score_threshold(mut self, score_threshold: f32) -> Self {
        self.score_threshold = score_threshold;
        self
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.base_url, self.collection)
    }

    async fn ensure_collection(&mut self, dimension: usize) -> Result<(), ReportError> {
        if self.collection_ready {
            return Ok(());
        }

        let body = CreateCollectionRequest {
            vectors: VectorsConfig {
                size: dimension,
                distance: "Cosine",
            },
        };
        let resp = self
            .client
            .put(self.collection_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| ReportError::Upstream(format!("collection create request failed: {e}")))?;

        // 409: created by an earlier run that never cleared.
        if !resp.status().is_success() && resp.status() != reqwest::StatusCode::CONFLICT {
            return Err(ReportError::Upstream(format!(
                "collection create returned status {}",
                resp.status()
            )));
        }

        self.collection_ready = true;
        Ok(())
    }
}

#[async_trait]
impl VectorMemory for QdrantVectorMemory {
    async fn clear(&mut self) -> Result<(), ReportError> {
        let resp = self
            .client
            .delete(self.collection_url())
            .send()
            .await
            .map_err(|e| ReportError::Upstream(format!("collection delete request failed: {e}")))?;

        if !resp.status().is_success() && resp.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(ReportError::Upstream(format!(
                "collection delete returned status {}",
                resp.status()
            )));
        }

        self.collection_ready = false;
        self.added = 0;
        tracing::debug!(collection = %self.collection, "vector memory cleared");
        Ok(())
    }

    async fn add(&mut self, entry: MemoryEntry) -> Result<(), ReportError> {
        let vector = self.tei.embed_one(&entry.content).await?;
        self.ensure_collection(vector.len()).await?;

        let body = UpsertPointsRequest {
            points: [Point {
                id: point_id(&self.collection, self.added, &entry.content),
                vector,
                payload: &entry,
            }],
        };
        let resp = self
            .client
            .put(format!("{}/points?wait=true", self.collection_url()))
            .json(&body)
            .send()
            .await
            .map_err(|e| ReportError::Upstream(format!("upsert request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(ReportError::Upstream(format!(
                "upsert returned status {}",
                resp.status()
            )));
        }

        self.added += 1;
        Ok(())
    }

    async fn query(&self, text: &str, k: usize) -> Result<Vec<MemoryEntry>, ReportError> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let body = SearchRequest {
            vector: self.tei.embed_one(text).await?,
            limit: k,
            score_threshold: self.score_threshold,
            with_payload: true,
        };
        let resp = self
            .client
            .post(format!("{}/points/search", self.collection_url()))
            .json(&body)
            .send()
            .await
            .map_err(|e| ReportError::Upstream(format!("search request failed: {e}")))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !resp.status().is_success() {
            return Err(ReportError::Upstream(format!(
                "search returned status {}",
                resp.status()
            )));
        }

        let parsed: SearchResponse = resp
            .json()
            .await
            .map_err(|e| ReportError::Upstream(format!("search response parse error: {e}")))?;
        Ok(parsed.result.into_iter().map(|p| p.payload).collect())
    }
}

/// Stable point id: the first 8 bytes of SHA-256 over collection, position,
/// and content, read big-endian.
pub(crate) fn point_id(collection: &str, position: u64, content: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(collection.as_bytes());
    hasher.update(position.to_be_bytes());
    hasher.update(content.as_bytes());
    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash[..8]);
    u64::from_be_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_id_is_stable() {
        assert_eq!(point_id("c", 0, "text"), point_id("c", 0, "text"));
    }

    #[test]
    fn repeated_content_gets_distinct_points() {
        assert_ne!(point_id("c", 0, "great"), point_id("c", 1, "great"));
        assert_ne!(point_id("a", 0, "great"), point_id("b", 0, "great"));
    }

    #[test]
    fn entity_collections_are_namespaced() {
        let id = EntityId::new();
        let memory = QdrantVectorMemory::for_entity("http://q", "http://t", id, 5).unwrap();
        assert_eq!(memory.collection(), format!("shelfwise_{id}"));
    }
}
