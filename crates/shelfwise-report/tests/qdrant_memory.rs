//! `QdrantVectorMemory` against wiremock stand-ins for TEI and Qdrant.

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shelfwise_core::EntityId;
use shelfwise_report::{EntryKind, MemoryEntry, QdrantVectorMemory, ReportError, VectorMemory};

async fn tei() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([[0.1, 0.2, 0.3]])))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn clear_add_and_query_round_trip_through_qdrant() {
    let tei = tei().await;
    let qdrant = MockServer::start().await;
    let entity_id = EntityId::new();
    let collection = format!("/collections/shelfwise_{entity_id}");
    let stored = MemoryEntry::text(EntryKind::Review, entity_id, "battery lasts two days")
        .with_metadata("reviewIndex", 0)
        .with_metadata("chunkIndex", 0);

    Mock::given(method("DELETE"))
        .and(path(collection.as_str()))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&qdrant)
        .await;
    Mock::given(method("PUT"))
        .and(path(collection.as_str()))
        .and(body_partial_json(json!({"vectors": {"size": 3, "distance": "Cosine"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": true})))
        .expect(1)
        .mount(&qdrant)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{collection}/points")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(2)
        .mount(&qdrant)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{collection}/points/search")))
        .and(body_partial_json(json!({
            "limit": 2,
            "score_threshold": 0.5,
            "with_payload": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [{"id": 7, "score": 0.91, "payload": stored}]
        })))
        .expect(1)
        .mount(&qdrant)
        .await;

    let mut memory = QdrantVectorMemory::for_entity(&qdrant.uri(), &tei.uri(), entity_id, 5)
        .unwrap()
        .with_score_threshold(0.5);
    memory.clear().await.unwrap();
    memory.add(stored.clone()).await.unwrap();
    memory
        .add(MemoryEntry::text(EntryKind::Metadata, entity_id, "{}"))
        .await
        .unwrap();

    let hits = memory.query("how long does the battery last", 2).await.unwrap();
    assert_eq!(hits, vec![stored]);
}

#[tokio::test]
async fn query_on_missing_collection_is_empty() {
    let tei = tei().await;
    let qdrant = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/collections/scratch/points/search"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&qdrant)
        .await;

    let memory = QdrantVectorMemory::new(&qdrant.uri(), &tei.uri(), "scratch", 5).unwrap();
    assert!(memory.query("anything", 3).await.unwrap().is_empty());
}

#[tokio::test]
async fn embedding_failure_is_upstream() {
    let tei = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embed"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&tei)
        .await;
    let qdrant = MockServer::start().await;

    let mut memory = QdrantVectorMemory::new(&qdrant.uri(), &tei.uri(), "scratch", 5).unwrap();
    let err = memory
        .add(MemoryEntry::text(EntryKind::Metadata, EntityId::new(), "{}"))
        .await
        .unwrap_err();
    assert!(matches!(err, ReportError::Upstream(message) if message.contains("503")));
}
