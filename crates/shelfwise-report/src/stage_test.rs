use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;
use shelfwise_core::{Review, ScrapedRecord, Verdict};
use shelfwise_db::{collections, get_report, insert_scraped_record, MemoryDocumentStore};

use super::*;
use crate::coerce::ReportDraft;
use crate::generation::GenerationResponse;
use crate::memory::{InMemoryVectorMemory, MemoryEntry};

struct CharTokenizer;

impl Tokenizer for CharTokenizer {
    fn encode(&self, text: &str) -> Vec<u32> {
        text.chars().map(u32::from).collect()
    }

    fn decode_bytes(&self, tokens: &[u32]) -> Result<Vec<u8>, ReportError> {
        Ok(tokens
            .iter()
            .filter_map(|t| char::from_u32(*t))
            .collect::<String>()
            .into_bytes())
    }
}

enum Script {
    Respond(GenerationResponse),
    Fail(&'static str),
}

/// Replays one scripted answer and records what it was asked.
struct ScriptedClient {
    script: Script,
    runs: Mutex<Vec<(String, Vec<MemoryEntry>)>>,
    closes: AtomicUsize,
}

impl ScriptedClient {
    fn new(script: Script) -> Self {
        Self {
            script,
            runs: Mutex::new(Vec::new()),
            closes: AtomicUsize::new(0),
        }
    }

    fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    fn runs(&self) -> usize {
        self.runs.lock().unwrap().len()
    }
}

#[async_trait]
impl GroundedGenerationClient for ScriptedClient {
    async fn run(
        &self,
        query: &str,
        context: &[MemoryEntry],
    ) -> Result<GenerationResponse, ReportError> {
        self.runs
            .lock()
            .unwrap()
            .push((query.to_string(), context.to_vec()));
        match &self.script {
            Script::Respond(response) => Ok(response.clone()),
            Script::Fail(reason) => Err(ReportError::Upstream((*reason).to_string())),
        }
    }

    async fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }

    fn model(&self) -> &str {
        "scripted-model"
    }
}

async fn seed(store: &MemoryDocumentStore, entity_id: EntityId) {
    let scraped_at = Utc::now();
    let record = ScrapedRecord {
        id: EntityId::at(scraped_at),
        entity_id,
        platform: "amazon".to_string(),
        url: "https://shop.example/p".to_string(),
        title: "Trail Running Shoe".to_string(),
        brand: Some("Acme".to_string()),
        price: Some(89.0),
        rating: Some(4.1),
        specifications: BTreeMap::from([("Weight".to_string(), "240 g".to_string())]),
        reviews: vec![
            Review::from_body("great grip on wet rock"),
            Review::from_body("sole wore out after two months"),
            Review::from_body("runs half a size small"),
            Review::from_body("light and breathable"),
        ],
        scraped_at,
    };
    insert_scraped_record(store, &record).await.unwrap();
}

fn draft(verdict: Verdict) -> ReportDraft {
    ReportDraft {
        buy_or_skip: verdict,
        pros: vec!["grip".to_string()],
        cons: vec!["durability".to_string()],
        feature_gaps: vec!["wide sizes".to_string()],
        pricing_summary: "mid-range".to_string(),
        platform_recommendation: "amazon".to_string(),
        generated_by: String::new(),
        generated_at: None,
        summary: Some("Solid trail shoe with a weak sole.".to_string()),
        strengths: None,
        improvement_opportunities: None,
        recommendations: None,
    }
}

#[tokio::test]
async fn structured_answer_is_stored_for_the_entity() {
    let store = MemoryDocumentStore::new();
    let entity_id = EntityId::new();
    seed(&store, entity_id).await;
    let tokenizer = CharTokenizer;
    let mut memory = InMemoryVectorMemory::new();
    let client = ScriptedClient::new(Script::Respond(GenerationResponse::Structured(draft(
        Verdict::Buy,
    ))));

    let report = ReportStage::new(&store, &tokenizer)
        .generate("How is the grip?", entity_id, &mut memory, &client)
        .await
        .unwrap();

    assert_eq!(report.entity_id, entity_id);
    assert_eq!(report.buy_or_skip, Verdict::Buy);
    assert_eq!(report.generated_by, "scripted-model");
    assert_eq!(report.strengths, Some(vec!["grip".to_string()]));
    assert_eq!(client.closes(), 1);

    let runs = client.runs.lock().unwrap();
    let (query, context) = &runs[0];
    assert_eq!(query, "How is the grip?");
    assert_eq!(context.len(), DEFAULT_TOP_K);
    assert_eq!(context[0].content, "great grip on wet rock");

    let stored = get_report(&store, entity_id).await.unwrap().unwrap();
    assert_eq!(stored, report);
}

#[tokio::test]
async fn model_supplied_identity_is_replaced() {
    let store = MemoryDocumentStore::new();
    let entity_id = EntityId::new();
    seed(&store, entity_id).await;
    let tokenizer = CharTokenizer;
    let mut memory = InMemoryVectorMemory::new();
    let map = match json!({
        "product_id": EntityId::new().to_string(),
        "entityId": "garbage",
        "buy_or_skip": "Neutral",
        "pros": [], "cons": [], "feature_gaps": [],
        "pricing_summary": "", "platform_recommendation": "",
    }) {
        serde_json::Value::Object(map) => map,
        _ => unreachable!(),
    };
    let client = ScriptedClient::new(Script::Respond(GenerationResponse::RawMap(map)));

    let report = ReportStage::new(&store, &tokenizer)
        .generate("verdict?", entity_id, &mut memory, &client)
        .await
        .unwrap();

    assert_eq!(report.entity_id, entity_id);
    assert!(get_report(&store, entity_id).await.unwrap().is_some());
}

#[tokio::test]
async fn freeform_answer_stores_stub() {
    let store = MemoryDocumentStore::new();
    let entity_id = EntityId::new();
    seed(&store, entity_id).await;
    let tokenizer = CharTokenizer;
    let mut memory = InMemoryVectorMemory::new();
    let client = ScriptedClient::new(Script::Respond(GenerationResponse::Freeform(
        "Looks like a decent shoe overall.".to_string(),
    )));

    let report = ReportStage::new(&store, &tokenizer)
        .generate("thoughts?", entity_id, &mut memory, &client)
        .await
        .unwrap();

    assert_eq!(report.buy_or_skip, Verdict::Neutral);
    assert!(report.pros.is_empty());
    assert_eq!(report.entity_id, entity_id);
    assert_eq!(get_report(&store, entity_id).await.unwrap(), Some(report));
}

#[tokio::test]
async fn regeneration_replaces_the_single_report() {
    let store = MemoryDocumentStore::new();
    let entity_id = EntityId::new();
    seed(&store, entity_id).await;
    let tokenizer = CharTokenizer;
    let stage = ReportStage::new(&store, &tokenizer);

    let mut memory = InMemoryVectorMemory::new();
    let first = stage
        .generate(
            "q",
            entity_id,
            &mut memory,
            &ScriptedClient::new(Script::Respond(GenerationResponse::Structured(draft(Verdict::Buy)))),
        )
        .await
        .unwrap();
    let second = stage
        .generate(
            "q",
            entity_id,
            &mut memory,
            &ScriptedClient::new(Script::Respond(GenerationResponse::Structured(draft(Verdict::Skip)))),
        )
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(store.count(collections::REPORTS), 1);
    let stored = get_report(&store, entity_id).await.unwrap().unwrap();
    assert_eq!(stored.buy_or_skip, Verdict::Skip);
}

#[tokio::test]
async fn generation_failure_is_wrapped_and_client_closed() {
    let store = MemoryDocumentStore::new();
    let entity_id = EntityId::new();
    seed(&store, entity_id).await;
    let tokenizer = CharTokenizer;
    let mut memory = InMemoryVectorMemory::new();
    let client = ScriptedClient::new(Script::Fail("model overloaded"));

    let err = ReportStage::new(&store, &tokenizer)
        .generate("q", entity_id, &mut memory, &client)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "error: upstream failure: model overloaded");
    assert!(!err.is_not_found());
    assert_eq!(client.closes(), 1);
    assert_eq!(store.count(collections::REPORTS), 0);
}

#[tokio::test]
async fn missing_scrape_is_not_found_without_calling_the_model() {
    let store = MemoryDocumentStore::new();
    let tokenizer = CharTokenizer;
    let mut memory = InMemoryVectorMemory::new();
    let client = ScriptedClient::new(Script::Fail("unused"));

    let err = ReportStage::new(&store, &tokenizer)
        .generate("q", EntityId::new(), &mut memory, &client)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(err.to_string().starts_with("error: "));
    assert_eq!(client.runs(), 0);
    assert_eq!(client.closes(), 1);
}
