//! Scrape, sentiment, and report command handlers.

use shelfwise_core::{AppConfig, EntityId};
use shelfwise_db::DocumentStore;
use shelfwise_report::{
    Cl100kTokenizer, InMemoryVectorMemory, OpenAiGenerationClient, QdrantVectorMemory,
    ReportStage, UnifiedReportAssembler, VectorMemory,
};
use shelfwise_scraper::{ExtractorClient, ScrapeOrchestrator};
use shelfwise_sentiment::SentimentStage;

use crate::print_json;

/// Scrape `count` listings per platform for the entity and print the
/// per-platform outcomes. Platform failures are part of the output, not errors.
pub(crate) async fn run_scrape(
    store: &dyn DocumentStore,
    config: &AppConfig,
    entity_id: EntityId,
    count: usize,
) -> anyhow::Result<()> {
    let client = ExtractorClient::from_app_config(config)
        .map_err(|e| anyhow::anyhow!("failed to build extractor client: {e}"))?;
    let registry = client.registry();
    let response = ScrapeOrchestrator::new(store, &registry)
        .with_max_concurrent_platforms(config.max_concurrent_platforms)
        .scrape_entity(entity_id, count)
        .await?;

    if response.failed_platforms() > 0 {
        eprintln!(
            "warning: {} of {} platform(s) failed",
            response.failed_platforms(),
            response.results.len()
        );
    }
    print_json(&response)
}

pub(crate) async fn run_sentiment(
    store: &dyn DocumentStore,
    scraped_record_id: EntityId,
) -> anyhow::Result<()> {
    let sentiment = SentimentStage::new(store).analyze(scraped_record_id).await?;
    print_json(&sentiment)
}

/// Generate and store a report answering `question`.
///
/// Uses Qdrant-backed retrieval when TEI and Qdrant are both configured.
pub(crate) async fn run_ask(
    store: &dyn DocumentStore,
    config: &AppConfig,
    entity_id: EntityId,
    question: &str,
) -> anyhow::Result<()> {
    let client = OpenAiGenerationClient::from_app_config(config)?
        .ok_or_else(|| anyhow::anyhow!("OPENAI_API_KEY is not set"))?;
    let tokenizer = Cl100kTokenizer::new()?;

    let mut memory: Box<dyn VectorMemory> = match config.qdrant_memory_endpoints() {
        Some((tei_url, qdrant_url)) => Box::new(
            QdrantVectorMemory::for_entity(
                qdrant_url,
                tei_url,
                entity_id,
                config.memory_timeout_secs,
            )?
            .with_score_threshold(config.memory_score_threshold),
        ),
        None => Box::new(InMemoryVectorMemory::new()),
    };

    let report = ReportStage::new(store, &tokenizer)
        .with_max_tokens(config.chunk_max_tokens)
        .with_top_k(config.memory_top_k)
        .generate(question, entity_id, memory.as_mut(), &client)
        .await?;
    print_json(&report)
}

pub(crate) async fn run_unified_report(
    store: &dyn DocumentStore,
    entity_id: EntityId,
) -> anyhow::Result<()> {
    let unified = UnifiedReportAssembler::new(store).assemble(entity_id).await?;
    print_json(&unified)
}

pub(crate) async fn run_list_scraped(
    store: &dyn DocumentStore,
    entity_id: EntityId,
) -> anyhow::Result<()> {
    let records = shelfwise_db::list_scraped_records(store, entity_id).await?;
    if records.is_empty() {
        eprintln!("no scraped records for {entity_id}; run `scrape {entity_id}` first");
    }
    print_json(&records)
}

pub(crate) async fn run_logs(store: &dyn DocumentStore, limit: usize) -> anyhow::Result<()> {
    print_json(&shelfwise_db::list_run_logs(store, limit).await?)
}
