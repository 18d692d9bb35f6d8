//! Retrieval-grounded competitive-analysis reports.
//!
//! Each run clears a caller-owned vector memory, ingests the entity's latest
//! scraped record, retrieves context for the question, asks the generation
//! service, coerces whatever comes back into a [`ReportRecord`], and upserts
//! it. [`UnifiedReportAssembler`] joins the stored report with the latest
//! sentiment snapshot.
//!
//! [`ReportRecord`]: shelfwise_core::ReportRecord

pub mod chunking;
pub mod coerce;
mod embeddings;
pub mod error;
pub mod generation;
pub mod http;
pub mod memory;
pub mod qdrant;
pub mod stage;
pub mod tokenizer;
pub mod unified;

pub use chunking::{chunk, ChunkingIngestor, DEFAULT_MAX_TOKENS};
pub use coerce::{coerce, ReportDraft};
pub use error::{AssembleError, GenerateError, ReportError};
pub use generation::{
    GenerationResponse, GroundedGenerationClient, OpenAiGenerationClient, ANALYST_PROMPT,
};
pub use memory::{EntryKind, InMemoryVectorMemory, MemoryEntry, VectorMemory};
pub use qdrant::QdrantVectorMemory;
pub use stage::ReportStage;
pub use tokenizer::{Cl100kTokenizer, Tokenizer};
pub use unified::{UnifiedReport, UnifiedReportAssembler};
