//! Grounded generation: the capability and an OpenAI-compatible client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shelfwise_core::AppConfig;

use crate::coerce::ReportDraft;
use crate::error::ReportError;
use crate::http::build_client;
use crate::memory::MemoryEntry;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub const ANALYST_PROMPT: &str = "\
You are a product intelligence analyst for e-commerce sellers.

Analyze the product data you are given (customer reviews, specifications, \
pricing and feature comparisons) and produce a concise competitive summary \
that helps a seller decide how to improve, price, market, or avoid the product.

Think from the seller's perspective: what users like and dislike, the \
product's strengths and weaknesses, features missing compared to competitors, \
how pricing compares across platforms, and whether the product is worth carrying.

Be objective. Avoid vague language. Use only insights found in the provided data.

Answer with a single JSON object with these keys:
  buyOrSkip: one of \"buy\", \"skip\", \"neutral\"
  pros, cons, featureGaps: arrays of short strings
  pricingSummary, platformRecommendation: strings
  summary: string
  strengths, improvementOpportunities, recommendations: arrays of short strings";

/// What the generation service handed back, before coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResponse {
    /// Already matches the report shape.
    Structured(ReportDraft),
    /// A JSON object that does not match the shape verbatim.
    RawMap(Map<String, Value>),
    Freeform(String),
}

impl GenerationResponse {
    /// Classify raw model output. Markdown code fences around JSON are ignored.
    #[must_use]
    pub fn from_content(content: &str) -> Self {
        match serde_json::from_str::<Value>(strip_code_fence(content)) {
            Ok(Value::Object(map)) => {
                match serde_json::from_value::<ReportDraft>(Value::Object(map.clone())) {
                    Ok(draft) => GenerationResponse::Structured(draft),
                    Err(_) => GenerationResponse::RawMap(map),
                }
            }
            _ => GenerationResponse::Freeform(content.to_string()),
        }
    }
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// A language model answering a question from retrieved context.
#[async_trait]
pub trait GroundedGenerationClient: Send + Sync {
    async fn run(
        &self,
        query: &str,
        context: &[MemoryEntry],
    ) -> Result<GenerationResponse, ReportError>;

    /// Release per-run resources. Called once after every run, whatever the
    /// outcome.
    async fn close(&self) {}

    /// Recorded as `generatedBy` when the response leaves it empty.
    fn model(&self) -> &str;
}

/// Chat-completions client for OpenAI and compatible endpoints.
pub struct OpenAiGenerationClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for OpenAiGenerationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiGenerationClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"[redacted]")
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage; 2],
    response_format: ResponseFormat,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiGenerationClient {
    /// Requests are abandoned after `timeout_secs`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Upstream`] if the HTTP client cannot be built.
    pub fn new(api_key: &str, model: &str, timeout_secs: u64) -> Result<Self, ReportError> {
        Ok(Self {
            http: build_client(timeout_secs)?,
            api_key: api_key.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.to_string(),
        })
    }

    #[must_use]
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// `Ok(None)` when no API key is configured.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Upstream`] if the HTTP client cannot be built.
    pub fn from_app_config(config: &AppConfig) -> Result<Option<Self>, ReportError> {
        let Some(api_key) = config.openai_api_key.as_deref() else {
            return Ok(None);
        };
        let client = Self::new(
            api_key,
            &config.generation_model,
            config.generation_timeout_secs,
        )?;
        Ok(Some(client.with_base_url(&config.generation_base_url)))
    }
}

/// The user turn: retrieved context, numbered, then the question.
pub(crate) fn grounded_prompt(query: &str, context: &[MemoryEntry]) -> String {
    let mut prompt = String::from("Relevant product data:\n");
    if context.is_empty() {
        prompt.push_str("(none)\n");
    }
    for (i, entry) in context.iter().enumerate() {
        let kind = entry.kind().unwrap_or("text");
        prompt.push_str(&format!("{}. [{kind}] {}\n", i + 1, entry.content));
    }
    prompt.push_str("\nQuestion: ");
    prompt.push_str(query);
    prompt
}

#[async_trait]
impl GroundedGenerationClient for OpenAiGenerationClient {
    async fn run(
        &self,
        query: &str,
        context: &[MemoryEntry],
    ) -> Result<GenerationResponse, ReportError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: ANALYST_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: grounded_prompt(query, context),
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
            temperature: 0.2,
        };

        tracing::debug!(model = %self.model, context = context.len(), "generation request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(ReportError::Upstream(format!(
                "generation API error ({status}): {error_text}"
            )));
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ReportError::Upstream("no response from generation API".to_string()))?;

        Ok(GenerationResponse::from_content(&content))
    }

    async fn close(&self) {
        tracing::debug!(model = %self.model, "generation session closed");
    }

    fn model(&self) -> &str {
        &self.model
    }
}
