#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Base URL of the platform extraction service.
    pub extractor_url: String,
    pub extractor_timeout_secs: u64,
    pub extractor_user_agent: String,
    pub extractor_max_retries: u32,
    pub extractor_backoff_base_secs: u64,
    /// Platforms scraped in parallel for one entity. `1` keeps the loop sequential.
    pub max_concurrent_platforms: usize,
    pub competitor_count: usize,
    pub chunk_max_tokens: usize,
    pub memory_top_k: usize,
    pub memory_score_threshold: f32,
    /// Timeout for embedding and vector-store requests.
    pub memory_timeout_secs: u64,
    pub tei_url: Option<String>,
    pub qdrant_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub generation_base_url: String,
    pub generation_model: String,
    pub generation_timeout_secs: u64,
}

impl AppConfig {
    /// Qdrant-backed retrieval is only available when both TEI and Qdrant are configured.
    #[must_use]
    pub fn qdrant_memory_endpoints(&self) -> Option<(&str, &str)> {
        match (&self.tei_url, &self.qdrant_url) {
            (Some(tei), Some(qdrant)) => Some((tei.as_str(), qdrant.as_str())),
            _ => None,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("extractor_url", &self.extractor_url)
            .field("extractor_timeout_secs", &self.extractor_timeout_secs)
            .field("extractor_user_agent", &self.extractor_user_agent)
            .field("extractor_max_retries", &self.extractor_max_retries)
            .field(
                "extractor_backoff_base_secs",
                &self.extractor_backoff_base_secs,
            )
            .field("max_concurrent_platforms", &self.max_concurrent_platforms)
            .field("competitor_count", &self.competitor_count)
            .field("chunk_max_tokens", &self.chunk_max_tokens)
            .field("memory_top_k", &self.memory_top_k)
            .field("memory_score_threshold", &self.memory_score_threshold)
            .field("memory_timeout_secs", &self.memory_timeout_secs)
            .field("tei_url", &self.tei_url)
            .field("qdrant_url", &self.qdrant_url)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("generation_base_url", &self.generation_base_url)
            .field("generation_model", &self.generation_model)
            .field("generation_timeout_secs", &self.generation_timeout_secs)
            .finish()
    }
}
