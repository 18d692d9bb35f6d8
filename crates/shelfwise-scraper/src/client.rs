use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use shelfwise_core::{AppConfig, ProductSnapshot};

use crate::error::ScraperError;
use crate::extractor::{Extractor, ExtractorRegistry};
use crate::platform::Platform;
use crate::rate_limit::retry_with_backoff;

/// HTTP client for the platform extraction service.
///
/// The service exposes `GET {base}/extract/{platform}?query=..&count=..` and
/// answers with a JSON array of products, a single product object, or
/// `{"products": [...]}`. A bare `{"error": "..."}` body is a whole-call
/// failure.
///
/// Transient errors (429, 5xx, network failures) are retried with
/// exponential backoff up to `max_retries` additional attempts.
#[derive(Debug, Clone)]
pub struct ExtractorClient {
    client: Client,
    base_url: String,
    max_retries: u32,
    backoff_base_secs: u64,
}

impl ExtractorClient {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            max_retries,
            backoff_base_secs,
        })
    }

    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the client cannot be constructed.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Self::new(
            &config.extractor_url,
            config.extractor_timeout_secs,
            &config.extractor_user_agent,
            config.extractor_max_retries,
            config.extractor_backoff_base_secs,
        )
    }

    /// Registry with a [`RemoteExtractor`] for every [`Platform`].
    #[must_use]
    pub fn registry(&self) -> ExtractorRegistry {
        Platform::ALL
            .into_iter()
            .fold(ExtractorRegistry::new(), |registry, platform| {
                registry.with(
                    platform,
                    Arc::new(RemoteExtractor {
                        client: self.clone(),
                        platform,
                    }),
                )
            })
    }

    /// Fetch products for `query` from one platform.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::RateLimited`]: HTTP 429 after all retries.
    /// - [`ScraperError::UnexpectedStatus`]: any other non-2xx status.
    /// - [`ScraperError::Http`]: network failure after all retries.
    /// - [`ScraperError::Deserialize`]: body is not the expected JSON.
    /// - [`ScraperError::Upstream`]: the service reported a failure in the body.
    pub async fn extract(
        &self,
        platform: Platform,
        query: &str,
        count: usize,
    ) -> Result<Vec<ProductSnapshot>, ScraperError> {
        let url = self.extract_url(platform, query, count)?;

        let body = retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .get(url.clone())
                    .header(reqwest::header::ACCEPT, "application/json")
                    .send()
                    .await?;
                let status = response.status();

                if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after_secs = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);
                    return Err(ScraperError::RateLimited {
                        domain: url.host_str().unwrap_or_default().to_owned(),
                        retry_after_secs,
                    });
                }

                if !status.is_success() {
                    return Err(ScraperError::UnexpectedStatus {
                        status: status.as_u16(),
                        url: url.to_string(),
                    });
                }

                Ok(response.text().await?)
            }
        })
        .await?;

        parse_products(platform, &body)
    }

    fn extract_url(
        &self,
        platform: Platform,
        query: &str,
        count: usize,
    ) -> Result<reqwest::Url, ScraperError> {
        let base = format!("{}/extract/{platform}", self.base_url);
        let mut url = reqwest::Url::parse(&base).map_err(|e| ScraperError::InvalidUrl {
            url: base.clone(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("count", &count.to_string());
        Ok(url)
    }
}

/// Normalize an extractor body to a product sequence.
fn parse_products(platform: Platform, body: &str) -> Result<Vec<ProductSnapshot>, ScraperError> {
    let deserialize = |source: serde_json::Error| ScraperError::Deserialize {
        context: format!("{platform} extractor response"),
        source,
    };

    let value: Value = serde_json::from_str(body).map_err(deserialize)?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut object) => {
            if let Some(Value::Array(items)) = object.remove("products") {
                items
            } else if object.len() == 1 && object.contains_key("error") {
                let message = match object.remove("error") {
                    Some(Value::String(message)) => message,
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                return Err(ScraperError::Upstream {
                    platform: platform.to_string(),
                    message,
                });
            } else {
                vec![Value::Object(object)]
            }
        }
        Value::Null => Vec::new(),
        other => vec![other],
    };

    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(deserialize))
        .collect()
}

/// [`Extractor`] for one platform backed by the extraction service.
#[derive(Debug, Clone)]
pub struct RemoteExtractor {
    client: ExtractorClient,
    platform: Platform,
}

impl RemoteExtractor {
    #[must_use]
    pub fn new(client: ExtractorClient, platform: Platform) -> Self {
        Self { client, platform }
    }
}

#[async_trait]
impl Extractor for RemoteExtractor {
    async fn scrape(
        &self,
        query: &str,
        count: usize,
    ) -> Result<Vec<ProductSnapshot>, ScraperError> {
        self.client.extract(self.platform, query, count).await
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
