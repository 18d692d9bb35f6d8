use shelfwise_core::EntityId;
use shelfwise_db::DbError;
use thiserror::Error;

/// Transport and payload failures talking to a platform extractor.
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by {domain} (retry after {retry_after_secs}s)")]
    RateLimited {
        domain: String,
        retry_after_secs: u64,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("{platform} extractor failed: {message}")]
    Upstream { platform: String, message: String },

    #[error("invalid extractor URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Failures that cross the scrape driver boundary.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("entity {0} not found")]
    EntityNotFound(EntityId),

    #[error(transparent)]
    Persistence(#[from] DbError),
}
