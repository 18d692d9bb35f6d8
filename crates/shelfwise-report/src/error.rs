use shelfwise_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("{0} not found")]
    NotFound(String),

    /// Generation service, embedding service, or vector store failure.
    #[error("upstream failure: {0}")]
    Upstream(String),

    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    #[error(transparent)]
    Persistence(#[from] DbError),
}

impl From<reqwest::Error> for ReportError {
    fn from(err: reqwest::Error) -> Self {
        ReportError::Upstream(err.to_string())
    }
}

/// Failure of a whole report generation, always displayed as `error: <detail>`.
#[derive(Debug, Error)]
#[error("error: {0}")]
pub struct GenerateError(#[from] pub ReportError);

impl GenerateError {
    /// `true` when the entity had no scraped data to analyze.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self.0, ReportError::NotFound(_))
    }
}

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("Product not found")]
    ReportNotFound,

    #[error("Sentiment not found")]
    SentimentNotFound,

    #[error(transparent)]
    Persistence(#[from] DbError),
}
