use shelfwise_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SentimentError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("sentiment persistence failed: {0}")]
    Persistence(#[from] DbError),
}
