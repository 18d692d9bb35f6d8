//! Domain types and configuration shared by every shelfwise crate.

pub mod app_config;
pub mod config;
pub mod entity;
pub mod ids;
pub mod records;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use entity::{EntityKind, EntityStatus, NewTrackedEntity, TrackedEntity};
pub use ids::EntityId;
pub use records::{
    CompetitorBundle, ProductSnapshot, RawReview, ReportRecord, Review, RunLog, RunStatus,
    ScrapedRecord, SentimentRecord, SentimentSummary, SentimentKeywords, Verdict,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid entity id \"{0}\": expected 24 hex characters")]
    InvalidEntityId(String),

    #[error("invalid entity kind: {0}")]
    InvalidKind(String),

    #[error("invalid entity status: {0}")]
    InvalidStatus(String),
}
