//! Review sentiment for scraped products.
//!
//! Scores each review of a single-product scrape with a lexicon-based
//! compound polarity, aggregates counts, keywords, and extreme reviews, and
//! upserts one snapshot per `(entity, platform)`.

pub mod error;
pub mod keywords;
pub mod scorer;
pub mod stage;

pub use error::SentimentError;
pub use keywords::{top_keywords, TOP_KEYWORDS};
pub use scorer::{classify, LexiconScorer, Polarity, PolarityScorer};
pub use stage::SentimentStage;
