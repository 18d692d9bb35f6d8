use chrono::Utc;
use shelfwise_core::{EntityId, SentimentKeywords, SentimentRecord, SentimentSummary};
use shelfwise_db::{get_scraped_record, upsert_sentiment, DocumentStore};

use crate::error::SentimentError;
use crate::keywords::{top_keywords, TOP_KEYWORDS};
use crate::scorer::{classify, LexiconScorer, Polarity, PolarityScorer};

static DEFAULT_SCORER: LexiconScorer = LexiconScorer;

/// Computes and stores the sentiment snapshot for one scraped record.
pub struct SentimentStage<'a> {
    store: &'a dyn DocumentStore,
    scorer: &'a dyn PolarityScorer,
}

struct Scored<'r> {
    body: &'r str,
    compound: f64,
    polarity: Polarity,
}

impl<'a> SentimentStage<'a> {
    #[must_use]
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            store,
            scorer: &DEFAULT_SCORER,
        }
    }

    #[must_use]
    pub fn with_scorer(mut self, scorer: &'a dyn PolarityScorer) -> Self {
        self.scorer = scorer;
        self
    }

    /// Score every review of a single-product scrape and upsert the result
    /// under its `(entity, platform)`.
    ///
    /// Competitor bundles are not looked up; their ids are reported as not found.
    ///
    /// # Errors
    ///
    /// - [`SentimentError::NotFound`] if the record is missing or has no reviews.
    /// - [`SentimentError::Persistence`] if the store fails.
    pub async fn analyze(&self, scraped_record_id: EntityId) -> Result<SentimentRecord, SentimentError> {
        let record = get_scraped_record(self.store, scraped_record_id)
            .await?
            .ok_or_else(|| SentimentError::NotFound(format!("scraped record {scraped_record_id}")))?;
        if record.reviews.is_empty() {
            return Err(SentimentError::NotFound(format!(
                "reviews for scraped record {scraped_record_id}"
            )));
        }

        let scored: Vec<Scored<'_>> = record
            .reviews
            .iter()
            .map(|review| {
                let compound = self.scorer.compound(&review.body);
                Scored {
                    body: &review.body,
                    compound,
                    polarity: classify(compound),
                }
            })
            .collect();

        let mut summary = SentimentSummary::default();
        for review in &scored {
            match review.polarity {
                Polarity::Positive => summary.positive += 1,
                Polarity::Negative => summary.negative += 1,
                Polarity::Neutral => summary.neutral += 1,
            }
        }

        let of = |polarity: Polarity| scored.iter().filter(move |r| r.polarity == polarity);
        // First review wins ties on both ends.
        let top_positive = of(Polarity::Positive)
            .fold(None::<&Scored<'_>>, |best, r| match best {
                Some(b) if b.compound >= r.compound => Some(b),
                _ => Some(r),
            })
            .map_or_else(String::new, |r| r.body.to_string());
        let top_negative = of(Polarity::Negative)
            .fold(None::<&Scored<'_>>, |worst, r| match worst {
                Some(w) if w.compound <= r.compound => Some(w),
                _ => Some(r),
            })
            .map_or_else(String::new, |r| r.body.to_string());

        let keywords = SentimentKeywords {
            positive: top_keywords(of(Polarity::Positive).map(|r| r.body), TOP_KEYWORDS),
            negative: top_keywords(of(Polarity::Negative).map(|r| r.body), TOP_KEYWORDS),
        };

        let processed_at = Utc::now();
        let mut sentiment = SentimentRecord {
            id: EntityId::at(processed_at),
            entity_id: record.entity_id,
            platform: record.platform.clone(),
            summary,
            keywords,
            top_positive_review: top_positive,
            top_negative_review: top_negative,
            processed_at,
        };
        sentiment.id = upsert_sentiment(self.store, &sentiment).await?;

        tracing::info!(
            entity_id = %sentiment.entity_id,
            platform = %sentiment.platform,
            %scraped_record_id,
            positive = summary.positive,
            negative = summary.negative,
            neutral = summary.neutral,
            "sentiment snapshot stored"
        );
        Ok(sentiment)
    }
}

#[cfg(test)]
#[path = "stage_test.rs"]
mod tests;
