//! Documents produced by the scrape, sentiment, and report stages.
//!
//! All cross-record references are [`EntityId`] values. Field names are
//! camelCase on the wire; `id` is stored as `_id`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::EntityId;

// ---------------------------------------------------------------------------
// Reviews and raw extractor payloads
// ---------------------------------------------------------------------------

/// A structured customer review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: String,
    #[serde(default, deserialize_with = "de_lenient_number")]
    pub rating: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Review {
    /// A review that only carries free text.
    #[must_use]
    pub fn from_body(body: impl Into<String>) -> Self {
        Self {
            title: None,
            body: body.into(),
            rating: None,
            timestamp: None,
        }
    }
}

/// A review as the extractor emits it: either an object or a bare string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawReview {
    Structured(Review),
    Text(String),
}

impl RawReview {
    /// Normalize to a [`Review`]; plain strings become the body.
    #[must_use]
    pub fn into_review(self) -> Review {
        match self {
            RawReview::Structured(review) => review,
            RawReview::Text(body) => Review::from_body(body),
        }
    }

    #[must_use]
    pub fn body(&self) -> &str {
        match self {
            RawReview::Structured(review) => &review.body,
            RawReview::Text(body) => body,
        }
    }
}

/// One product as returned by a platform extractor.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default, deserialize_with = "de_lenient_number")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "de_lenient_number")]
    pub rating: Option<f64>,
    #[serde(default, deserialize_with = "de_string_map")]
    pub specifications: BTreeMap<String, String>,
    #[serde(default)]
    pub reviews: Vec<RawReview>,
    /// Set by extractors that report a per-item failure inside a batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Persisted scrape results
// ---------------------------------------------------------------------------

/// Single-product scrape result with reviews kept as structured objects.
///
/// Never mutated after insert; a newer `scraped_at` supersedes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedRecord {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub entity_id: EntityId,
    pub platform: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub specifications: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "de_reviews")]
    pub reviews: Vec<Review>,
    pub scraped_at: DateTime<Utc>,
}

impl ScrapedRecord {
    /// Build a record from a single extractor product.
    #[must_use]
    pub fn from_snapshot(
        entity_id: EntityId,
        platform: &str,
        snapshot: ProductSnapshot,
        scraped_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EntityId::at(scraped_at),
            entity_id,
            platform: platform.to_string(),
            url: snapshot.url.unwrap_or_default(),
            title: snapshot.title.unwrap_or_default(),
            brand: snapshot.brand,
            price: snapshot.price,
            rating: snapshot.rating,
            specifications: snapshot.specifications,
            reviews: snapshot
                .reviews
                .into_iter()
                .map(RawReview::into_review)
                .collect(),
            scraped_at,
        }
    }
}

/// Multi-product scrape result for one platform, stored as one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorBundle {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub entity_id: EntityId,
    pub platform: String,
    pub products: Vec<ProductSnapshot>,
    pub scraped_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Run log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failed,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Success => write!(f, "success"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Append-only history entry for one extractor invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunLog {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<EntityId>,
    pub platform: String,
    pub query: String,
    /// Raw extractor payload, or `{"error": ...}`.
    pub result: Value,
    pub status: RunStatus,
    pub ran_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Sentiment
// ---------------------------------------------------------------------------

/// Review counts per polarity class. Counts sum to the number of reviews scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub positive: u32,
    pub negative: u32,
    pub neutral: u32,
}

impl SentimentSummary {
    #[must_use]
    pub fn total(&self) -> u32 {
        self.positive + self.negative + self.neutral
    }
}

/// Top keywords (by frequency) for each polar class.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SentimentKeywords {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

/// Sentiment snapshot, unique per `(entity_id, platform)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentRecord {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub entity_id: EntityId,
    pub platform: String,
    pub summary: SentimentSummary,
    pub keywords: SentimentKeywords,
    /// Empty when no review classified positive.
    pub top_positive_review: String,
    /// Empty when no review classified negative.
    pub top_negative_review: String,
    pub processed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Buy,
    Skip,
    #[default]
    Neutral,
}

/// Competitive-analysis report, at most one per entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    #[serde(rename = "_id")]
    pub id: EntityId,
    pub entity_id: EntityId,
    pub buy_or_skip: Verdict,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub feature_gaps: Vec<String>,
    pub pricing_summary: String,
    pub platform_recommendation: String,
    pub generated_by: String,
    pub generated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strengths: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub improvement_opportunities: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<String>>,
}

impl ReportRecord {
    /// The minimal well-formed record used when generation output is unusable.
    #[must_use]
    pub fn stub(entity_id: EntityId, generated_at: DateTime<Utc>) -> Self {
        Self {
            id: EntityId::at(generated_at),
            entity_id,
            buy_or_skip: Verdict::Neutral,
            pros: Vec::new(),
            cons: Vec::new(),
            feature_gaps: Vec::new(),
            pricing_summary: String::new(),
            platform_recommendation: String::new(),
            generated_by: String::new(),
            generated_at,
            summary: None,
            strengths: None,
            improvement_opportunities: None,
            recommendations: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Lenient deserializers for scraped payloads
// ---------------------------------------------------------------------------

/// Accept a JSON number, a numeric string such as `"$1,299.00"`, or null.
fn de_lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => first_number(&s),
        _ => None,
    })
}

/// First numeric token in `s`, ignoring thousands separators:
/// `"₹29,990"` is 29990, `"4.4 out of 5 stars"` is 4.4.
fn first_number(s: &str) -> Option<f64> {
    let cleaned = s.replace(',', "");
    let start = cleaned.find(|c: char| c.is_ascii_digit())?;
    let negative = cleaned[..start].ends_with('-');
    let digits: String = cleaned[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let value = digits.trim_end_matches('.').parse::<f64>().ok()?;
    Some(if negative { -value } else { value })
}

/// Accept a JSON object whose values may be non-strings; non-strings are
/// rendered with their JSON text.
fn de_string_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?;
    Ok(value
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| {
            let rendered = match v {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (k, rendered)
        })
        .collect())
}

fn de_reviews<'de, D>(deserializer: D) -> Result<Vec<Review>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<RawReview>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(RawReview::into_review)
        .collect())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn snapshot_accepts_string_reviews_and_loose_numbers() {
        let snapshot: ProductSnapshot = serde_json::from_value(json!({
            "url": "https://example.com/p/1",
            "title": "Headphones",
            "price": "$1,299.50",
            "rating": 4.5,
            "specifications": {"Weight": "250 g", "Battery": 30},
            "reviews": ["great sound", {"title": "Meh", "body": "too tight", "rating": "2"}]
        }))
        .unwrap();

        assert_eq!(snapshot.price, Some(1299.5));
        assert_eq!(snapshot.rating, Some(4.5));
        assert_eq!(snapshot.specifications["Battery"], "30");
        assert_eq!(snapshot.reviews[0].body(), "great sound");
        assert_eq!(snapshot.reviews[1].body(), "too tight");
    }

    #[test]
    fn loose_numbers_take_the_first_numeric_token() {
        assert_eq!(first_number("₹29,990"), Some(29990.0));
        assert_eq!(first_number("4.4 out of 5 stars"), Some(4.4));
        assert_eq!(first_number("-3.5"), Some(-3.5));
        assert_eq!(first_number("n/a"), None);
    }

    #[test]
    fn scraped_record_from_snapshot_normalizes_reviews() {
        let snapshot = ProductSnapshot {
            title: Some("Kettle".to_string()),
            reviews: vec![RawReview::Text("boils fast".to_string())],
            ..ProductSnapshot::default()
        };
        let entity_id = EntityId::new();
        let record = ScrapedRecord::from_snapshot(entity_id, "amazon", snapshot, Utc::now());

        assert_eq!(record.entity_id, entity_id);
        assert_eq!(record.title, "Kettle");
        assert_eq!(record.url, "");
        assert_eq!(record.reviews, vec![Review::from_body("boils fast")]);
    }

    #[test]
    fn scraped_record_document_reads_raw_string_reviews() {
        let id = EntityId::new();
        let doc = json!({
            "_id": id.to_string(),
            "entityId": id.to_string(),
            "platform": "ebay",
            "reviews": ["ok"],
            "scrapedAt": "2026-01-01T00:00:00Z"
        });
        let record: ScrapedRecord = serde_json::from_value(doc).unwrap();
        assert_eq!(record.reviews[0].body, "ok");
        assert!(record.reviews[0].title.is_none());
    }

    #[test]
    fn sentiment_summary_total_sums_counts() {
        let summary = SentimentSummary {
            positive: 3,
            negative: 2,
            neutral: 1,
        };
        assert_eq!(summary.total(), 6);
    }

    #[test]
    fn report_stub_is_neutral_and_empty() {
        let entity_id = EntityId::new();
        let stub = ReportRecord::stub(entity_id, Utc::now());
        assert_eq!(stub.entity_id, entity_id);
        assert_eq!(stub.buy_or_skip, Verdict::Neutral);
        assert!(stub.pros.is_empty() && stub.cons.is_empty() && stub.feature_gaps.is_empty());
        assert!(stub.pricing_summary.is_empty());

        let json = serde_json::to_value(&stub).unwrap();
        assert_eq!(json["buyOrSkip"], "neutral");
        assert!(json.get("strengths").is_none());
    }
}
