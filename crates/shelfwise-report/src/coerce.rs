//! Turning whatever the generation service produced into a [`ReportRecord`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shelfwise_core::{EntityId, ReportRecord, Verdict};

use crate::generation::GenerationResponse;

/// Report fields as the generation service is asked to emit them.
///
/// Identity is not part of the draft: any id the model writes is ignored and
/// the caller's entity id is used instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDraft {
    pub buy_or_skip: Verdict,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
    pub feature_gaps: Vec<String>,
    pub pricing_summary: String,
    pub platform_recommendation: String,
    #[serde(default)]
    pub generated_by: String,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub strengths: Option<Vec<String>>,
    #[serde(default)]
    pub improvement_opportunities: Option<Vec<String>>,
    #[serde(default)]
    pub recommendations: Option<Vec<String>>,
}

const LIST_FIELDS: [&str; 6] = [
    "pros",
    "cons",
    "featureGaps",
    "strengths",
    "improvementOpportunities",
    "recommendations",
];
const TEXT_FIELDS: [&str; 3] = ["pricingSummary", "platformRecommendation", "summary"];

impl ReportDraft {
    /// Build a draft from a loosely shaped object: keys in snake, kebab, or
    /// Pascal case, a verdict in any letter case, a single string where a
    /// list is expected, or numbers where text is expected.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error when a mandatory field is still
    /// missing or unusable after normalization.
    pub fn from_map(map: Map<String, Value>) -> Result<Self, serde_json::Error> {
        let normalized: Map<String, Value> = map
            .into_iter()
            .map(|(key, value)| {
                let key = camel_key(&key);
                let value = normalize_value(&key, value);
                (key, value)
            })
            .collect();
        serde_json::from_value(Value::Object(normalized))
    }

    fn into_record(self, entity_id: EntityId, now: DateTime<Utc>, model: &str) -> ReportRecord {
        let strengths = self.strengths.or_else(|| Some(self.pros.clone()));
        let improvement_opportunities = self
            .improvement_opportunities
            .or_else(|| Some(self.feature_gaps.clone()));
        let generated_by = if self.generated_by.trim().is_empty() {
            model.to_string()
        } else {
            self.generated_by
        };

        ReportRecord {
            id: EntityId::at(now),
            entity_id,
            buy_or_skip: self.buy_or_skip,
            pros: self.pros,
            cons: self.cons,
            feature_gaps: self.feature_gaps,
            pricing_summary: self.pricing_summary,
            platform_recommendation: self.platform_recommendation,
            generated_by,
            generated_at: self.generated_at.unwrap_or(now),
            summary: self.summary,
            strengths,
            improvement_opportunities,
            recommendations: self.recommendations,
        }
    }
}

fn camel_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for c in key.trim().chars() {
        if matches!(c, '_' | '-' | ' ') {
            upper_next = !out.is_empty();
        } else if out.is_empty() {
            out.extend(c.to_lowercase());
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn normalize_value(key: &str, value: Value) -> Value {
    match value {
        Value::String(s) if key == "buyOrSkip" => Value::String(s.trim().to_lowercase()),
        Value::String(s) if LIST_FIELDS.contains(&key) => {
            if s.trim().is_empty() {
                Value::Array(Vec::new())
            } else {
                Value::Array(vec![Value::String(s)])
            }
        }
        Value::Number(n) if TEXT_FIELDS.contains(&key) => Value::String(n.to_string()),
        other => other,
    }
}

/// Resolve a generation response into a well-formed record for `entity_id`.
///
/// Never fails: output that cannot be read as a report becomes
/// [`ReportRecord::stub`]. The record always carries `entity_id`.
#[must_use]
pub fn coerce(
    response: GenerationResponse,
    entity_id: EntityId,
    now: DateTime<Utc>,
    model: &str,
) -> ReportRecord {
    let draft = match response {
        GenerationResponse::Structured(draft) => Some(draft),
        GenerationResponse::RawMap(map) => match ReportDraft::from_map(map) {
            Ok(draft) => Some(draft),
            Err(e) => {
                tracing::warn!(%entity_id, error = %e, "generation map unusable, storing stub report");
                None
            }
        },
        GenerationResponse::Freeform(text) => {
            tracing::warn!(%entity_id, chars = text.len(), "freeform generation output, storing stub report");
            None
        }
    };

    match draft {
        Some(draft) => draft.into_record(entity_id, now, model),
        None => ReportRecord::stub(entity_id, now),
    }
}

#[cfg(test)]
#[path = "coerce_test.rs"]
mod tests;
