use chrono::TimeZone;
use serde_json::json;

use super::*;

const MODEL: &str = "gpt-4o-mini";

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 9, 1, 12, 0, 0).unwrap()
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn draft() -> ReportDraft {
    ReportDraft {
        buy_or_skip: Verdict::Buy,
        pros: vec!["deep bass".to_string()],
        cons: vec!["tight fit".to_string()],
        feature_gaps: vec!["no multipoint".to_string()],
        pricing_summary: "cheapest on flipkart".to_string(),
        platform_recommendation: "flipkart".to_string(),
        generated_by: String::new(),
        generated_at: None,
        summary: None,
        strengths: None,
        improvement_opportunities: None,
        recommendations: None,
    }
}

#[test]
fn structured_draft_is_used_with_defaults_filled() {
    let entity_id = EntityId::new();
    let record = coerce(GenerationResponse::Structured(draft()), entity_id, now(), MODEL);

    assert_eq!(record.entity_id, entity_id);
    assert_eq!(record.buy_or_skip, Verdict::Buy);
    assert_eq!(record.strengths, Some(vec!["deep bass".to_string()]));
    assert_eq!(
        record.improvement_opportunities,
        Some(vec!["no multipoint".to_string()])
    );
    assert_eq!(record.summary, None);
    assert_eq!(record.recommendations, None);
    assert_eq!(record.generated_by, MODEL);
    assert_eq!(record.generated_at, now());
}

#[test]
fn explicit_optional_fields_are_kept() {
    let mut draft = draft();
    draft.strengths = Some(vec!["comfort".to_string()]);
    draft.generated_by = "analyst-v2".to_string();
    let record = coerce(GenerationResponse::Structured(draft), EntityId::new(), now(), MODEL);

    assert_eq!(record.strengths, Some(vec!["comfort".to_string()]));
    assert_eq!(record.generated_by, "analyst-v2");
}

#[test]
fn snake_case_map_is_normalized() {
    let entity_id = EntityId::new();
    let map = object(json!({
        "product_id": "not-an-id",
        "buy_or_skip": "SKIP",
        "pros": "solid build",
        "cons": [],
        "feature_gaps": ["no anc"],
        "pricing_summary": 199,
        "platform_recommendation": "amazon",
        "recommendations": ["bundle a case"],
    }));

    let record = coerce(GenerationResponse::RawMap(map), entity_id, now(), MODEL);

    assert_eq!(record.entity_id, entity_id);
    assert_eq!(record.buy_or_skip, Verdict::Skip);
    assert_eq!(record.pros, vec!["solid build".to_string()]);
    assert_eq!(record.pricing_summary, "199");
    assert_eq!(record.recommendations, Some(vec!["bundle a case".to_string()]));
}

#[test]
fn unusable_map_falls_back_to_stub() {
    let entity_id = EntityId::new();
    let map = object(json!({"verdict": "buy", "notes": "looks fine"}));

    let record = coerce(GenerationResponse::RawMap(map), entity_id, now(), MODEL);

    assert_eq!(record, ReportRecord { id: record.id, ..ReportRecord::stub(entity_id, now()) });
}

#[test]
fn freeform_text_falls_back_to_stub() {
    let entity_id = EntityId::new();
    let record = coerce(
        GenerationResponse::Freeform("I think you should buy it.".to_string()),
        entity_id,
        now(),
        MODEL,
    );

    assert_eq!(record.entity_id, entity_id);
    assert_eq!(record.buy_or_skip, Verdict::Neutral);
    assert!(record.pros.is_empty() && record.cons.is_empty() && record.feature_gaps.is_empty());
    assert!(record.pricing_summary.is_empty());
    assert_eq!(record.generated_at, now());
}

#[test]
fn keys_are_camel_cased() {
    assert_eq!(camel_key("feature_gaps"), "featureGaps");
    assert_eq!(camel_key("Buy-Or-Skip"), "buyOrSkip");
    assert_eq!(camel_key("pricingSummary"), "pricingSummary");
    assert_eq!(camel_key("_pros"), "pros");
}
