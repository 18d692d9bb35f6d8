use super::*;

#[test]
fn parse_products_accepts_array_object_and_wrapper() {
    let array = parse_products(Platform::Amazon, r#"[{"title": "a"}, {"title": "b"}]"#).unwrap();
    assert_eq!(array.len(), 2);

    let single = parse_products(Platform::Amazon, r#"{"title": "a", "price": "$10"}"#).unwrap();
    assert_eq!(single.len(), 1);
    assert_eq!(single[0].price, Some(10.0));

    let wrapped = parse_products(Platform::Ebay, r#"{"products": [{"title": "a"}]}"#).unwrap();
    assert_eq!(wrapped[0].title.as_deref(), Some("a"));

    assert!(parse_products(Platform::Ebay, "null").unwrap().is_empty());
}

#[test]
fn parse_products_keeps_item_level_errors() {
    let items = parse_products(
        Platform::Flipkart,
        r#"[{"title": "a"}, {"error": "captcha"}]"#,
    )
    .unwrap();
    assert_eq!(items[1].error.as_deref(), Some("captcha"));
}

#[test]
fn parse_products_maps_bare_error_body_to_upstream() {
    let err = parse_products(Platform::Flipkart, r#"{"error": "blocked"}"#).unwrap_err();
    assert!(
        matches!(err, ScraperError::Upstream { ref platform, ref message } if platform == "flipkart" && message == "blocked")
    );
}

#[test]
fn parse_products_rejects_malformed_json() {
    assert!(matches!(
        parse_products(Platform::Amazon, "<html>"),
        Err(ScraperError::Deserialize { .. })
    ));
}

#[test]
fn extract_url_encodes_query_and_count() {
    let client = ExtractorClient::new("http://localhost:8090/", 5, "ua", 0, 0).unwrap();
    let url = client
        .extract_url(Platform::Ebay, "sony wh-1000xm5 & case", 3)
        .unwrap();
    assert_eq!(url.path(), "/extract/ebay");
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("query".to_string(), "sony wh-1000xm5 & case".to_string()),
            ("count".to_string(), "3".to_string()),
        ]
    );
}

#[test]
fn registry_covers_every_platform() {
    let client = ExtractorClient::new("http://localhost:8090", 5, "ua", 0, 0).unwrap();
    assert_eq!(client.registry().platforms(), Platform::ALL.to_vec());
}
