//! Integration tests for the HTTP classifier backend against a mocked
//! classification endpoint.

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mealtrace_core::Zone;
use mealtrace_enrich::{ClassifierService, ClassifyError, HttpClassifier};

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn classify_parses_a_full_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .and(body_json(json!({"items": ["kale", "bacon"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"name": "kale", "zone": "green", "category": "vegetable", "group": "Leafy Greens"},
                {"name": "bacon", "zone": "red", "group": "Processed Meat"}
            ]
        })))
        .mount(&server)
        .await;

    let classifier = HttpClassifier::with_config(server.uri(), 5);
    let result = classifier.classify(&names(&["kale", "bacon"])).await.unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(result[0].name, "kale");
    assert_eq!(result[0].zone, Zone::Green);
    assert_eq!(result[0].category.as_deref(), Some("vegetable"));
    assert_eq!(result[0].group, "Leafy Greens");
    assert_eq!(result[1].zone, Zone::Red);
    assert_eq!(result[1].category, None);
}

#[tokio::test]
async fn classify_accepts_a_partial_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"name": "kale", "zone": "green", "group": "Leafy Greens"}
            ]
        })))
        .mount(&server)
        .await;

    let classifier = HttpClassifier::with_config(server.uri(), 5);
    let result = classifier
        .classify(&names(&["kale", "sugar", "rice"]))
        .await
        .unwrap();

    // Silent partial success is expected behavior, not an error.
    assert_eq!(result.len(), 1);
    assert_eq!(result[0].name, "kale");
}

#[tokio::test]
async fn classify_defaults_unknown_zone_and_missing_group() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {"name": "kale", "zone": "chartreuse"},
                {"name": "rice"}
            ]
        })))
        .mount(&server)
        .await;

    let classifier = HttpClassifier::with_config(server.uri(), 5);
    let result = classifier.classify(&names(&["kale", "rice"])).await.unwrap();

    assert_eq!(result[0].zone, Zone::Unzoned);
    assert_eq!(result[0].group, "other");
    assert_eq!(result[1].zone, Zone::Unzoned);
    assert_eq!(result[1].group, "other");
}

#[tokio::test]
async fn classify_maps_error_status_to_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let classifier = HttpClassifier::with_config(server.uri(), 5);
    let err = classifier.classify(&names(&["kale"])).await.unwrap_err();

    match err {
        ClassifyError::Status { code, body } => {
            assert_eq!(code, 503);
            assert_eq!(body, "overloaded");
        }
        other => panic!("Expected Status error, got: {other}"),
    }
}

#[tokio::test]
async fn classify_maps_malformed_body_to_schema_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .mount(&server)
        .await;

    let classifier = HttpClassifier::with_config(server.uri(), 5);
    let err = classifier.classify(&names(&["kale"])).await.unwrap_err();
    assert!(matches!(err, ClassifyError::Schema(_)));
}

#[tokio::test]
async fn classify_rejects_elements_without_a_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"zone": "green", "group": "Leafy Greens"}]
        })))
        .mount(&server)
        .await;

    let classifier = HttpClassifier::with_config(server.uri(), 5);
    let err = classifier.classify(&names(&["kale"])).await.unwrap_err();
    assert!(matches!(err, ClassifyError::Schema(_)));
}

#[tokio::test]
async fn classify_skips_the_network_for_empty_input() {
    // No mock mounted: any request would 404 and fail the call.
    let server = MockServer::start().await;
    let classifier = HttpClassifier::with_config(server.uri(), 5);

    let result = classifier.classify(&[]).await.unwrap();
    assert!(result.is_empty());
}
