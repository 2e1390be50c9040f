//! HTTP-contract tests for `UpstreamClient` against a mocked Upstream.

use manhwa_upstream::{UpstreamClient, UpstreamConfig, UpstreamError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(base_url: &str) -> UpstreamClient {
    UpstreamClient::new(UpstreamConfig::new(base_url, "user", "secret"))
}

#[tokio::test]
async fn fetch_by_id_returns_the_mocked_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/manga/U-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {
                "id": "U-1",
                "attributes": {
                    "title": { "en": "Solo Leveling" },
                    "altTitles": [],
                    "description": { "en": "A weak hunter grows stronger." },
                    "status": "ongoing",
                    "year": 2018,
                    "lastChapter": "179"
                },
                "relationships": []
            }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let record = client.fetch_by_id("U-1").await.unwrap();
    assert_eq!(record.id, "U-1");
    assert_eq!(record.attributes.title.get("en").unwrap(), "Solo Leveling");
}

#[tokio::test]
async fn captcha_error_maps_to_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/manga/U-2"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "result": "error",
            "errors": [{ "id": "captcha_required_exception" }]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let err = client.fetch_by_id("U-2").await.unwrap_err();
    assert!(matches!(err, UpstreamError::RateLimited));
}

#[tokio::test]
async fn not_found_error_maps_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/manga/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "result": "error",
            "errors": [{ "id": "entity_not_found_exception" }]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    let err = client.fetch_by_id("missing").await.unwrap_err();
    assert!(matches!(err, UpstreamError::NotFound));
}

#[tokio::test]
async fn list_tags_swallows_failures_into_an_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/manga/tag"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server.uri());
    assert!(client.list_tags().await.is_empty());
}
