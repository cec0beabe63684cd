//! Integration tests for the platform API clients using wiremock HTTP mocks.

use subatime_fetch::FetchError;
use subatime_platforms::{FacebookApiClient, InstagramApiClient, YoutubeApiClient};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// YouTube
// ============================================================================

#[tokio::test]
async fn youtube_returns_subscriber_count() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "items": [
            { "statistics": { "subscriberCount": "1005", "viewCount": "99999" } }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/youtube/v3/channels"))
        .and(query_param("part", "statistics"))
        .and(query_param("id", "UCabc123"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let client = YoutubeApiClient::with_base_url(&server.uri());
    let count = client
        .fetch_subscriber_count("test-key", "https://www.youtube.com/channel/UCabc123")
        .await
        .expect("should parse subscriber count");

    assert_eq!(count, 1005);
}

#[tokio::test]
async fn youtube_empty_items_is_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/youtube/v3/channels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "items": [] })))
        .mount(&server)
        .await;

    let client = YoutubeApiClient::with_base_url(&server.uri());
    let err = client
        .fetch_subscriber_count("test-key", "https://www.youtube.com/channel/UCmissing")
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::NotFound(_)));
}

#[tokio::test]
async fn youtube_quota_error_surfaces_provider_message() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "error": { "code": 403, "message": "The request cannot be completed because you have exceeded your quota." }
    });

    Mock::given(method("GET"))
        .and(path("/youtube/v3/channels"))
        .respond_with(ResponseTemplate::new(403).set_body_json(&body))
        .mount(&server)
        .await;

    let client = YoutubeApiClient::with_base_url(&server.uri());
    let err = client
        .fetch_subscriber_count("bad-key", "https://www.youtube.com/channel/UCabc123")
        .await
        .unwrap_err();

    match err {
        FetchError::Auth(message) => assert!(message.contains("exceeded your quota")),
        other => panic!("expected Auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn youtube_missing_key_fails_without_request() {
    // No mock server mounted: a request would error differently.
    let client = YoutubeApiClient::with_base_url("http://127.0.0.1:1");
    let err = client
        .fetch_subscriber_count("", "https://www.youtube.com/channel/UCabc123")
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Auth(_)));
}

// ============================================================================
// Instagram
// ============================================================================

#[tokio::test]
async fn instagram_returns_follower_count() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v12.0/17841400000000000"))
        .and(query_param("fields", "followers_count"))
        .and(query_param("access_token", "ig-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "followers_count": 4321,
            "id": "17841400000000000"
        })))
        .mount(&server)
        .await;

    let client = InstagramApiClient::with_base_url(&server.uri());
    let count = client
        .fetch_follower_count("ig-token", "17841400000000000")
        .await
        .expect("should parse follower count");

    assert_eq!(count, 4321);
}

#[tokio::test]
async fn instagram_oauth_exception_is_auth_error() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "error": {
            "message": "Invalid OAuth access token.",
            "type": "OAuthException",
            "code": 190
        }
    });

    Mock::given(method("GET"))
        .and(path("/v12.0/17841400000000000"))
        .respond_with(ResponseTemplate::new(400).set_body_json(&body))
        .mount(&server)
        .await;

    let client = InstagramApiClient::with_base_url(&server.uri());
    let err = client
        .fetch_follower_count("expired", "17841400000000000")
        .await
        .unwrap_err();

    match err {
        FetchError::Auth(message) => assert!(message.contains("Invalid OAuth access token")),
        other => panic!("expected Auth error, got {other:?}"),
    }
}

// ============================================================================
// Facebook
// ============================================================================

#[tokio::test]
async fn facebook_returns_fan_count() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v12.0/1234567890"))
        .and(query_param("fields", "fan_count"))
        .and(query_param("access_token", "fb-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "fan_count": 98765,
            "id": "1234567890"
        })))
        .mount(&server)
        .await;

    let client = FacebookApiClient::with_base_url(&server.uri());
    let count = client
        .fetch_fan_count("fb-token", "1234567890")
        .await
        .expect("should parse fan count");

    assert_eq!(count, 98765);
}

#[tokio::test]
async fn facebook_missing_field_is_upstream_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v12.0/1234567890"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "1234567890"
        })))
        .mount(&server)
        .await;

    let client = FacebookApiClient::with_base_url(&server.uri());
    let err = client.fetch_fan_count("fb-token", "1234567890").await.unwrap_err();

    match err {
        FetchError::Upstream(message) => assert!(message.contains("fan_count")),
        other => panic!("expected Upstream error, got {other:?}"),
    }
}
