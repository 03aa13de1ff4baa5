//! Integration tests for the request surface: JSON decoding, request
//! headers, and no-content handling.

use serde::Deserialize;
use serde_json::json;
use terracord_rest::routes;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

#[derive(Debug, Deserialize)]
struct Guild {
    id: String,
    name: String,
}

#[tokio::test]
async fn test_get_decodes_response() {
    let (server, client) = common::setup().await;

    common::mount_json(
        &server,
        "GET",
        "/guilds/123",
        200,
        json!({"id": "123", "name": "Test Guild"}),
    )
    .await;

    let guild: Option<Guild> = client
        .get(&routes::guild("123"), &CancellationToken::new())
        .await
        .expect("GET failed");

    let guild = guild.expect("expected a decoded body");
    assert_eq!(guild.id, "123");
    assert_eq!(guild.name, "Test Guild");
}

#[tokio::test]
async fn test_post_sends_bot_headers_and_json_body() {
    let server = MockServer::start().await;
    let client = common::client_for(&server);

    Mock::given(method("POST"))
        .and(path("/guilds/123/channels"))
        .and(header("Authorization", "Bot test-token"))
        .and(header("Content-Type", "application/json"))
        .and(header_exists("User-Agent"))
        .and(body_json(json!({"name": "general", "type": 0})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "456",
            "name": "general"
        })))
        .expect(1)
        .mount(&server)
        .await;

    #[derive(Debug, Deserialize)]
    struct Channel {
        id: String,
    }

    let channel: Option<Channel> = client
        .post(
            &routes::guild_channels("123"),
            &json!({"name": "general", "type": 0}),
            &CancellationToken::new(),
        )
        .await
        .expect("POST failed");

    assert_eq!(channel.unwrap().id, "456");
}

#[tokio::test]
async fn test_no_content_response_skips_decoding() {
    let server = MockServer::start().await;
    let client = common::client_for(&server);

    Mock::given(method("PATCH"))
        .and(path("/channels/456"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    // A decode target is supplied, but a 204 must leave it untouched.
    let result: Option<Guild> = client
        .patch(
            &routes::channel("456"),
            &json!({"topic": "news"}),
            &CancellationToken::new(),
        )
        .await
        .expect("PATCH failed");

    assert!(result.is_none());
}

#[tokio::test]
async fn test_empty_success_body_yields_none() {
    let server = MockServer::start().await;
    let client = common::client_for(&server);

    Mock::given(method("GET"))
        .and(path("/guilds/123"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let result: Option<Guild> = client
        .get(&routes::guild("123"), &CancellationToken::new())
        .await
        .expect("GET failed");

    assert!(result.is_none());
}

#[tokio::test]
async fn test_delete_ignores_response_body() {
    let server = MockServer::start().await;
    let client = common::client_for(&server);

    // A body that would never decode as JSON must not matter for a
    // no-content call.
    Mock::given(method("DELETE"))
        .and(path("/channels/456"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(1)
        .mount(&server)
        .await;

    client
        .delete(&routes::channel("456"), &CancellationToken::new())
        .await
        .expect("DELETE failed");
}

#[tokio::test]
async fn test_malformed_success_body_is_terminal() {
    let server = MockServer::start().await;
    let client = common::client_for(&server);

    Mock::given(method("GET"))
        .and(path("/guilds/123"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not valid json"))
        .expect(1)
        .mount(&server)
        .await;

    let result: Result<Option<Guild>, _> = client
        .get(&routes::guild("123"), &CancellationToken::new())
        .await;

    assert!(matches!(
        result,
        Err(terracord_rest::RestError::Decode(_))
    ));
}

#[tokio::test]
async fn test_unencodable_body_is_terminal_and_sends_nothing() {
    use std::collections::HashMap;

    let server = MockServer::start().await;
    let client = common::client_for(&server);

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    // Maps with non-string keys cannot be represented in JSON.
    let bad_body: HashMap<(u32, u32), String> = HashMap::from([((1, 2), "x".to_string())]);

    let result: Result<Option<serde_json::Value>, _> = client
        .post("/guilds/123", &bad_body, &CancellationToken::new())
        .await;

    assert!(matches!(
        result,
        Err(terracord_rest::RestError::Encode(_))
    ));
}
