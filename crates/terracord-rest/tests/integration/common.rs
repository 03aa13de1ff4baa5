//! Shared test helpers for REST engine integration tests.
//!
//! Provides wiremock-based mock server setup and a client configured
//! with a short backoff so retry tests stay fast.

use std::time::Duration;

use terracord_rest::{Config, DiscordClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Bot token used by all tests.
pub const TEST_TOKEN: &str = "test-token";

/// Starts a mock server and returns it with a client pointed at it.
///
/// The client keeps the default retry budget (3 retries) but shrinks the
/// backoff base to 10ms.
pub async fn setup() -> (MockServer, DiscordClient) {
    let server = MockServer::start().await;
    let client = client_for(&server);
    (server, client)
}

/// Builds a fast-backoff client for an existing mock server.
pub fn client_for(server: &MockServer) -> DiscordClient {
    let mut config = Config::new(TEST_TOKEN);
    config.base_url = server.uri();
    config.backoff_base = Duration::from_millis(10);
    DiscordClient::with_config(config)
}

/// Builds a fast-backoff client with a custom retry budget.
#[allow(dead_code)]
pub fn client_with_retries(server: &MockServer, max_retries: u32) -> DiscordClient {
    let mut config = Config::new(TEST_TOKEN);
    config.base_url = server.uri();
    config.backoff_base = Duration::from_millis(10);
    config.max_retries = max_retries;
    DiscordClient::with_config(config)
}

/// Mounts a JSON response for the given method and route.
#[allow(dead_code)]
pub async fn mount_json(
    server: &MockServer,
    http_method: &str,
    route: &str,
    status: u16,
    body: serde_json::Value,
) {
    Mock::given(method(http_method))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

/// Mounts a 200 response carrying rate-limit headers.
#[allow(dead_code)]
pub async fn mount_with_rate_limit_headers(
    server: &MockServer,
    route: &str,
    remaining: &str,
    reset_after: &str,
    body: serde_json::Value,
) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(body)
                .append_header("X-RateLimit-Remaining", remaining)
                .append_header("X-RateLimit-Reset-After", reset_after),
        )
        .mount(server)
        .await;
}
