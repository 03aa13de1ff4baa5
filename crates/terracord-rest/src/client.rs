//! Discord REST API client.
//!
//! Provides [`DiscordClient`], the request engine every provider resource
//! operation funnels through. Each call is gated on a per-route rate-limit
//! bucket, sent with bot authentication headers, classified into
//! success / transient / terminal, and retried with exponential backoff
//! when transient. All suspension points honor the caller's
//! [`CancellationToken`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use terracord_rest::{DiscordClient, routes};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), terracord_rest::RestError> {
//! let client = DiscordClient::new("bot-token-here");
//! let guild: Option<serde_json::Value> = client
//!     .get(&routes::guild("81384788765712384"), &CancellationToken::new())
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{ApiErrorBody, RateLimitBody, RestError};
use crate::rate_limit::{parse_reset_after, Bucket, BucketRegistry};

/// Base URL for the Discord REST API, v10
const DEFAULT_BASE_URL: &str = "https://discord.com/api/v10";

/// Maximum number of retries after the initial attempt
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff between attempts
const BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Largest exponent applied to the backoff base; delays stop doubling
/// past this point
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// Fallback wait after a 429 whose body and headers carried no usable
/// retry-after value
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Response header carrying the requests left in the current window
/// (`X-RateLimit-Remaining` on the wire)
const HEADER_REMAINING: &str = "x-ratelimit-remaining";

/// Response header carrying seconds (fractional) until the window resets
/// (`X-RateLimit-Reset-After` on the wire)
const HEADER_RESET_AFTER: &str = "x-ratelimit-reset-after";

// ============================================================================
// Config
// ============================================================================

/// Configuration for a [`DiscordClient`].
///
/// [`Config::new`] fills in the production defaults; tests override
/// `base_url` and shrink `backoff_base` to keep retry tests fast.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bot token, sent as `Authorization: Bot <token>`
    pub token: String,
    /// Base endpoint including the versioned path prefix
    pub base_url: String,
    /// `User-Agent` header identifying the provider and its version
    pub user_agent: String,
    /// Retries allowed after the initial attempt
    pub max_retries: u32,
    /// Base delay for exponential backoff (doubles per retry)
    pub backoff_base: Duration,
}

impl Config {
    /// Returns a configuration with production defaults for `token`.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: format!(
                "DiscordBot (https://github.com/terracord/terracord, {})",
                env!("CARGO_PKG_VERSION")
            ),
            max_retries: MAX_RETRIES,
            backoff_base: BACKOFF_BASE,
        }
    }
}

// ============================================================================
// DiscordClient
// ============================================================================

/// Outcome of a single attempt. Terminal failures are returned as `Err`
/// from [`DiscordClient::attempt`] instead.
enum Attempt {
    /// A 2xx response with its raw body (possibly empty)
    Done(Vec<u8>),
    /// A 204 response, or the caller declared it expects no payload
    NoContent,
    /// A failure worth retrying: connection error, 429, or 5xx
    Transient(RestError),
}

/// Rate-limited, retrying HTTP client for the Discord REST API.
///
/// Safe to share across tasks: the underlying `reqwest::Client` pools
/// connections, the bucket registry takes its structural lock only for
/// lookup/insert, and each bucket serializes its own state independently.
/// Concurrent callers on the same route are not FIFO-ordered; the rate
/// limit is a window, not a queue.
pub struct DiscordClient {
    /// The underlying HTTP client
    http: reqwest::Client,
    /// Client configuration (token, endpoint, retry policy)
    config: Config,
    /// Per-route rate-limit state, owned exclusively by this client
    buckets: BucketRegistry,
}

impl DiscordClient {
    /// Creates a client with production defaults for the given bot token.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_config(Config::new(token))
    }

    /// Creates a client pointed at a custom base URL (useful for testing).
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        let mut config = Config::new(token);
        config.base_url = base_url.into();
        Self::with_config(config)
    }

    /// Creates a client from an explicit [`Config`].
    pub fn with_config(config: Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            buckets: BucketRegistry::default(),
        }
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the rate-limit bucket for `route`, creating it on first use.
    ///
    /// The same route always yields the same bucket for the lifetime of
    /// this client. Exposed for diagnostics; mutation happens only through
    /// the request path.
    pub fn bucket(&self, route: &str) -> Arc<Bucket> {
        self.buckets.bucket(route)
    }

    // ========================================================================
    // Request surface
    // ========================================================================

    /// Performs a JSON request against `route` and decodes the response.
    ///
    /// `route` is the literal REST path with IDs already interpolated
    /// (see [`crate::routes`]); it doubles as the rate-limit bucket key.
    /// Returns `Ok(None)` for a 204 or empty success body, leaving nothing
    /// to decode.
    ///
    /// # Errors
    /// - [`RestError::Encode`] if `body` cannot be serialized (terminal,
    ///   consumes no retry budget)
    /// - [`RestError::Api`] for 4xx responses (terminal)
    /// - [`RestError::Decode`] if a success body does not match `R`
    /// - [`RestError::Cancelled`] when `cancel` fires
    /// - [`RestError::RetriesExhausted`] after persistent transient failures
    pub async fn request<B, R>(
        &self,
        method: Method,
        route: &str,
        body: Option<&B>,
        cancel: &CancellationToken,
    ) -> Result<Option<R>, RestError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let payload = body
            .map(|b| serde_json::to_vec(b))
            .transpose()
            .map_err(RestError::Encode)?;

        match self.execute(method, route, payload, false, cancel).await? {
            Some(body) => serde_json::from_slice(&body)
                .map(Some)
                .map_err(RestError::Decode),
            None => Ok(None),
        }
    }

    /// Performs a request whose response payload is irrelevant (delete-style
    /// calls). Never attempts to decode the body.
    pub async fn request_no_content<B>(
        &self,
        method: Method,
        route: &str,
        body: Option<&B>,
        cancel: &CancellationToken,
    ) -> Result<(), RestError>
    where
        B: Serialize + ?Sized,
    {
        let payload = body
            .map(|b| serde_json::to_vec(b))
            .transpose()
            .map_err(RestError::Encode)?;

        self.execute(method, route, payload, true, cancel).await?;
        Ok(())
    }

    /// `GET route`, decoding the response.
    pub async fn get<R: DeserializeOwned>(
        &self,
        route: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<R>, RestError> {
        self.request::<(), R>(Method::GET, route, None, cancel).await
    }

    /// `POST route` with a JSON body, decoding the response.
    pub async fn post<B, R>(
        &self,
        route: &str,
        body: &B,
        cancel: &CancellationToken,
    ) -> Result<Option<R>, RestError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.request(Method::POST, route, Some(body), cancel).await
    }

    /// `PATCH route` with a JSON body, decoding the response.
    pub async fn patch<B, R>(
        &self,
        route: &str,
        body: &B,
        cancel: &CancellationToken,
    ) -> Result<Option<R>, RestError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.request(Method::PATCH, route, Some(body), cancel).await
    }

    /// `PUT route`, optionally with a JSON body, ignoring the response
    /// payload (e.g., assigning a role to a member).
    pub async fn put<B>(
        &self,
        route: &str,
        body: Option<&B>,
        cancel: &CancellationToken,
    ) -> Result<(), RestError>
    where
        B: Serialize + ?Sized,
    {
        self.request_no_content(Method::PUT, route, body, cancel)
            .await
    }

    /// `DELETE route`, ignoring the response payload.
    pub async fn delete(&self, route: &str, cancel: &CancellationToken) -> Result<(), RestError> {
        self.request_no_content::<()>(Method::DELETE, route, None, cancel)
            .await
    }

    // ========================================================================
    // Retry loop
    // ========================================================================

    /// Runs the retry loop for one logical call.
    ///
    /// Transient failures (connection errors, 429, 5xx) consume retry
    /// budget and incur `backoff_base * 2^(retry-1)` of delay; terminal
    /// failures propagate immediately. Returns the raw success body, or
    /// `None` when there is nothing to decode.
    async fn execute(
        &self,
        method: Method,
        route: &str,
        payload: Option<Vec<u8>>,
        expect_no_body: bool,
        cancel: &CancellationToken,
    ) -> Result<Option<Vec<u8>>, RestError> {
        let bucket = self.buckets.bucket(route);
        let mut retries: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(RestError::Cancelled);
            }

            let outcome = self
                .attempt(
                    method.clone(),
                    route,
                    payload.as_deref(),
                    expect_no_body,
                    &bucket,
                    cancel,
                )
                .await?;

            let err = match outcome {
                Attempt::Done(body) => {
                    if retries > 0 {
                        info!(route, retries, "request succeeded after retry");
                    }
                    return Ok(if body.is_empty() { None } else { Some(body) });
                }
                Attempt::NoContent => {
                    if retries > 0 {
                        info!(route, retries, "request succeeded after retry");
                    }
                    return Ok(None);
                }
                Attempt::Transient(err) => err,
            };

            if retries >= self.config.max_retries {
                warn!(route, retries, error = %err, "retry budget exhausted");
                return Err(RestError::RetriesExhausted {
                    retries,
                    source: Box::new(err),
                });
            }

            retries += 1;
            // Cap the exponent so oversized retry budgets saturate the
            // delay instead of overflowing the multiply.
            let exponent = (retries - 1).min(MAX_BACKOFF_EXPONENT);
            let backoff = self
                .config
                .backoff_base
                .saturating_mul(2u32.saturating_pow(exponent));
            warn!(
                route,
                retry = retries,
                backoff_ms = backoff.as_millis() as u64,
                error = %err,
                "transient failure, backing off"
            );
            tokio::select! {
                _ = cancel.cancelled() => return Err(RestError::Cancelled),
                _ = tokio::time::sleep(backoff) => {}
            }
        }
    }

    /// Performs a single attempt: gate on the bucket, send, update the
    /// bucket from response headers, classify the status code.
    ///
    /// `Err` is terminal (cancellation or a structured 4xx);
    /// [`Attempt::Transient`] feeds the retry loop.
    async fn attempt(
        &self,
        method: Method,
        route: &str,
        payload: Option<&[u8]>,
        expect_no_body: bool,
        bucket: &Bucket,
        cancel: &CancellationToken,
    ) -> Result<Attempt, RestError> {
        bucket.acquire(cancel).await?;

        let url = format!("{}{}", self.config.base_url, route);
        let mut request = self
            .http
            .request(method, &url)
            .header(AUTHORIZATION, format!("Bot {}", self.config.token))
            .header(USER_AGENT, &self.config.user_agent);
        if let Some(payload) = payload {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(payload.to_vec());
        }

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(RestError::Cancelled),
            result = request.send() => match result {
                Ok(response) => response,
                Err(err) => return Ok(Attempt::Transient(RestError::Network(err))),
            }
        };

        let status = response.status();
        let reset_after = rate_limit_reset_after(response.headers());
        bucket.record_headers(rate_limit_remaining(response.headers()), reset_after);
        debug!(route, status = status.as_u16(), "response received");

        let body = tokio::select! {
            _ = cancel.cancelled() => return Err(RestError::Cancelled),
            result = response.bytes() => match result {
                Ok(bytes) => bytes.to_vec(),
                Err(err) => return Ok(Attempt::Transient(RestError::Network(err))),
            }
        };

        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                let limit: RateLimitBody = serde_json::from_slice(&body).unwrap_or_default();
                let retry_after = if limit.retry_after.is_finite() && limit.retry_after > 0.0 {
                    Duration::from_secs_f64(limit.retry_after)
                } else {
                    reset_after.unwrap_or(DEFAULT_RETRY_AFTER)
                };
                // Force the bucket into the exhausted state so the next
                // gate wait is accurate even without usable headers.
                bucket.record_throttle(retry_after);
                warn!(
                    route,
                    retry_after_ms = retry_after.as_millis() as u64,
                    global = limit.global,
                    "rate limited"
                );
                Ok(Attempt::Transient(RestError::RateLimited {
                    retry_after,
                    global: limit.global,
                    message: limit.message,
                }))
            }
            status if status.is_server_error() => Ok(Attempt::Transient(RestError::Server {
                status: status.as_u16(),
            })),
            status if status.is_client_error() => {
                // 404 and friends carry terminal information; retrying
                // cannot change the answer.
                Err(RestError::Api(
                    ApiErrorBody::parse(&body).into_api_error(status.as_u16()),
                ))
            }
            StatusCode::NO_CONTENT => Ok(Attempt::NoContent),
            _ if expect_no_body => Ok(Attempt::NoContent),
            _ => Ok(Attempt::Done(body)),
        }
    }
}

/// Reads `X-RateLimit-Remaining` as a signed count, if present and valid.
fn rate_limit_remaining(headers: &HeaderMap) -> Option<i64> {
    headers
        .get(HEADER_REMAINING)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Reads `X-RateLimit-Reset-After` (fractional seconds), if present and valid.
fn rate_limit_reset_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(HEADER_RESET_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_reset_after)
}
