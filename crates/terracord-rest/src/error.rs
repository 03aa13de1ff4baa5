//! Error types for Discord REST operations.
//!
//! Provides the typed error taxonomy the resource layer branches on:
//! structured API errors (4xx with a Discord error body), rate-limit
//! responses, transient transport/server failures, and retry exhaustion.
//!
//! Classification never requires string matching: [`is_not_found`] walks
//! standard `Error::source()` chains, so a wrapped error still reports
//! whether the remote resource was missing.

use std::error::Error as StdError;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Structured error returned by the Discord API for non-success statuses.
///
/// Carries the HTTP status alongside Discord's own numeric error code and
/// message, plus the raw `errors` validation payload when the API included
/// one. Callers branch on [`http_status`](ApiError::http_status) (or use
/// [`is_not_found`]) rather than parsing the message.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    /// HTTP status code of the response (e.g., 404, 403)
    pub http_status: u16,
    /// Discord-defined numeric error code (e.g., 10003 "Unknown Channel")
    pub code: i64,
    /// Human-readable message from the API
    pub message: String,
    /// Raw validation-error payload, retained verbatim for diagnostics
    pub errors: Option<serde_json::Value>,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "API error (status {}, code {}): {}",
            self.http_status, self.code, self.message
        )?;
        if let Some(errors) = &self.errors {
            write!(f, " (errors: {})", errors)?;
        }
        Ok(())
    }
}

impl StdError for ApiError {}

/// Wire shape of a Discord error body: `{"code": 10003, "message": "...",
/// "errors": {...}}`. Missing fields default so a bare or malformed body
/// still yields a usable [`ApiError`].
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub errors: Option<serde_json::Value>,
}

impl ApiErrorBody {
    /// Parses an error body, falling back to defaults when the payload is
    /// empty or not the expected JSON shape.
    pub(crate) fn parse(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    pub(crate) fn into_api_error(self, http_status: u16) -> ApiError {
        ApiError {
            http_status,
            code: self.code,
            message: self.message,
            errors: self.errors,
        }
    }
}

/// Wire shape of a 429 body: `{"retry_after": 1.5, "global": false,
/// "message": "..."}`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RateLimitBody {
    #[serde(default)]
    pub retry_after: f64,
    #[serde(default)]
    pub global: bool,
    #[serde(default)]
    pub message: String,
}

/// Errors produced by the REST engine.
#[derive(Debug, Error)]
pub enum RestError {
    /// The API rejected the request with a structured error body (4xx)
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The API returned HTTP 429; retried internally, surfaced only
    /// through [`RestError::RetriesExhausted`]
    #[error("rate limited (retry after {retry_after:?}, global: {global}): {message}")]
    RateLimited {
        /// Duration the server asked us to wait before retrying
        retry_after: Duration,
        /// Whether the limit applies globally rather than to this route
        global: bool,
        /// Message from the rate-limit body, if any
        message: String,
    },

    /// The API returned a 5xx status
    #[error("server error: HTTP {status}")]
    Server {
        /// HTTP status code of the response
        status: u16,
    },

    /// A transport-level failure (connection refused, timeout, etc.)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The request body could not be serialized to JSON (a caller bug,
    /// never retried)
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// A success response body could not be deserialized (never retried)
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    /// The caller's cancellation token fired during the operation
    #[error("operation cancelled")]
    Cancelled,

    /// Every attempt within the retry budget hit a transient failure
    #[error("retry budget exhausted after {retries} retries: {source}")]
    RetriesExhausted {
        /// Number of retries performed (attempts are `retries + 1`)
        retries: u32,
        /// The last transient failure observed
        #[source]
        source: Box<RestError>,
    },
}

impl RestError {
    /// Reports whether this error (or any error in its source chain)
    /// represents a 404 from the API.
    pub fn is_not_found(&self) -> bool {
        is_not_found(self)
    }
}

/// Reports whether `err` represents a "not found" API response.
///
/// Walks the standard `source()` chain, so the predicate holds even after
/// the error has been wrapped by intermediate layers (including `anyhow`
/// context; pass `err.as_ref()` for an `anyhow::Error`).
pub fn is_not_found(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(api) = e.downcast_ref::<ApiError>() {
            if api.http_status == 404 {
                return true;
            }
        }
        if let Some(rest) = e.downcast_ref::<RestError>() {
            if api_status_is_not_found(rest) {
                return true;
            }
        }
        // A `#[source] Box<RestError>` field (RetriesExhausted) surfaces
        // in the chain as the Box, not the RestError itself.
        if let Some(boxed) = e.downcast_ref::<Box<RestError>>() {
            if api_status_is_not_found(boxed) {
                return true;
            }
        }
        current = e.source();
    }
    false
}

fn api_status_is_not_found(err: &RestError) -> bool {
    matches!(err, RestError::Api(api) if api.http_status == 404)
}
