//! Terracord REST - rate-limited Discord API client
//!
//! The request engine behind the Terracord provider's resource
//! operations. Provides:
//! - Per-route rate-limit buckets driven by server response headers
//! - A retry loop with exponential backoff for transient failures
//! - Typed errors the resource layer can branch on without string matching
//! - Cancellation support at every suspension point
//!
//! ## Modules
//!
//! - [`client`] - The [`DiscordClient`] request engine and its [`Config`]
//! - [`rate_limit`] - Per-route buckets and the availability gate
//! - [`error`] - Error taxonomy and the not-found classification helper
//! - [`routes`] - Literal REST path builders for provider resources

pub mod client;
pub mod error;
pub mod rate_limit;
pub mod routes;

pub use client::{Config, DiscordClient};
pub use error::{is_not_found, ApiError, RestError};
pub use rate_limit::Bucket;

// Callers name HTTP methods when using the generic request surface.
pub use reqwest::Method;
