//! Per-route rate-limit buckets for the Discord REST API.
//!
//! Discord communicates rate limits through response headers
//! (`X-RateLimit-Remaining`, `X-RateLimit-Reset-After`) and 429 bodies.
//! This module tracks that state with one [`Bucket`] per literal route
//! string, created lazily by the [`BucketRegistry`].
//!
//! The server's real buckets can be shared across routes; one bucket per
//! route is a deliberate over-approximation. It never exceeds the real
//! limit, at the cost of occasionally waiting slightly longer than
//! strictly necessary.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::RestError;

/// Mutable bucket state, protected by the bucket's own Mutex so waiting
/// on one route never blocks operations on another.
#[derive(Debug, Clone, Copy)]
struct BucketState {
    /// Requests allowed before the window resets. Signed because header
    /// updates overwrite it and a forced throttle drives it to zero.
    remaining: i64,
    /// When `remaining` should be considered replenished. `None` means
    /// the route has never reported a limit.
    reset_at: Option<Instant>,
}

/// Throttling state for a single route, as observed from server responses.
///
/// A fresh bucket starts with `remaining = 1` so the first request for any
/// route goes through without waiting.
#[derive(Debug)]
pub struct Bucket {
    state: Mutex<BucketState>,
}

impl Bucket {
    fn new() -> Self {
        Self {
            state: Mutex::new(BucketState {
                remaining: 1,
                reset_at: None,
            }),
        }
    }

    /// Blocks until the bucket's window has reset, honoring cancellation.
    ///
    /// If the bucket is exhausted (`remaining <= 0`) and the reset time is
    /// still in the future, sleeps for exactly `reset_at - now`. The sleep
    /// is raced against `cancel`, and cancellation returns
    /// [`RestError::Cancelled`] promptly.
    ///
    /// A successful return means the window has elapsed, not that the
    /// server will accept the next request; the bucket is an approximation
    /// derived from prior responses, not a reservation.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), RestError> {
        let wait = {
            let state = self.state.lock().unwrap();
            if state.remaining <= 0 {
                state
                    .reset_at
                    .map(|at| at.saturating_duration_since(Instant::now()))
                    .filter(|d| !d.is_zero())
            } else {
                None
            }
        };

        if let Some(wait) = wait {
            debug!(wait_ms = wait.as_millis() as u64, "bucket exhausted, waiting for reset");
            tokio::select! {
                _ = cancel.cancelled() => return Err(RestError::Cancelled),
                _ = tokio::time::sleep(wait) => {}
            }
        }

        Ok(())
    }

    /// Applies rate-limit response headers to the bucket.
    ///
    /// A remaining-count header overwrites `remaining`; a reset-after
    /// header sets `reset_at` relative to now. Absent headers leave the
    /// corresponding field untouched.
    pub(crate) fn record_headers(&self, remaining: Option<i64>, reset_after: Option<Duration>) {
        let mut state = self.state.lock().unwrap();
        if let Some(remaining) = remaining {
            state.remaining = remaining;
        }
        if let Some(reset_after) = reset_after {
            state.reset_at = Some(Instant::now() + reset_after);
        }
    }

    /// Forces the bucket into the exhausted state after a 429.
    ///
    /// `remaining` is driven to zero so the next [`Bucket::acquire`] waits
    /// out `retry_after` even if the response headers were absent or
    /// malformed.
    pub(crate) fn record_throttle(&self, retry_after: Duration) {
        let mut state = self.state.lock().unwrap();
        state.remaining = 0;
        state.reset_at = Some(Instant::now() + retry_after);
    }

    /// Returns the current `(remaining, reset_at)` pair.
    pub fn snapshot(&self) -> (i64, Option<Instant>) {
        let state = self.state.lock().unwrap();
        (state.remaining, state.reset_at)
    }
}

/// Lazily-populated map from route string to its [`Bucket`].
///
/// The structural map is behind a read-preferring `RwLock` held only for
/// lookup and insert, never while waiting on a bucket. Buckets live for
/// the lifetime of the client; the route space is small and finite in
/// practice, so entries are never evicted.
#[derive(Debug, Default)]
pub(crate) struct BucketRegistry {
    buckets: RwLock<HashMap<String, Arc<Bucket>>>,
}

impl BucketRegistry {
    /// Returns the bucket for `route`, creating it on first use.
    ///
    /// Every call with the same route returns the same `Arc` for the
    /// registry's lifetime. Cannot fail.
    pub(crate) fn bucket(&self, route: &str) -> Arc<Bucket> {
        if let Some(bucket) = self.buckets.read().unwrap().get(route) {
            return Arc::clone(bucket);
        }

        // Re-check under the write lock: another caller may have inserted
        // the bucket between the read and write acquisitions.
        let mut buckets = self.buckets.write().unwrap();
        Arc::clone(
            buckets
                .entry(route.to_string())
                .or_insert_with(|| {
                    debug!(route, "creating rate-limit bucket");
                    Arc::new(Bucket::new())
                }),
        )
    }
}

/// Parses an `X-RateLimit-Reset-After` style value: fractional seconds.
///
/// Returns `None` for unparsable or negative values.
pub(crate) fn parse_reset_after(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
}
