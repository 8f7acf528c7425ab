//! Retry logic with exponential backoff
//!
//! Transient fetch failures (network timeouts, connection resets, per-item
//! deadline expiry) are retried with exponential backoff and optional jitter.
//! Permanent failures (bad input, lookup misses, persist errors) fail
//! immediately.

use crate::config::RetryConfig;
use crate::error::Error;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (network timeouts, server busy, connection reset) should return `true`.
/// Permanent failures (bad input, missing record, write error) should return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            // Network errors are retryable when they look transient
            Error::Network(e) => e.is_timeout() || e.is_connect(),
            // A per-item deadline expiry may succeed on the next attempt
            Error::Timeout { .. } => true,
            // I/O errors can be retryable in some cases
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::NotConnected
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::Interrupted
            ),
            // Bad input is permanent
            Error::InvalidInput(_) => false,
            // Config errors are permanent
            Error::Config { .. } => false,
            // Lookup results will not change between attempts
            Error::LookupMiss { .. } => false,
            Error::AmbiguousSector { .. } => false,
            // Write errors need user action (permissions, disk space)
            Error::Persist { .. } => false,
            // Malformed catalog tables are permanent
            Error::Csv(_) => false,
            // Serialization errors are permanent
            Error::Serialization(_) => false,
            // Cancellation is a deliberate stop, never retried
            Error::Cancelled { .. } => false,
        }
    }
}

/// Execute an async operation with exponential backoff retry logic
///
/// Retries only while the error classifies as retryable and attempts remain;
/// returns the successful result or the last error otherwise.
pub async fn fetch_with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "Fetch succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                attempt += 1;

                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis(),
                    "Fetch failed, retrying"
                );

                let jittered_delay = if config.jitter {
                    add_jitter(delay)
                } else {
                    delay
                };

                tokio::time::sleep(jittered_delay).await;

                let next_delay =
                    Duration::from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier);
                delay = next_delay.min(config.max_delay);
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::error!(
                        error = %e,
                        attempts = attempt + 1,
                        "Fetch failed after all retry attempts exhausted"
                    );
                } else {
                    tracing::error!(error = %e, "Fetch failed with non-retryable error");
                }
                return Err(e);
            }
        }
    }
}

/// Add random jitter to a delay to prevent thundering herd
///
/// Jitter is uniformly distributed between 0% and 100% of the delay, so the
/// actual delay falls between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    let jittered_secs = delay.as_secs_f64() * (1.0 + jitter_factor);
    Duration::from_secs_f64(jittered_secs)
}
