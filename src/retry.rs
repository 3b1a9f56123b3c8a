//! Retry logic with exponential backoff
//!
//! Per-item retry for transient collaborator failures. Retries are off by default
//! ([`RetryConfig::disabled`]), in which case every item is fetched exactly once.
//!
//! # Example
//!
//! ```no_run
//! use batch_fetch::retry::{IsRetryable, fetch_with_retry};
//! use batch_fetch::config::RetryConfig;
//!
//! #[derive(Debug)]
//! enum MyError {
//!     Transient,
//!     Permanent,
//! }
//!
//! impl std::fmt::Display for MyError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "{:?}", self)
//!     }
//! }
//!
//! impl IsRetryable for MyError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, MyError::Transient)
//!     }
//! }
//!
//! # async fn example() -> Result<(), MyError> {
//! let config = RetryConfig::default();
//! let result = fetch_with_retry(&config, || async {
//!     Ok::<_, MyError>(())
//! }).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::FetchError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (timeouts, connection resets, overloaded servers) should return `true`.
/// Permanent failures (not found, malformed data) should return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for FetchError {
    fn is_retryable(&self) -> bool {
        match self {
            FetchError::Network(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| is_transient_status(s.as_u16()))
            }
            FetchError::Status { status, .. } => is_transient_status(*status),
            // The server answered; asking again yields the same body
            FetchError::Decode { .. } => false,
            FetchError::Other(_) => false,
        }
    }
}

impl IsRetryable for std::io::Error {
    fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            std::io::ErrorKind::TimedOut
                | std::io::ErrorKind::ConnectionRefused
                | std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::ConnectionAborted
                | std::io::ErrorKind::NotConnected
                | std::io::ErrorKind::BrokenPipe
                | std::io::ErrorKind::Interrupted
        )
    }
}

impl IsRetryable for std::convert::Infallible {
    fn is_retryable(&self) -> bool {
        match *self {}
    }
}

// Plain message errors carry no classification
impl IsRetryable for String {
    fn is_retryable(&self) -> bool {
        false
    }
}

impl IsRetryable for &'static str {
    fn is_retryable(&self) -> bool {
        false
    }
}

/// 408 Request Timeout, 429 Too Many Requests and all 5xx
fn is_transient_status(status: u16) -> bool {
    status == 408 || status == 429 || (500..600).contains(&status)
}

/// Delay schedule for one operation's retries
///
/// Yields at most `max_attempts` delays, starting at `initial_delay` and growing by
/// `backoff_multiplier` up to `max_delay`, with jitter applied when enabled.
pub(crate) struct Backoff<'a> {
    config: &'a RetryConfig,
    attempt: u32,
    delay: Duration,
}

impl<'a> Backoff<'a> {
    pub(crate) fn new(config: &'a RetryConfig) -> Self {
        Self {
            config,
            attempt: 0,
            delay: config.initial_delay,
        }
    }

    /// Retries handed out so far
    pub(crate) fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Delay before the next retry, or `None` once attempts are exhausted
    pub(crate) fn next_delay(&mut self) -> Option<Duration> {
        if self.attempt >= self.config.max_attempts {
            return None;
        }
        self.attempt += 1;

        let current = self.delay;
        let next =
            Duration::from_secs_f64(current.as_secs_f64() * self.config.backoff_multiplier);
        self.delay = next.min(self.config.max_delay);

        Some(if self.config.jitter {
            add_jitter(current)
        } else {
            current
        })
    }
}

/// Execute an async operation with exponential backoff retry logic
///
/// # Arguments
///
/// * `config` - Retry configuration (max attempts, delays, backoff multiplier, jitter)
/// * `operation` - Async closure that returns Result<T, E> where E implements IsRetryable
///
/// # Returns
///
/// Returns the successful result or the last error after all retry attempts are exhausted.
/// With `max_attempts == 0` the operation runs exactly once.
pub async fn fetch_with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut backoff = Backoff::new(config);

    loop {
        let e = match operation().await {
            Ok(result) => {
                if backoff.attempt() > 0 {
                    tracing::info!(
                        attempts = backoff.attempt() + 1,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(e) => e,
        };

        if !e.is_retryable() {
            return Err(e);
        }
        let Some(delay) = backoff.next_delay() else {
            if backoff.attempt() > 0 {
                tracing::warn!(
                    error = %e,
                    attempts = backoff.attempt() + 1,
                    "Operation failed after retrying"
                );
            }
            return Err(e);
        };
        tracing::warn!(
            error = %e,
            attempt = backoff.attempt(),
            max_attempts = config.max_attempts,
            delay_ms = delay.as_millis(),
            "Operation failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

/// Add random jitter to a delay to prevent thundering herd
///
/// The result lies between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}
