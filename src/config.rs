//! Configuration types for batch-fetch

use crate::error::{Error, Result};
use crate::types::ExecutionPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Batch runner configuration
///
/// Every field has a default, so an empty JSON object is a valid configuration and
/// reproduces the reference behavior: sequential dispatch, no retries, no bound on
/// concurrent dispatch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Policy used by [`BatchRunner::run_default`](crate::runner::BatchRunner::run_default)
    #[serde(default)]
    pub policy: ExecutionPolicy,

    /// Upper bound on items in flight for concurrent policies (None = all items)
    #[serde(default)]
    pub max_in_flight: Option<usize>,

    /// Per-item retry behavior (default: disabled)
    #[serde(default = "RetryConfig::disabled")]
    pub retry: RetryConfig,

    /// Capacity of the event broadcast channel (default: 256)
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            policy: ExecutionPolicy::default(),
            max_in_flight: None,
            retry: RetryConfig::disabled(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl RunnerConfig {
    /// Parse and validate a configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "Loaded runner configuration");
        Self::from_json_str(&contents)
    }

    /// Check invariants that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.max_in_flight == Some(0) {
            return Err(Error::config(
                "max_in_flight",
                "max_in_flight must be greater than zero when set",
            ));
        }
        if self.event_capacity == 0 {
            return Err(Error::config(
                "event_capacity",
                "event_capacity must be greater than zero",
            ));
        }
        self.retry.validate()
    }
}

/// Retry configuration for transient per-item failures
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first call (default: 5, 0 = never retry)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 500 milliseconds)
    #[serde(default = "default_initial_delay", with = "duration_millis")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_millis")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Retry settings that never retry: every item is fetched exactly once
    pub fn disabled() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }

    /// Returns true if at least one retry may happen
    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 0
    }

    fn validate(&self) -> Result<()> {
        if self.backoff_multiplier.is_nan() || self.backoff_multiplier < 1.0 {
            return Err(Error::config(
                "retry.backoff_multiplier",
                format!(
                    "backoff_multiplier must be at least 1.0, got {}",
                    self.backoff_multiplier
                ),
            ));
        }
        if self.initial_delay > self.max_delay {
            return Err(Error::config(
                "retry.initial_delay",
                "initial_delay must not exceed max_delay",
            ));
        }
        Ok(())
    }
}

/// Settings for the bundled HTTP JSON collaborator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Base URL; the id is appended as the last path segment
    /// (default: "https://jsonplaceholder.typicode.com/posts")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// User-Agent header sent with each request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_event_capacity() -> usize {
    256
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_base_url() -> String {
    "https://jsonplaceholder.typicode.com/posts".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("batch-fetch/{}", env!("CARGO_PKG_VERSION"))
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Duration serialization helper (milliseconds), for retry delays
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_json_gives_reference_defaults() {
        let config = RunnerConfig::from_json_str("{}").unwrap();

        assert_eq!(config.policy, ExecutionPolicy::Sequential);
        assert_eq!(config.max_in_flight, None);
        assert_eq!(config.retry.max_attempts, 0);
        assert!(!config.retry.is_enabled());
        assert_eq!(config, RunnerConfig::default());
    }

    #[test]
    fn retry_delays_are_milliseconds() {
        let config = RunnerConfig::from_json_str(
            r#"{"retry": {"max_attempts": 2, "initial_delay": 50, "max_delay": 400}}"#,
        )
        .unwrap();

        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.retry.initial_delay, Duration::from_millis(50));
        assert_eq!(config.retry.max_delay, Duration::from_millis(400));
        assert!(config.retry.jitter, "jitter defaults to true");
    }

    #[test]
    fn policy_parses_from_snake_case() {
        let config =
            RunnerConfig::from_json_str(r#"{"policy": "concurrent_settled", "max_in_flight": 4}"#)
                .unwrap();

        assert_eq!(config.policy, ExecutionPolicy::ConcurrentSettled);
        assert_eq!(config.max_in_flight, Some(4));
    }

    #[test]
    fn zero_max_in_flight_is_rejected() {
        let err = RunnerConfig::from_json_str(r#"{"max_in_flight": 0}"#).unwrap_err();

        match err {
            Error::Config { key, .. } => assert_eq!(key.as_deref(), Some("max_in_flight")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn zero_event_capacity_is_rejected() {
        let err = RunnerConfig::from_json_str(r#"{"event_capacity": 0}"#).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn shrinking_backoff_is_rejected() {
        let err =
            RunnerConfig::from_json_str(r#"{"retry": {"backoff_multiplier": 0.5}}"#).unwrap_err();

        match err {
            Error::Config { key, .. } => {
                assert_eq!(key.as_deref(), Some("retry.backoff_multiplier"))
            }
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn initial_delay_above_max_is_rejected() {
        let err = RunnerConfig::from_json_str(
            r#"{"retry": {"initial_delay": 5000, "max_delay": 1000}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = RunnerConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"policy": "fold_sequential"}}"#).unwrap();

        let config = RunnerConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.policy, ExecutionPolicy::FoldSequential);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = RunnerConfig::from_json_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn http_config_timeout_is_seconds() {
        let config: HttpConfig =
            serde_json::from_str(r#"{"base_url": "http://localhost:8080/items", "timeout": 5}"#)
                .unwrap();

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.base_url, "http://localhost:8080/items");
        assert!(config.user_agent.starts_with("batch-fetch/"));
    }

    #[test]
    fn retry_config_round_trips() {
        let config = RetryConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: RetryConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
