//! Configuration for the Freightline controller

use freightline_registry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main controller configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Conflict retry configuration
    #[serde(default)]
    pub retry: RetryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Retries of read-mutate-write cycles that lose an optimistic-concurrency race
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause between attempts in milliseconds
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.backoff_ms))
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_ms() -> u64 {
    50
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ControllerConfig {
    /// Load configuration from defaults, an optional file, then the environment.
    ///
    /// Environment variables use the `FREIGHTLINE_` prefix and `__` between
    /// nested keys, e.g. `FREIGHTLINE_RETRY__MAX_ATTEMPTS=10`.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&ControllerConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("FREIGHTLINE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ControllerConfig::default();
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.backoff_ms, 50);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_retry_policy_conversion() {
        let retry = RetryConfig {
            max_attempts: 3,
            backoff_ms: 250,
        };
        assert_eq!(retry.policy(), RetryPolicy::new(3, Duration::from_millis(250)));
    }

    #[test]
    fn test_partial_sections_use_field_defaults() {
        let config: ControllerConfig =
            serde_json::from_str(r#"{"retry": {"max_attempts": 9}}"#).unwrap();
        assert_eq!(config.retry.max_attempts, 9);
        assert_eq!(config.retry.backoff_ms, 50);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[retry]\nmax_attempts = 2\nbackoff_ms = 10\n\n[logging]\njson = true"
        )
        .unwrap();

        let config = ControllerConfig::load(file.path().to_str()).unwrap();
        assert_eq!(config.retry.max_attempts, 2);
        assert_eq!(config.retry.backoff_ms, 10);
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = ControllerConfig::load(Some("/nonexistent/freightline")).unwrap();
        assert_eq!(config.retry, RetryConfig::default());
    }
}
