//! Emission configuration
//!
//! All remote-sink behaviour is driven by environment variables, resolved
//! once into a [`SinkConfig`] at a composition boundary (the process-wide
//! emitter) rather than read ad hoc mid-pipeline. Every setting is optional
//! and falls back to a documented default, including when a timeout value
//! is present but does not parse as a positive integer.

use chrono::NaiveDate;
use std::time::Duration;

/// Enables remote routing and overrides any caller-supplied log function.
pub const ENV_LOGGING_URL: &str = "ELASTIC_LOGGING_URL";
/// Fixes the target index name, bypassing the derived `logs-<service>-<date>`.
pub const ENV_LOGGING_INDEX: &str = "ELASTIC_LOGGING_INDEX";
/// Service name used in the derived index name.
pub const ENV_SERVICE_NAME: &str = "ELASTIC_LOGGING_SERVICE_NAME";
/// Connection probe timeout in milliseconds.
pub const ENV_PING_TIMEOUT: &str = "ELASTIC_PING_TIMEOUT";
/// Per-request timeout in milliseconds.
pub const ENV_REQUEST_TIMEOUT: &str = "ELASTIC_REQUEST_TIMEOUT";
/// Batch flush cadence in milliseconds.
pub const ENV_FLUSH_INTERVAL: &str = "ELASTIC_FLUSH_INTERVAL";

/// Service name used when `ELASTIC_LOGGING_SERVICE_NAME` is unset.
pub const DEFAULT_SERVICE_NAME: &str = "error-custom";

const DEFAULT_PING_TIMEOUT_MS: u64 = 2000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 2000;
const DEFAULT_FLUSH_INTERVAL_MS: u64 = 500;

/// Process-wide emission settings.
///
/// # Example
///
/// ```
/// use error_custom::SinkConfig;
///
/// let config = SinkConfig::default();
/// assert!(config.logging_url.is_none());
/// assert_eq!(config.service_name, "error-custom");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkConfig {
    /// Remote indexing endpoint; `None` disables remote routing.
    pub logging_url: Option<String>,
    /// Explicit index name; `None` derives `logs-<service>-<date>`.
    pub index_override: Option<String>,
    /// Service name for the derived index.
    pub service_name: String,
    /// Connection probe timeout.
    pub ping_timeout: Duration,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Batch flush cadence for the remote writer.
    pub flush_interval: Duration,
}

impl Default for SinkConfig {
    fn default() -> Self {
        SinkConfig {
            logging_url: None,
            index_override: None,
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            ping_timeout: Duration::from_millis(DEFAULT_PING_TIMEOUT_MS),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            flush_interval: Duration::from_millis(DEFAULT_FLUSH_INTERVAL_MS),
        }
    }
}

impl SinkConfig {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve configuration through an arbitrary lookup function.
    ///
    /// Empty values are treated as unset, matching the usual shell habit of
    /// `VAR= command` to disable a setting.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|value| !value.is_empty());

        SinkConfig {
            logging_url: get(ENV_LOGGING_URL),
            index_override: get(ENV_LOGGING_INDEX),
            service_name: get(ENV_SERVICE_NAME)
                .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
            ping_timeout: timeout_ms(get(ENV_PING_TIMEOUT), DEFAULT_PING_TIMEOUT_MS),
            request_timeout: timeout_ms(get(ENV_REQUEST_TIMEOUT), DEFAULT_REQUEST_TIMEOUT_MS),
            flush_interval: timeout_ms(get(ENV_FLUSH_INTERVAL), DEFAULT_FLUSH_INTERVAL_MS),
        }
    }

    /// Target index for a given UTC date.
    ///
    /// The override wins when present; otherwise one index per service per
    /// day: `logs-<service>-<YYYY-MM-DD>`.
    pub fn index_name(&self, date: NaiveDate) -> String {
        match &self.index_override {
            Some(index) => index.clone(),
            None => format!("logs-{}-{}", self.service_name, date.format("%Y-%m-%d")),
        }
    }
}

/// Parse a millisecond setting, falling back to the default when the value
/// is absent, non-numeric, or zero.
fn timeout_ms(value: Option<String>, default_ms: u64) -> Duration {
    let ms = value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|&ms| ms > 0)
        .unwrap_or(default_ms);
    Duration::from_millis(ms)
}
