//! Occurrence emission: routing and sinks
//!
//! Every construction emits exactly one occurrence record. The destination
//! is decided by [`route`], a pure function over the resolved configuration
//! and the caller-supplied [`LogFunction`], evaluated in a fixed priority
//! order:
//!
//! 1. configured remote URL → remote sink, log function ignored
//! 2. callback → invoked with `(id, error)`
//! 3. string parsing as a URL with a host → remote sink at that endpoint
//! 4. anything else → the local `error-custom` channel
//!
//! The remote sink is behind the [`RemoteTransport`] trait so tests inject a
//! recording fake instead of relying on a live backend or real timing.

use crate::config::SinkConfig;
use crate::elastic::ElasticTransport;
use crate::error::ErrorCustom;
use chrono::Utc;
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::Arc;

/// Channel name for the local default output.
pub const LOG_CHANNEL: &str = "error-custom";

// ============================================================================
// LogFunction
// ============================================================================

/// Signature of a caller-supplied logging callback.
pub type LogCallback = Box<dyn Fn(&str, &ErrorCustom) + Send + Sync>;

/// Caller-selected occurrence sink.
pub enum LogFunction {
    /// Invoke this callback with `(id, error)`.
    Callback(LogCallback),
    /// A string destination: treated as a remote endpoint when it parses as
    /// a URL with a host, otherwise falls through to the local channel.
    Target(String),
}

impl LogFunction {
    /// Wrap a logging callback.
    pub fn callback(f: impl Fn(&str, &ErrorCustom) + Send + Sync + 'static) -> Self {
        LogFunction::Callback(Box::new(f))
    }

    /// Name a string destination.
    pub fn target(destination: impl Into<String>) -> Self {
        LogFunction::Target(destination.into())
    }
}

impl fmt::Debug for LogFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFunction::Callback(_) => f.write_str("LogFunction::Callback"),
            LogFunction::Target(target) => f.debug_tuple("LogFunction::Target").field(target).finish(),
        }
    }
}

// ============================================================================
// Routing
// ============================================================================

/// The single emission action selected for one construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Ship to the remote indexing backend at this endpoint.
    Remote(String),
    /// Invoke the caller's callback.
    Callback,
    /// Emit on the local `error-custom` channel.
    Local,
}

/// Decide the emission destination.
///
/// A configured remote URL always wins and the log function is ignored
/// entirely. A string destination without a URL host is conclusively local;
/// it never reaches the remote path.
pub fn route(remote_url: Option<&str>, log_function: Option<&LogFunction>) -> Route {
    if let Some(url) = remote_url {
        return Route::Remote(url.to_string());
    }
    match log_function {
        Some(LogFunction::Callback(_)) => Route::Callback,
        Some(LogFunction::Target(target)) if has_url_host(target) => {
            Route::Remote(target.clone())
        }
        Some(LogFunction::Target(_)) | None => Route::Local,
    }
}

fn has_url_host(target: &str) -> bool {
    url::Url::parse(target)
        .map(|parsed| parsed.has_host())
        .unwrap_or(false)
}

/// Local default output: one tagged debug record per occurrence.
pub(crate) fn default_output(error: &ErrorCustom) {
    let payload =
        serde_json::to_string(error).unwrap_or_else(|_| error.message().to_string());
    tracing::debug!(target: "error-custom", id = %error.id(), %payload);
}

// ============================================================================
// Emitter
// ============================================================================

/// Transport seam for the remote sink.
///
/// `dispatch` must not block on network I/O; the production implementation
/// hands the document to a background writer and returns immediately.
pub trait RemoteTransport: Send + Sync {
    /// Schedule one occurrence document for delivery.
    fn dispatch(&self, endpoint: String, index: String, document: serde_json::Value);
}

/// The emission pipeline: resolved configuration plus a remote transport.
pub struct Emitter {
    config: SinkConfig,
    transport: Arc<dyn RemoteTransport>,
}

static GLOBAL_EMITTER: Lazy<Emitter> = Lazy::new(Emitter::from_env);

/// Process-wide emitter backed by environment configuration, resolved once.
pub(crate) fn global_emitter() -> &'static Emitter {
    &GLOBAL_EMITTER
}

impl Emitter {
    /// Build an emitter from explicit parts.
    pub fn new(config: SinkConfig, transport: Arc<dyn RemoteTransport>) -> Self {
        Emitter { config, transport }
    }

    /// Build the production emitter: environment configuration and the
    /// Elasticsearch transport.
    pub fn from_env() -> Self {
        let config = SinkConfig::from_env();
        let transport = Arc::new(ElasticTransport::new(&config));
        Emitter { config, transport }
    }

    /// Resolved configuration backing this emitter.
    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    /// Emit one occurrence record for a freshly constructed error.
    ///
    /// Returns the route that was taken. The remote arm also echoes the
    /// record on the local channel before scheduling the send, as a
    /// durability fallback.
    pub(crate) fn emit(&self, error: &ErrorCustom, log_function: Option<&LogFunction>) -> Route {
        let decision = route(self.config.logging_url.as_deref(), log_function);
        match &decision {
            Route::Remote(endpoint) => {
                default_output(error);
                let index = self.config.index_name(Utc::now().date_naive());
                self.transport
                    .dispatch(endpoint.clone(), index, occurrence_document(error));
            }
            Route::Callback => {
                if let Some(LogFunction::Callback(callback)) = log_function {
                    callback(error.id(), error);
                }
            }
            Route::Local => default_output(error),
        }
        decision
    }
}

/// The document written to the remote backend for one occurrence.
pub(crate) fn occurrence_document(error: &ErrorCustom) -> serde_json::Value {
    serde_json::json!({
        "@timestamp": Utc::now().to_rfc3339(),
        "severity": "error",
        "message": error.message(),
        "fields": error,
    })
}

#[cfg(test)]
pub(crate) fn discarding_transport() -> Arc<dyn RemoteTransport> {
    struct Discard;
    impl RemoteTransport for Discard {
        fn dispatch(&self, _endpoint: String, _index: String, _document: serde_json::Value) {}
    }
    Arc::new(Discard)
}
