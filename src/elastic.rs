//! Remote sink: Elasticsearch-compatible REST transport
//!
//! Documents are handed to a background writer thread over a channel, so
//! the constructing caller never blocks on network I/O. The writer
//! coalesces whatever arrives within one flush interval and ships each
//! batch with the `_bulk` API, creating the target index first if it does
//! not exist yet. Two writers racing to create the same index is benign;
//! the loser's `400` is accepted. All failures are reported on the
//! `error_custom::elastic` tracing target and never propagate.

use crate::config::SinkConfig;
use crate::sink::RemoteTransport;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// One queued occurrence document.
struct Envelope {
    endpoint: String,
    index: String,
    document: serde_json::Value,
}

/// Failures on the remote path. Logged, never surfaced to the caller.
#[derive(Debug, Error)]
pub(crate) enum TransportError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: ureq::Error,
    },

    #[error("index {index} could not be created: status {status}")]
    IndexCreate { index: String, status: u16 },

    #[error("bulk write to {index} rejected: status {status}")]
    BulkRejected { index: String, status: u16 },

    #[error("failed to encode bulk body: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Production [`RemoteTransport`] backed by a lazily started writer thread.
pub(crate) struct ElasticTransport {
    ping_timeout: Duration,
    request_timeout: Duration,
    flush_interval: Duration,
    queue: OnceCell<Mutex<Sender<Envelope>>>,
}

impl ElasticTransport {
    pub(crate) fn new(config: &SinkConfig) -> Self {
        ElasticTransport {
            ping_timeout: config.ping_timeout,
            request_timeout: config.request_timeout,
            flush_interval: config.flush_interval,
            queue: OnceCell::new(),
        }
    }

    /// Start the writer thread on first use.
    fn queue(&self) -> &Mutex<Sender<Envelope>> {
        self.queue.get_or_init(|| {
            let (tx, rx) = mpsc::channel();
            let ping = self.ping_timeout;
            let request = self.request_timeout;
            let flush = self.flush_interval;
            // A failed spawn leaves a sender with no receiver; dispatch then
            // drops records with a warning instead of panicking.
            let spawned = thread::Builder::new()
                .name("error-custom-elastic".to_string())
                .spawn(move || writer_loop(rx, ping, request, flush));
            if let Err(e) = spawned {
                tracing::warn!(
                    target: "error_custom::elastic",
                    error = %e,
                    "Could not start the background writer"
                );
            }
            Mutex::new(tx)
        })
    }
}

impl RemoteTransport for ElasticTransport {
    fn dispatch(&self, endpoint: String, index: String, document: serde_json::Value) {
        let envelope = Envelope {
            endpoint,
            index,
            document,
        };
        if self.queue().lock().send(envelope).is_err() {
            tracing::warn!(
                target: "error_custom::elastic",
                "Background writer is gone, dropping error record"
            );
        }
    }
}

/// Drain the queue forever, flushing one coalesced batch per wakeup.
fn writer_loop(rx: Receiver<Envelope>, ping: Duration, request: Duration, flush: Duration) {
    while let Ok(first) = rx.recv() {
        let mut batch = vec![first];
        let deadline = Instant::now() + flush;
        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            match rx.recv_timeout(deadline - now) {
                Ok(envelope) => batch.push(envelope),
                Err(_) => break,
            }
        }
        flush_batch(batch, ping, request);
    }
}

fn flush_batch(batch: Vec<Envelope>, ping: Duration, request: Duration) {
    let agent = build_agent(ping, request);

    let mut groups: BTreeMap<(String, String), Vec<serde_json::Value>> = BTreeMap::new();
    for envelope in batch {
        groups
            .entry((envelope.endpoint, envelope.index))
            .or_default()
            .push(envelope.document);
    }

    for ((endpoint, index), documents) in groups {
        if let Err(e) = deliver(&agent, &endpoint, &index, &documents) {
            tracing::warn!(
                target: "error_custom::elastic",
                endpoint = %endpoint,
                index = %index,
                count = documents.len(),
                error = %e,
                "Failed to ship error records"
            );
        }
    }
}

fn build_agent(ping: Duration, request: Duration) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_connect(Some(ping))
        .timeout_global(Some(request))
        .http_status_as_error(false)
        .build();
    ureq::Agent::new_with_config(config)
}

fn deliver(
    agent: &ureq::Agent,
    endpoint: &str,
    index: &str,
    documents: &[serde_json::Value],
) -> Result<(), TransportError> {
    ensure_index(agent, endpoint, index)?;

    let body = bulk_body(index, documents)?;
    let url = join_url(endpoint, "_bulk");
    let response = agent
        .post(&url)
        .header("Content-Type", "application/x-ndjson")
        .send(body.as_bytes())
        .map_err(|source| TransportError::Request {
            url: url.clone(),
            source,
        })?;

    let status = response.status().as_u16();
    if !(200..300).contains(&status) {
        return Err(TransportError::BulkRejected {
            index: index.to_string(),
            status,
        });
    }
    Ok(())
}

/// Probe for the index and create it when absent.
fn ensure_index(agent: &ureq::Agent, endpoint: &str, index: &str) -> Result<(), TransportError> {
    let index_url = join_url(endpoint, index);
    let probe = agent
        .head(&index_url)
        .call()
        .map_err(|source| TransportError::Request {
            url: index_url.clone(),
            source,
        })?;
    if probe.status().as_u16() == 200 {
        return Ok(());
    }

    let created = agent
        .put(&index_url)
        .send_empty()
        .map_err(|source| TransportError::Request {
            url: index_url.clone(),
            source,
        })?;
    let status = created.status().as_u16();
    // 400 here is resource_already_exists: another writer won the race.
    if (200..300).contains(&status) || status == 400 {
        Ok(())
    } else {
        Err(TransportError::IndexCreate {
            index: index.to_string(),
            status,
        })
    }
}

/// One action line plus one source line per document, newline terminated.
fn bulk_body(index: &str, documents: &[serde_json::Value]) -> Result<String, serde_json::Error> {
    let mut body = String::new();
    for document in documents {
        let action = serde_json::json!({ "index": { "_index": index } });
        body.push_str(&serde_json::to_string(&action)?);
        body.push('\n');
        body.push_str(&serde_json::to_string(document)?);
        body.push('\n');
    }
    Ok(body)
}

fn join_url(endpoint: &str, path: &str) -> String {
    format!("{}/{}", endpoint.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url_handles_trailing_slash() {
        assert_eq!(
            join_url("http://localhost:9200/", "_bulk"),
            "http://localhost:9200/_bulk"
        );
        assert_eq!(
            join_url("http://localhost:9200", "logs-svc-2024-01-05"),
            "http://localhost:9200/logs-svc-2024-01-05"
        );
    }

    #[test]
    fn test_bulk_body_one_action_one_source_per_document() {
        let documents = vec![
            serde_json::json!({ "message": "first" }),
            serde_json::json!({ "message": "second" }),
        ];
        let body = bulk_body("logs-svc-2024-01-05", &documents).unwrap();

        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[0],
            r#"{"index":{"_index":"logs-svc-2024-01-05"}}"#
        );
        assert_eq!(lines[1], r#"{"message":"first"}"#);
        assert_eq!(
            lines[2],
            r#"{"index":{"_index":"logs-svc-2024-01-05"}}"#
        );
        assert_eq!(lines[3], r#"{"message":"second"}"#);
        assert!(body.ends_with('\n'));
    }

    #[test]
    fn test_bulk_body_empty_batch() {
        let body = bulk_body("logs", &[]).unwrap();
        assert!(body.is_empty());
    }

    #[test]
    fn test_dispatch_does_not_block() {
        let transport = ElasticTransport::new(&SinkConfig::default());
        let start = Instant::now();
        transport.dispatch(
            "http://localhost:1".to_string(),
            "logs".to_string(),
            serde_json::json!({ "message": "m" }),
        );
        // Enqueue only; delivery (and its failure) happens on the writer.
        assert!(start.elapsed() < Duration::from_millis(500));
    }
}
