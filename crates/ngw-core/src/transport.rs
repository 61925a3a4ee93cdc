//! HTTP transport used by the protocol worker.
//!
//! The worker only needs "fetch these bytes or fail". [`ReqwestTransport`]
//! does that over blocking HTTP; [`MemoryTransport`] serves canned replies
//! for tests and offline fixtures.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use log::{debug, trace};

use crate::error::TransportError;

/// Synchronous "fetch bytes or fail" primitive.
///
/// Implementations do their own timeouts; nothing above this trait retries.
pub trait Transport: Send + Sync + fmt::Debug {
    /// Performs an HTTP GET request and returns the body.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] if the request cannot complete, the status
    /// is not a success or the body cannot be read.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}

/// Blocking HTTP transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// Creates a transport with the given request timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Client`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| TransportError::Client {
                message: e.to_string(),
            })?;

        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| TransportError::Request {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().map_err(|e| TransportError::Request {
            url: url.to_string(),
            message: format!("Failed to read response: {e}"),
        })?;

        if body.is_empty() {
            return Err(TransportError::EmptyReply {
                url: url.to_string(),
            });
        }

        trace!("{} byte(s) from {url}", body.len());
        Ok(body.to_vec())
    }
}

/// Transport serving canned replies keyed by exact URL.
///
/// Unknown URLs answer with HTTP 404. Every fetch is counted so callers can
/// check how often a URL was requested.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    replies: HashMap<String, Result<Vec<u8>, TransportError>>,
    fetches: Mutex<HashMap<String, usize>>,
}

impl MemoryTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`.
    #[must_use]
    pub fn with_reply(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.replies.insert(url.into(), Ok(body.into()));
        self
    }

    /// Serve a JSON document for `url`.
    #[must_use]
    pub fn with_json(self, url: impl Into<String>, json: &str) -> Self {
        self.with_reply(url, json.as_bytes().to_vec())
    }

    /// Fail every fetch of `url` with `error`.
    #[must_use]
    pub fn with_error(mut self, url: impl Into<String>, error: TransportError) -> Self {
        self.replies.insert(url.into(), Err(error));
        self
    }

    /// Number of fetches of `url` so far.
    #[must_use]
    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetches
            .lock()
            .map(|fetches| fetches.get(url).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Number of fetches across all URLs so far.
    #[must_use]
    pub fn total_fetches(&self) -> usize {
        self.fetches
            .lock()
            .map(|fetches| fetches.values().sum())
            .unwrap_or(0)
    }
}

impl Transport for MemoryTransport {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        if let Ok(mut fetches) = self.fetches.lock() {
            *fetches.entry(url.to_string()).or_insert(0) += 1;
        }

        match self.replies.get(url) {
            Some(Ok(body)) if body.is_empty() => Err(TransportError::EmptyReply {
                url: url.to_string(),
            }),
            Some(reply) => reply.clone(),
            None => Err(TransportError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_transport_serves_and_counts() {
        let transport = MemoryTransport::new().with_json("http://ngw/a", r#"{"ok":true}"#);

        assert_eq!(transport.fetch("http://ngw/a").unwrap(), br#"{"ok":true}"#.to_vec());
        assert_eq!(transport.fetch("http://ngw/a").unwrap().len(), 11);
        assert_eq!(transport.fetch_count("http://ngw/a"), 2);
        assert_eq!(transport.fetch_count("http://ngw/b"), 0);
    }

    #[test]
    fn memory_transport_unknown_url_is_404() {
        let transport = MemoryTransport::new();
        let err = transport.fetch("http://ngw/missing").unwrap_err();
        assert_eq!(
            err,
            TransportError::Status {
                url: "http://ngw/missing".to_string(),
                status: 404,
            }
        );
        assert_eq!(transport.total_fetches(), 1);
    }

    #[test]
    fn memory_transport_replays_errors_and_empty_bodies() {
        let transport = MemoryTransport::new()
            .with_error(
                "http://ngw/down",
                TransportError::Request {
                    url: "http://ngw/down".to_string(),
                    message: "connection refused".to_string(),
                },
            )
            .with_reply("http://ngw/empty", Vec::new());

        assert!(matches!(
            transport.fetch("http://ngw/down"),
            Err(TransportError::Request { .. })
        ));
        assert!(matches!(
            transport.fetch("http://ngw/empty"),
            Err(TransportError::EmptyReply { .. })
        ));
    }

    #[test]
    fn reqwest_transport_builds() {
        let transport = ReqwestTransport::new(Duration::from_secs(5), "ngw-test");
        assert!(transport.is_ok());
    }
}
