//! Transport adapters that fetch update documents from the network.
//!
//! Both adapters implement [`UpdateSource`] and decode bodies through the
//! same [`decode`] function, so a session cannot tell them apart.

mod error;
mod poller;
mod stream;

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::protocol::UpdateDocument;

pub use error::TransportError;
pub use poller::Poller;
pub use stream::{HANDSHAKE, StreamListener};

/// A source of update documents: "next document or terminal error".
pub trait UpdateSource {
    /// Waits for and returns the next update document.
    fn next_document(&mut self) -> impl Future<Output = Result<UpdateDocument, TransportError>> + Send;

    /// Releases the underlying connection, if any. Safe to call repeatedly.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Decodes a raw message body into an update document.
///
/// Only syntactically broken JSON is an error; anything that parses is
/// handed to the classifier.
pub fn decode(body: &str) -> Result<UpdateDocument, TransportError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| TransportError::Parse(e.to_string()))?;
    Ok(UpdateDocument::from_value(value))
}

/// Which adapter a session uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Request/response polling over HTTP.
    Poll,
    /// Persistent WebSocket stream.
    Stream,
}

impl TransportKind {
    /// `ws://` and `wss://` endpoints stream; everything else polls.
    pub fn infer(endpoint: &str) -> Self {
        let lower = endpoint.trim_start().to_ascii_lowercase();
        if lower.starts_with("ws://") || lower.starts_with("wss://") {
            TransportKind::Stream
        } else {
            TransportKind::Poll
        }
    }
}

/// Either adapter, so one session type covers both transports.
pub enum Transport {
    Poll(Poller),
    Stream(StreamListener),
}

impl Transport {
    pub fn open(
        kind: TransportKind,
        endpoint: &str,
        poll_interval: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(match kind {
            TransportKind::Poll => Transport::Poll(Poller::new(endpoint, poll_interval)?),
            TransportKind::Stream => Transport::Stream(StreamListener::new(endpoint)),
        })
    }
}

impl UpdateSource for Transport {
    async fn next_document(&mut self) -> Result<UpdateDocument, TransportError> {
        match self {
            Transport::Poll(p) => p.next_document().await,
            Transport::Stream(s) => s.next_document().await,
        }
    }

    async fn close(&mut self) {
        match self {
            Transport::Poll(p) => p.close().await,
            Transport::Stream(s) => s.close().await,
        }
    }
}
