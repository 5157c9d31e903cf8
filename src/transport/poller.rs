use std::time::Duration;

use reqwest::{Client, StatusCode};
use tokio::time::sleep;
use tracing::debug;

use super::{TransportError, UpdateSource, decode};
use crate::protocol::UpdateDocument;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Polls an HTTP endpoint, one GET per cycle.
///
/// The first dispatch goes out immediately; every later one waits the poll
/// interval first.
pub struct Poller {
    client: Client,
    url: String,
    interval: Duration,
    dispatched: u64,
}

impl Poller {
    pub fn new(url: &str, interval: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, url, interval))
    }

    /// Create a poller around an existing client (useful for testing).
    pub fn with_client(client: Client, url: &str, interval: Duration) -> Self {
        Self {
            client,
            url: url.to_string(),
            interval,
            dispatched: 0,
        }
    }

    /// Number of requests issued so far.
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    async fn fetch(&self) -> Result<UpdateDocument, TransportError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(TransportError::Http {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        decode(&body)
    }
}

impl UpdateSource for Poller {
    async fn next_document(&mut self) -> Result<UpdateDocument, TransportError> {
        if self.dispatched > 0 {
            sleep(self.interval).await;
        }
        self.dispatched += 1;
        debug!(url = %self.url, attempt = self.dispatched, "polling");
        self.fetch().await
    }

    async fn close(&mut self) {}
}
