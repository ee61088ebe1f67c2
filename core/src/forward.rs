//! # Forwarding Sink Adapter
//!
//! Best-effort delivery of each roster to an external HTTP endpoint. Failures
//! are logged and dropped; the next tick's roster supersedes a lost one.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use presence_common::network::host::HostRecord;

#[derive(Debug, Error)]
pub enum ForwardingError {
    #[error("failed to build forwarding client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to forwarding sink failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("forwarding sink rejected roster with status {0}")]
    Rejected(u16),
}

#[derive(Serialize)]
struct ForwardPayload<'a> {
    json: &'a [HostRecord],
}

pub struct Forwarder {
    client: reqwest::Client,
    endpoint: Option<Url>,
}

impl Forwarder {
    /// `timeout` bounds each request so a slow sink cannot stall the tick loop.
    pub fn new(endpoint: Option<Url>, timeout: Duration) -> Result<Self, ForwardingError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ForwardingError::Client)?;
        Ok(Self { client, endpoint })
    }

    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Sends `roster` to the configured endpoint. Never fails; without an
    /// endpoint this is a no-op.
    pub async fn forward(&self, roster: &[HostRecord]) {
        let Some(endpoint) = &self.endpoint else {
            return;
        };

        match self.try_forward(endpoint, roster).await {
            Ok(()) => debug!(%endpoint, hosts = roster.len(), "roster forwarded"),
            Err(e) => warn!(%endpoint, error = %e, "failed to forward roster"),
        }
    }

    /// POSTs `{"json": roster}`. Any non-2xx answer is a failure.
    pub async fn try_forward(
        &self,
        endpoint: &Url,
        roster: &[HostRecord],
    ) -> Result<(), ForwardingError> {
        let response = self
            .client
            .post(endpoint.clone())
            .json(&ForwardPayload { json: roster })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ForwardingError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}
