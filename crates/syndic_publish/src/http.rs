//! Real HTTP transport backed by reqwest.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use syndic_error::{ConfigError, ConfigErrorKind, TransportError, TransportErrorKind};
use syndic_interface::{Headers, RemoteResponse, Transport, ensure_success};
use tracing::{debug, error, instrument};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

const USER_AGENT: &str = concat!("syndic/", env!("CARGO_PKG_VERSION"));

/// [`Transport`] over a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Creates a transport with a request timeout.
    ///
    /// # Errors
    ///
    /// Returns error if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ConfigError::new(ConfigErrorKind::Client(e.to_string())))?;
        debug!(timeout_secs = timeout.as_secs(), "Created HTTP transport");
        Ok(Self { client, timeout })
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn send(&self, request: RequestBuilder, headers: &Headers) -> Result<RemoteResponse, TransportError> {
        let request = headers
            .iter()
            .fold(request, |request, (name, value)| request.header(name, value));

        let response = request.send().await.map_err(|e| {
            error!(error = ?e, "HTTP request failed");
            if e.is_timeout() {
                TransportError::new(TransportErrorKind::Timeout(format!("{:?}", self.timeout)))
            } else {
                TransportError::new(TransportErrorKind::Network(e.to_string()))
            }
        })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            error!(status, error = ?e, "Failed to read response body");
            TransportError::new(TransportErrorKind::Decode(e.to_string()))
        })?;
        debug!(status, len = body.len(), "Received response");

        ensure_success(RemoteResponse::new(status, body))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, headers))]
    async fn get(&self, url: &str, headers: &Headers) -> Result<RemoteResponse, TransportError> {
        self.send(self.client.get(url), headers).await
    }

    #[instrument(skip(self, headers, body))]
    async fn post(
        &self,
        url: &str,
        headers: &Headers,
        body: &serde_json::Value,
    ) -> Result<RemoteResponse, TransportError> {
        self.send(self.client.post(url).json(body), headers).await
    }
}
