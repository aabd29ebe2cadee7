//! The transport seam between adapters and the network.

use crate::{Headers, RemoteResponse};
use async_trait::async_trait;
use syndic_error::{TransportError, TransportErrorKind};

/// HTTP method of a transport call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    /// Read.
    Get,
    /// Write, or a read that needs a request body (GraphQL, Markdown render).
    Post,
}

/// Minimal HTTP client used by platform adapters.
///
/// Implementations must return `Ok` only for 2xx responses; any other status
/// becomes [`TransportErrorKind::Status`] carrying the body. Timeouts and
/// connection failures get their own kinds so callers can tell them apart.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues a GET request.
    ///
    /// # Errors
    ///
    /// Returns error on non-2xx status, network failure or timeout.
    async fn get(&self, url: &str, headers: &Headers) -> Result<RemoteResponse, TransportError>;

    /// Issues a POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns error on non-2xx status, network failure or timeout.
    async fn post(
        &self,
        url: &str,
        headers: &Headers,
        body: &serde_json::Value,
    ) -> Result<RemoteResponse, TransportError>;
}

/// Turns a non-2xx response into a [`TransportErrorKind::Status`] error.
///
/// # Examples
///
/// ```
/// use syndic_interface::{RemoteResponse, ensure_success};
///
/// assert!(ensure_success(RemoteResponse::new(200, "{}")).is_ok());
///
/// let err = ensure_success(RemoteResponse::new(404, "Not Found")).unwrap_err();
/// assert!(err.kind().is_benign_absence());
/// ```
#[track_caller]
pub fn ensure_success(response: RemoteResponse) -> Result<RemoteResponse, TransportError> {
    if response.is_success() {
        Ok(response)
    } else {
        tracing::debug!(status = response.status(), "Non-success response");
        Err(TransportError::new(TransportErrorKind::Status {
            status: *response.status(),
            body: response.body().clone(),
        }))
    }
}
