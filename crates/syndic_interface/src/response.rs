//! Remote responses.

use derive_getters::Getters;
use serde::de::DeserializeOwned;
use syndic_error::{RemoteError, RemoteErrorKind};

/// Status and body of a completed HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq, Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct RemoteResponse {
    /// HTTP status code.
    status: u16,
    /// Raw response body.
    #[builder(default)]
    body: String,
}

impl RemoteResponse {
    /// Returns a builder for constructing a RemoteResponse.
    pub fn builder() -> RemoteResponseBuilder {
        RemoteResponseBuilder::default()
    }

    /// Creates a response from its parts.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parses the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns `UnexpectedPayload` when the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RemoteError> {
        serde_json::from_str(&self.body).map_err(|e| {
            RemoteError::new(RemoteErrorKind::UnexpectedPayload(format!(
                "{e}: {}",
                truncate_body(&self.body)
            )))
        })
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() <= MAX {
        body.to_string()
    } else {
        body.chars().take(MAX).chain(std::iter::once('…')).collect()
    }
}
