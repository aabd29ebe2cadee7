//! Errors reported by a remote API that answered with a 2xx status.

/// Remote API failure conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum RemoteErrorKind {
    /// GraphQL response carried an `errors` array.
    #[display("{}", _0.join("\n"))]
    GraphQl(Vec<String>),
    /// Remote says the object does not exist or is not visible.
    #[display("Not found: {_0}")]
    NotFound(String),
    /// Expected field is absent from the response.
    #[display("Response is missing {_0}")]
    MissingField(String),
    /// Response is not the JSON we expected.
    #[display("Unexpected response: {_0}")]
    UnexpectedPayload(String),
}

/// Remote API error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Remote Error: {} at line {} in {}", kind, line, file)]
pub struct RemoteError {
    kind: RemoteErrorKind,
    line: u32,
    file: &'static str,
}

impl RemoteError {
    /// Create a new remote error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RemoteErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &RemoteErrorKind {
        &self.kind
    }
}

impl From<RemoteErrorKind> for RemoteError {
    #[track_caller]
    fn from(kind: RemoteErrorKind) -> Self {
        Self::new(kind)
    }
}

#[cfg(feature = "json")]
impl From<serde_json::Error> for RemoteError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::new(RemoteErrorKind::UnexpectedPayload(err.to_string()))
    }
}
