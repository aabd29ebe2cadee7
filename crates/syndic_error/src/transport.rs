//! Transport error types.

/// Status codes that mean the remote object is gone or hidden rather than
/// that the request itself was wrong.
///
/// 404 and 410 are returned for deleted issues, repos and statuses; 451 for
/// legal takedowns.
pub const BENIGN_ABSENCE_STATUSES: [u16; 3] = [404, 410, 451];

/// Transport failure conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum TransportErrorKind {
    /// Remote answered with a non-2xx status.
    #[display("HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },
    /// Connection, DNS or TLS failure.
    #[display("Network error: {_0}")]
    Network(String),
    /// Request exceeded the configured timeout.
    #[display("Request timed out: {_0}")]
    Timeout(String),
    /// Response body could not be decoded.
    #[display("Could not decode response body: {_0}")]
    Decode(String),
}

impl TransportErrorKind {
    /// HTTP status code, if the remote answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this error only says the remote object is missing or hidden.
    pub fn is_benign_absence(&self) -> bool {
        self.status()
            .is_some_and(|status| BENIGN_ABSENCE_STATUSES.contains(&status))
    }
}

/// Transport error with source location tracking.
///
/// # Examples
///
/// ```
/// use syndic_error::{TransportError, TransportErrorKind};
///
/// let err = TransportError::new(TransportErrorKind::Status {
///     status: 404,
///     body: "Not Found".to_string(),
/// });
/// assert!(err.kind().is_benign_absence());
/// assert!(err.to_string().contains("HTTP 404"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Transport Error: {} at line {} in {}", kind, line, file)]
pub struct TransportError {
    kind: TransportErrorKind,
    line: u32,
    file: &'static str,
}

impl TransportError {
    /// Create a new transport error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: TransportErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &TransportErrorKind {
        &self.kind
    }
}

impl From<TransportErrorKind> for TransportError {
    #[track_caller]
    fn from(kind: TransportErrorKind) -> Self {
        Self::new(kind)
    }
}
