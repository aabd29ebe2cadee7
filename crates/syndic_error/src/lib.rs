//! Error types for the syndic publishing pipeline.
//!
//! Every error carries the file and line where it was created. Domain errors
//! ([`TransportError`], [`RemoteError`], [`ConfigError`]) fold into the
//! umbrella [`SyndicError`] through `?`.
//!
//! Note that precondition failures of a publish request (missing target,
//! unsupported verb, no matching tags) are *not* errors: the pipeline reports
//! them as an aborted `CreationResult`.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod remote;
mod transport;

pub use config::{ConfigError, ConfigErrorKind};
pub use remote::{RemoteError, RemoteErrorKind};
pub use transport::{BENIGN_ABSENCE_STATUSES, TransportError, TransportErrorKind};

/// Umbrella error conditions.
#[derive(Debug, Clone, derive_more::Display, derive_more::From)]
pub enum SyndicErrorKind {
    /// Wire-level failure.
    #[display("{_0}")]
    Transport(TransportError),
    /// Remote API rejected or garbled the request.
    #[display("{_0}")]
    Remote(RemoteError),
    /// Invalid configuration.
    #[display("{_0}")]
    Config(ConfigError),
}

/// Syndic error with location tracking.
///
/// # Examples
///
/// ```
/// use syndic_error::{SyndicError, TransportError, TransportErrorKind};
///
/// let err: SyndicError = TransportError::new(TransportErrorKind::Timeout("30s".into())).into();
/// assert!(err.to_string().contains("timed out"));
/// assert!(!err.is_benign_absence());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Syndic Error: {} at line {} in {}", kind, line, file)]
pub struct SyndicError {
    kind: SyndicErrorKind,
    line: u32,
    file: &'static str,
}

impl SyndicError {
    /// Create a new error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: SyndicErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &SyndicErrorKind {
        &self.kind
    }

    /// Whether the underlying failure only says the remote object is gone.
    pub fn is_benign_absence(&self) -> bool {
        match &self.kind {
            SyndicErrorKind::Transport(e) => e.kind().is_benign_absence(),
            SyndicErrorKind::Remote(e) => matches!(e.kind(), RemoteErrorKind::NotFound(_)),
            SyndicErrorKind::Config(_) => false,
        }
    }

    /// Human readable message without location decoration.
    ///
    /// This is what ends up in a result's `error_plain`.
    pub fn message(&self) -> String {
        match &self.kind {
            SyndicErrorKind::Transport(e) => e.kind().to_string(),
            SyndicErrorKind::Remote(e) => e.kind().to_string(),
            SyndicErrorKind::Config(e) => e.kind().to_string(),
        }
    }
}

impl<T> From<T> for SyndicError
where
    T: Into<SyndicErrorKind>,
{
    #[track_caller]
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for syndic operations.
pub type SyndicResult<T> = Result<T, SyndicError>;
