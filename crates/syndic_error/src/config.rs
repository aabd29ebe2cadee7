//! Configuration error types.

/// Configuration failure conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ConfigErrorKind {
    /// Config file could not be read.
    #[display("Could not read configuration: {_0}")]
    Read(String),
    /// Config file is not valid TOML or has the wrong shape.
    #[display("Could not parse configuration: {_0}")]
    Parse(String),
    /// No platform with this name is configured.
    #[display("Unknown platform: {_0}")]
    UnknownPlatform(String),
    /// Access token environment variable is not set.
    #[display("Access token variable {_0} is not set")]
    MissingToken(String),
    /// A path template or fragment rule is malformed.
    #[display("Invalid grammar: {_0}")]
    InvalidGrammar(String),
    /// HTTP client could not be constructed.
    #[display("Could not build HTTP client: {_0}")]
    Client(String),
}

/// Configuration error with source location.
///
/// # Examples
///
/// ```
/// use syndic_error::{ConfigError, ConfigErrorKind};
///
/// let err = ConfigError::new(ConfigErrorKind::MissingToken("GITHUB_TOKEN".into()));
/// assert!(err.to_string().contains("GITHUB_TOKEN"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", kind, line, file)]
pub struct ConfigError {
    kind: ConfigErrorKind,
    line: u32,
    file: &'static str,
}

impl ConfigError {
    /// Create a new ConfigError with the given kind at the current location.
    #[track_caller]
    pub fn new(kind: ConfigErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ConfigErrorKind {
        &self.kind
    }
}

impl From<ConfigErrorKind> for ConfigError {
    #[track_caller]
    fn from(kind: ConfigErrorKind) -> Self {
        Self::new(kind)
    }
}
