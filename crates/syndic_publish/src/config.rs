//! TOML configuration for platforms.
//!
//! ```toml
//! [platforms.github]
//! kind = "github"
//! token_env = "GITHUB_TOKEN"
//!
//! [platforms.mastodon]
//! kind = "mastodon"
//! base_url = "https://mastodon.social"
//! token_env = "MASTODON_TOKEN"
//! max_length = 500
//! user_id = "109"
//!
//! [platforms.mastodon.lookup_policy]
//! reply = "benign-absence"
//! ```

use crate::{
    DEFAULT_TIMEOUT_SECONDS, GitHub, HttpTransport, LookupPolicy, Mastodon, OperationKind, Platform,
    PlatformGrammar, PlatformKind, Publisher,
};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use syndic_error::{ConfigError, ConfigErrorKind};
use syndic_interface::Transport;
use tracing::{debug, instrument};

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Getters)]
pub struct SyndicConfig {
    /// Platforms by name.
    #[serde(default)]
    platforms: BTreeMap<String, PlatformConfig>,
}

impl SyndicConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed.
    #[instrument(skip(path))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::new(ConfigErrorKind::Read(format!(
                "{}: {}",
                path.as_ref().display(),
                e
            )))
        })?;
        content.parse()
    }

    /// Configuration of one platform.
    ///
    /// # Errors
    ///
    /// Returns error if no platform has this name.
    pub fn platform(&self, name: &str) -> Result<&PlatformConfig, ConfigError> {
        self.platforms
            .get(name)
            .ok_or_else(|| ConfigError::new(ConfigErrorKind::UnknownPlatform(name.to_string())))
    }
}

impl FromStr for SyndicConfig {
    type Err = ConfigError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(ConfigErrorKind::Parse(e.to_string())))?;
        debug!(platforms = config.platforms.len(), "Parsed configuration");
        Ok(config)
    }
}

/// One platform section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct PlatformConfig {
    /// Which adapter to use.
    kind: PlatformKind,
    /// Web base URL. Required for Mastodon; GitHub defaults to github.com.
    #[serde(default)]
    #[builder(default)]
    base_url: Option<String>,
    /// API base URL, for GitHub Enterprise.
    #[serde(default)]
    #[builder(default)]
    api_base: Option<String>,
    /// Environment variable holding the access token.
    token_env: String,
    /// Overrides the grammar's length limit.
    #[serde(default)]
    #[builder(default)]
    max_length: Option<usize>,
    /// Overrides the grammar's link width.
    #[serde(default)]
    #[builder(default)]
    link_width: Option<usize>,
    /// Request timeout.
    #[serde(default)]
    #[builder(default)]
    timeout_seconds: Option<u64>,
    /// Authenticated account id, used in Mastodon favourite URLs.
    #[serde(default)]
    #[builder(default)]
    user_id: Option<String>,
    /// Per-operation lookup policy overrides.
    #[serde(default)]
    #[builder(default)]
    lookup_policy: BTreeMap<OperationKind, LookupPolicy>,
    /// Full grammar replacing the built-in one.
    #[serde(default)]
    #[builder(default)]
    grammar: Option<PlatformGrammar>,
}

impl PlatformConfig {
    /// Returns a builder for constructing a PlatformConfig.
    pub fn builder() -> PlatformConfigBuilder {
        PlatformConfigBuilder::default()
    }

    /// Grammar after applying this section's overrides.
    ///
    /// # Errors
    ///
    /// Returns error if a Mastodon section has no `base_url`.
    pub fn effective_grammar(&self) -> Result<PlatformGrammar, ConfigError> {
        let mut grammar = match (&self.grammar, self.kind) {
            (Some(grammar), _) => grammar.clone(),
            (None, PlatformKind::GitHub) => PlatformGrammar::github()?,
            (None, PlatformKind::Mastodon) => PlatformGrammar::mastodon(self.require_base_url()?)?,
        };
        if let Some(base_url) = &self.base_url {
            grammar.set_base_url(base_url.as_str());
        }
        if self.max_length.is_some() {
            grammar.set_max_length(self.max_length);
        }
        if self.link_width.is_some() {
            grammar.set_link_width(self.link_width);
        }
        Ok(grammar)
    }

    /// Request timeout, defaulting to thirty seconds.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }

    /// Reads the access token from the environment.
    ///
    /// # Errors
    ///
    /// Returns error if the variable is unset or empty.
    pub fn token(&self) -> Result<String, ConfigError> {
        std::env::var(&self.token_env)
            .ok()
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| ConfigError::new(ConfigErrorKind::MissingToken(self.token_env.clone())))
    }

    /// Builds the adapter over a given transport and token.
    ///
    /// # Errors
    ///
    /// Returns error if the grammar is incomplete.
    pub fn build_platform(
        &self,
        transport: Arc<dyn Transport>,
        token: impl Into<String>,
    ) -> Result<Platform, ConfigError> {
        let grammar = self.effective_grammar()?;
        let platform = match self.kind {
            PlatformKind::GitHub => {
                let mut github = GitHub::new(transport, token)?.with_grammar(grammar);
                if let Some(api_base) = &self.api_base {
                    github = github.with_api_base(api_base.as_str());
                }
                for (kind, policy) in &self.lookup_policy {
                    github = github.with_lookup_policy(*kind, *policy);
                }
                Platform::GitHub(github)
            }
            PlatformKind::Mastodon => {
                let mut mastodon = Mastodon::new(self.require_base_url()?, transport, token)?
                    .with_grammar(grammar);
                if let Some(user_id) = &self.user_id {
                    mastodon = mastodon.with_user_id(user_id.as_str());
                }
                for (kind, policy) in &self.lookup_policy {
                    mastodon = mastodon.with_lookup_policy(*kind, *policy);
                }
                Platform::Mastodon(mastodon)
            }
        };
        debug!(kind = %self.kind, "Built platform adapter");
        Ok(platform)
    }

    /// Builds a publisher over a real HTTP transport, with the token read
    /// from the environment.
    ///
    /// # Errors
    ///
    /// Returns error if the token is missing or the HTTP client fails to build.
    pub fn publisher(&self) -> Result<Publisher<Platform>, ConfigError> {
        let token = self.token()?;
        let transport = Arc::new(HttpTransport::new(self.timeout())?);
        Ok(Publisher::new(self.build_platform(transport, token)?))
    }

    fn require_base_url(&self) -> Result<&str, ConfigError> {
        self.base_url.as_deref().ok_or_else(|| {
            ConfigError::new(ConfigErrorKind::Parse(format!(
                "{} platform requires base_url",
                self.kind
            )))
        })
    }
}
