//! Platform adapters.

mod github;
mod mastodon;

pub use github::{GITHUB_API_BASE, GitHub};
pub use mastodon::{MAX_MEDIA, Mastodon};

use crate::{CapabilityTable, Plan, PlatformGrammar, RenderedContent};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use syndic_core::CreationResult;
use syndic_error::SyndicResult;

/// A network the pipeline can publish to.
///
/// Adapters receive only validated plans. Preview must not issue any
/// mutating call; create runs the operation's lookup and mutate steps.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Human readable platform name.
    fn name(&self) -> &str;

    /// URL grammar and text rules.
    fn grammar(&self) -> &PlatformGrammar;

    /// Supported operations and what each needs.
    fn capabilities(&self) -> &CapabilityTable;

    /// Describes what create would do.
    ///
    /// # Errors
    ///
    /// Returns error if a read-only lookup fails.
    async fn preview(&self, plan: &Plan<'_>, rendered: &RenderedContent) -> SyndicResult<CreationResult>;

    /// Publishes for real.
    ///
    /// # Errors
    ///
    /// Returns error if the lookup or the mutation fails.
    async fn create(&self, plan: &Plan<'_>, rendered: &RenderedContent) -> SyndicResult<CreationResult>;
}

/// Platform kinds known to configuration.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlatformKind {
    /// github.com or a compatible host.
    GitHub,
    /// A Mastodon instance.
    Mastodon,
}

/// Every supported adapter behind one type.
#[derive(Debug, Clone)]
pub enum Platform {
    /// GitHub.
    GitHub(GitHub),
    /// Mastodon.
    Mastodon(Mastodon),
}

impl Platform {
    /// Which kind of platform this is.
    pub fn kind(&self) -> PlatformKind {
        match self {
            Self::GitHub(_) => PlatformKind::GitHub,
            Self::Mastodon(_) => PlatformKind::Mastodon,
        }
    }

    fn adapter(&self) -> &dyn Adapter {
        match self {
            Self::GitHub(github) => github,
            Self::Mastodon(mastodon) => mastodon,
        }
    }
}

impl From<GitHub> for Platform {
    fn from(github: GitHub) -> Self {
        Self::GitHub(github)
    }
}

impl From<Mastodon> for Platform {
    fn from(mastodon: Mastodon) -> Self {
        Self::Mastodon(mastodon)
    }
}

#[async_trait]
impl Adapter for Platform {
    fn name(&self) -> &str {
        self.adapter().name()
    }

    fn grammar(&self) -> &PlatformGrammar {
        self.adapter().grammar()
    }

    fn capabilities(&self) -> &CapabilityTable {
        self.adapter().capabilities()
    }

    async fn preview(&self, plan: &Plan<'_>, rendered: &RenderedContent) -> SyndicResult<CreationResult> {
        self.adapter().preview(plan, rendered).await
    }

    async fn create(&self, plan: &Plan<'_>, rendered: &RenderedContent) -> SyndicResult<CreationResult> {
        self.adapter().create(plan, rendered).await
    }
}
