//! Cross-platform publish pipeline.
//!
//! A canonical object goes through four stages:
//!
//! 1. [`TargetResolver`] matches its reply/like/tag references against the
//!    platform's [`PlatformGrammar`].
//! 2. [`Dispatcher`] picks an [`Operation`] and checks it against the
//!    adapter's [`CapabilityTable`], producing a [`Plan`] or an abort.
//! 3. [`ContentRenderer`] turns the object into platform text.
//! 4. [`execute`] runs the plan through an [`Adapter`] in preview or create
//!    mode.
//!
//! [`Publisher::publish`] wires the stages together and always returns a
//! single [`CreationResult`](syndic_core::CreationResult).

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod dispatch;
mod executor;
mod grammar;
mod http;
mod pipeline;
mod platforms;
mod render;
mod target;
mod text;
mod truncate;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{PlatformConfig, PlatformConfigBuilder, SyndicConfig};
pub use dispatch::{
    AbortMessage, Capability, CapabilityTable, Dispatcher, Operation, OperationKind, Plan,
    REFERENCE_PLACEHOLDER, TargetRequirement, github_capabilities, mastodon_capabilities,
};
pub use executor::{LookupPolicy, Mutated, PendingLookup, Ready, execute};
pub use grammar::{
    CaptureRule, Citation, CompositeId, FragmentRule, GITHUB_REACTIONS, LinkSyntax,
    MASTODON_LINK_WIDTH, MASTODON_MAX_LENGTH, PathPattern, PlatformGrammar, PlatformGrammarBuilder,
    TargetShape,
};
pub use http::{DEFAULT_TIMEOUT_SECONDS, HttpTransport};
pub use pipeline::{NO_CONTENT_MESSAGE, Publisher};
pub use platforms::{
    Adapter, GITHUB_API_BASE, GitHub, MAX_MEDIA, Mastodon, Platform, PlatformKind,
};
pub use render::{ContentRenderer, RenderedContent, TITLE_CHARS, TITLE_WORDS};
pub use target::{Resolution, SubItem, TargetDescriptor, TargetResolver};
pub use text::{
    TextStyle, collapse_whitespace, html_to_text, linkify_preview, looks_like_html,
    rewrite_profile_mentions,
};
pub use truncate::{ELLIPSIS, Shortened, shorten, weighted_len};
