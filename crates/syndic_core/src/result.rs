//! The uniform outcome of every publish call.

use crate::html::{escape_text, strip_tags};
use derive_getters::Getters;
use serde::Serialize;

/// Which publish branch produced a created object.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CreatedType {
    /// New top-level post or issue.
    Post,
    /// Reply or issue comment.
    Comment,
    /// Like, favorite or star.
    Like,
    /// Reshare or boost.
    Share,
    /// Emoji reaction.
    React,
    /// Labels added.
    Tag,
    /// Account followed.
    Follow,
}

/// Object created by a successful create call.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, derive_builder::Builder)]
#[builder(setter(into))]
pub struct Created {
    /// Platform id of the new object, when the platform returns one.
    #[builder(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    /// Permalink of the new object, or of its target when the platform gave none.
    url: String,
    /// Which branch executed.
    #[serde(rename = "type")]
    created_type: CreatedType,
    /// Platform-specific extras, e.g. the labels that were applied.
    #[builder(default)]
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

impl Created {
    /// Returns a builder for constructing a Created.
    pub fn builder() -> CreatedBuilder {
        CreatedBuilder::default()
    }

    /// Adds a platform-specific field.
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Content of a successful result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CreatedContent {
    /// Preview mode: the HTML that would be published, if any.
    Preview {
        /// Rendered HTML preview
        #[serde(skip_serializing_if = "Option::is_none")]
        html: Option<String>,
    },
    /// Create mode: the new object.
    Created(Created),
}

/// Outcome of a publish call.
///
/// `Aborted` means nothing was attempted because a precondition failed; the
/// caller may try another adapter or report the message. `Failed` means a
/// remote or transport error happened. Plain and HTML error messages are
/// always kept in sync.
///
/// # Examples
///
/// ```
/// use syndic_core::CreationResult;
///
/// let result = CreationResult::aborted("You need an in-reply-to URL.");
/// assert!(result.abort());
/// assert_eq!(result.error_html(), "You need an in-reply-to URL.");
///
/// let preview = CreationResult::preview(None, "<span class=\"verb\">star</span> foo/bar.");
/// assert!(!preview.abort());
/// assert!(preview.error_plain().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CreationResult {
    /// Precondition failure; nothing was published.
    Aborted {
        /// Plain text explanation
        error_plain: String,
        /// HTML explanation
        error_html: String,
    },
    /// Transport or remote failure.
    Failed {
        /// Plain text explanation
        error_plain: String,
        /// HTML explanation
        error_html: String,
    },
    /// Preview rendered or object created.
    Succeeded {
        /// Preview HTML or created object
        content: CreatedContent,
        /// HTML fragment describing the action, preview mode only
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

const DEFAULT_ABORT_MESSAGE: &str = "Publish aborted.";
const DEFAULT_FAILURE_MESSAGE: &str = "Publish failed.";

fn sync_from_plain(plain: String, fallback: &str) -> (String, String) {
    let plain = if plain.trim().is_empty() {
        fallback.to_string()
    } else {
        plain
    };
    let html = escape_text(&plain);
    (plain, html)
}

fn sync_from_html(html: String, fallback: &str) -> (String, String) {
    let plain = strip_tags(&html);
    if plain.trim().is_empty() {
        return sync_from_plain(String::new(), fallback);
    }
    (plain, html)
}

impl CreationResult {
    /// Precondition failure from a plain text message.
    pub fn aborted(message: impl Into<String>) -> Self {
        let (error_plain, error_html) = sync_from_plain(message.into(), DEFAULT_ABORT_MESSAGE);
        Self::Aborted {
            error_plain,
            error_html,
        }
    }

    /// Precondition failure from an HTML message; the plain form strips tags.
    pub fn aborted_html(html: impl Into<String>) -> Self {
        let (error_plain, error_html) = sync_from_html(html.into(), DEFAULT_ABORT_MESSAGE);
        Self::Aborted {
            error_plain,
            error_html,
        }
    }

    /// Precondition failure with hand-written plain and HTML forms.
    pub fn aborted_with(plain: impl Into<String>, html: impl Into<String>) -> Self {
        let (error_plain, fallback_html) = sync_from_plain(plain.into(), DEFAULT_ABORT_MESSAGE);
        let html = html.into();
        Self::Aborted {
            error_plain,
            error_html: if html.trim().is_empty() {
                fallback_html
            } else {
                html
            },
        }
    }

    /// Remote or transport failure from a plain text message.
    pub fn failed(message: impl Into<String>) -> Self {
        let (error_plain, error_html) = sync_from_plain(message.into(), DEFAULT_FAILURE_MESSAGE);
        Self::Failed {
            error_plain,
            error_html,
        }
    }

    /// Successful preview.
    pub fn preview(html: Option<String>, description: impl Into<String>) -> Self {
        Self::Succeeded {
            content: CreatedContent::Preview { html },
            description: Some(description.into()),
        }
    }

    /// Successful create.
    pub fn created(created: Created) -> Self {
        Self::Succeeded {
            content: CreatedContent::Created(created),
            description: None,
        }
    }

    /// True when the request was not attempted because a precondition failed.
    pub fn abort(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }

    /// True for previews and creates that went through.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Plain text error; empty on success.
    pub fn error_plain(&self) -> &str {
        match self {
            Self::Aborted { error_plain, .. } | Self::Failed { error_plain, .. } => error_plain,
            Self::Succeeded { .. } => "",
        }
    }

    /// HTML error; empty on success.
    pub fn error_html(&self) -> &str {
        match self {
            Self::Aborted { error_html, .. } | Self::Failed { error_html, .. } => error_html,
            Self::Succeeded { .. } => "",
        }
    }

    /// Preview description.
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Succeeded { description, .. } => description.as_deref(),
            _ => None,
        }
    }

    /// Success content.
    pub fn content(&self) -> Option<&CreatedContent> {
        match self {
            Self::Succeeded { content, .. } => Some(content),
            _ => None,
        }
    }

    /// The created object, for successful creates.
    pub fn created_object(&self) -> Option<&Created> {
        match self.content() {
            Some(CreatedContent::Created(created)) => Some(created),
            _ => None,
        }
    }

    /// The preview HTML, for successful previews that render content.
    pub fn preview_html(&self) -> Option<&str> {
        match self.content() {
            Some(CreatedContent::Preview { html }) => html.as_deref(),
            _ => None,
        }
    }

    /// Short outcome label for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Aborted { .. } => "aborted",
            Self::Failed { .. } => "failed",
            Self::Succeeded { .. } => "succeeded",
        }
    }
}
