//! Mastodon adapter: toots, replies, favourites, boosts and follows.

use crate::{
    Adapter, CapabilityTable, LookupPolicy, Operation, OperationKind, PendingLookup, Plan,
    PlatformGrammar, Ready, RenderedContent, TargetDescriptor, mastodon_capabilities,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use syndic_core::{
    Attachment, CanonicalObject, Created, CreatedType, CreationResult, MediaType, escape_attr,
    escape_text,
};
use syndic_error::{ConfigError, RemoteError, RemoteErrorKind, SyndicResult};
use syndic_interface::{Headers, Transport};
use tracing::{debug, info, instrument, warn};

/// Most attachments a status can carry.
pub const MAX_MEDIA: usize = 4;

#[derive(Debug, Deserialize)]
struct Status {
    id: String,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Account {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Relationship {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(default)]
    accounts: Vec<Account>,
    #[serde(default)]
    statuses: Vec<Status>,
}

/// Publishes to a Mastodon instance.
#[derive(Clone)]
pub struct Mastodon {
    grammar: PlatformGrammar,
    capabilities: CapabilityTable,
    transport: Arc<dyn Transport>,
    token: String,
    user_id: Option<String>,
}

impl std::fmt::Debug for Mastodon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mastodon")
            .field("instance", self.grammar.base_url())
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

impl Mastodon {
    /// Creates an adapter for an instance, e.g. `https://mastodon.social`.
    ///
    /// # Errors
    ///
    /// Returns error if the built-in grammar fails to compile.
    pub fn new(
        instance: impl Into<String>,
        transport: Arc<dyn Transport>,
        token: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            grammar: PlatformGrammar::mastodon(instance)?,
            capabilities: mastodon_capabilities(),
            transport,
            token: token.into(),
            user_id: None,
        })
    }

    /// Sets the authenticated account id, used in favourite URLs.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Replaces the grammar.
    pub fn with_grammar(mut self, grammar: PlatformGrammar) -> Self {
        self.grammar = grammar;
        self
    }

    /// Overrides the lookup policy of one operation.
    pub fn with_lookup_policy(mut self, kind: OperationKind, policy: LookupPolicy) -> Self {
        self.capabilities.set_lookup_policy(kind, policy);
        self
    }

    fn headers(&self) -> Headers {
        Headers::new().with("Authorization", format!("Bearer {}", self.token))
    }

    fn api_url(&self, path: &str) -> String {
        self.grammar.url_for(path)
    }

    async fn post_status(&self, path: &str, body: serde_json::Value) -> SyndicResult<Status> {
        let response = self
            .transport
            .post(&self.api_url(path), &self.headers(), &body)
            .await?;
        Ok(response.json()?)
    }

    /// Asks the instance to resolve a URL from anywhere in the fediverse.
    async fn search(&self, url: &str) -> SyndicResult<SearchResults> {
        let query: String = url::form_urlencoded::byte_serialize(url.as_bytes()).collect();
        let response = self
            .transport
            .get(
                &self.api_url(&format!("/api/v2/search?q={query}&resolve=true")),
                &self.headers(),
            )
            .await?;
        Ok(response.json()?)
    }

    /// Finds the local id of a status hosted on another instance.
    #[instrument(skip(self))]
    async fn search_status(&self, url: &str) -> SyndicResult<String> {
        let status = self
            .search(url)
            .await?
            .statuses
            .into_iter()
            .next()
            .ok_or_else(|| RemoteError::new(RemoteErrorKind::NotFound(url.to_string())))?;
        debug!(id = %status.id, "Found status");
        Ok(status.id)
    }

    /// Finds the local id of an account from its profile URL.
    #[instrument(skip(self))]
    async fn search_account(&self, url: &str) -> SyndicResult<String> {
        let account = self
            .search(url)
            .await?
            .accounts
            .into_iter()
            .next()
            .ok_or_else(|| RemoteError::new(RemoteErrorKind::NotFound(url.to_string())))?;
        debug!(id = %account.id, "Found account");
        Ok(account.id)
    }

    async fn follow_account(&self, id: String) -> SyndicResult<Relationship> {
        let response = self
            .transport
            .post(
                &self.api_url(&format!("/api/v1/accounts/{id}/follow")),
                &self.headers(),
                &json!({}),
            )
            .await?;
        Ok(response.json()?)
    }

    /// Local status id of the target, looking it up when it lives elsewhere.
    async fn status_lookup(&self, plan: &Plan<'_>, target: &TargetDescriptor) -> SyndicResult<Ready<String>> {
        let lookup = PendingLookup::new("status id", *plan.lookup_policy());
        match target.id("id") {
            Some(id) if !target.needs_lookup() => Ok(lookup.known(id.to_string())),
            _ => lookup.run(|| self.search_status(target.url())).await,
        }
    }

    fn target(plan: &Plan<'_>) -> SyndicResult<TargetDescriptor> {
        let target = plan
            .required_target()
            .cloned()
            .ok_or_else(|| RemoteError::new(RemoteErrorKind::MissingField("target".into())))?;
        Ok(target)
    }

    fn toot_link(target: &TargetDescriptor) -> String {
        format!("<a href=\"{}\">this toot</a>", escape_attr(target.url()))
    }

    fn created(status: Status, fallback_url: &str, created_type: CreatedType) -> SyndicResult<Created> {
        Created::builder()
            .id(Some(status.id))
            .url(status.url.unwrap_or_else(|| fallback_url.to_string()))
            .created_type(created_type)
            .build()
            .map_err(|e| RemoteError::new(RemoteErrorKind::MissingField(e.to_string())).into())
    }

    fn unsupported(&self, plan: &Plan<'_>) -> CreationResult {
        CreationResult::aborted(format!(
            "Cannot {} on {}",
            plan.operation().kind(),
            self.grammar.name()
        ))
    }
}

/// Image and video previews, videos first, at most [`MAX_MEDIA`].
fn media_previews(object: &CanonicalObject) -> Vec<String> {
    let of_type = |media_type: MediaType| {
        object
            .attachments()
            .iter()
            .filter(move |a| a.media_type() == &media_type)
            .filter(|a| a.source_url().is_some())
    };
    let videos: Vec<&Attachment> = of_type(MediaType::Video).take(MAX_MEDIA).collect();
    let images: Vec<&Attachment> = of_type(MediaType::Image)
        .take(MAX_MEDIA - videos.len())
        .collect();

    let total = of_type(MediaType::Video).count() + of_type(MediaType::Image).count();
    if total > MAX_MEDIA {
        warn!(total, max = MAX_MEDIA, "Too many attachments, previewing the first ones");
    }

    let video_html = videos.iter().map(|video| {
        let src = escape_attr(video.source_url().unwrap_or_default());
        let name = video
            .display_name()
            .as_deref()
            .map_or_else(|| "this video".to_string(), escape_text);
        format!("<video controls src=\"{src}\"><a href=\"{src}\">{name}</a></video>")
    });
    let image_html = images.iter().map(|image| {
        format!(
            "<img src=\"{}\" alt=\"{}\" />",
            escape_attr(image.source_url().unwrap_or_default()),
            escape_attr(image.display_name().as_deref().unwrap_or_default())
        )
    });
    video_html.chain(image_html).collect()
}

#[async_trait]
impl Adapter for Mastodon {
    fn name(&self) -> &str {
        self.grammar.name()
    }

    fn grammar(&self) -> &PlatformGrammar {
        &self.grammar
    }

    fn capabilities(&self) -> &CapabilityTable {
        &self.capabilities
    }

    #[instrument(skip_all, fields(platform = "Mastodon", operation = %plan.operation().kind()))]
    async fn preview(&self, plan: &Plan<'_>, rendered: &RenderedContent) -> SyndicResult<CreationResult> {
        let result = match plan.operation() {
            Operation::NewPost | Operation::Reply => {
                let description = match plan.required_target() {
                    Some(target) if plan.operation() == &Operation::Reply => format!(
                        "<span class=\"verb\">reply</span> to {}:",
                        Self::toot_link(target)
                    ),
                    _ => "<span class=\"verb\">toot</span>:".to_string(),
                };
                let mut html = rendered
                    .preview_html()
                    .clone()
                    .unwrap_or_else(|| escape_text(rendered.text()));
                let media = media_previews(plan.object());
                if !media.is_empty() {
                    html.push_str("<br /><br />");
                    html.push_str(&media.join(" &nbsp; "));
                }
                CreationResult::preview(Some(html), description)
            }
            Operation::Like => {
                let target = Self::target(plan)?;
                CreationResult::preview(
                    None,
                    format!("<span class=\"verb\">favorite</span> {}.", Self::toot_link(&target)),
                )
            }
            Operation::Share => {
                let target = Self::target(plan)?;
                CreationResult::preview(
                    None,
                    format!("<span class=\"verb\">boost</span> {}.", Self::toot_link(&target)),
                )
            }
            Operation::Follow => {
                let target = Self::target(plan)?;
                CreationResult::preview(
                    None,
                    format!(
                        "<span class=\"verb\">follow</span> <a href=\"{}\">this user</a>.",
                        escape_attr(target.url())
                    ),
                )
            }
            Operation::React { .. } | Operation::Tag { .. } => self.unsupported(plan),
        };
        Ok(result)
    }

    #[instrument(skip_all, fields(platform = "Mastodon", operation = %plan.operation().kind()))]
    async fn create(&self, plan: &Plan<'_>, rendered: &RenderedContent) -> SyndicResult<CreationResult> {
        if !plan.object().attachments().is_empty() {
            warn!(
                count = plan.object().attachments().len(),
                "Media upload is not supported, publishing text only"
            );
        }

        let created = match plan.operation() {
            Operation::NewPost => {
                let status = PendingLookup::new("status id", *plan.lookup_policy())
                    .known(())
                    .mutate(|()| self.post_status("/api/v1/statuses", json!({ "status": rendered.text() })))
                    .await?
                    .into_inner();
                Self::created(status, self.grammar.base_url(), CreatedType::Post)?
            }
            Operation::Reply => {
                let target = Self::target(plan)?;
                let status = self
                    .status_lookup(plan, &target)
                    .await?
                    .mutate(|id| {
                        self.post_status(
                            "/api/v1/statuses",
                            json!({ "status": rendered.text(), "in_reply_to_id": id }),
                        )
                    })
                    .await?
                    .into_inner();
                Self::created(status, target.url(), CreatedType::Comment)?
            }
            Operation::Like => {
                let target = Self::target(plan)?;
                let status = self
                    .status_lookup(plan, &target)
                    .await?
                    .mutate(|id| async move {
                        self.post_status(&format!("/api/v1/statuses/{id}/favourite"), json!({}))
                            .await
                    })
                    .await?
                    .into_inner();
                let mut status = status;
                if let Some(user_id) = &self.user_id {
                    let url = status.url.take().unwrap_or_else(|| target.url().to_string());
                    status.url = Some(format!("{url}#favorited-by-{user_id}"));
                }
                Self::created(status, target.url(), CreatedType::Like)?
            }
            Operation::Share => {
                let target = Self::target(plan)?;
                let status = self
                    .status_lookup(plan, &target)
                    .await?
                    .mutate(|id| async move {
                        self.post_status(&format!("/api/v1/statuses/{id}/reblog"), json!({}))
                            .await
                    })
                    .await?
                    .into_inner();
                Self::created(status, target.url(), CreatedType::Share)?
            }
            Operation::Follow => {
                let target = Self::target(plan)?;
                // Profile URLs never carry the account id.
                let relationship: Relationship =
                    PendingLookup::new("account id", *plan.lookup_policy())
                        .run(|| self.search_account(target.url()))
                        .await?
                        .mutate(|id| self.follow_account(id))
                        .await?
                        .into_inner();
                Created::builder()
                    .id(Some(relationship.id))
                    .url(target.url().to_string())
                    .created_type(CreatedType::Follow)
                    .build()
                    .map_err(|e| RemoteError::new(RemoteErrorKind::MissingField(e.to_string())))?
            }
            Operation::React { .. } | Operation::Tag { .. } => return Ok(self.unsupported(plan)),
        };

        info!(url = %created.url(), created_type = %created.created_type(), "Published to Mastodon");
        Ok(CreationResult::created(created))
    }
}
