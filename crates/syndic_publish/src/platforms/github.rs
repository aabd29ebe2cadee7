//! GitHub adapter: issues, comments, reactions, stars and labels.
//!
//! Comments and stars run a GraphQL id lookup followed by a GraphQL
//! mutation. Reactions, labels and new issues use the REST API. Previews only
//! issue read-only calls: GraphQL queries, comment fetches and the Markdown
//! render endpoint.

use crate::{
    Adapter, CapabilityTable, LookupPolicy, Operation, OperationKind, PendingLookup, Plan,
    PlatformGrammar, Ready, RenderedContent, SubItem, github_capabilities,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use syndic_core::{Created, CreatedType, CreationResult, ellipsize, escape_attr, escape_text, strip_tags};
use syndic_error::{ConfigError, RemoteError, RemoteErrorKind, SyndicResult};
use syndic_interface::{Headers, Transport};
use tracing::{debug, info, instrument, warn};

/// GitHub API base URL.
pub const GITHUB_API_BASE: &str = "https://api.github.com";

const ISSUE_OR_PR_QUERY: &str = "query($owner: String!, $repo: String!, $number: Int!) {
  repository(owner: $owner, name: $repo) {
    issueOrPullRequest(number: $number) {
      ... on Issue {id title}
      ... on PullRequest {id title}
    }
  }
}";

const REPO_QUERY: &str = "query($owner: String!, $repo: String!) {
  repository(owner: $owner, name: $repo) {
    id
  }
}";

const REPO_LABELS_QUERY: &str = "query($owner: String!, $repo: String!) {
  repository(owner: $owner, name: $repo) {
    labels(first:100) {
      nodes {
        name
      }
    }
  }
}";

const ADD_COMMENT_MUTATION: &str = "mutation($subjectId: ID!, $body: String!) {
  addComment(input: {subjectId: $subjectId, body: $body}) {
    commentEdge {
      node {
        id url
      }
    }
  }
}";

const ADD_STAR_MUTATION: &str = "mutation($starrableId: ID!) {
  addStar(input: {starrableId: $starrableId}) {
    starrable {
      id
    }
  }
}";

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
    #[serde(rename = "type", default)]
    error_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepositoryData<T> {
    repository: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueOrPullRequest {
    issue_or_pull_request: Option<IssueNode>,
}

#[derive(Debug, Deserialize)]
struct IssueNode {
    id: String,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct RepoNode {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RepoLabels {
    labels: LabelConnection,
}

#[derive(Debug, Deserialize)]
struct LabelConnection {
    nodes: Vec<LabelNode>,
}

#[derive(Debug, Deserialize)]
struct LabelNode {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddCommentData {
    add_comment: AddCommentPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddCommentPayload {
    comment_edge: CommentEdge,
}

#[derive(Debug, Deserialize)]
struct CommentEdge {
    node: CommentNode,
}

#[derive(Debug, Deserialize)]
struct CommentNode {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RestComment {
    #[serde(default)]
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RestReaction {
    id: Option<u64>,
    content: String,
    user: RestUser,
}

#[derive(Debug, Deserialize)]
struct RestUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RestIssue {
    id: Option<u64>,
    html_url: Option<String>,
}

/// Repository, issue and comment named by a resolved target.
#[derive(Debug, Clone, Copy)]
struct RepoTarget<'a> {
    owner: &'a str,
    repo: &'a str,
    number: Option<&'a str>,
    sub_item: Option<&'a SubItem>,
    url: &'a str,
}

impl<'a> RepoTarget<'a> {
    fn from_plan(plan: &'a Plan<'_>) -> SyndicResult<Self> {
        let target = plan
            .required_target()
            .ok_or_else(|| RemoteError::new(RemoteErrorKind::MissingField("target".into())))?;
        let field = |name: &str| {
            target
                .id(name)
                .ok_or_else(|| RemoteError::new(RemoteErrorKind::MissingField(name.to_string())))
        };
        Ok(Self {
            owner: field("owner")?,
            repo: field("repo")?,
            number: target.id("number"),
            sub_item: target.sub_item().as_ref(),
            url: target.url(),
        })
    }

    fn number(&self) -> SyndicResult<u64> {
        let number = self
            .number
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| RemoteError::new(RemoteErrorKind::MissingField("number".into())))?;
        Ok(number)
    }

    fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    fn issue_slug(&self) -> String {
        format!("{}/{}#{}", self.owner, self.repo, self.number.unwrap_or_default())
    }

    fn href(&self) -> String {
        escape_attr(self.url)
    }
}

/// Publishes to GitHub.
#[derive(Clone)]
pub struct GitHub {
    grammar: PlatformGrammar,
    capabilities: CapabilityTable,
    transport: Arc<dyn Transport>,
    token: String,
    api_base: String,
}

impl std::fmt::Debug for GitHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHub")
            .field("base_url", self.grammar.base_url())
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl GitHub {
    /// Creates an adapter for github.com.
    ///
    /// # Errors
    ///
    /// Returns error if the built-in grammar fails to compile.
    pub fn new(transport: Arc<dyn Transport>, token: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            grammar: PlatformGrammar::github()?,
            capabilities: github_capabilities(),
            transport,
            token: token.into(),
            api_base: GITHUB_API_BASE.to_string(),
        })
    }

    /// Replaces the grammar, e.g. for a GitHub Enterprise host.
    pub fn with_grammar(mut self, grammar: PlatformGrammar) -> Self {
        self.grammar = grammar;
        self
    }

    /// Replaces the API base URL.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Overrides the lookup policy of one operation.
    pub fn with_lookup_policy(mut self, kind: OperationKind, policy: LookupPolicy) -> Self {
        self.capabilities.set_lookup_policy(kind, policy);
        self
    }

    fn rest_headers(&self) -> Headers {
        Headers::new()
            .with("Authorization", format!("token {}", self.token))
            .with("Accept", "application/vnd.github+json")
    }

    fn graphql_headers(&self) -> Headers {
        Headers::new().with("Authorization", format!("bearer {}", self.token))
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> SyndicResult<T> {
        let response = self
            .transport
            .post(
                &self.rest_url("/graphql"),
                &self.graphql_headers(),
                &json!({ "query": query, "variables": variables }),
            )
            .await?;
        let parsed: GraphQlResponse<T> = response.json()?;

        if !parsed.errors.is_empty() {
            warn!(errors = ?parsed.errors, "GraphQL errors");
            let not_found = parsed
                .errors
                .iter()
                .any(|e| e.error_type.as_deref() == Some("NOT_FOUND"));
            let messages: Vec<String> = parsed.errors.into_iter().map(|e| e.message).collect();
            let kind = if not_found {
                RemoteErrorKind::NotFound(messages.join("\n"))
            } else {
                RemoteErrorKind::GraphQl(messages)
            };
            return Err(RemoteError::new(kind).into());
        }

        let data = parsed
            .data
            .ok_or_else(|| RemoteError::new(RemoteErrorKind::MissingField("data".into())))?;
        Ok(data)
    }

    async fn rest_get<T: DeserializeOwned>(&self, path: &str) -> SyndicResult<T> {
        let response = self
            .transport
            .get(&self.rest_url(path), &self.rest_headers())
            .await?;
        Ok(response.json()?)
    }

    async fn rest_post<T: DeserializeOwned>(&self, path: &str, body: serde_json::Value) -> SyndicResult<T> {
        let response = self
            .transport
            .post(&self.rest_url(path), &self.rest_headers(), &body)
            .await?;
        Ok(response.json()?)
    }

    /// Renders Markdown to HTML on the server, in the repo's context.
    async fn render_markdown(&self, markdown: &str, target: &RepoTarget<'_>) -> SyndicResult<String> {
        let response = self
            .transport
            .post(
                &self.rest_url("/markdown"),
                &self.rest_headers(),
                &json!({ "text": markdown, "mode": "gfm", "context": target.slug() }),
            )
            .await?;
        Ok(response.body().clone())
    }

    async fn issue(&self, target: &RepoTarget<'_>) -> SyndicResult<IssueNode> {
        let data: RepositoryData<IssueOrPullRequest> = self
            .graphql(
                ISSUE_OR_PR_QUERY,
                json!({ "owner": target.owner, "repo": target.repo, "number": target.number()? }),
            )
            .await?;
        let issue = data
            .repository
            .and_then(|r| r.issue_or_pull_request)
            .ok_or_else(|| RemoteError::new(RemoteErrorKind::NotFound(target.issue_slug())))?;
        Ok(issue)
    }

    async fn repo_id(&self, target: &RepoTarget<'_>) -> SyndicResult<String> {
        let data: RepositoryData<RepoNode> = self
            .graphql(REPO_QUERY, json!({ "owner": target.owner, "repo": target.repo }))
            .await?;
        let repo = data
            .repository
            .ok_or_else(|| RemoteError::new(RemoteErrorKind::NotFound(target.slug())))?;
        Ok(repo.id)
    }

    /// Label names defined on the repo.
    async fn existing_labels(&self, target: &RepoTarget<'_>) -> SyndicResult<BTreeSet<String>> {
        let data: RepositoryData<RepoLabels> = self
            .graphql(
                REPO_LABELS_QUERY,
                json!({ "owner": target.owner, "repo": target.repo }),
            )
            .await?;
        let repo = data
            .repository
            .ok_or_else(|| RemoteError::new(RemoteErrorKind::NotFound(target.slug())))?;
        Ok(repo.labels.nodes.into_iter().map(|l| l.name).collect())
    }

    async fn labels_lookup(
        &self,
        plan: &Plan<'_>,
        target: &RepoTarget<'_>,
        tags: &BTreeSet<String>,
    ) -> SyndicResult<Ready<BTreeSet<String>>> {
        let lookup = PendingLookup::new("existing labels", *plan.lookup_policy());
        if tags.is_empty() {
            return Ok(lookup.known(BTreeSet::new()));
        }
        lookup.run(|| self.existing_labels(target)).await
    }

    /// Link to the issue or comment being replied or reacted to.
    async fn target_link(&self, target: &RepoTarget<'_>) -> SyndicResult<String> {
        if let Some(comment) = target.sub_item {
            let fetched: RestComment = self
                .rest_get(&format!(
                    "/repos/{}/{}/{}/comments/{}",
                    target.owner,
                    target.repo,
                    comment.kind(),
                    comment.id()
                ))
                .await?;
            let body = strip_tags(fetched.body.as_deref().unwrap_or_default());
            return Ok(format!(
                "<a href=\"{}\">a comment on {}, <em>{}</em></a>",
                target.href(),
                target.issue_slug(),
                escape_text(&ellipsize(&body, 14, 140))
            ));
        }

        let issue = self.issue(target).await?;
        let title = strip_tags(&issue.title);
        let title = title.trim();
        let suffix = if title.is_empty() {
            String::new()
        } else {
            format!(", <em>{}</em>", escape_text(title))
        };
        Ok(format!(
            "<a href=\"{}\">{}{}</a>",
            target.href(),
            target.issue_slug(),
            suffix
        ))
    }

    async fn add_comment(&self, subject_id: String, body: &str) -> SyndicResult<CommentNode> {
        let data: AddCommentData = self
            .graphql(
                ADD_COMMENT_MUTATION,
                json!({ "subjectId": subject_id, "body": body }),
            )
            .await?;
        Ok(data.add_comment.comment_edge.node)
    }

    async fn add_star(&self, starrable_id: String) -> SyndicResult<()> {
        let _: serde_json::Value = self
            .graphql(ADD_STAR_MUTATION, json!({ "starrableId": starrable_id }))
            .await?;
        Ok(())
    }

    async fn react(&self, target: &RepoTarget<'_>, emoji: &str) -> SyndicResult<Created> {
        let content = self
            .grammar
            .reaction_name(emoji)
            .ok_or_else(|| RemoteError::new(RemoteErrorKind::UnexpectedPayload(format!("unsupported reaction {emoji}"))))?;

        let (path, on_comment) = match target.sub_item {
            Some(comment) => (
                format!(
                    "/repos/{}/{}/{}/comments/{}/reactions",
                    target.owner,
                    target.repo,
                    comment.kind(),
                    comment.id()
                ),
                true,
            ),
            None => (
                format!(
                    "/repos/{}/{}/issues/{}/reactions",
                    target.owner,
                    target.repo,
                    target.number()?
                ),
                false,
            ),
        };

        let reacted: RestReaction = self.rest_post(&path, json!({ "content": content })).await?;
        let url = if on_comment {
            target.url.to_string()
        } else {
            format!(
                "{}#{}-by-{}",
                target.url,
                reacted.content.to_lowercase(),
                reacted.user.login
            )
        };
        created(url, CreatedType::React, reacted.id.map(|id| id.to_string()))
    }

    fn no_matching_labels(
        target: &RepoTarget<'_>,
        tags: &BTreeSet<String>,
        labels: &BTreeSet<String>,
    ) -> CreationResult {
        let list = |names: &BTreeSet<String>| {
            names
                .iter()
                .map(|n| escape_text(n))
                .collect::<Vec<_>>()
                .join(", ")
        };
        CreationResult::aborted_html(format!(
            "No tags in [{}] matched <a href=\"{}\">{}</a>'s existing labels [{}].",
            list(tags),
            target.href(),
            target.issue_slug(),
            list(labels)
        ))
    }

    fn label_phrase(labels: &BTreeSet<String>) -> String {
        format!(
            "label{} <span class=\"verb\">{}</span>",
            if labels.len() > 1 { "s" } else { "" },
            labels
                .iter()
                .map(|l| escape_text(l))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }

    fn unsupported(&self, plan: &Plan<'_>) -> CreationResult {
        CreationResult::aborted(format!(
            "Cannot {} on {}",
            plan.operation().kind(),
            self.grammar.name()
        ))
    }
}

fn intersect(tags: &BTreeSet<String>, labels: &BTreeSet<String>) -> BTreeSet<String> {
    tags.intersection(labels).cloned().collect()
}

fn created(url: impl Into<String>, created_type: CreatedType, id: Option<String>) -> SyndicResult<Created> {
    Created::builder()
        .url(url.into())
        .created_type(created_type)
        .id(id)
        .build()
        .map_err(|e| RemoteError::new(RemoteErrorKind::MissingField(e.to_string())).into())
}

#[async_trait]
impl Adapter for GitHub {
    fn name(&self) -> &str {
        self.grammar.name()
    }

    fn grammar(&self) -> &PlatformGrammar {
        &self.grammar
    }

    fn capabilities(&self) -> &CapabilityTable {
        &self.capabilities
    }

    #[instrument(skip_all, fields(platform = "GitHub", operation = %plan.operation().kind()))]
    async fn preview(&self, plan: &Plan<'_>, rendered: &RenderedContent) -> SyndicResult<CreationResult> {
        let target = RepoTarget::from_plan(plan)?;

        let result = match plan.operation() {
            Operation::Reply => {
                let link = self.target_link(&target).await?;
                let html = self.render_markdown(rendered.text(), &target).await?;
                CreationResult::preview(
                    Some(html),
                    format!("<span class=\"verb\">comment</span> on {link}:"),
                )
            }
            Operation::React { emoji } => {
                let link = self.target_link(&target).await?;
                CreationResult::preview(
                    None,
                    format!("<span class=\"verb\">react {emoji}</span> to {link}."),
                )
            }
            Operation::Like => CreationResult::preview(
                None,
                format!(
                    "<span class=\"verb\">star</span> <a href=\"{}\">{}</a>.",
                    target.href(),
                    target.slug()
                ),
            ),
            Operation::Tag { tags } => {
                let ready = self.labels_lookup(plan, &target, tags).await?;
                let labels = intersect(tags, ready.value());
                if labels.is_empty() {
                    return Ok(Self::no_matching_labels(&target, tags, ready.value()));
                }
                CreationResult::preview(
                    None,
                    format!(
                        "add {} to <a href=\"{}\">{}</a>.",
                        Self::label_phrase(&labels),
                        target.href(),
                        target.issue_slug()
                    ),
                )
            }
            Operation::NewPost => {
                let tags = plan.object().tag_names();
                let ready = self.labels_lookup(plan, &target, &tags).await?;
                let labels = intersect(&tags, ready.value());
                let title = rendered.title().clone().unwrap_or_default();
                let html = self.render_markdown(rendered.text(), &target).await?;
                let label_note = if labels.is_empty() {
                    String::new()
                } else {
                    format!(" and attempt to add {}", Self::label_phrase(&labels))
                };
                CreationResult::preview(
                    Some(format!("<b>{}</b><hr>{}", escape_text(&title), html)),
                    format!(
                        "<span class=\"verb\">create a new issue</span> on <a href=\"{}\">{}</a>{}:",
                        target.href(),
                        target.slug(),
                        label_note
                    ),
                )
            }
            Operation::Share | Operation::Follow => self.unsupported(plan),
        };
        debug!(outcome = result.outcome(), "Preview rendered");
        Ok(result)
    }

    #[instrument(skip_all, fields(platform = "GitHub", operation = %plan.operation().kind()))]
    async fn create(&self, plan: &Plan<'_>, rendered: &RenderedContent) -> SyndicResult<CreationResult> {
        let target = RepoTarget::from_plan(plan)?;
        let policy = *plan.lookup_policy();

        let created = match plan.operation() {
            Operation::Reply => {
                let comment = PendingLookup::new("issue id", policy)
                    .run(|| async { self.issue(&target).await.map(|issue| issue.id) })
                    .await?
                    .mutate(|subject_id| self.add_comment(subject_id, rendered.text()))
                    .await?
                    .into_inner();
                created(
                    comment.url.unwrap_or_else(|| target.url.to_string()),
                    CreatedType::Comment,
                    Some(comment.id),
                )?
            }
            Operation::React { emoji } => PendingLookup::new("reaction subject", policy)
                .known(())
                .mutate(|()| self.react(&target, emoji))
                .await?
                .into_inner(),
            Operation::Like => {
                PendingLookup::new("repository id", policy)
                    .run(|| self.repo_id(&target))
                    .await?
                    .mutate(|starrable_id| self.add_star(starrable_id))
                    .await?;
                created(
                    self.grammar
                        .url_for(&format!("/{}/{}/stargazers", target.owner, target.repo)),
                    CreatedType::Like,
                    None,
                )?
            }
            Operation::Tag { tags } => {
                let ready = self.labels_lookup(plan, &target, tags).await?;
                let labels = intersect(tags, ready.value());
                if labels.is_empty() {
                    return Ok(Self::no_matching_labels(&target, tags, ready.value()));
                }
                let path = format!(
                    "/repos/{}/{}/issues/{}/labels",
                    target.owner,
                    target.repo,
                    target.number()?
                );
                ready
                    .mutate(|_| async {
                        self.rest_post::<serde_json::Value>(&path, json!(labels))
                            .await
                            .map(|_| ())
                    })
                    .await?;
                created(target.url, CreatedType::Tag, None)?.with_extra("tags", json!(labels))
            }
            Operation::NewPost => {
                let tags = plan.object().tag_names();
                let ready = self.labels_lookup(plan, &target, &tags).await?;
                let labels = intersect(&tags, ready.value());
                let path = format!("/repos/{}/{}/issues", target.owner, target.repo);
                let issue: RestIssue = ready
                    .mutate(|_| {
                        self.rest_post(
                            &path,
                            json!({
                                "title": rendered.title().clone().unwrap_or_default(),
                                "body": rendered.text(),
                                "labels": labels,
                            }),
                        )
                    })
                    .await?
                    .into_inner();
                created(
                    issue.html_url.unwrap_or_else(|| target.url.to_string()),
                    CreatedType::Post,
                    issue.id.map(|id| id.to_string()),
                )?
            }
            Operation::Share | Operation::Follow => return Ok(self.unsupported(plan)),
        };

        info!(url = %created.url(), created_type = %created.created_type(), "Published to GitHub");
        Ok(CreationResult::created(created))
    }
}
