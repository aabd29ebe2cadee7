//! Choosing what a canonical object asks a platform to do.
//!
//! Dispatch runs a small state machine:
//! `Start → TargetResolved → VerbSelected → Validated`, stopping early in
//! `Aborted` when a precondition fails. Only a validated [`Plan`] reaches
//! rendering and execution.

use crate::{LookupPolicy, PlatformGrammar, Resolution, TargetDescriptor, TargetResolver, TargetShape};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use syndic_core::{
    CanonicalObject, CreationResult, ObjectType, Reference, Verb, escape_attr, escape_text,
    strip_tags,
};
use tracing::{debug, instrument};

/// Operation kinds, used as keys in capability tables and configuration.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OperationKind {
    /// New top-level post or issue.
    NewPost,
    /// Reply or comment.
    Reply,
    /// Emoji reaction.
    React,
    /// Like, favorite or star.
    Like,
    /// Reshare.
    Share,
    /// Add tags or labels.
    Tag,
    /// Follow an account.
    Follow,
}

/// What the object asks the platform to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// New top-level post or issue.
    NewPost,
    /// Reply or comment.
    Reply,
    /// Emoji reaction.
    React {
        /// The reaction emoji
        emoji: String,
    },
    /// Like, favorite or star.
    Like,
    /// Reshare.
    Share,
    /// Add tags or labels.
    Tag {
        /// Requested tag names
        tags: BTreeSet<String>,
    },
    /// Follow an account.
    Follow,
}

impl Operation {
    /// The operation's kind.
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::NewPost => OperationKind::NewPost,
            Self::Reply => OperationKind::Reply,
            Self::React { .. } => OperationKind::React,
            Self::Like => OperationKind::Like,
            Self::Share => OperationKind::Share,
            Self::Tag { .. } => OperationKind::Tag,
            Self::Follow => OperationKind::Follow,
        }
    }

    /// Whether the operation publishes text.
    pub fn publishes_text(&self) -> bool {
        matches!(self, Self::NewPost | Self::Reply)
    }
}

/// Placeholder in abort messages for the reference that failed to resolve.
pub const REFERENCE_PLACEHOLDER: &str = "{reference}";

/// Plain and optional HTML form of an abort message.
///
/// Either form may contain [`REFERENCE_PLACEHOLDER`]. The plain form gets
/// the reference verbatim; the HTML form gets it as a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbortMessage {
    plain: String,
    html: Option<String>,
}

impl AbortMessage {
    /// Plain message; the HTML form is escaped from it.
    pub fn plain(message: impl Into<String>) -> Self {
        Self {
            plain: message.into(),
            html: None,
        }
    }

    /// Message with a hand-written HTML form.
    pub fn with_html(plain: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            plain: plain.into(),
            html: Some(html.into()),
        }
    }

    /// Converts into an aborted result, filling in the reference if any.
    pub fn to_result(&self, reference: Option<&str>) -> CreationResult {
        let html = self.html.clone().unwrap_or_else(|| escape_text(&self.plain));
        let (plain, html) = match reference.map(str::trim).filter(|r| !r.is_empty()) {
            Some(reference) => {
                let linked = if reference.starts_with("http://") || reference.starts_with("https://") {
                    format!(
                        "<a href=\"{}\">{}</a>",
                        escape_attr(reference),
                        escape_text(reference)
                    )
                } else {
                    escape_text(reference)
                };
                (
                    self.plain.replace(REFERENCE_PLACEHOLDER, reference),
                    html.replace(REFERENCE_PLACEHOLDER, &linked),
                )
            }
            None => {
                let gap = format!(" {REFERENCE_PLACEHOLDER}");
                (
                    self.plain.replace(&gap, "").replace(REFERENCE_PLACEHOLDER, ""),
                    html.replace(&gap, "").replace(REFERENCE_PLACEHOLDER, ""),
                )
            }
        };
        CreationResult::aborted_with(plain, html)
    }
}

/// Target an operation needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetRequirement {
    /// Any target is ignored.
    NotNeeded,
    /// A target of one of these shapes is required.
    Required {
        /// Accepted shapes
        shapes: Vec<TargetShape>,
        /// Message when no reference resolved
        missing: AbortMessage,
        /// Message when the target has the wrong shape
        wrong_shape: AbortMessage,
    },
}

/// One supported operation of an adapter.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Capability {
    /// Which operation.
    kind: OperationKind,
    /// Target it needs.
    target: TargetRequirement,
    /// How the lookup step treats "not found".
    lookup_policy: LookupPolicy,
}

impl Capability {
    /// Operation that needs no target.
    pub fn untargeted(kind: OperationKind) -> Self {
        Self {
            kind,
            target: TargetRequirement::NotNeeded,
            lookup_policy: LookupPolicy::Strict,
        }
    }

    /// Operation that needs a target of one of `shapes`.
    pub fn targeted(
        kind: OperationKind,
        shapes: impl IntoIterator<Item = TargetShape>,
        missing: AbortMessage,
        wrong_shape: AbortMessage,
    ) -> Self {
        Self {
            kind,
            target: TargetRequirement::Required {
                shapes: shapes.into_iter().collect(),
                missing,
                wrong_shape,
            },
            lookup_policy: LookupPolicy::Strict,
        }
    }

    /// Sets the lookup policy.
    pub fn with_lookup_policy(mut self, policy: LookupPolicy) -> Self {
        self.lookup_policy = policy;
        self
    }
}

/// Operations an adapter supports, and what each needs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CapabilityTable {
    capabilities: Vec<Capability>,
}

impl CapabilityTable {
    /// Creates a table.
    pub fn new(capabilities: impl IntoIterator<Item = Capability>) -> Self {
        Self {
            capabilities: capabilities.into_iter().collect(),
        }
    }

    /// Capability for an operation kind, if supported.
    pub fn get(&self, kind: OperationKind) -> Option<&Capability> {
        self.capabilities.iter().find(|c| c.kind == kind)
    }

    /// Overrides the lookup policy of one operation.
    pub fn set_lookup_policy(&mut self, kind: OperationKind, policy: LookupPolicy) {
        if let Some(capability) = self.capabilities.iter_mut().find(|c| c.kind == kind) {
            capability.lookup_policy = policy;
        }
    }

    /// Lookup policy of an operation; strict when unsupported.
    pub fn lookup_policy(&self, kind: OperationKind) -> LookupPolicy {
        self.get(kind)
            .map(|c| c.lookup_policy)
            .unwrap_or(LookupPolicy::Strict)
    }

    /// Supported operation kinds.
    pub fn kinds(&self) -> impl Iterator<Item = OperationKind> + '_ {
        self.capabilities.iter().map(|c| c.kind)
    }
}

/// Validated request: ready for rendering and execution.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct Plan<'a> {
    /// The object being published.
    object: &'a CanonicalObject,
    /// What to do.
    operation: Operation,
    /// Where to do it, when the operation needs a target.
    target: Option<TargetDescriptor>,
    /// How the lookup step treats "not found".
    lookup_policy: LookupPolicy,
}

impl Plan<'_> {
    /// The target, for operations that require one.
    pub fn required_target(&self) -> Option<&TargetDescriptor> {
        self.target.as_ref()
    }
}

/// Dispatch states.
#[derive(Debug)]
enum State<'a> {
    Start,
    TargetResolved(Resolution),
    VerbSelected {
        resolution: Resolution,
        operation: Operation,
    },
    Validated(Plan<'a>),
    Aborted(CreationResult),
}

/// Turns a canonical object into a [`Plan`] or an aborted result.
///
/// # Examples
///
/// ```
/// use syndic_core::CanonicalObject;
/// use syndic_publish::{Dispatcher, OperationKind, PlatformGrammar, github_capabilities};
///
/// let grammar = PlatformGrammar::github().unwrap();
/// let capabilities = github_capabilities();
/// let object: CanonicalObject = serde_json::from_value(serde_json::json!({
///     "objectType": "activity",
///     "verb": "like",
///     "target": "https://github.com/foo/bar",
/// })).unwrap();
///
/// let plan = Dispatcher::new(&grammar, &capabilities).dispatch(&object).unwrap();
/// assert_eq!(plan.operation().kind(), OperationKind::Like);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher<'g> {
    grammar: &'g PlatformGrammar,
    capabilities: &'g CapabilityTable,
}

impl<'g> Dispatcher<'g> {
    /// Creates a dispatcher for one platform.
    pub fn new(grammar: &'g PlatformGrammar, capabilities: &'g CapabilityTable) -> Self {
        Self {
            grammar,
            capabilities,
        }
    }

    /// Runs the state machine to completion.
    ///
    /// # Errors
    ///
    /// Returns the aborted result when a precondition fails.
    #[instrument(skip_all, fields(platform = %self.grammar.name()))]
    pub fn dispatch<'a>(&self, object: &'a CanonicalObject) -> Result<Plan<'a>, CreationResult> {
        let mut state = State::Start;
        loop {
            state = match state {
                State::Start => State::TargetResolved(self.resolve(object)),
                State::TargetResolved(resolution) => self.select(object, resolution),
                State::VerbSelected {
                    resolution,
                    operation,
                } => self.validate(object, resolution, operation),
                State::Validated(plan) => {
                    debug!(operation = %plan.operation.kind(), "Dispatch validated");
                    return Ok(plan);
                }
                State::Aborted(result) => {
                    debug!(error = %result.error_plain(), "Dispatch aborted");
                    return Err(result);
                }
            };
        }
    }

    fn resolve(&self, object: &CanonicalObject) -> Resolution {
        let references = object
            .in_reply_to()
            .iter()
            .chain(object.object())
            .chain(object.target());
        TargetResolver::new(self.grammar).resolve_first(references)
    }

    fn select<'a>(&self, object: &CanonicalObject, resolution: Resolution) -> State<'a> {
        if let Resolution::InvalidFragment(fragment) = &resolution {
            return State::Aborted(CreationResult::aborted(format!(
                "Please remove the fragment #{fragment} from your in-reply-to URL."
            )));
        }

        match self.select_operation(object, &resolution) {
            Some(operation) => State::VerbSelected {
                resolution,
                operation,
            },
            None => State::Aborted(self.unsupported(object)),
        }
    }

    fn select_operation(&self, object: &CanonicalObject, resolution: &Resolution) -> Option<Operation> {
        let object_type = object.object_type().as_ref();
        let is_activity = matches!(object_type, Some(ObjectType::Activity) | None);

        if let Some(verb) = object.verb().as_ref().filter(|_| is_activity) {
            return match verb {
                verb if verb.is_like() => Some(Operation::Like),
                verb if verb.is_rsvp() => Some(Operation::NewPost),
                Verb::Share => Some(Operation::Share),
                Verb::Tag => Some(Operation::Tag {
                    tags: object.tag_names(),
                }),
                Verb::React => Some(Operation::React {
                    emoji: reaction_text(object)?,
                }),
                Verb::Follow => Some(Operation::Follow),
                Verb::Post if !object.in_reply_to().is_empty() => Some(Operation::Reply),
                Verb::Post => Some(Operation::NewPost),
                _ => None,
            };
        }

        match object_type {
            Some(ObjectType::Comment) => Some(self.reply_or_reaction(object)),
            Some(ObjectType::Note | ObjectType::Article | ObjectType::Issue) | None => {
                let targets_item = resolution
                    .descriptor()
                    .is_some_and(|t| t.shape() != &TargetShape::Container);
                if !object.in_reply_to().is_empty() && targets_item {
                    Some(self.reply_or_reaction(object))
                } else {
                    Some(Operation::NewPost)
                }
            }
            _ => None,
        }
    }

    fn reply_or_reaction(&self, object: &CanonicalObject) -> Operation {
        match reaction_text(object) {
            Some(emoji) if self.grammar.reaction_name(&emoji).is_some() => Operation::React { emoji },
            _ => Operation::Reply,
        }
    }

    fn validate<'a>(
        &self,
        object: &'a CanonicalObject,
        resolution: Resolution,
        operation: Operation,
    ) -> State<'a> {
        let Some(capability) = self.capabilities.get(operation.kind()) else {
            return State::Aborted(self.unsupported(object));
        };

        let target = match (capability.target(), resolution) {
            (TargetRequirement::NotNeeded, _) => None,
            (TargetRequirement::Required { missing, .. }, Resolution::NotFound) => {
                return State::Aborted(missing.to_result(first_reference(object)));
            }
            (TargetRequirement::Required { .. }, Resolution::InvalidFragment(fragment)) => {
                return State::Aborted(CreationResult::aborted(format!(
                    "Please remove the fragment #{fragment} from your in-reply-to URL."
                )));
            }
            (
                TargetRequirement::Required {
                    shapes,
                    wrong_shape,
                    ..
                },
                Resolution::Resolved(target),
            ) => {
                if !shapes.contains(target.shape()) {
                    return State::Aborted(wrong_shape.to_result(Some(target.url())));
                }
                Some(target)
            }
        };

        if let Operation::Tag { tags } = &operation
            && tags.is_empty()
        {
            return State::Aborted(CreationResult::aborted("No tags found in tag post!"));
        }

        if let Operation::React { emoji } = &operation
            && self.grammar.reaction_name(emoji).is_none()
        {
            return State::Aborted(CreationResult::aborted(format!(
                "{} does not support the {emoji} reaction.",
                self.grammar.name()
            )));
        }

        State::Validated(Plan {
            object,
            operation,
            target,
            lookup_policy: *capability.lookup_policy(),
        })
    }

    fn unsupported(&self, object: &CanonicalObject) -> CreationResult {
        let object_type = object
            .object_type()
            .as_ref()
            .map_or_else(|| "None".to_string(), ToString::to_string);
        let verb = object
            .verb()
            .as_ref()
            .map_or_else(|| "None".to_string(), ToString::to_string);
        CreationResult::aborted(format!(
            "Cannot publish type={object_type}, verb={verb} to {}",
            self.grammar.name()
        ))
    }
}

/// URL or id of the first reference the object carries, for messages.
fn first_reference(object: &CanonicalObject) -> Option<&str> {
    object
        .in_reply_to()
        .iter()
        .chain(object.object())
        .chain(object.target())
        .find_map(Reference::locator)
}

/// Trimmed visible text of the object's content, if any.
fn reaction_text(object: &CanonicalObject) -> Option<String> {
    let content = CanonicalObject::text_field(object.content())?;
    let text = strip_tags(content).trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Capability table of the GitHub adapter.
pub fn github_capabilities() -> CapabilityTable {
    let missing = || AbortMessage::plain("You need an in-reply-to GitHub repo, issue, PR, or comment URL.");
    let comment_shape = || AbortMessage::plain("GitHub comment requires in-reply-to issue or PR URL.");

    CapabilityTable::new([
        Capability::targeted(
            OperationKind::NewPost,
            [TargetShape::Container],
            missing(),
            AbortMessage::plain("New GitHub issue requires in-reply-to repo URL"),
        )
        .with_lookup_policy(LookupPolicy::BenignAbsence),
        Capability::targeted(
            OperationKind::Reply,
            [TargetShape::Item, TargetShape::SubItem],
            missing(),
            comment_shape(),
        ),
        Capability::targeted(
            OperationKind::React,
            [TargetShape::Item, TargetShape::SubItem],
            missing(),
            comment_shape(),
        ),
        Capability::targeted(
            OperationKind::Like,
            [TargetShape::Container],
            missing(),
            AbortMessage::plain("GitHub like requires in-reply-to repo URL."),
        ),
        Capability::targeted(
            OperationKind::Tag,
            [TargetShape::Item, TargetShape::SubItem],
            missing(),
            AbortMessage::plain("GitHub tag post requires tag-of issue or PR URL."),
        )
        .with_lookup_policy(LookupPolicy::BenignAbsence),
    ])
}

/// Capability table of the Mastodon adapter.
pub fn mastodon_capabilities() -> CapabilityTable {
    let not_found = |label: &str, link: &str, link_name: &str| {
        AbortMessage::with_html(
            format!("Could not find a Mastodon toot to {label}."),
            format!(
                "Could not find a Mastodon toot to <a href=\"http://indiewebcamp.com/{link}\">{label}</a>. \
                 Check that your post has the right <a href=\"http://indiewebcamp.com/{link}\">{link_name}</a> link."
            ),
        )
    };
    let wrong = |label: &str| AbortMessage::plain(format!("Mastodon {label} requires a toot URL."));

    CapabilityTable::new([
        Capability::untargeted(OperationKind::NewPost),
        Capability::targeted(
            OperationKind::Reply,
            [TargetShape::Item],
            not_found("reply to", "reply", "in-reply-to"),
            wrong("reply"),
        ),
        Capability::targeted(
            OperationKind::Like,
            [TargetShape::Item],
            not_found("favorite", "like", "u-like-of"),
            wrong("favorite"),
        ),
        Capability::targeted(
            OperationKind::Share,
            [TargetShape::Item],
            not_found("boost", "repost", "repost-of"),
            wrong("boost"),
        ),
        Capability::targeted(
            OperationKind::Follow,
            [TargetShape::Container],
            AbortMessage::plain(format!("Could not find user {REFERENCE_PLACEHOLDER} to follow.")),
            AbortMessage::plain(format!(
                "Mastodon follow requires a profile URL, not {REFERENCE_PLACEHOLDER}."
            )),
        ),
    ])
}
