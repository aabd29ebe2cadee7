//! Canonical content objects.
//!
//! The shape follows ActivityStreams 1.0 as emitted by microformats2 parsers:
//! `objectType`, `verb`, `displayName`, `inReplyTo` and friends, with single
//! values and lists accepted interchangeably for the reference fields.

use derive_getters::Getters;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// Kind of object being published.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ObjectType {
    /// Short post.
    #[display("note")]
    Note,
    /// Long-form post with a title.
    #[display("article")]
    Article,
    /// Reply to another object.
    #[display("comment")]
    Comment,
    /// Issue in a tracker.
    #[display("issue")]
    Issue,
    /// Verb-carrying activity (like, share, tag, rsvp...).
    #[display("activity")]
    Activity,
    /// Person or account.
    #[display("person")]
    Person,
    /// Calendar event.
    #[display("event")]
    Event,
    /// Stand-alone image.
    #[display("image")]
    Image,
    /// Stand-alone video.
    #[display("video")]
    Video,
    /// Anything else, kept verbatim.
    #[display("{_0}")]
    Other(String),
}

impl From<String> for ObjectType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "note" => Self::Note,
            "article" => Self::Article,
            "comment" => Self::Comment,
            "issue" => Self::Issue,
            "activity" => Self::Activity,
            "person" => Self::Person,
            "event" => Self::Event,
            "image" => Self::Image,
            "video" => Self::Video,
            _ => Self::Other(value),
        }
    }
}

impl From<ObjectType> for String {
    fn from(value: ObjectType) -> Self {
        value.to_string()
    }
}

/// Activity verb.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Verb {
    /// Publish a new object.
    #[display("post")]
    Post,
    /// Like.
    #[display("like")]
    Like,
    /// Like, under its other common name.
    #[display("favorite")]
    Favorite,
    /// Reshare, boost, retweet.
    #[display("share")]
    Share,
    /// Emoji reaction.
    #[display("react")]
    React,
    /// Add tags or labels to something.
    #[display("tag")]
    Tag,
    /// RSVP to an event.
    #[display("rsvp-{_0}")]
    Rsvp(String),
    /// Invite someone to an event.
    #[display("invite")]
    Invite,
    /// Follow an account.
    #[display("follow")]
    Follow,
    /// Anything else, kept verbatim.
    #[display("{_0}")]
    Other(String),
}

impl From<String> for Verb {
    fn from(value: String) -> Self {
        match value.as_str() {
            "post" => Self::Post,
            "like" => Self::Like,
            "favorite" => Self::Favorite,
            "share" => Self::Share,
            "react" => Self::React,
            "tag" => Self::Tag,
            "invite" => Self::Invite,
            "follow" => Self::Follow,
            _ => match value.strip_prefix("rsvp-") {
                Some(answer) => Self::Rsvp(answer.to_string()),
                None => Self::Other(value),
            },
        }
    }
}

impl From<Verb> for String {
    fn from(value: Verb) -> Self {
        value.to_string()
    }
}

impl Verb {
    /// Whether this verb means "like", under any of its names.
    pub fn is_like(&self) -> bool {
        matches!(self, Self::Like | Self::Favorite)
    }

    /// Whether this verb is an RSVP or an invitation.
    pub fn is_rsvp(&self) -> bool {
        matches!(self, Self::Rsvp(_) | Self::Invite)
    }
}

/// Reference to another object: the thing replied to, liked, shared or tagged.
///
/// A bare string deserializes as a URL when it looks like one and as an
/// opaque id otherwise.
///
/// # Examples
///
/// ```
/// use syndic_core::Reference;
///
/// let by_url: Reference = serde_json::from_str(r#""https://github.com/foo/bar""#).unwrap();
/// assert_eq!(by_url.url().as_deref(), Some("https://github.com/foo/bar"));
///
/// let by_id: Reference = serde_json::from_str(r#""foo:bar:123""#).unwrap();
/// assert_eq!(by_id.id().as_deref(), Some("foo:bar:123"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Getters, Serialize, Deserialize)]
#[serde(from = "ReferenceRepr")]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    /// Opaque id or tag URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    /// Permalink.
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    /// Human readable name, if the reference carried one.
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
}

impl Reference {
    /// Reference by permalink.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Reference by opaque id.
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    /// Candidate strings to resolve, URL first.
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        self.url
            .as_deref()
            .into_iter()
            .chain(self.id.as_deref())
            .filter(|s| !s.trim().is_empty())
    }

    /// The URL if present, otherwise the id.
    pub fn locator(&self) -> Option<&str> {
        self.candidates().next()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReferenceRepr {
    Bare(String),
    #[serde(rename_all = "camelCase")]
    Full {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        display_name: Option<String>,
    },
}

impl From<ReferenceRepr> for Reference {
    fn from(repr: ReferenceRepr) -> Self {
        match repr {
            ReferenceRepr::Bare(s) if s.starts_with("http://") || s.starts_with("https://") => {
                Self::from_url(s)
            }
            ReferenceRepr::Bare(s) => Self::from_id(s),
            ReferenceRepr::Full {
                id,
                url,
                display_name,
            } => Self {
                id,
                url,
                display_name,
            },
        }
    }
}

/// Tag or label name attached to an object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Getters, Serialize, Deserialize)]
#[serde(from = "TagRepr")]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    /// Tag text.
    display_name: String,
}

impl Tag {
    /// Creates a tag from its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            display_name: name.into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TagRepr {
    Bare(String),
    #[serde(rename_all = "camelCase")]
    Full {
        #[serde(default)]
        display_name: String,
    },
}

impl From<TagRepr> for Tag {
    fn from(repr: TagRepr) -> Self {
        match repr {
            TagRepr::Bare(name) | TagRepr::Full { display_name: name } => Self::new(name),
        }
    }
}

/// Media types supported for attachments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    /// Image (PNG, JPEG, GIF, etc.)
    Image,
    /// Video (MP4, MOV, etc.)
    Video,
    /// Audio (MP3, WAV, etc.)
    Audio,
    /// Anything that is not media, e.g. a quoted note.
    #[default]
    #[serde(other)]
    Other,
}

/// Media attachment on an object.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Getters, Serialize, Deserialize, derive_builder::Builder,
)]
#[serde(rename_all = "camelCase")]
#[builder(setter(into))]
pub struct Attachment {
    /// Type of media.
    #[serde(rename = "objectType", default)]
    media_type: MediaType,

    /// URL to the media file.
    #[builder(default)]
    #[serde(default)]
    url: Option<String>,

    /// Stream URL, used by videos.
    #[builder(default)]
    #[serde(default)]
    stream: Option<Reference>,

    /// Alt text for accessibility.
    #[builder(default)]
    #[serde(default)]
    display_name: Option<String>,
}

impl Attachment {
    /// Where the media actually lives: the stream for videos, else the URL.
    pub fn source_url(&self) -> Option<&str> {
        self.stream
            .as_ref()
            .and_then(Reference::locator)
            .or(self.url.as_deref())
    }
}

/// Canonical content object: the input to `publish`.
///
/// # Examples
///
/// ```
/// use syndic_core::{CanonicalObject, ObjectType};
///
/// let obj: CanonicalObject = serde_json::from_value(serde_json::json!({
///     "objectType": "comment",
///     "content": "hello",
///     "inReplyTo": "https://github.com/foo/bar/issues/123",
/// })).unwrap();
///
/// assert_eq!(obj.object_type(), &Some(ObjectType::Comment));
/// assert_eq!(obj.in_reply_to().len(), 1);
/// ```
#[derive(
    Debug, Clone, Default, PartialEq, Getters, Serialize, Deserialize, derive_builder::Builder,
)]
#[serde(rename_all = "camelCase")]
#[builder(default)]
pub struct CanonicalObject {
    /// Kind of object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(setter(into, strip_option))]
    object_type: Option<ObjectType>,

    /// Activity verb, for activities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(setter(into, strip_option))]
    verb: Option<Verb>,

    /// Canonical id of the object itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(setter(into, strip_option))]
    id: Option<String>,

    /// Rich content, possibly HTML.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(setter(into, strip_option))]
    content: Option<String>,

    /// Name or title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(setter(into, strip_option))]
    display_name: Option<String>,

    /// Alternate title field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(setter(into, strip_option))]
    title: Option<String>,

    /// Plain text summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(setter(into, strip_option))]
    summary: Option<String>,

    /// Canonical permalink of the content being published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(setter(into, strip_option))]
    url: Option<String>,

    /// Objects this one replies to.
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    in_reply_to: Vec<Reference>,

    /// Object acted upon by an activity.
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    object: Vec<Reference>,

    /// Target of an activity, e.g. the tag-of object.
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    target: Vec<Reference>,

    /// Tags on the object.
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    tags: Vec<Tag>,

    /// Images and videos.
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<Attachment>,
}

impl CanonicalObject {
    /// Returns a builder for constructing a CanonicalObject.
    pub fn builder() -> CanonicalObjectBuilder {
        CanonicalObjectBuilder::default()
    }

    /// Whether this is an activity with the given verb.
    pub fn is_activity(&self) -> bool {
        matches!(self.object_type, Some(ObjectType::Activity)) || self.verb.is_some()
    }

    /// Distinct, non-empty tag names.
    ///
    /// Tag activities carry their tags in `object`; other objects in `tags`.
    pub fn tag_names(&self) -> BTreeSet<String> {
        let from_tags = self
            .tags
            .iter()
            .map(|t| t.display_name().trim().to_string());
        let from_object = self
            .object
            .iter()
            .filter_map(|r| r.display_name().as_deref())
            .map(|name| name.trim().to_string());

        from_tags
            .chain(from_object)
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// Trimmed text field, treating blank strings as absent.
    pub fn text_field(field: &Option<String>) -> Option<&str> {
        field.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Accepts either a single value or a list.
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::Many(items)) => items,
        Some(OneOrMany::One(item)) => vec![item],
    })
}
