//! Platform URL grammars and rendering rules.
//!
//! A [`PlatformGrammar`] describes everything the pipeline needs to know about
//! a network without talking to it: which URLs point at what, how long posts
//! may be, and how text must be written.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use syndic_error::{ConfigError, ConfigErrorKind};

/// What a resolved target points at.
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
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TargetShape {
    /// Repository, account or other holder of items.
    Container,
    /// Issue, pull request or status.
    Item,
    /// Comment inside an item, addressed by URL fragment.
    SubItem,
}

/// What a capture segment accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureRule {
    /// Any non-empty text.
    Any,
    /// Digits only.
    Numeric,
    /// One of a fixed set of words.
    OneOf(Vec<String>),
}

/// One segment of a path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal this text exactly.
    Literal(String),
    /// Optional literal prefix followed by a named capture, e.g. `@{user}`.
    Capture {
        /// Literal text before the captured value
        prefix: String,
        /// Capture name
        name: String,
        /// Accepted values
        rule: CaptureRule,
    },
}

impl Segment {
    fn parse(raw: &str, template: &str) -> Result<Self, ConfigError> {
        let Some(open) = raw.find('{') else {
            if raw.contains('}') {
                return Err(invalid(template, "unopened capture"));
            }
            return Ok(Self::Literal(raw.to_string()));
        };
        let prefix = &raw[..open];
        let inner = raw[open + 1..]
            .strip_suffix('}')
            .ok_or_else(|| invalid(template, "capture must close at the end of its segment"))?;
        if inner.contains(['{', '}']) {
            return Err(invalid(template, "nested braces"));
        }

        let (name, rule) = match inner.split_once(':') {
            Some((name, rule)) => (name, Some(rule)),
            None => (inner, None),
        };
        if name.is_empty() {
            return Err(invalid(template, "capture without a name"));
        }

        let rule = match rule {
            None => CaptureRule::Any,
            Some("int") => CaptureRule::Numeric,
            Some(words) => {
                let options: Vec<String> = words
                    .split('|')
                    .filter(|w| !w.is_empty())
                    .map(str::to_string)
                    .collect();
                if options.is_empty() {
                    return Err(invalid(template, "empty alternative list"));
                }
                CaptureRule::OneOf(options)
            }
        };

        Ok(Self::Capture {
            prefix: prefix.to_string(),
            name: name.to_string(),
            rule,
        })
    }

    fn matches(&self, value: &str, captures: &mut BTreeMap<String, String>) -> bool {
        match self {
            Self::Literal(text) => text == value,
            Self::Capture { prefix, name, rule } => {
                let Some(value) = value.strip_prefix(prefix.as_str()) else {
                    return false;
                };
                let ok = !value.is_empty()
                    && match rule {
                        CaptureRule::Any => true,
                        CaptureRule::Numeric => value.bytes().all(|b| b.is_ascii_digit()),
                        CaptureRule::OneOf(options) => options.iter().any(|o| o == value),
                    };
                if ok {
                    captures.insert(name.clone(), value.to_string());
                }
                ok
            }
        }
    }

    fn expand(&self, captures: &BTreeMap<String, String>) -> Option<String> {
        match self {
            Self::Literal(text) => Some(text.clone()),
            Self::Capture { prefix, name, .. } => {
                captures.get(name).map(|value| format!("{prefix}{value}"))
            }
        }
    }
}

fn invalid(template: &str, reason: &str) -> ConfigError {
    ConfigError::new(ConfigErrorKind::InvalidGrammar(format!(
        "{template}: {reason}"
    )))
}

fn parse_segments(template: &str, separator: char) -> Result<Vec<Segment>, ConfigError> {
    let segments = split_outside_braces(template, separator)
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(|s| Segment::parse(s, template))
        .collect::<Result<Vec<_>, _>>()?;
    if segments.is_empty() {
        return Err(invalid(template, "no segments"));
    }
    Ok(segments)
}

/// Splits on `separator`, ignoring separators inside `{...}`.
fn split_outside_braces(template: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in template.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            c if c == separator && depth == 0 => {
                parts.push(&template[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&template[start..]);
    parts
}

fn match_segments(segments: &[Segment], values: &[&str]) -> Option<BTreeMap<String, String>> {
    if segments.len() != values.len() {
        return None;
    }
    let mut captures = BTreeMap::new();
    segments
        .iter()
        .zip(values)
        .all(|(segment, value)| segment.matches(value, &mut captures))
        .then_some(captures)
}

/// Path template such as `/{owner}/{repo}/{kind:issues|pull}/{number:int}`.
///
/// Segment counts must match exactly. Empty segments (from trailing or
/// doubled slashes) are ignored on both sides.
///
/// # Examples
///
/// ```
/// use syndic_publish::{PathPattern, TargetShape};
///
/// let pattern = PathPattern::new("/{owner}/{repo}/{kind:issues|pull}/{number:int}", TargetShape::Item)
///     .unwrap();
/// let captures = pattern.match_path("/foo/bar/pull/12/").unwrap();
/// assert_eq!(captures["kind"], "pull");
/// assert!(pattern.match_path("/foo/bar/issues/abc").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(try_from = "PathPatternRepr", into = "PathPatternRepr")]
pub struct PathPattern {
    /// Source template text.
    template: String,
    /// Shape of targets matched by this template.
    shape: TargetShape,
    /// Whether URL fragments may address comments inside the target.
    sub_items: bool,
    #[getter(skip)]
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parses a template.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGrammar` for malformed captures.
    pub fn new(template: impl Into<String>, shape: TargetShape) -> Result<Self, ConfigError> {
        let template = template.into();
        let segments = parse_segments(&template, '/')?;
        Ok(Self {
            template,
            shape,
            sub_items: false,
            segments,
        })
    }

    /// Allows fragments to address comments inside matched targets.
    pub fn with_sub_items(mut self) -> Self {
        self.sub_items = true;
        self
    }

    /// Matches a URL path, returning the named captures.
    pub fn match_path(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let values: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match_segments(&self.segments, &values)
    }

    /// Fills the template's captures back in.
    pub fn expand(&self, captures: &BTreeMap<String, String>) -> Option<String> {
        expand_segments(&self.segments, captures, '/').map(|path| format!("/{path}"))
    }
}

fn expand_segments(
    segments: &[Segment],
    captures: &BTreeMap<String, String>,
    separator: char,
) -> Option<String> {
    let parts = segments
        .iter()
        .map(|segment| segment.expand(captures))
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join(&separator.to_string()))
}

#[derive(Serialize, Deserialize)]
struct PathPatternRepr {
    template: String,
    shape: TargetShape,
    #[serde(default)]
    sub_items: bool,
}

impl TryFrom<PathPatternRepr> for PathPattern {
    type Error = ConfigError;

    fn try_from(repr: PathPatternRepr) -> Result<Self, Self::Error> {
        let pattern = Self::new(repr.template, repr.shape)?;
        Ok(if repr.sub_items {
            pattern.with_sub_items()
        } else {
            pattern
        })
    }
}

impl From<PathPattern> for PathPatternRepr {
    fn from(pattern: PathPattern) -> Self {
        Self {
            template: pattern.template,
            shape: pattern.shape,
            sub_items: pattern.sub_items,
        }
    }
}

/// Colon separated id such as `{owner}:{repo}:{number:int}`, resolved to a
/// URL through a path template.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(try_from = "CompositeIdRepr", into = "CompositeIdRepr")]
pub struct CompositeId {
    /// Id template.
    template: String,
    /// Path template used to build the canonical URL.
    path: PathPattern,
    #[getter(skip)]
    segments: Vec<Segment>,
}

impl CompositeId {
    /// Parses an id template and the path it maps to.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGrammar` for malformed templates.
    pub fn new(template: impl Into<String>, path: PathPattern) -> Result<Self, ConfigError> {
        let template = template.into();
        let segments = parse_segments(&template, ':')?;
        Ok(Self {
            template,
            path,
            segments,
        })
    }

    /// Matches an opaque id, returning the named captures.
    pub fn match_id(&self, id: &str) -> Option<BTreeMap<String, String>> {
        let values: Vec<&str> = id.split(':').collect();
        if values.iter().any(|v| v.is_empty()) {
            return None;
        }
        match_segments(&self.segments, &values)
    }
}

#[derive(Serialize, Deserialize)]
struct CompositeIdRepr {
    template: String,
    path: PathPattern,
}

impl TryFrom<CompositeIdRepr> for CompositeId {
    type Error = ConfigError;

    fn try_from(repr: CompositeIdRepr) -> Result<Self, Self::Error> {
        Self::new(repr.template, repr.path)
    }
}

impl From<CompositeId> for CompositeIdRepr {
    fn from(id: CompositeId) -> Self {
        Self {
            template: id.template,
            path: id.path,
        }
    }
}

/// Fragment that addresses a comment inside an item, e.g. `#issuecomment-123`.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct FragmentRule {
    /// Literal prefix before the numeric id.
    prefix: String,
    /// Kind recorded on the descriptor, used to build API paths.
    kind: String,
}

impl FragmentRule {
    /// Creates a fragment rule.
    pub fn new(prefix: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            kind: kind.into(),
        }
    }

    /// Returns the numeric id if the fragment matches this rule.
    pub fn match_fragment<'a>(&self, fragment: &'a str) -> Option<&'a str> {
        fragment
            .strip_prefix(self.prefix.as_str())
            .filter(|id| !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit()))
    }
}

/// How hyperlinks are written in published text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LinkSyntax {
    /// Only the link text survives.
    #[default]
    Bare,
    /// `[text](href)`.
    Markdown,
}

/// Text wrapped around the object's own URL when a citation is appended.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct Citation {
    /// Text before the URL.
    prefix: String,
    /// Text after the URL.
    suffix: String,
}

impl Citation {
    /// Creates a citation format.
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Formats the citation for a URL.
    pub fn format(&self, url: &str) -> String {
        format!("{}{}{}", self.prefix, url, self.suffix)
    }
}

impl Default for Citation {
    fn default() -> Self {
        Self::new(" (", ")")
    }
}

/// Everything the pipeline knows about a network before talking to it.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into))]
pub struct PlatformGrammar {
    /// Human readable platform name, used in messages.
    name: String,
    /// Web base URL, e.g. `https://github.com`.
    base_url: String,
    /// Maximum post length in characters, if any.
    #[serde(default)]
    #[builder(default)]
    max_length: Option<usize>,
    /// Length every URL counts as, when the platform shortens links.
    #[serde(default)]
    #[builder(default)]
    link_width: Option<usize>,
    /// Ordered path templates; first match wins.
    #[serde(default)]
    #[builder(default)]
    url_patterns: Vec<PathPattern>,
    /// Fragment rules for comments inside items.
    #[serde(default)]
    #[builder(default)]
    fragments: Vec<FragmentRule>,
    /// Opaque id template.
    #[serde(default)]
    #[builder(default)]
    composite_id: Option<CompositeId>,
    /// Domain accepted in `tag:` URIs. Defaults to the host of `base_url`.
    #[serde(default)]
    #[builder(default)]
    tag_domain: Option<String>,
    /// Whether URLs on other hosts may still name targets here.
    #[serde(default)]
    #[builder(default)]
    foreign_hosts: bool,
    /// Hyperlink syntax.
    #[serde(default)]
    #[builder(default)]
    link_syntax: LinkSyntax,
    /// Whether `<`, `>` and `&` are escaped in published text.
    #[serde(default)]
    #[builder(default)]
    escape_output: bool,
    /// Tags copied through untouched when converting HTML.
    #[serde(default)]
    #[builder(default)]
    passthrough_tags: Vec<String>,
    /// Profile URL prefix whose exact matches become `@user` mentions.
    #[serde(default)]
    #[builder(default)]
    profile_url_prefix: Option<String>,
    /// Whether new posts prefer the name over the body text.
    #[serde(default)]
    #[builder(default)]
    prefer_name_for_posts: bool,
    /// Whether preview HTML linkifies mentions, hashtags and URLs locally.
    #[serde(default)]
    #[builder(default)]
    linkify_preview: bool,
    /// Citation format.
    #[serde(default)]
    #[builder(default)]
    citation: Citation,
    /// Emoji accepted as reactions, with the platform's name for each.
    #[serde(default)]
    #[builder(default)]
    reactions: BTreeMap<String, String>,
}

/// GitHub's reaction emoji and their REST names.
pub const GITHUB_REACTIONS: [(&str, &str); 8] = [
    ("👍", "+1"),
    ("👎", "-1"),
    ("😆", "laugh"),
    ("😕", "confused"),
    ("❤️", "heart"),
    ("🎉", "hooray"),
    ("🚀", "rocket"),
    ("👀", "eyes"),
];

/// Default Mastodon status length.
pub const MASTODON_MAX_LENGTH: usize = 500;

/// Length Mastodon counts every URL as.
pub const MASTODON_LINK_WIDTH: usize = 23;

impl PlatformGrammar {
    /// Returns a builder for constructing a PlatformGrammar.
    pub fn builder() -> PlatformGrammarBuilder {
        PlatformGrammarBuilder::default()
    }

    /// Grammar for github.com.
    ///
    /// # Errors
    ///
    /// Never in practice; templates are fixed.
    pub fn github() -> Result<Self, ConfigError> {
        let issue_path = PathPattern::new("/{owner}/{repo}/issues/{number:int}", TargetShape::Item)?;
        Ok(Self {
            name: "GitHub".to_string(),
            base_url: "https://github.com".to_string(),
            max_length: None,
            link_width: None,
            url_patterns: vec![
                PathPattern::new("/{owner}/{repo}", TargetShape::Container)?,
                PathPattern::new("/{owner}/{repo}/{section:issues}", TargetShape::Container)?,
                PathPattern::new(
                    "/{owner}/{repo}/{kind:issues|pull}/{number:int}",
                    TargetShape::Item,
                )?
                .with_sub_items(),
            ],
            fragments: vec![
                FragmentRule::new("issuecomment-", "issues"),
                FragmentRule::new("discussion_r", "pulls"),
            ],
            composite_id: Some(CompositeId::new("{owner}:{repo}:{number:int}", issue_path)?),
            tag_domain: None,
            foreign_hosts: false,
            link_syntax: LinkSyntax::Markdown,
            escape_output: true,
            passthrough_tags: vec!["blockquote".to_string(), "code".to_string()],
            profile_url_prefix: Some("https://github.com/".to_string()),
            prefer_name_for_posts: false,
            linkify_preview: false,
            citation: Citation::new("\n\n(Originally published at: ", ")"),
            reactions: GITHUB_REACTIONS
                .iter()
                .map(|(emoji, name)| (emoji.to_string(), name.to_string()))
                .collect(),
        })
    }

    /// Grammar for a Mastodon instance, e.g. `https://mastodon.social`.
    ///
    /// # Errors
    ///
    /// Never in practice; templates are fixed.
    pub fn mastodon(instance: impl Into<String>) -> Result<Self, ConfigError> {
        let status_path = PathPattern::new("/web/statuses/{id:int}", TargetShape::Item)?;
        Ok(Self {
            name: "Mastodon".to_string(),
            base_url: instance.into().trim_end_matches('/').to_string(),
            max_length: Some(MASTODON_MAX_LENGTH),
            link_width: Some(MASTODON_LINK_WIDTH),
            url_patterns: vec![
                PathPattern::new("/@{user}/{id:int}", TargetShape::Item)?,
                status_path.clone(),
                PathPattern::new("/users/{user}/statuses/{id:int}", TargetShape::Item)?,
                PathPattern::new("/@{user}", TargetShape::Container)?,
                PathPattern::new("/users/{user}", TargetShape::Container)?,
            ],
            fragments: Vec::new(),
            composite_id: Some(CompositeId::new("{id:int}", status_path)?),
            tag_domain: None,
            foreign_hosts: true,
            link_syntax: LinkSyntax::Bare,
            escape_output: false,
            passthrough_tags: Vec::new(),
            profile_url_prefix: None,
            prefer_name_for_posts: true,
            linkify_preview: true,
            citation: Citation::default(),
            reactions: BTreeMap::new(),
        })
    }

    /// Host of `base_url`, lowercased.
    pub fn host(&self) -> Option<String> {
        url::Url::parse(&self.base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
    }

    /// Domain accepted in `tag:` URIs.
    pub fn effective_tag_domain(&self) -> Option<String> {
        self.tag_domain.clone().or_else(|| self.host())
    }

    /// Points the grammar at another host, e.g. a GitHub Enterprise server.
    pub fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
    }

    /// Overrides the length limit.
    pub fn set_max_length(&mut self, max_length: Option<usize>) {
        self.max_length = max_length;
    }

    /// Overrides the link width.
    pub fn set_link_width(&mut self, link_width: Option<usize>) {
        self.link_width = link_width;
    }

    /// Platform name of a reaction emoji, if this platform accepts it.
    pub fn reaction_name(&self, emoji: &str) -> Option<&str> {
        self.reactions.get(emoji).map(String::as_str)
    }

    /// Absolute URL for a path on this platform.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_parsing_errors() {
        assert!(PathPattern::new("/{owner", TargetShape::Container).is_err());
        assert!(PathPattern::new("/{:int}", TargetShape::Container).is_err());
        assert!(PathPattern::new("/a{b}c", TargetShape::Container).is_err());
        assert!(PathPattern::new("/@{user}", TargetShape::Container).is_ok());
        assert!(PathPattern::new("/", TargetShape::Container).is_err());
    }

    #[test]
    fn test_composite_id_round_trip_to_url() {
        let github = PlatformGrammar::github().unwrap();
        let composite = github.composite_id().as_ref().unwrap();

        let captures = composite.match_id("foo:bar:123").unwrap();
        assert_eq!(
            composite.path().expand(&captures).as_deref(),
            Some("/foo/bar/issues/123")
        );
        assert!(composite.match_id("foo:bar:xyz").is_none());
        assert!(composite.match_id("foo::123").is_none());
    }

    #[test]
    fn test_split_respects_capture_rules() {
        assert_eq!(
            split_outside_braces("{owner}:{repo}:{number:int}", ':'),
            vec!["{owner}", "{repo}", "{number:int}"]
        );
    }

    #[test]
    fn test_fragment_rule_requires_digits() {
        let rule = FragmentRule::new("issuecomment-", "issues");
        assert_eq!(rule.match_fragment("issuecomment-42"), Some("42"));
        assert_eq!(rule.match_fragment("issuecomment-"), None);
        assert_eq!(rule.match_fragment("issuecomment-4a"), None);
    }

    #[test]
    fn test_grammar_deserializes_from_toml() {
        let grammar: PlatformGrammar = toml::from_str(
            r#"
            name = "Forge"
            base_url = "https://forge.example"
            max_length = 280

            [[url_patterns]]
            template = "/{user}/posts/{id:int}"
            shape = "item"
            "#,
        )
        .unwrap();

        assert_eq!(grammar.max_length(), &Some(280));
        assert_eq!(grammar.host().as_deref(), Some("forge.example"));
        assert!(grammar.url_patterns()[0].match_path("/alice/posts/9").is_some());
    }
}
