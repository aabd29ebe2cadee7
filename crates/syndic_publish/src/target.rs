//! Resolving references against a platform grammar.

use crate::{PlatformGrammar, TargetShape};
use derive_getters::Getters;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use syndic_core::Reference;
use tracing::{debug, instrument};
use url::Url;

static TAG_URI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^tag:([^,]+),(\d{4}(?:-\d{2}){0,2}):(.+)$").expect("static tag URI pattern")
});

/// Comment inside an item, addressed by a URL fragment.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct SubItem {
    /// Kind from the matching fragment rule, e.g. `issues` or `pulls`.
    kind: String,
    /// Numeric id from the fragment.
    id: String,
}

impl SubItem {
    /// Creates a sub-item reference.
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }
}

/// Platform identifiers of a resolved target.
///
/// Built per publish call and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct TargetDescriptor {
    /// Named captures from the matched template.
    ids: BTreeMap<String, String>,
    /// URL the target was resolved from, or built for an opaque id.
    url: String,
    /// What the target is.
    shape: TargetShape,
    /// Comment addressed by the fragment, for sub-item targets.
    sub_item: Option<SubItem>,
    /// Whether the platform must look up its own id before acting on it.
    needs_lookup: bool,
}

impl TargetDescriptor {
    /// Value of a named capture.
    pub fn id(&self, name: &str) -> Option<&str> {
        self.ids.get(name).map(String::as_str)
    }
}

/// Outcome of resolving one or more references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A target on this platform.
    Resolved(TargetDescriptor),
    /// Nothing matched this platform's grammar.
    NotFound,
    /// The URL matched but carried a fragment the platform cannot address.
    InvalidFragment(String),
}

impl Resolution {
    /// The descriptor, if resolved.
    pub fn descriptor(&self) -> Option<&TargetDescriptor> {
        match self {
            Self::Resolved(descriptor) => Some(descriptor),
            _ => None,
        }
    }
}

/// Matches URLs, tag URIs and opaque ids against a [`PlatformGrammar`].
///
/// # Examples
///
/// ```
/// use syndic_core::Reference;
/// use syndic_publish::{PlatformGrammar, Resolution, TargetResolver, TargetShape};
///
/// let grammar = PlatformGrammar::github().unwrap();
/// let resolver = TargetResolver::new(&grammar);
///
/// let resolution = resolver.resolve(&Reference::from_url("https://github.com/foo/bar/issues/123"));
/// let target = resolution.descriptor().unwrap();
/// assert_eq!(target.shape(), &TargetShape::Item);
/// assert_eq!(target.id("number"), Some("123"));
///
/// assert_eq!(
///     resolver.resolve(&Reference::from_url("https://github.com/foo/bar/issues/1#bad-1")),
///     Resolution::InvalidFragment("bad-1".to_string()),
/// );
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TargetResolver<'a> {
    grammar: &'a PlatformGrammar,
}

impl<'a> TargetResolver<'a> {
    /// Creates a resolver for a grammar.
    pub fn new(grammar: &'a PlatformGrammar) -> Self {
        Self { grammar }
    }

    /// Resolves the first reference that belongs to this platform.
    ///
    /// A reference whose URL matches but carries a bad fragment stops the
    /// search; it never falls through to a later reference.
    pub fn resolve_first<'r>(&self, references: impl IntoIterator<Item = &'r Reference>) -> Resolution {
        for reference in references {
            match self.resolve(reference) {
                Resolution::NotFound => continue,
                found => return found,
            }
        }
        Resolution::NotFound
    }

    /// Resolves one reference, trying its URL before its id.
    pub fn resolve(&self, reference: &Reference) -> Resolution {
        for candidate in reference.candidates() {
            match self.resolve_str(candidate) {
                Resolution::NotFound => continue,
                found => return found,
            }
        }
        Resolution::NotFound
    }

    /// Resolves a URL, tag URI or opaque id.
    #[instrument(skip(self), fields(platform = %self.grammar.name()))]
    pub fn resolve_str(&self, candidate: &str) -> Resolution {
        let candidate = candidate.trim();
        let resolution = if let Some(caps) = TAG_URI_RE.captures(candidate) {
            self.resolve_tag_uri(&caps[1], &caps[3])
        } else if candidate.starts_with("http://") || candidate.starts_with("https://") {
            self.resolve_url(candidate)
        } else {
            self.resolve_composite(candidate)
        };
        debug!(?resolution, "Resolved candidate");
        resolution
    }

    fn resolve_url(&self, candidate: &str) -> Resolution {
        let Ok(parsed) = Url::parse(candidate) else {
            return Resolution::NotFound;
        };
        let Some(host) = parsed.host_str().map(str::to_ascii_lowercase) else {
            return Resolution::NotFound;
        };
        let local = self.grammar.host().as_deref() == Some(host.as_str());
        if !local && !self.grammar.foreign_hosts() {
            return Resolution::NotFound;
        }

        let Some((pattern, ids)) = self
            .grammar
            .url_patterns()
            .iter()
            .find_map(|p| p.match_path(parsed.path()).map(|ids| (p, ids)))
        else {
            return Resolution::NotFound;
        };

        let fragment = parsed.fragment().filter(|f| !f.is_empty());
        let (shape, sub_item) = match fragment {
            None => (*pattern.shape(), None),
            Some(fragment) if !pattern.sub_items() => {
                return Resolution::InvalidFragment(fragment.to_string());
            }
            Some(fragment) => {
                let sub_item = self.grammar.fragments().iter().find_map(|rule| {
                    rule.match_fragment(fragment)
                        .map(|id| SubItem::new(rule.kind().as_str(), id))
                });
                match sub_item {
                    Some(sub_item) => (TargetShape::SubItem, Some(sub_item)),
                    None => return Resolution::InvalidFragment(fragment.to_string()),
                }
            }
        };

        Resolution::Resolved(TargetDescriptor {
            ids,
            url: candidate.to_string(),
            shape,
            sub_item,
            needs_lookup: !local,
        })
    }

    fn resolve_tag_uri(&self, domain: &str, id: &str) -> Resolution {
        let accepted = self
            .grammar
            .effective_tag_domain()
            .is_some_and(|d| d.eq_ignore_ascii_case(domain));
        if accepted {
            self.resolve_composite(id)
        } else {
            Resolution::NotFound
        }
    }

    fn resolve_composite(&self, id: &str) -> Resolution {
        let Some(composite) = self.grammar.composite_id() else {
            return Resolution::NotFound;
        };
        let Some(ids) = composite.match_id(id) else {
            return Resolution::NotFound;
        };
        let Some(path) = composite.path().expand(&ids) else {
            return Resolution::NotFound;
        };

        Resolution::Resolved(TargetDescriptor {
            url: self.grammar.url_for(&path),
            ids,
            shape: *composite.path().shape(),
            sub_item: None,
            needs_lookup: false,
        })
    }
}
