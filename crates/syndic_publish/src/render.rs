//! Canonical object to platform text.

use crate::{
    LinkSyntax, Operation, PlatformGrammar, TextStyle, collapse_whitespace, html_to_text,
    linkify_preview, looks_like_html, rewrite_profile_mentions, shorten,
};
use derive_getters::Getters;
use syndic_core::{CanonicalObject, IncludeLink, ObjectType, ellipsize, escape_text, strip_tags};
use tracing::{debug, instrument};

/// Words kept in a generated title.
pub const TITLE_WORDS: usize = 14;

/// Characters kept in a generated title.
pub const TITLE_CHARS: usize = 140;

/// Text ready to send to a platform.
#[derive(Debug, Clone, PartialEq, Eq, Default, Getters)]
pub struct RenderedContent {
    /// Body in platform syntax, citation included.
    text: String,
    /// Title for new posts on platforms that have them.
    title: Option<String>,
    /// Locally linkified preview HTML, on platforms that render it client-side.
    preview_html: Option<String>,
    /// Whether the source text was cut to fit.
    truncated: bool,
}

impl RenderedContent {
    /// Whether there is no body text.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Renders canonical objects for one platform.
///
/// # Examples
///
/// ```
/// use syndic_core::{CanonicalObject, IncludeLink};
/// use syndic_publish::{ContentRenderer, Operation, PlatformGrammar};
///
/// let grammar = PlatformGrammar::github().unwrap();
/// let object = CanonicalObject::builder()
///     .content(r#"<p>see <a href="http://x/">this</a> &amp; that</p>"#)
///     .build()
///     .unwrap();
///
/// let rendered = ContentRenderer::new(&grammar).render(&object, &Operation::Reply, IncludeLink::Omit, false);
/// assert_eq!(rendered.text(), "see [this](http://x/) &amp; that");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ContentRenderer<'a> {
    grammar: &'a PlatformGrammar,
}

impl<'a> ContentRenderer<'a> {
    /// Creates a renderer for a grammar.
    pub fn new(grammar: &'a PlatformGrammar) -> Self {
        Self { grammar }
    }

    /// Renders an object for an operation.
    ///
    /// Rendering never fails; markup it cannot convert is dropped.
    #[instrument(skip_all, fields(platform = %self.grammar.name(), operation = %operation.kind()))]
    pub fn render(
        &self,
        object: &CanonicalObject,
        operation: &Operation,
        include_link: IncludeLink,
        ignore_formatting: bool,
    ) -> RenderedContent {
        let prefer_name = *self.grammar.prefer_name_for_posts()
            && matches!(operation, Operation::NewPost)
            && object.object_type() != &Some(ObjectType::Note);

        let mut text = self.source_text(object, prefer_name, ignore_formatting);
        if let Some(prefix) = self.grammar.profile_url_prefix() {
            text = rewrite_profile_mentions(&text, prefix);
        }

        let citation = object
            .url()
            .as_deref()
            .map(|url| self.grammar.citation().format(url));
        let shortened = shorten(
            &text,
            *self.grammar.max_length(),
            *self.grammar.link_width(),
            citation.as_deref(),
            include_link,
        );
        debug!(truncated = shortened.truncated, len = shortened.text.chars().count(), "Rendered text");

        let title = matches!(operation, Operation::NewPost).then(|| self.title(object, &text));
        let preview_html = self
            .grammar
            .linkify_preview()
            .then(|| linkify_preview(&shortened.text, self.grammar.base_url()));

        RenderedContent {
            text: shortened.text,
            title,
            preview_html,
            truncated: shortened.truncated,
        }
    }

    /// Picks summary, content or name, converted to platform text.
    fn source_text(&self, object: &CanonicalObject, prefer_name: bool, ignore_formatting: bool) -> String {
        let content = CanonicalObject::text_field(object.content())
            .map(|c| self.convert(c, ignore_formatting))
            .filter(|c| !c.is_empty());
        let name = CanonicalObject::text_field(object.display_name())
            .or_else(|| CanonicalObject::text_field(object.title()))
            .map(|n| self.escape_plain(n));
        let summary = CanonicalObject::text_field(object.summary())
            .filter(|s| {
                let content_plain = object.content().as_deref().map(strip_tags).unwrap_or_default();
                s.trim() != content_plain.trim()
            })
            .map(|s| self.escape_plain(s));

        let body = if prefer_name {
            name.or(content)
        } else {
            content.or(name)
        };
        summary.or(body).unwrap_or_default()
    }

    fn convert(&self, content: &str, ignore_formatting: bool) -> String {
        match (looks_like_html(content), ignore_formatting) {
            (true, false) => html_to_text(
                content,
                TextStyle {
                    link_syntax: *self.grammar.link_syntax(),
                    escape: *self.grammar.escape_output(),
                    passthrough: self.grammar.passthrough_tags(),
                },
            ),
            (true, true) => html_to_text(
                content,
                TextStyle {
                    link_syntax: LinkSyntax::Bare,
                    escape: false,
                    passthrough: &[],
                },
            ),
            (false, true) => collapse_whitespace(content),
            (false, false) => self.escape_plain(content.trim()),
        }
    }

    fn escape_plain(&self, text: &str) -> String {
        if *self.grammar.escape_output() {
            escape_text(text)
        } else {
            text.to_string()
        }
    }

    fn title(&self, object: &CanonicalObject, text: &str) -> String {
        let source = CanonicalObject::text_field(object.display_name())
            .or_else(|| CanonicalObject::text_field(object.title()))
            .map(str::to_string)
            .unwrap_or_else(|| strip_tags(text));
        ellipsize(&source, TITLE_WORDS, TITLE_CHARS)
    }
}
