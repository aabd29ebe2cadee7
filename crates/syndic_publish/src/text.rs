//! HTML to platform text, mention rewriting and preview linkifying.

use crate::LinkSyntax;
use regex::{Captures, Regex};
use scraper::{ElementRef, Html, node::Node};
use std::sync::LazyLock;
use syndic_core::{escape_attr, escape_text};

static HTML_SNIFF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<[A-Za-z!/][^>]*>|&(?:#[0-9]+|#[xX][0-9a-fA-F]+|[A-Za-z]+);")
        .expect("static HTML sniffing pattern")
});

static BLANK_LINES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("static blank line pattern"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static whitespace pattern"));

static PREVIEW_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?P<url>https?://[^\s<>]+)|@(?P<user>[a-z0-9_](?:[a-z0-9_.-]*[a-z0-9_])?)(?:@(?P<host>[a-z0-9.-]*[a-z0-9]))?|[#＃](?P<tag>\w+)",
    )
    .expect("static preview token pattern")
});

const BLOCK_TAGS: [&str; 14] = [
    "p", "div", "ul", "ol", "blockquote", "pre", "section", "article", "table", "tr", "header",
    "footer", "figure", "hr",
];

/// Whether text contains markup or entities.
///
/// # Examples
///
/// ```
/// use syndic_publish::looks_like_html;
///
/// assert!(looks_like_html("<p>hi</p>"));
/// assert!(looks_like_html("fish &amp; chips"));
/// assert!(!looks_like_html("1 < 2 & 3 > 2"));
/// ```
pub fn looks_like_html(text: &str) -> bool {
    HTML_SNIFF_RE.is_match(text)
}

/// Collapses every whitespace run to a single space.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

/// How HTML is turned into published text.
#[derive(Debug, Clone, Copy)]
pub struct TextStyle<'a> {
    /// Hyperlink syntax.
    pub link_syntax: LinkSyntax,
    /// Escape `<`, `>` and `&` in text.
    pub escape: bool,
    /// Tags copied through as raw HTML.
    pub passthrough: &'a [String],
}

impl TextStyle<'_> {
    fn escaped(&self, text: &str) -> String {
        if self.escape {
            escape_text(text)
        } else {
            text.to_string()
        }
    }
}

/// Converts HTML to the platform's text form.
///
/// Block elements become paragraph breaks, `<br>` a newline, images are
/// dropped and links follow the style's link syntax. Passthrough tags are
/// emitted as raw HTML; everything else is escaped when the style asks for it.
///
/// # Examples
///
/// ```
/// use syndic_publish::{LinkSyntax, TextStyle, html_to_text};
///
/// let style = TextStyle { link_syntax: LinkSyntax::Markdown, escape: true, passthrough: &[] };
/// let text = html_to_text(r#"<p>see <a href="http://x/">this</a> &amp; <img src="y"></p>"#, style);
/// assert_eq!(text, "see [this](http://x/) &amp;");
/// ```
pub fn html_to_text(html: &str, style: TextStyle<'_>) -> String {
    let fragment = Html::parse_fragment(html);
    let mut writer = TextWriter::new(style);
    writer.children(fragment.root_element());
    writer.finish()
}

struct TextWriter<'a> {
    style: TextStyle<'a>,
    out: String,
    pre_depth: usize,
}

impl<'a> TextWriter<'a> {
    fn new(style: TextStyle<'a>) -> Self {
        Self {
            style,
            out: String::new(),
            pre_depth: 0,
        }
    }

    fn finish(self) -> String {
        let lines: Vec<&str> = self.out.lines().map(str::trim_end).collect();
        let joined = lines.join("\n");
        BLANK_LINES_RE
            .replace_all(joined.trim(), "\n\n")
            .into_owned()
    }

    fn children(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            if let Some(child_element) = ElementRef::wrap(child) {
                self.element(child_element);
            } else if let Node::Text(text) = child.value() {
                self.text(text);
            }
        }
    }

    fn inline(&self, element: ElementRef<'_>) -> String {
        let mut inner = TextWriter::new(self.style);
        inner.pre_depth = self.pre_depth;
        inner.children(element);
        collapse_whitespace(&inner.out)
    }

    fn text(&mut self, text: &str) {
        if self.pre_depth > 0 {
            let escaped = self.style.escaped(text);
            self.out.push_str(&escaped);
            return;
        }

        let collapsed = WHITESPACE_RE.replace_all(text, " ");
        let at_line_start = self.out.is_empty() || self.out.ends_with('\n');
        let at_space = at_line_start || self.out.ends_with(' ');
        let trimmed = if at_space {
            collapsed.trim_start()
        } else {
            collapsed.as_ref()
        };
        let escaped = self.style.escaped(trimmed);
        self.out.push_str(&escaped);
    }

    fn block_break(&mut self) {
        let trimmed_len = self.out.trim_end_matches(' ').len();
        self.out.truncate(trimmed_len);
        if self.out.is_empty() || self.out.ends_with("\n\n") {
            return;
        }
        if self.out.ends_with('\n') {
            self.out.push('\n');
        } else {
            self.out.push_str("\n\n");
        }
    }

    fn line_break(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    fn element(&mut self, element: ElementRef<'_>) {
        let name = element.value().name();
        if self.style.passthrough.iter().any(|tag| tag == name) {
            self.out.push_str(&element.html());
            return;
        }

        let markdown = self.style.link_syntax == LinkSyntax::Markdown;
        match name {
            "script" | "style" | "img" | "head" | "title" | "video" | "audio" => {}
            "br" => self.out.push('\n'),
            "a" => {
                let text = self.inline(element);
                let href = element.value().attr("href").unwrap_or_default().trim();
                let rendered = match (markdown, text.is_empty(), href.is_empty()) {
                    (_, true, _) => self.style.escaped(href),
                    (true, false, false) => format!("[{text}]({})", self.style.escaped(href)),
                    _ => text,
                };
                self.out.push_str(&rendered);
            }
            "strong" | "b" if markdown => {
                let text = self.inline(element);
                if !text.is_empty() {
                    self.out.push_str(&format!("**{text}**"));
                }
            }
            "em" | "i" if markdown => {
                let text = self.inline(element);
                if !text.is_empty() {
                    self.out.push_str(&format!("_{text}_"));
                }
            }
            "li" => {
                self.line_break();
                self.out.push_str("* ");
                self.children(element);
                self.line_break();
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.block_break();
                if markdown {
                    let level = name[1..].parse::<usize>().unwrap_or(1);
                    self.out.push_str(&"#".repeat(level));
                    self.out.push(' ');
                }
                self.children(element);
                self.block_break();
            }
            "pre" => {
                self.block_break();
                self.pre_depth += 1;
                self.children(element);
                self.pre_depth -= 1;
                self.block_break();
            }
            name if BLOCK_TAGS.contains(&name) => {
                self.block_break();
                self.children(element);
                self.block_break();
            }
            _ => self.children(element),
        }
    }
}

/// Replaces exact profile URLs with `@user` mentions.
///
/// `prefix` is the profile URL up to the user name, e.g.
/// `https://github.com/`. A URL is only rewritten when the user name is the
/// whole rest of it: no further path, query, fragment or `_+@.` suffix. URLs
/// inside a Markdown link target `](...)` or an HTML attribute `="..."` are
/// left alone.
///
/// # Examples
///
/// ```
/// use syndic_publish::rewrite_profile_mentions;
///
/// let out = rewrite_profile_mentions("cc https://github.com/snarfed, thanks", "https://github.com/");
/// assert_eq!(out, "cc @snarfed, thanks");
///
/// let out = rewrite_profile_mentions("https://github.com/snarfed/granary", "https://github.com/");
/// assert_eq!(out, "https://github.com/snarfed/granary");
/// ```
pub fn rewrite_profile_mentions(text: &str, prefix: &str) -> String {
    let Ok(pattern) = Regex::new(&format!(r"{}([A-Za-z0-9-]+)", regex::escape(prefix))) else {
        return text.to_string();
    };

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in pattern.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let before = &text[..whole.start()];
        let after = &text[whole.end()..];

        let attached_before = before
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric() || c == '_');
        let in_link_target = before.ends_with("](");
        let in_attribute = before.ends_with("=\"") || before.ends_with("='");
        let continues = after
            .chars()
            .next()
            .is_some_and(|c| "/?_+#@.".contains(c));

        if attached_before || in_link_target || in_attribute || continues {
            continue;
        }
        out.push_str(&text[last..whole.start()]);
        out.push('@');
        out.push_str(&caps[1]);
        last = whole.end();
    }
    out.push_str(&text[last..]);
    out
}

/// Escapes plain text and links URLs, `@user`, `@user@host` and `#tags`.
///
/// Mentions without a host and hashtags link into `base_url`.
///
/// # Examples
///
/// ```
/// use syndic_publish::linkify_preview;
///
/// let html = linkify_preview("hi @alice #rust", "https://mastodon.example");
/// assert_eq!(
///     html,
///     "hi <a href=\"https://mastodon.example/@alice\">@alice</a> \
///      <a href=\"https://mastodon.example/tags/rust\">#rust</a>"
/// );
/// ```
pub fn linkify_preview(text: &str, base_url: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    let mut out = String::with_capacity(text.len() * 2);
    let mut last = 0;

    for caps in PREVIEW_TOKEN_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let prev = text[..whole.start()].chars().next_back();
        let Some(html) = preview_link(&caps, prev, base_url) else {
            continue;
        };
        out.push_str(&escape_text(&text[last..whole.start()]));
        out.push_str(&html);
        last = whole.end();
    }
    out.push_str(&escape_text(&text[last..]));
    out
}

/// Drops sentence punctuation and closing parens that follow a URL.
pub(crate) fn trim_url_punctuation(url: &str) -> &str {
    url.trim_end_matches(['.', ',', ';', ':', '!', '?', ')', '\'', '"'])
}

fn preview_link(caps: &Captures<'_>, prev: Option<char>, base_url: &str) -> Option<String> {
    if let Some(url) = caps.name("url") {
        let raw = url.as_str();
        let trimmed = trim_url_punctuation(raw);
        let trailing = &raw[trimmed.len()..];
        return Some(format!(
            "<a href=\"{}\">{}</a>{}",
            escape_attr(trimmed),
            escape_text(trimmed),
            escape_text(trailing)
        ));
    }

    if let Some(user) = caps.name("user") {
        if prev.is_some_and(|c| c == '/' || c.is_alphanumeric() || c == '_') {
            return None;
        }
        let instance = caps
            .name("host")
            .map(|host| format!("https://{}", host.as_str()))
            .unwrap_or_else(|| base_url.to_string());
        return Some(format!(
            "<a href=\"{}/@{}\">@{}</a>",
            escape_attr(&instance),
            escape_attr(user.as_str()),
            escape_text(user.as_str())
        ));
    }

    let tag = caps.name("tag")?;
    if prev.is_some_and(|c| !c.is_whitespace()) {
        return None;
    }
    Some(format!(
        "<a href=\"{base_url}/tags/{}\">#{}</a>",
        escape_attr(tag.as_str()),
        escape_text(tag.as_str())
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn github_style() -> TextStyle<'static> {
        static PASSTHROUGH: LazyLock<Vec<String>> =
            LazyLock::new(|| vec!["blockquote".to_string(), "code".to_string()]);
        TextStyle {
            link_syntax: LinkSyntax::Markdown,
            escape: true,
            passthrough: &PASSTHROUGH,
        }
    }

    #[test]
    fn test_passthrough_tags_stay_raw() {
        let text = html_to_text(
            "<p>x <code>&lt;data foo&gt;</code> y &lt; z</p>",
            github_style(),
        );
        assert_eq!(text, "x <code>&lt;data foo&gt;</code> y &lt; z");
    }

    #[test]
    fn test_blocks_and_lists() {
        let style = TextStyle {
            link_syntax: LinkSyntax::Bare,
            escape: false,
            passthrough: &[],
        };
        let text = html_to_text(
            "<p>first</p><p>second <a href=\"http://x\">link</a></p><ul><li>a</li><li>b</li></ul>",
            style,
        );
        assert_eq!(text, "first\n\nsecond link\n\n* a\n* b");
    }

    #[test]
    fn test_mentions_skip_links_and_attributes() {
        let prefix = "https://github.com/";
        assert_eq!(
            rewrite_profile_mentions("[me](https://github.com/foo)", prefix),
            "[me](https://github.com/foo)"
        );
        assert_eq!(
            rewrite_profile_mentions("<a href=\"https://github.com/foo\">x</a>", prefix),
            "<a href=\"https://github.com/foo\">x</a>"
        );
        assert_eq!(
            rewrite_profile_mentions("https://github.com/foo?tab=repos", prefix),
            "https://github.com/foo?tab=repos"
        );
        assert_eq!(
            rewrite_profile_mentions("http://github.com/foo", prefix),
            "http://github.com/foo"
        );
        assert_eq!(
            rewrite_profile_mentions("a https://github.com/foo\nb https://github.com/bar", prefix),
            "a @foo\nb @bar"
        );
    }

    #[test]
    fn test_linkify_urls_and_remote_mentions() {
        let html = linkify_preview(
            "see http://a.example/x. and @bob@other.example, not me@mail.example",
            "https://mastodon.example",
        );
        assert_eq!(
            html,
            "see <a href=\"http://a.example/x\">http://a.example/x</a>. and \
             <a href=\"https://other.example/@bob\">@bob</a>, not me@mail.example"
        );
    }

    #[test]
    fn test_linkify_escapes_text() {
        assert_eq!(linkify_preview("1 < 2", "https://m.example"), "1 &lt; 2");
    }
}
