//! Minimal HTML text helpers shared by results and renderers.

use scraper::Html;

/// Escapes `&`, `<` and `>`; quotes are left alone.
///
/// # Examples
///
/// ```
/// assert_eq!(syndic_core::escape_text("a < b & c"), "a &lt; b &amp; c");
/// ```
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escapes text for use inside a double-quoted attribute value.
pub fn escape_attr(text: &str) -> String {
    escape_text(text).replace('"', "&quot;")
}

/// Parses the HTML and keeps only its visible text, with entities decoded.
///
/// Stray `<` and `>` that do not open a tag are kept as text.
///
/// # Examples
///
/// ```
/// let plain = syndic_core::strip_tags("No tags in [a] matched <a href=\"x\">foo/bar#1</a>.");
/// assert_eq!(plain, "No tags in [a] matched foo/bar#1.");
/// ```
pub fn strip_tags(html: &str) -> String {
    if !html.contains(['<', '&']) {
        return html.to_string();
    }
    Html::parse_fragment(html)
        .root_element()
        .text()
        .collect::<String>()
}

/// Shortens text to a number of words and characters, adding `…` if cut.
///
/// Word-boundary cuts are preferred; a single over-long word is cut hard.
pub fn ellipsize(text: &str, words: usize, chars: usize) -> String {
    let text = text.trim();
    let word_count = text.split_whitespace().count();
    if word_count <= words && text.chars().count() <= chars {
        return text.to_string();
    }

    let mut out = String::new();
    for word in text.split_whitespace().take(words) {
        let extra = usize::from(!out.is_empty()) + word.chars().count();
        if out.chars().count() + extra + 1 > chars {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }

    if out.is_empty() {
        out = text.chars().take(chars.saturating_sub(1)).collect();
    }
    out.push('…');
    out
}
