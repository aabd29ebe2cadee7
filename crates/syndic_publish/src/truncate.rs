//! Length limits with link budgeting.

use crate::text::trim_url_punctuation;
use regex::Regex;
use std::sync::LazyLock;
use syndic_core::IncludeLink;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s<>…]+").expect("static URL pattern"));

/// Appended to truncated text.
pub const ELLIPSIS: char = '…';

/// Length of text as the platform counts it.
///
/// Characters are Unicode scalar values. When `link_width` is set, every URL
/// counts as exactly that many characters, whatever its real length.
/// Punctuation right after a URL, like the `)` closing a citation, counts as
/// text.
///
/// # Examples
///
/// ```
/// use syndic_publish::weighted_len;
///
/// assert_eq!(weighted_len("héllo", None), 5);
/// assert_eq!(weighted_len("see https://example.com/a/very/long/path", Some(23)), 27);
/// assert_eq!(weighted_len("(https://example.com/post).", Some(23)), 26);
/// ```
pub fn weighted_len(text: &str, link_width: Option<usize>) -> usize {
    let total = text.chars().count();
    let Some(width) = link_width else {
        return total;
    };
    URL_RE.find_iter(text).fold(total, |len, url| {
        len - trim_url_punctuation(url.as_str()).chars().count() + width
    })
}

/// Text after length limiting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortened {
    /// Final text, citation included.
    pub text: String,
    /// Whether any of the source text was cut.
    pub truncated: bool,
}

/// Fits text and an optional citation into a platform limit.
///
/// The citation is only used when `include_link` asks for it: always for
/// [`IncludeLink::Include`], and only when the text was cut for
/// [`IncludeLink::IfTruncated`]. Cuts prefer word boundaries, never split a
/// URL or the citation, and end in [`ELLIPSIS`]. A citation that cannot fit
/// even next to an empty text is dropped.
///
/// Shortening is idempotent for `Omit` and `IfTruncated`: shortening the
/// result again returns it unchanged.
///
/// # Examples
///
/// ```
/// use syndic_core::IncludeLink;
/// use syndic_publish::shorten;
///
/// let short = shorten("one two three four", Some(10), None, Some(" (http://x)"), IncludeLink::Omit);
/// assert_eq!(short.text, "one two…");
/// assert!(short.truncated);
///
/// let fits = shorten("hi", Some(10), None, Some(" (u)"), IncludeLink::Include);
/// assert_eq!(fits.text, "hi (u)");
/// assert!(!fits.truncated);
/// ```
pub fn shorten(
    text: &str,
    max_length: Option<usize>,
    link_width: Option<usize>,
    citation: Option<&str>,
    include_link: IncludeLink,
) -> Shortened {
    let text = text.trim_end();
    let always_cite = match include_link {
        IncludeLink::Include => citation,
        IncludeLink::Omit | IncludeLink::IfTruncated => None,
    };
    let full = match always_cite {
        Some(cite) => format!("{text}{cite}"),
        None => text.to_string(),
    };

    let Some(limit) = max_length else {
        return Shortened {
            text: full,
            truncated: false,
        };
    };
    if weighted_len(&full, link_width) <= limit {
        return Shortened {
            text: full,
            truncated: false,
        };
    }

    let cite = match include_link {
        IncludeLink::Omit => None,
        IncludeLink::Include | IncludeLink::IfTruncated => citation,
    }
    .filter(|cite| weighted_len(cite, link_width) + 1 <= limit);
    let cite_len = cite.map_or(0, |c| weighted_len(c, link_width));
    let budget = limit.saturating_sub(cite_len + 1);

    let prefix = word_prefix(text, budget, link_width)
        .unwrap_or_else(|| hard_prefix(text, budget, link_width));

    let mut out = prefix;
    out.push(ELLIPSIS);
    if let Some(cite) = cite {
        out.push_str(cite);
    }
    Shortened {
        text: out,
        truncated: true,
    }
}

/// Longest prefix ending at a word boundary that fits the budget.
fn word_prefix(text: &str, budget: usize, link_width: Option<usize>) -> Option<String> {
    text.char_indices()
        .filter(|(_, c)| c.is_whitespace())
        .map(|(i, _)| text[..i].trim_end())
        .filter(|prefix| !prefix.is_empty() && weighted_len(prefix, link_width) <= budget)
        .last()
        .map(str::to_string)
}

/// Character cut for text whose first word alone is over budget.
fn hard_prefix(text: &str, budget: usize, link_width: Option<usize>) -> String {
    let mut prefix: String = text.chars().take(budget).collect();
    while weighted_len(&prefix, link_width) > budget && prefix.pop().is_some() {}
    prefix
}
