//! Tests for rendering canonical objects into platform text.

use serde_json::json;
use syndic_core::{CanonicalObject, IncludeLink};
use syndic_publish::{
    ContentRenderer, ELLIPSIS, MASTODON_LINK_WIDTH, MASTODON_MAX_LENGTH, Operation, PlatformGrammar,
    shorten, weighted_len,
};

fn object(value: serde_json::Value) -> CanonicalObject {
    serde_json::from_value(value).unwrap()
}

// ============================================================================
// GitHub
// ============================================================================

#[test]
fn test_github_html_becomes_markdown() {
    let grammar = PlatformGrammar::github().unwrap();
    let obj = object(json!({
        "content": "<p>Fixed in <a href=\"https://github.com/foo/bar/pull/2\">#2</a>.</p>\
                    <p>Thanks <em>everyone</em> &amp; https://github.com/snarfed</p>",
    }));

    let rendered = ContentRenderer::new(&grammar).render(&obj, &Operation::Reply, IncludeLink::Omit, false);

    assert_eq!(
        rendered.text(),
        "Fixed in [#2](https://github.com/foo/bar/pull/2).\n\nThanks _everyone_ &amp; @snarfed"
    );
    assert!(rendered.title().is_none());
    assert!(rendered.preview_html().is_none());
    assert!(!*rendered.truncated());
}

#[test]
fn test_github_plain_text_is_escaped() {
    let grammar = PlatformGrammar::github().unwrap();
    let obj = object(json!({"content": "a < b"}));

    let rendered = ContentRenderer::new(&grammar).render(&obj, &Operation::Reply, IncludeLink::Omit, false);

    assert_eq!(rendered.text(), "a &lt; b");
}

#[test]
fn test_ignore_formatting_drops_markup() {
    let grammar = PlatformGrammar::github().unwrap();
    let obj = object(json!({"content": "<p>see <a href=\"http://x/\">this</a> <b>now</b></p>"}));

    let rendered = ContentRenderer::new(&grammar).render(&obj, &Operation::Reply, IncludeLink::Omit, true);

    assert_eq!(rendered.text(), "see this now");
}

#[test]
fn test_github_citation_is_appended_on_request() {
    let grammar = PlatformGrammar::github().unwrap();
    let obj = object(json!({"content": "hello", "url": "https://blog.example/1"}));
    let renderer = ContentRenderer::new(&grammar);

    let with_link = renderer.render(&obj, &Operation::Reply, IncludeLink::Include, false);
    assert_eq!(
        with_link.text(),
        "hello\n\n(Originally published at: https://blog.example/1)"
    );

    let if_truncated = renderer.render(&obj, &Operation::Reply, IncludeLink::IfTruncated, false);
    assert_eq!(if_truncated.text(), "hello");
}

#[test]
fn test_new_issue_title_prefers_name() {
    let grammar = PlatformGrammar::github().unwrap();
    let obj = object(json!({
        "objectType": "issue",
        "displayName": "Crash on start",
        "content": "It crashes.",
    }));

    let rendered = ContentRenderer::new(&grammar).render(&obj, &Operation::NewPost, IncludeLink::Omit, false);

    assert_eq!(rendered.title().as_deref(), Some("Crash on start"));
    assert_eq!(rendered.text(), "It crashes.");
}

// ============================================================================
// Mastodon
// ============================================================================

fn mastodon() -> PlatformGrammar {
    PlatformGrammar::mastodon("https://mastodon.social").unwrap()
}

#[test]
fn test_mastodon_text_fits_limit_with_citation() {
    let grammar = mastodon();
    let body = vec!["lorem"; 150].join(" ");
    let obj = object(json!({"objectType": "note", "content": body, "url": "https://blog.example/a/really/long/permalink/that/counts/as/twenty/three"}));

    let rendered =
        ContentRenderer::new(&grammar).render(&obj, &Operation::NewPost, IncludeLink::IfTruncated, false);

    assert!(*rendered.truncated());
    assert!(weighted_len(rendered.text(), Some(MASTODON_LINK_WIDTH)) <= MASTODON_MAX_LENGTH);
    assert!(rendered.text().contains(&format!("lorem{ELLIPSIS} (https://blog.example/")));
    assert!(rendered.text().ends_with("twenty/three)"));
}

#[test]
fn test_shortening_is_idempotent() {
    let text = vec!["word"; 200].join(" ");
    for include_link in [IncludeLink::Omit, IncludeLink::IfTruncated] {
        let once = shorten(
            &text,
            Some(MASTODON_MAX_LENGTH),
            Some(MASTODON_LINK_WIDTH),
            Some(" (https://blog.example/post)"),
            include_link,
        );
        let twice = shorten(
            &once.text,
            Some(MASTODON_MAX_LENGTH),
            Some(MASTODON_LINK_WIDTH),
            Some(" (https://blog.example/post)"),
            include_link,
        );
        assert_eq!(twice.text, once.text, "{include_link:?}");
        assert!(!twice.truncated);
    }
}

#[test]
fn test_mastodon_preview_is_linkified_and_escaped() {
    let grammar = mastodon();
    let obj = object(json!({"content": "1 < 2, cc @bob@other.example"}));

    let rendered = ContentRenderer::new(&grammar).render(&obj, &Operation::NewPost, IncludeLink::Omit, false);

    assert_eq!(rendered.text(), "1 < 2, cc @bob@other.example");
    assert_eq!(
        rendered.preview_html().as_deref(),
        Some("1 &lt; 2, cc <a href=\"https://other.example/@bob\">@bob</a>")
    );
}

#[test]
fn test_empty_content_renders_empty() {
    let grammar = mastodon();
    let obj = object(json!({"objectType": "note", "content": "<p>  </p>"}));

    let rendered = ContentRenderer::new(&grammar).render(&obj, &Operation::NewPost, IncludeLink::Omit, false);

    assert!(rendered.is_empty());
}
