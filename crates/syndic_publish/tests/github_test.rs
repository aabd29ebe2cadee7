//! End-to-end tests for the GitHub adapter over a recording mock transport.

use serde_json::json;
use std::sync::Arc;
use syndic_core::{CanonicalObject, CreatedType, IncludeLink, PublishMode};
use syndic_publish::testing::MockTransport;
use syndic_publish::{GitHub, LookupPolicy, OperationKind, Publisher};

const GRAPHQL: &str = "https://api.github.com/graphql";

fn publisher(mock: MockTransport) -> (Arc<MockTransport>, Publisher<GitHub>) {
    let mock = Arc::new(mock);
    let github = GitHub::new(mock.clone(), "tok").unwrap();
    (mock, Publisher::new(github))
}

fn object(value: serde_json::Value) -> CanonicalObject {
    serde_json::from_value(value).unwrap()
}

async fn publish(publisher: &Publisher<GitHub>, obj: &CanonicalObject, mode: PublishMode) -> syndic_core::CreationResult {
    publisher.publish(obj, mode, IncludeLink::Omit, false).await
}

// ============================================================================
// Stars
// ============================================================================

fn star_mock() -> MockTransport {
    MockTransport::new()
        .respond_post_when(
            GRAPHQL,
            "addStar",
            200,
            r#"{"data":{"addStar":{"starrable":{"id":"R_1"}}}}"#,
        )
        .respond_post_when(GRAPHQL, "repository", 200, r#"{"data":{"repository":{"id":"R_1"}}}"#)
}

fn like() -> CanonicalObject {
    object(json!({
        "objectType": "activity",
        "verb": "like",
        "object": "https://github.com/foo/bar",
    }))
}

#[tokio::test]
async fn test_like_preview_describes_star() {
    let (mock, publisher) = publisher(star_mock());

    let result = publish(&publisher, &like(), PublishMode::Preview).await;

    assert!(result.is_success(), "{result:?}");
    assert_eq!(
        result.description(),
        Some("<span class=\"verb\">star</span> <a href=\"https://github.com/foo/bar\">foo/bar</a>.")
    );
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn test_like_create_stars_repo() {
    let (mock, publisher) = publisher(star_mock());

    let result = publish(&publisher, &like(), PublishMode::Create).await;

    let created = result.created_object().unwrap();
    assert_eq!(created.url(), "https://github.com/foo/bar/stargazers");
    assert_eq!(created.created_type(), &CreatedType::Like);

    let calls = mock.calls();
    assert_eq!(calls.len(), 2);
    assert!(!calls[0].is_mutating());
    assert_eq!(calls[0].body.as_ref().unwrap()["variables"], json!({"owner": "foo", "repo": "bar"}));
    assert!(calls[1].graphql_query().unwrap().contains("addStar"));
    assert_eq!(calls[1].body.as_ref().unwrap()["variables"]["starrableId"], "R_1");
    assert_eq!(calls[1].headers.get("Authorization"), Some("bearer tok"));
}

#[tokio::test]
async fn test_like_of_issue_aborts() {
    let (mock, publisher) = publisher(star_mock());
    let obj = object(json!({
        "objectType": "activity",
        "verb": "like",
        "object": "https://github.com/foo/bar/issues/1",
    }));

    let result = publish(&publisher, &obj, PublishMode::Create).await;

    assert!(result.abort());
    assert_eq!(result.error_plain(), "GitHub like requires in-reply-to repo URL.");
    assert!(mock.calls().is_empty());
}

// ============================================================================
// Comments
// ============================================================================

fn comment_mock() -> MockTransport {
    MockTransport::new()
        .respond_post_when(
            GRAPHQL,
            "addComment",
            200,
            r#"{"data":{"addComment":{"commentEdge":{"node":{"id":"IC_9","url":"https://github.com/foo/bar/issues/1#issuecomment-9"}}}}}"#,
        )
        .respond_post_when(
            GRAPHQL,
            "issueOrPullRequest",
            200,
            r#"{"data":{"repository":{"issueOrPullRequest":{"id":"I_1","title":"Broken <b>build</b>"}}}}"#,
        )
        .respond_post("https://api.github.com/markdown", 200, "<p>i have <em>thoughts</em></p>")
}

fn comment(in_reply_to: &str) -> CanonicalObject {
    object(json!({
        "objectType": "comment",
        "content": "i have _thoughts_",
        "inReplyTo": in_reply_to,
    }))
}

#[tokio::test]
async fn test_comment_preview_is_read_only() {
    let (mock, publisher) = publisher(comment_mock());

    let result = publish(
        &publisher,
        &comment("https://github.com/foo/bar/issues/1"),
        PublishMode::Preview,
    )
    .await;

    assert_eq!(
        result.description(),
        Some(
            "<span class=\"verb\">comment</span> on \
             <a href=\"https://github.com/foo/bar/issues/1\">foo/bar#1, <em>Broken build</em></a>:"
        )
    );
    assert_eq!(result.preview_html(), Some("<p>i have <em>thoughts</em></p>"));
    assert!(mock.mutating_calls().is_empty());

    let markdown = mock
        .calls()
        .into_iter()
        .find(|c| c.url.ends_with("/markdown"))
        .unwrap();
    assert_eq!(
        markdown.body.unwrap(),
        json!({"text": "i have _thoughts_", "mode": "gfm", "context": "foo/bar"})
    );
}

#[tokio::test]
async fn test_comment_preview_is_repeatable() {
    let (mock, publisher) = publisher(comment_mock());
    let obj = comment("https://github.com/foo/bar/issues/1");

    let first = publish(&publisher, &obj, PublishMode::Preview).await;
    let second = publish(&publisher, &obj, PublishMode::Preview).await;

    assert!(first.is_success(), "{first:?}");
    assert_eq!(first.description(), second.description());
    assert_eq!(first.preview_html(), second.preview_html());
    assert!(mock.mutating_calls().is_empty());
}

#[tokio::test]
async fn test_comment_create_looks_up_then_mutates() {
    let (mock, publisher) = publisher(comment_mock());

    let result = publish(
        &publisher,
        &comment("https://github.com/foo/bar/issues/1"),
        PublishMode::Create,
    )
    .await;

    let created = result.created_object().unwrap();
    assert_eq!(created.id().as_deref(), Some("IC_9"));
    assert_eq!(created.url(), "https://github.com/foo/bar/issues/1#issuecomment-9");
    assert_eq!(created.created_type(), &CreatedType::Comment);

    let calls = mock.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].graphql_query().unwrap().contains("issueOrPullRequest"));
    assert_eq!(calls[0].body.as_ref().unwrap()["variables"]["number"], 1);
    assert_eq!(
        calls[1].body.as_ref().unwrap()["variables"],
        json!({"subjectId": "I_1", "body": "i have _thoughts_"})
    );
}

#[tokio::test]
async fn test_comment_with_bad_fragment_aborts_without_calls() {
    let (mock, publisher) = publisher(comment_mock());

    for mode in [PublishMode::Preview, PublishMode::Create] {
        let result = publish(
            &publisher,
            &comment("https://github.com/foo/bar/issues/1#bad-1"),
            mode,
        )
        .await;
        assert!(result.abort());
        assert_eq!(
            result.error_plain(),
            "Please remove the fragment #bad-1 from your in-reply-to URL."
        );
    }
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn test_comment_on_missing_issue_fails_without_mutation() {
    let mock = MockTransport::new().respond_post(
        GRAPHQL,
        200,
        r#"{"data":{"repository":null},"errors":[{"type":"NOT_FOUND","message":"Could not resolve to an issue or pull request with the number of 1."}]}"#,
    );
    let (mock, publisher) = publisher(mock);

    let result = publish(
        &publisher,
        &comment("https://github.com/foo/bar/issues/1"),
        PublishMode::Create,
    )
    .await;

    assert!(!result.abort());
    assert_eq!(result.outcome(), "failed");
    assert!(result.error_plain().contains("Could not resolve"), "{}", result.error_plain());
    assert!(mock.mutating_calls().is_empty());
}

#[tokio::test]
async fn test_comment_without_target_aborts_in_both_modes() {
    let (mock, publisher) = publisher(comment_mock());
    let obj = object(json!({"objectType": "comment", "content": "hi"}));

    for mode in [PublishMode::Preview, PublishMode::Create] {
        let result = publish(&publisher, &obj, mode).await;
        assert!(result.abort());
        assert_eq!(
            result.error_plain(),
            "You need an in-reply-to GitHub repo, issue, PR, or comment URL."
        );
    }
    assert!(mock.calls().is_empty());
}

// ============================================================================
// Reactions
// ============================================================================

#[tokio::test]
async fn test_reaction_on_issue_links_to_reaction() {
    let mock = MockTransport::new().respond_post(
        "https://api.github.com/repos/foo/bar/issues/1/reactions",
        201,
        r#"{"id":5,"content":"+1","user":{"login":"alice"}}"#,
    );
    let (mock, publisher) = publisher(mock);

    let result = publish(
        &publisher,
        &comment_with_content("https://github.com/foo/bar/issues/1", "👍"),
        PublishMode::Create,
    )
    .await;

    let created = result.created_object().unwrap();
    assert_eq!(created.url(), "https://github.com/foo/bar/issues/1#+1-by-alice");
    assert_eq!(created.created_type(), &CreatedType::React);

    let calls = mock.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].body, Some(json!({"content": "+1"})));
    assert_eq!(calls[0].headers.get("Authorization"), Some("token tok"));
}

#[tokio::test]
async fn test_reaction_on_comment_previews_comment_text() {
    let mock = MockTransport::new()
        .respond_get(
            "https://api.github.com/repos/foo/bar/issues/comments/456",
            200,
            r#"{"id":456,"body":"I <b>agree</b> with this"}"#,
        )
        .respond_post(
            "https://api.github.com/repos/foo/bar/issues/comments/456/reactions",
            201,
            r#"{"id":6,"content":"hooray","user":{"login":"alice"}}"#,
        );
    let (mock, publisher) = publisher(mock);
    let obj = comment_with_content("https://github.com/foo/bar/issues/1#issuecomment-456", "🎉");

    let preview = publish(&publisher, &obj, PublishMode::Preview).await;
    assert_eq!(
        preview.description(),
        Some(
            "<span class=\"verb\">react 🎉</span> to \
             <a href=\"https://github.com/foo/bar/issues/1#issuecomment-456\">a comment on foo/bar#1, \
             <em>I agree with this</em></a>."
        )
    );
    assert!(mock.mutating_calls().is_empty());

    let created = publish(&publisher, &obj, PublishMode::Create).await;
    assert_eq!(
        created.created_object().unwrap().url(),
        "https://github.com/foo/bar/issues/1#issuecomment-456"
    );
    assert_eq!(mock.mutating_calls().len(), 1);
}

#[tokio::test]
async fn test_reaction_outside_vocabulary_aborts_without_calls() {
    let (mock, publisher) = publisher(MockTransport::new());
    let unicorn = object(json!({
        "objectType": "activity",
        "verb": "react",
        "content": "🦄",
        "object": "https://github.com/foo/bar/issues/1",
    }));

    for mode in [PublishMode::Preview, PublishMode::Create] {
        let result = publish(&publisher, &unicorn, mode).await;
        assert!(result.abort(), "{mode:?}: {result:?}");
        assert_eq!(result.error_plain(), "GitHub does not support the 🦄 reaction.");
    }
    assert!(mock.calls().is_empty());
}

fn comment_with_content(in_reply_to: &str, content: &str) -> CanonicalObject {
    object(json!({
        "objectType": "comment",
        "content": content,
        "inReplyTo": in_reply_to,
    }))
}

// ============================================================================
// Labels
// ============================================================================

fn tag_post(tags: &[&str]) -> CanonicalObject {
    let names: Vec<_> = tags.iter().map(|t| json!({"displayName": t})).collect();
    object(json!({
        "objectType": "activity",
        "verb": "tag",
        "object": names,
        "target": "https://github.com/foo/bar/issues/1",
    }))
}

fn labels_mock(labels: &[&str]) -> MockTransport {
    let nodes: Vec<_> = labels.iter().map(|l| json!({"name": l})).collect();
    MockTransport::new()
        .respond_post_when(
            GRAPHQL,
            "labels(",
            200,
            json!({"data": {"repository": {"labels": {"nodes": nodes}}}}).to_string(),
        )
        .respond_post("https://api.github.com/repos/foo/bar/issues/1/labels", 200, "[]")
}

#[tokio::test]
async fn test_tag_without_matching_labels_aborts() {
    let (mock, publisher) = publisher(labels_mock(&["one", "two"]));

    for mode in [PublishMode::Preview, PublishMode::Create] {
        let result = publish(&publisher, &tag_post(&["three"]), mode).await;
        assert!(result.abort(), "{result:?}");
        assert_eq!(
            result.error_html(),
            "No tags in [three] matched <a href=\"https://github.com/foo/bar/issues/1\">foo/bar#1</a>'s \
             existing labels [one, two]."
        );
        assert_eq!(
            result.error_plain(),
            "No tags in [three] matched foo/bar#1's existing labels [one, two]."
        );
    }
    assert!(mock.mutating_calls().is_empty());
}

#[tokio::test]
async fn test_tag_adds_only_existing_labels() {
    let (mock, publisher) = publisher(labels_mock(&["one", "two"]));
    let obj = tag_post(&["one", "three", "two"]);

    let preview = publish(&publisher, &obj, PublishMode::Preview).await;
    assert_eq!(
        preview.description(),
        Some(
            "add labels <span class=\"verb\">one, two</span> to \
             <a href=\"https://github.com/foo/bar/issues/1\">foo/bar#1</a>."
        )
    );

    let result = publish(&publisher, &obj, PublishMode::Create).await;
    let created = result.created_object().unwrap();
    assert_eq!(created.created_type(), &CreatedType::Tag);
    assert_eq!(created.url(), "https://github.com/foo/bar/issues/1");

    let mutating = mock.mutating_calls();
    assert_eq!(mutating.len(), 1);
    assert_eq!(mutating[0].body, Some(json!(["one", "two"])));
}

#[tokio::test]
async fn test_empty_tag_post_aborts() {
    let (mock, publisher) = publisher(labels_mock(&["one"]));

    let result = publish(&publisher, &tag_post(&[]), PublishMode::Create).await;

    assert!(result.abort());
    assert_eq!(result.error_plain(), "No tags found in tag post!");
    assert!(mock.calls().is_empty());
}

// ============================================================================
// New issues
// ============================================================================

fn issue_post() -> CanonicalObject {
    object(json!({
        "objectType": "issue",
        "displayName": "Crash on start",
        "content": "It <b>crashes</b>.",
        "inReplyTo": "https://github.com/foo/bar",
        "tags": ["bug", "nope"],
    }))
}

#[tokio::test]
async fn test_new_issue_gets_matching_labels() {
    let mock = labels_mock(&["bug", "docs"]).respond_post(
        "https://api.github.com/repos/foo/bar/issues",
        201,
        r#"{"id":77,"html_url":"https://github.com/foo/bar/issues/5"}"#,
    );
    let (mock, publisher) = publisher(mock);

    let result = publish(&publisher, &issue_post(), PublishMode::Create).await;

    let created = result.created_object().unwrap();
    assert_eq!(created.url(), "https://github.com/foo/bar/issues/5");
    assert_eq!(created.created_type(), &CreatedType::Post);
    assert_eq!(created.id().as_deref(), Some("77"));

    let mutating = mock.mutating_calls();
    assert_eq!(mutating.len(), 1);
    assert_eq!(
        mutating[0].body,
        Some(json!({"title": "Crash on start", "body": "It **crashes**.", "labels": ["bug"]}))
    );
}

#[tokio::test]
async fn test_new_issue_preview_mentions_labels() {
    let mock = labels_mock(&["bug"]).respond_post(
        "https://api.github.com/markdown",
        200,
        "<p>It <strong>crashes</strong>.</p>",
    );
    let (mock, publisher) = publisher(mock);

    let result = publish(&publisher, &issue_post(), PublishMode::Preview).await;

    assert_eq!(
        result.description(),
        Some(
            "<span class=\"verb\">create a new issue</span> on \
             <a href=\"https://github.com/foo/bar\">foo/bar</a> and attempt to add \
             label <span class=\"verb\">bug</span>:"
        )
    );
    assert_eq!(
        result.preview_html(),
        Some("<b>Crash on start</b><hr><p>It <strong>crashes</strong>.</p>")
    );
    assert!(mock.mutating_calls().is_empty());
}

#[tokio::test]
async fn test_new_issue_preview_is_repeatable() {
    let mock = labels_mock(&["bug"]).respond_post(
        "https://api.github.com/markdown",
        200,
        "<p>It <strong>crashes</strong>.</p>",
    );
    let (mock, publisher) = publisher(mock);

    let first = publish(&publisher, &issue_post(), PublishMode::Preview).await;
    let second = publish(&publisher, &issue_post(), PublishMode::Preview).await;

    assert!(first.is_success(), "{first:?}");
    assert_eq!(first.description(), second.description());
    assert_eq!(first.preview_html(), second.preview_html());
    assert!(mock.mutating_calls().is_empty());
    assert!(!mock.calls().is_empty());
}

#[tokio::test]
async fn test_missing_labels_are_benign_for_new_issues() {
    let mock = MockTransport::new()
        .respond_post_when(GRAPHQL, "labels(", 404, r#"{"message":"Not Found"}"#)
        .respond_post(
            "https://api.github.com/repos/foo/bar/issues",
            201,
            r#"{"id":78,"html_url":"https://github.com/foo/bar/issues/6"}"#,
        );
    let (mock, publisher) = publisher(mock);

    let result = publish(&publisher, &issue_post(), PublishMode::Create).await;

    assert_eq!(
        result.created_object().unwrap().url(),
        "https://github.com/foo/bar/issues/6"
    );
    assert_eq!(mock.mutating_calls()[0].body.as_ref().unwrap()["labels"], json!([]));
}

#[tokio::test]
async fn test_strict_policy_makes_missing_labels_fail() {
    let mock = MockTransport::new()
        .respond_post_when(GRAPHQL, "labels(", 404, r#"{"message":"Not Found"}"#);
    let mock = Arc::new(mock);
    let github = GitHub::new(mock.clone(), "tok")
        .unwrap()
        .with_lookup_policy(OperationKind::NewPost, LookupPolicy::Strict);
    let publisher = Publisher::new(github);

    let result = publish(&publisher, &issue_post(), PublishMode::Create).await;

    assert_eq!(result.outcome(), "failed");
    assert!(result.error_plain().contains("404"), "{}", result.error_plain());
    assert!(mock.mutating_calls().is_empty());
}

#[tokio::test]
async fn test_new_issue_on_issue_url_aborts() {
    let (mock, publisher) = publisher(MockTransport::new());
    let obj = object(json!({
        "objectType": "issue",
        "displayName": "x",
        "content": "y",
        "target": "https://github.com/foo/bar/issues/3",
    }));

    let result = publish(&publisher, &obj, PublishMode::Preview).await;

    assert!(result.abort());
    assert_eq!(result.error_plain(), "New GitHub issue requires in-reply-to repo URL");
    assert!(mock.calls().is_empty());
}
