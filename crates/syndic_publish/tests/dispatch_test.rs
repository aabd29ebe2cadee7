//! Tests for choosing operations and validating them against capabilities.

use serde_json::json;
use syndic_core::CanonicalObject;
use syndic_publish::{
    CapabilityTable, Dispatcher, LookupPolicy, Operation, OperationKind, PlatformGrammar, TargetShape,
    github_capabilities, mastodon_capabilities,
};

fn object(value: serde_json::Value) -> CanonicalObject {
    serde_json::from_value(value).unwrap()
}

struct Fixture {
    grammar: PlatformGrammar,
    capabilities: CapabilityTable,
}

impl Fixture {
    fn github() -> Self {
        Self {
            grammar: PlatformGrammar::github().unwrap(),
            capabilities: github_capabilities(),
        }
    }

    fn mastodon() -> Self {
        Self {
            grammar: PlatformGrammar::mastodon("https://mastodon.social").unwrap(),
            capabilities: mastodon_capabilities(),
        }
    }

    fn operation(&self, obj: &CanonicalObject) -> Operation {
        match Dispatcher::new(&self.grammar, &self.capabilities).dispatch(obj) {
            Ok(plan) => plan.operation().clone(),
            Err(aborted) => panic!("unexpected abort: {}", aborted.error_plain()),
        }
    }

    fn abort(&self, obj: &CanonicalObject) -> String {
        match Dispatcher::new(&self.grammar, &self.capabilities).dispatch(obj) {
            Ok(plan) => panic!("expected abort, got {:?}", plan.operation()),
            Err(aborted) => {
                assert!(aborted.abort());
                aborted.error_plain().to_string()
            }
        }
    }
}

// ============================================================================
// Verb selection
// ============================================================================

#[test]
fn test_activity_verbs_map_to_operations() {
    let github = Fixture::github();
    let repo = "https://github.com/foo/bar";
    let issue = "https://github.com/foo/bar/issues/1";

    let like = object(json!({"objectType": "activity", "verb": "like", "object": repo}));
    assert_eq!(github.operation(&like), Operation::Like);

    let favorite = object(json!({"verb": "favorite", "object": repo}));
    assert_eq!(github.operation(&favorite), Operation::Like);

    let react = object(json!({"verb": "react", "content": "👍", "object": issue}));
    assert_eq!(
        github.operation(&react),
        Operation::React {
            emoji: "👍".to_string()
        }
    );

    let tag = object(json!({
        "verb": "tag",
        "object": [{"displayName": "bug"}, {"displayName": " docs "}, {"displayName": ""}],
        "target": issue,
    }));
    assert_eq!(
        github.operation(&tag),
        Operation::Tag {
            tags: ["bug".to_string(), "docs".to_string()].into()
        }
    );
}

#[test]
fn test_note_reply_depends_on_target_shape() {
    let github = Fixture::github();

    let on_issue = object(json!({
        "objectType": "note",
        "content": "hi",
        "inReplyTo": "https://github.com/foo/bar/issues/1",
    }));
    assert_eq!(github.operation(&on_issue), Operation::Reply);

    let on_repo = object(json!({
        "objectType": "note",
        "content": "hi",
        "inReplyTo": "https://github.com/foo/bar",
    }));
    assert_eq!(github.operation(&on_repo), Operation::NewPost);
}

#[test]
fn test_emoji_comment_becomes_reaction_only_when_supported() {
    let github = Fixture::github();
    let issue = "https://github.com/foo/bar/issues/1";

    let thumbs = object(json!({"objectType": "comment", "content": "<p> 👍 </p>", "inReplyTo": issue}));
    assert_eq!(
        github.operation(&thumbs),
        Operation::React {
            emoji: "👍".to_string()
        }
    );

    let unsupported = object(json!({"objectType": "comment", "content": "🦀", "inReplyTo": issue}));
    assert_eq!(github.operation(&unsupported), Operation::Reply);
}

#[test]
fn test_mastodon_follow_and_rsvp_verbs() {
    let mastodon = Fixture::mastodon();

    let follow = object(json!({"verb": "follow", "object": "https://other.example/@bob"}));
    assert_eq!(mastodon.operation(&follow), Operation::Follow);

    let rsvp = object(json!({"verb": "rsvp-yes", "content": "see you there"}));
    assert_eq!(mastodon.operation(&rsvp), Operation::NewPost);

    let invite = object(json!({"verb": "invite", "content": "come along"}));
    assert_eq!(mastodon.operation(&invite), Operation::NewPost);
}

#[test]
fn test_mastodon_note_without_target_is_new_post() {
    let mastodon = Fixture::mastodon();
    let note = object(json!({"objectType": "note", "content": "hello"}));
    let plan_dispatcher = Dispatcher::new(&mastodon.grammar, &mastodon.capabilities);

    let plan = plan_dispatcher.dispatch(&note).unwrap();
    assert_eq!(plan.operation(), &Operation::NewPost);
    assert!(plan.required_target().is_none());
}

// ============================================================================
// Aborts
// ============================================================================

#[test]
fn test_unsupported_combinations_abort_with_type_and_verb() {
    let github = Fixture::github();

    let share = object(json!({"objectType": "activity", "verb": "share", "object": "https://github.com/foo/bar"}));
    assert_eq!(
        github.abort(&share),
        "Cannot publish type=activity, verb=share to GitHub"
    );

    let follow = object(json!({"verb": "follow", "object": "https://github.com/foo"}));
    assert_eq!(github.abort(&follow), "Cannot publish type=None, verb=follow to GitHub");

    let person = object(json!({"objectType": "person"}));
    assert_eq!(github.abort(&person), "Cannot publish type=person, verb=None to GitHub");
}

#[test]
fn test_reaction_outside_vocabulary_aborts() {
    let github = Fixture::github();
    let unicorn = object(json!({
        "verb": "react",
        "content": "🦄",
        "object": "https://github.com/foo/bar/issues/1",
    }));

    assert_eq!(github.abort(&unicorn), "GitHub does not support the 🦄 reaction.");
}

#[test]
fn test_follow_messages_name_the_reference() {
    let mastodon = Fixture::mastodon();

    let elsewhere = object(json!({"verb": "follow", "object": "https://twitter.com/foo"}));
    assert_eq!(
        mastodon.abort(&elsewhere),
        "Could not find user https://twitter.com/foo to follow."
    );

    let toot = object(json!({"verb": "follow", "object": "https://mastodon.social/@alice/109"}));
    assert_eq!(
        mastodon.abort(&toot),
        "Mastodon follow requires a profile URL, not https://mastodon.social/@alice/109."
    );
}

#[test]
fn test_wrong_shapes_use_capability_messages() {
    let github = Fixture::github();

    let comment_on_repo = object(json!({
        "objectType": "comment",
        "content": "hi",
        "inReplyTo": "https://github.com/foo/bar",
    }));
    assert_eq!(
        github.abort(&comment_on_repo),
        "GitHub comment requires in-reply-to issue or PR URL."
    );

    let tag_on_repo = object(json!({
        "verb": "tag",
        "object": [{"displayName": "bug"}],
        "target": "https://github.com/foo/bar",
    }));
    assert_eq!(
        github.abort(&tag_on_repo),
        "GitHub tag post requires tag-of issue or PR URL."
    );
}

#[test]
fn test_mastodon_share_without_toot_has_html_message() {
    let mastodon = Fixture::mastodon();
    let share = object(json!({"verb": "share", "object": "https://example.com/post"}));

    let aborted = Dispatcher::new(&mastodon.grammar, &mastodon.capabilities)
        .dispatch(&share)
        .unwrap_err();

    assert_eq!(aborted.error_plain(), "Could not find a Mastodon toot to boost.");
    assert!(aborted.error_html().contains("<a href=\"http://indiewebcamp.com/repost\">repost-of</a>"));
}

// ============================================================================
// Plans
// ============================================================================

#[test]
fn test_plan_carries_target_and_policy() {
    let github = Fixture::github();
    let issue = object(json!({
        "objectType": "issue",
        "displayName": "x",
        "inReplyTo": "https://github.com/foo/bar",
    }));

    let plan = Dispatcher::new(&github.grammar, &github.capabilities)
        .dispatch(&issue)
        .unwrap();

    let target = plan.required_target().unwrap();
    assert_eq!(target.shape(), &TargetShape::Container);
    assert_eq!(plan.lookup_policy(), &LookupPolicy::BenignAbsence);
}

#[test]
fn test_lookup_policy_can_be_overridden() {
    let mut capabilities = github_capabilities();
    assert_eq!(capabilities.lookup_policy(OperationKind::Reply), LookupPolicy::Strict);

    capabilities.set_lookup_policy(OperationKind::Reply, LookupPolicy::BenignAbsence);
    assert_eq!(
        capabilities.lookup_policy(OperationKind::Reply),
        LookupPolicy::BenignAbsence
    );
    assert!(!capabilities.kinds().any(|k| k == OperationKind::Share));
}
