//! Tests for the publish entry point over the platform enum.

use serde_json::json;
use std::sync::Arc;
use syndic_core::{CanonicalObject, IncludeLink, PublishMode};
use syndic_error::TransportErrorKind;
use syndic_interface::Method;
use syndic_publish::testing::MockTransport;
use syndic_publish::{GitHub, Mastodon, Platform, Publisher};

fn object(value: serde_json::Value) -> CanonicalObject {
    serde_json::from_value(value).unwrap()
}

#[tokio::test]
async fn test_transport_failure_becomes_failed_result() {
    let mock = Arc::new(MockTransport::new().fail(
        Method::Post,
        "https://api.github.com/graphql",
        TransportErrorKind::Timeout("30s".to_string()),
    ));
    let publisher = Publisher::new(Platform::from(GitHub::new(mock.clone(), "tok").unwrap()));
    let comment = object(json!({
        "objectType": "comment",
        "content": "hi",
        "inReplyTo": "https://github.com/foo/bar/issues/1",
    }));

    let result = publisher
        .publish(&comment, PublishMode::Create, IncludeLink::Omit, false)
        .await;

    assert_eq!(result.outcome(), "failed");
    assert_eq!(result.error_plain(), "Request timed out: 30s");
    assert_eq!(mock.calls().len(), 1);
    assert!(mock.mutating_calls().is_empty());
}

#[tokio::test]
async fn test_unmatched_call_is_not_benign() {
    let mock = Arc::new(MockTransport::new());
    let publisher = Publisher::new(Platform::from(
        Mastodon::new("https://mastodon.social", mock.clone(), "tok").unwrap(),
    ));
    let like = object(json!({"verb": "like", "object": "https://other.example/@bob/1"}));

    let result = publisher
        .publish(&like, PublishMode::Create, IncludeLink::Omit, false)
        .await;

    assert_eq!(result.outcome(), "failed");
    assert!(result.error_plain().starts_with("HTTP 501"), "{}", result.error_plain());
}

#[tokio::test]
async fn test_results_serialize_with_status() {
    let mock = Arc::new(MockTransport::new());
    let publisher = Publisher::new(Platform::from(
        Mastodon::new("https://mastodon.social", mock, "tok").unwrap(),
    ));
    let note = object(json!({"objectType": "note", "content": "hello"}));

    let preview = publisher
        .publish(&note, PublishMode::Preview, IncludeLink::Omit, false)
        .await;
    let value = serde_json::to_value(&preview).unwrap();
    assert_eq!(value["status"], "succeeded");
    assert_eq!(value["description"], "<span class=\"verb\">toot</span>:");

    let share = object(json!({"verb": "share"}));
    let aborted = publisher
        .publish(&share, PublishMode::Preview, IncludeLink::Omit, false)
        .await;
    let value = serde_json::to_value(&aborted).unwrap();
    assert_eq!(value["status"], "aborted");
    assert_eq!(value["error_plain"], "Could not find a Mastodon toot to boost.");
}
