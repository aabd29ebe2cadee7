//! Tests for the Transport trait contract.

use async_trait::async_trait;
use std::sync::Mutex;
use syndic_error::{TransportError, TransportErrorKind};
use syndic_interface::{Headers, Method, RemoteResponse, Transport, ensure_success};

/// Answers every call with one fixed response and remembers what it saw.
struct FixedTransport {
    status: u16,
    seen: Mutex<Vec<(Method, String)>>,
}

#[async_trait]
impl Transport for FixedTransport {
    async fn get(&self, url: &str, _headers: &Headers) -> Result<RemoteResponse, TransportError> {
        self.seen.lock().unwrap().push((Method::Get, url.to_string()));
        ensure_success(RemoteResponse::new(self.status, "{\"ok\": true}"))
    }

    async fn post(
        &self,
        url: &str,
        _headers: &Headers,
        _body: &serde_json::Value,
    ) -> Result<RemoteResponse, TransportError> {
        self.seen.lock().unwrap().push((Method::Post, url.to_string()));
        ensure_success(RemoteResponse::new(self.status, ""))
    }
}

#[tokio::test]
async fn test_transport_is_object_safe_and_shareable() {
    let transport: std::sync::Arc<dyn Transport> = std::sync::Arc::new(FixedTransport {
        status: 200,
        seen: Mutex::new(Vec::new()),
    });

    let response = transport
        .get("https://api.example/x", &Headers::new())
        .await
        .unwrap();
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_non_success_status_is_an_error() {
    let transport = FixedTransport {
        status: 451,
        seen: Mutex::new(Vec::new()),
    };

    let err = transport
        .post("https://api.example/y", &Headers::new(), &serde_json::json!({}))
        .await
        .unwrap_err();
    assert!(matches!(
        err.kind(),
        TransportErrorKind::Status { status: 451, .. }
    ));
    assert!(err.kind().is_benign_absence());
    assert_eq!(
        transport.seen.lock().unwrap().as_slice(),
        &[(Method::Post, "https://api.example/y".to_string())]
    );
}

#[test]
fn test_method_names() {
    assert_eq!(Method::Get.to_string(), "GET");
    assert_eq!("POST".parse::<Method>().unwrap(), Method::Post);
}
