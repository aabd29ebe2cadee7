//! Recording mock transport for tests.
//!
//! Responses are canned by method, URL prefix and an optional body substring;
//! the first matching registration wins. Every call is recorded and classified
//! as mutating or read-only, so tests can assert that previews never mutate.

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use syndic_error::{TransportError, TransportErrorKind};
use syndic_interface::{Headers, Method, RemoteResponse, Transport, ensure_success};

/// One call seen by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// HTTP method.
    pub method: Method,
    /// Full URL.
    pub url: String,
    /// Request headers.
    pub headers: Headers,
    /// JSON body of POST requests.
    pub body: Option<serde_json::Value>,
}

impl RecordedCall {
    /// Whether the call changes remote state.
    ///
    /// GETs, Markdown renders and GraphQL queries are read-only; GraphQL
    /// mutations and every other POST are mutating.
    pub fn is_mutating(&self) -> bool {
        match self.method {
            Method::Get => false,
            Method::Post if self.url.ends_with("/markdown") => false,
            Method::Post if self.url.ends_with("/graphql") => self
                .body
                .as_ref()
                .and_then(|b| b.get("query"))
                .and_then(serde_json::Value::as_str)
                .is_some_and(|q| q.trim_start().starts_with("mutation")),
            Method::Post => true,
        }
    }

    /// GraphQL query text, for GraphQL calls.
    pub fn graphql_query(&self) -> Option<&str> {
        self.body.as_ref()?.get("query")?.as_str()
    }
}

#[derive(Debug)]
struct Canned {
    method: Method,
    url_prefix: String,
    body_contains: Option<String>,
    response: Result<RemoteResponse, TransportErrorKind>,
}

impl Canned {
    fn matches(&self, method: Method, url: &str, body: Option<&str>) -> bool {
        self.method == method
            && url.starts_with(&self.url_prefix)
            && self
                .body_contains
                .as_deref()
                .is_none_or(|needle| body.is_some_and(|b| b.contains(needle)))
    }
}

/// [`Transport`] that answers from canned responses and records calls.
///
/// Unmatched calls fail with status 501 so a missing registration is never
/// mistaken for a benign 404.
#[derive(Debug, Default)]
pub struct MockTransport {
    canned: Mutex<Vec<Canned>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTransport {
    /// Mock with no canned responses.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, canned: Canned) -> Self {
        self.canned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(canned);
        self
    }

    /// Answers GETs whose URL starts with `url_prefix`.
    pub fn respond_get(self, url_prefix: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        self.push(Canned {
            method: Method::Get,
            url_prefix: url_prefix.into(),
            body_contains: None,
            response: Ok(RemoteResponse::new(status, body)),
        })
    }

    /// Answers POSTs whose URL starts with `url_prefix`.
    pub fn respond_post(self, url_prefix: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        self.push(Canned {
            method: Method::Post,
            url_prefix: url_prefix.into(),
            body_contains: None,
            response: Ok(RemoteResponse::new(status, body)),
        })
    }

    /// Answers POSTs whose URL starts with `url_prefix` and whose JSON body
    /// contains `needle`.
    pub fn respond_post_when(
        self,
        url_prefix: impl Into<String>,
        needle: impl Into<String>,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        self.push(Canned {
            method: Method::Post,
            url_prefix: url_prefix.into(),
            body_contains: Some(needle.into()),
            response: Ok(RemoteResponse::new(status, body)),
        })
    }

    /// Fails matching calls with a transport error.
    pub fn fail(self, method: Method, url_prefix: impl Into<String>, kind: TransportErrorKind) -> Self {
        self.push(Canned {
            method,
            url_prefix: url_prefix.into(),
            body_contains: None,
            response: Err(kind),
        })
    }

    /// Every call so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Calls that change remote state.
    pub fn mutating_calls(&self) -> Vec<RecordedCall> {
        self.calls().into_iter().filter(RecordedCall::is_mutating).collect()
    }

    fn answer(
        &self,
        method: Method,
        url: &str,
        headers: &Headers,
        body: Option<&serde_json::Value>,
    ) -> Result<RemoteResponse, TransportError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                method,
                url: url.to_string(),
                headers: headers.clone(),
                body: body.cloned(),
            });

        let body_text = body.map(serde_json::Value::to_string);
        let canned = self.canned.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(found) = canned
            .iter()
            .find(|c| c.matches(method, url, body_text.as_deref()))
        else {
            return Err(TransportError::new(TransportErrorKind::Status {
                status: 501,
                body: format!("no canned response for {method} {url}"),
            }));
        };

        match &found.response {
            Ok(response) => ensure_success(response.clone()),
            Err(kind) => Err(TransportError::new(kind.clone())),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str, headers: &Headers) -> Result<RemoteResponse, TransportError> {
        self.answer(Method::Get, url, headers, None)
    }

    async fn post(
        &self,
        url: &str,
        headers: &Headers,
        body: &serde_json::Value,
    ) -> Result<RemoteResponse, TransportError> {
        self.answer(Method::Post, url, headers, Some(body))
    }
}
