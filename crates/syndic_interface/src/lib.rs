//! Trait definitions for the syndic publish pipeline.
//!
//! Adapters never talk HTTP directly. They consume a [`Transport`], which the
//! binary backs with a real client and tests back with a recording mock.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod headers;
mod response;
mod transport;

pub use headers::Headers;
pub use response::{RemoteResponse, RemoteResponseBuilder};
pub use transport::{Method, Transport, ensure_success};
