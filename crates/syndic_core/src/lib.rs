//! Core data types for the syndic publish pipeline.
//!
//! This crate provides the canonical content model consumed by every adapter,
//! the uniform [`CreationResult`] every publish call returns, and tracing and
//! metrics initialization shared by binaries.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod html;
mod mode;
mod object;
mod observability;
mod result;

pub use html::{ellipsize, escape_attr, escape_text, strip_tags};
pub use mode::{IncludeLink, PublishMode};
pub use object::{
    Attachment, AttachmentBuilder, CanonicalObject, CanonicalObjectBuilder, MediaType, ObjectType,
    Reference, Tag, Verb,
};
pub use observability::{LogFormat, init_metrics, init_tracing, record_publish, shutdown_metrics};
pub use result::{Created, CreatedBuilder, CreatedContent, CreatedType, CreationResult};
