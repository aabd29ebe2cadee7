//! Publish canonical social objects to other platforms.
//!
//! This is the facade crate: it re-exports the pipeline crates so callers
//! depend on one crate, and ships the `syndic` command-line tool.
//!
//! ```no_run
//! use syndic::{IncludeLink, PublishMode, SyndicConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SyndicConfig::from_file("syndic.toml")?;
//! let publisher = config.platform("github")?.publisher()?;
//! let object = serde_json::from_str(r#"{"objectType":"activity","verb":"like","object":"https://github.com/foo/bar"}"#)?;
//! let result = publisher.publish(&object, PublishMode::Preview, IncludeLink::Omit, false).await;
//! println!("{}", serde_json::to_string_pretty(&result)?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cli;

// Error types
pub use syndic_error::*;

// Canonical objects, results and observability
pub use syndic_core::*;

// Transport seam
pub use syndic_interface::*;

// Resolution, rendering, dispatch and adapters
pub use syndic_publish::*;
