//! Publish options.

use serde::{Deserialize, Serialize};

/// Whether a publish call mutates the remote platform.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PublishMode {
    /// Dry run: describe what would happen, never mutate.
    #[default]
    Preview,
    /// Perform the real mutating calls.
    Create,
}

/// Whether to append a citation link to the object's own URL.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use syndic_core::IncludeLink;
///
/// assert_eq!(IncludeLink::from_str("if-truncated").unwrap(), IncludeLink::IfTruncated);
/// assert_eq!(IncludeLink::Include.to_string(), "include");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum IncludeLink {
    /// Never append the link.
    #[default]
    Omit,
    /// Always append the link, if it fits.
    Include,
    /// Append the link only when the text had to be truncated.
    IfTruncated,
}
