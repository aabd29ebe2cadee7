//! Grammar command handler.

use std::path::Path;
use syndic_publish::SyndicConfig;

/// Renders a platform's effective grammar as pretty JSON.
///
/// # Errors
///
/// Returns error if the configuration cannot be loaded or has no such
/// platform.
#[tracing::instrument(skip(config), fields(config = %config.display()))]
pub fn handle_grammar_command(config: &Path, platform: &str) -> anyhow::Result<String> {
    let config = SyndicConfig::from_file(config)?;
    let grammar = config.platform(platform)?.effective_grammar()?;
    tracing::debug!(name = %grammar.name(), "Resolved grammar");
    Ok(serde_json::to_string_pretty(&grammar)?)
}
