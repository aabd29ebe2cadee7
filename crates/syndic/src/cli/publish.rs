//! Publish command handler.

use super::PublishArgs;
use anyhow::Context;
use std::io::Read;
use syndic_core::{CanonicalObject, CreationResult};
use syndic_publish::{Adapter, Publisher, SyndicConfig};

/// Process exit code for a result: 0 succeeded, 1 failed, 2 aborted.
pub fn exit_code(result: &CreationResult) -> u8 {
    match result {
        CreationResult::Succeeded { .. } => 0,
        CreationResult::Failed { .. } => 1,
        CreationResult::Aborted { .. } => 2,
    }
}

/// Reads a canonical object from a JSON file, or from stdin for `-`.
///
/// # Errors
///
/// Returns error if the source cannot be read or is not a valid object.
pub fn read_object(source: &str) -> anyhow::Result<CanonicalObject> {
    let json = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read object from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Failed to read object from {source}"))?
    };
    serde_json::from_str(&json).with_context(|| format!("Failed to parse object from {source}"))
}

/// Publishes one object with an already built publisher.
pub async fn publish_with<A: Adapter>(
    publisher: &Publisher<A>,
    object: &CanonicalObject,
    args: &PublishArgs,
) -> CreationResult {
    publisher
        .publish(object, args.mode(), args.include_link, args.ignore_formatting)
        .await
}

/// Handles the publish command.
///
/// Configuration, token and input problems are errors; everything that
/// happens once the object reaches the pipeline is in the returned result.
///
/// # Errors
///
/// Returns error if the configuration, the token or the object cannot be
/// loaded.
#[tracing::instrument(skip_all, fields(platform = %args.platform, mode = %args.mode()))]
pub async fn handle_publish_command(args: &PublishArgs) -> anyhow::Result<CreationResult> {
    let config = SyndicConfig::from_file(&args.config)?;
    let publisher = config.platform(&args.platform)?.publisher()?;
    let object = read_object(&args.object)?;

    tracing::info!(object = %args.object, "Publishing object");
    Ok(publish_with(&publisher, &object, args).await)
}
