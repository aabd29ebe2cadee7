//! Command-line argument definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use syndic_core::{IncludeLink, LogFormat, PublishMode};

/// Publish canonical social objects to other platforms.
#[derive(Debug, Parser)]
#[command(name = "syndic", version, about, long_about = None)]
pub struct Cli {
    /// Log output format (pretty or json)
    #[arg(long, global = true, env = "SYNDIC_LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,

    /// Command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Preview or publish one object and print the result as JSON
    Publish(PublishArgs),

    /// Print a platform's effective grammar as JSON
    Grammar {
        /// Configuration file
        #[arg(short, long, env = "SYNDIC_CONFIG", default_value = "syndic.toml")]
        config: PathBuf,

        /// Platform section name
        #[arg(short, long)]
        platform: String,
    },
}

/// Arguments of the publish command.
#[derive(Debug, Clone, Args)]
pub struct PublishArgs {
    /// Configuration file
    #[arg(short, long, env = "SYNDIC_CONFIG", default_value = "syndic.toml")]
    pub config: PathBuf,

    /// Platform section name
    #[arg(short, long)]
    pub platform: String,

    /// Describe what would happen without changing anything
    #[arg(long)]
    pub preview: bool,

    /// Append a link to the object's own URL (omit, include, if-truncated)
    #[arg(long, default_value = "omit")]
    pub include_link: IncludeLink,

    /// Publish plain text, dropping links and formatting
    #[arg(long)]
    pub ignore_formatting: bool,

    /// JSON file holding the object, or `-` for stdin
    #[arg(default_value = "-")]
    pub object: String,
}

impl PublishArgs {
    /// Preview or create.
    pub fn mode(&self) -> PublishMode {
        if self.preview {
            PublishMode::Preview
        } else {
            PublishMode::Create
        }
    }
}
