//! Command-line interface module.
//!
//! This module provides the CLI structure and command handlers for the syndic binary.

mod commands;
mod grammar;
mod publish;

pub use commands::{Cli, Commands, PublishArgs};
pub use grammar::handle_grammar_command;
pub use publish::{exit_code, handle_publish_command, publish_with, read_object};
