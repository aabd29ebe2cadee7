//! The `syndic` command-line tool.

use clap::Parser;
use std::process::ExitCode;
use syndic::cli::{Cli, Commands, exit_code, handle_grammar_command, handle_publish_command};
use syndic::{init_metrics, init_tracing, shutdown_metrics};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Tokens usually live in .env during development
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.log_format);
    if let Err(e) = init_metrics("syndic", 60) {
        tracing::warn!(error = %e, "Metrics disabled");
    }

    let outcome = run(cli.command).await;
    shutdown_metrics();
    outcome
}

async fn run(command: Commands) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Publish(args) => {
            let result = handle_publish_command(&args).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(ExitCode::from(exit_code(&result)))
        }
        Commands::Grammar { config, platform } => {
            println!("{}", handle_grammar_command(&config, &platform)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}
