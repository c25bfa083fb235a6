//! secretstash CLI
//!
//! Encrypted backups of SSM parameters and Secrets Manager secrets, and
//! placeholder-gated restores.

mod aws;
mod cli;
mod commands;
mod output;
mod version;

use std::process::ExitCode;

use anyhow::{anyhow, Result};
use clap::Parser;
use secretstash_core::StashConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};
use commands::Context;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    // Dropping the command future on Ctrl-C abandons any call in flight
    let result = tokio::select! {
        result = run(cli) => result,
        _ = tokio::signal::ctrl_c() => Err(anyhow!("Interrupted")),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Version(args) = cli.command {
        return commands::version::run(args);
    }

    let config = StashConfig::load(cli.config.as_deref())?;
    let context = Context::new(config, cli.region, cli.endpoint);

    match cli.command {
        Commands::GenerateDataKey(args) => commands::generate::run(args, &context).await,
        Commands::BackupParameters(args) => commands::backup::run_parameters(args, &context).await,
        Commands::BackupSecrets(args) => commands::backup::run_secrets(args, &context).await,
        Commands::DownloadBackup(args) => commands::download::run(args, &context).await,
        Commands::RestoreParameters(args) => commands::restore::run_parameters(args, &context).await,
        Commands::RestoreSecrets(args) => commands::restore::run_secrets(args, &context).await,
        Commands::Version(args) => commands::version::run(args),
    }
}

/// Logs go to stderr so `download-backup` can write the document to stdout
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
