//! synthgen command-line launcher
//!
//! Resolves configuration, starts logging, opens the metadata store (failing fast if
//! it does not answer), and runs a single command.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use synthgen::{SynthError, SynthService, SynthgenConfig};
use synthgen_logging::{init_logging, LogConfig};
use tracing::error;

mod cli;

#[derive(Parser, Debug)]
#[command(name = "synthgen", about = "Generate synthetic files and keep their metadata in sync")]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// TOML configuration file
    #[arg(short, long, global = true, env = "SYNTHGEN_CONFIG")]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: cli::Commands,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();

    let config = match SynthgenConfig::resolve(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(LogConfig {
        app_name: "synthgen",
        verbose: args.verbose,
        dir: config.logging.dir.clone(),
        rotation: config.logging.rotation(),
    }) {
        eprintln!("warning: logging disabled: {e:#}");
    }

    let service = match open_service(&config).await {
        Ok(service) => service,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Startup failed");
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = cli::run(args.command, &service, args.json).await;
    service.db().clone().close().await;

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Command failed");
            eprintln!("error: {e:#}");
            ExitCode::from(exit_status(&e))
        }
    }
}

async fn open_service(config: &SynthgenConfig) -> anyhow::Result<SynthService> {
    SynthService::from_config(config)
        .await
        .with_context(|| format!("Failed to open store at {}", config.database.path.display()))
}

/// 2 when the caller asked for something invalid, 1 for every other failure.
fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<SynthError>() {
        Some(e) if e.is_client_error() => 2,
        _ => 1,
    }
}
