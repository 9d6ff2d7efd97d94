//! # credguard CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use credguard_cli::issue::{run_issue, run_preview, DocumentArgs};
use credguard_cli::verify::{run_verify, VerifyArgs};
use credguard_client::ClientConfig;

/// CredGuard operator CLI.
///
/// Verifies credentials and issues new ones from document scans, using the
/// collaborators configured in the environment.
#[derive(Parser, Debug)]
#[command(name = "credguard", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify a credential JSON file.
    Verify(VerifyArgs),

    /// Parse a document scan and print the credential it would produce.
    Preview(DocumentArgs),

    /// Issue a credential from a document scan.
    Issue(DocumentArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    // stdout carries the JSON output.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("failed to start runtime: {e}");
            return ExitCode::from(1);
        }
    };

    match runtime.block_on(run(cli.command)) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(command: Commands) -> Result<u8> {
    let clients = ClientConfig::from_env().context("invalid collaborator configuration")?;
    match command {
        Commands::Verify(args) => {
            let engine = credguard_cli::build_verifier(&clients.key_set)?;
            run_verify(&args, &engine).await
        }
        Commands::Preview(args) => {
            let orchestrator = credguard_cli::build_orchestrator(&clients)?;
            run_preview(&args, &orchestrator).await
        }
        Commands::Issue(args) => {
            let orchestrator = credguard_cli::build_orchestrator(&clients)?;
            run_issue(&args, &orchestrator).await
        }
    }
}
