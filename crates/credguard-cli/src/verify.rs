//! # Verify Subcommand
//!
//! Reads a credential JSON file, runs the verification engine over it, and
//! prints the result. Exit code 0 when valid, 1 otherwise.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use credguard_core::Credential;
use credguard_verify::VerificationEngine;

/// Arguments for `credguard verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Credential JSON file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Execute the verify subcommand.
pub async fn run_verify(args: &VerifyArgs, engine: &VerificationEngine) -> Result<u8> {
    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let credential: Credential = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a credential", args.file.display()))?;
    credential.validate()?;

    let result = engine.verify(&credential).await;
    crate::print_json(&result)?;
    Ok(if result.valid { 0 } else { 1 })
}
