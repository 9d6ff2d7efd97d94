//! # Preview & Issue Subcommands
//!
//! Both read a document scan from disk. `preview` stops after building the
//! credential; `issue` runs the whole pipeline against the agent and exits
//! 1 when the agent did not deliver.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Args;

use credguard_core::DocumentType;
use credguard_issuance::{IssuanceOrchestrator, IssuanceRequest};

/// Arguments shared by `credguard preview` and `credguard issue`.
#[derive(Args, Debug)]
pub struct DocumentArgs {
    /// Document scan (PDF or image).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// PASSPORT, DRIVERS_LICENSE, DEGREE_CERTIFICATE, BIRTH_CERTIFICATE, or OTHER.
    #[arg(long, value_parser = parse_document_type)]
    pub document_type: DocumentType,

    /// Holder wallet DID.
    #[arg(long)]
    pub wallet_did: String,
}

fn parse_document_type(raw: &str) -> Result<DocumentType, String> {
    DocumentType::from_str(raw).map_err(|e| e.to_string())
}

impl DocumentArgs {
    fn read(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.file).with_context(|| format!("failed to read {}", self.file.display()))
    }
}

/// Execute the preview subcommand.
pub async fn run_preview(args: &DocumentArgs, orchestrator: &IssuanceOrchestrator) -> Result<u8> {
    let bytes = args.read()?;
    let credential = orchestrator
        .preview(
            bytes,
            &crate::file_name_of(&args.file),
            args.document_type,
            &args.wallet_did,
        )
        .await
        .context("preview failed")?;
    crate::print_json(&credential)?;
    Ok(0)
}

/// Execute the issue subcommand.
pub async fn run_issue(args: &DocumentArgs, orchestrator: &IssuanceOrchestrator) -> Result<u8> {
    let request = IssuanceRequest {
        file_bytes: args.read()?,
        file_name: crate::file_name_of(&args.file),
        document_type: args.document_type,
        wallet_did: args.wallet_did.clone(),
    };
    let result = orchestrator
        .issue(request)
        .await
        .context("issuance aborted")?;
    crate::print_json(&result)?;
    Ok(if result.success() { 0 } else { 1 })
}
