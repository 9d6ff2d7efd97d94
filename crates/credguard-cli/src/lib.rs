//! # credguard-cli — Operator CLI for CredGuard
//!
//! ## Subcommands
//!
//! - `credguard verify <credential.json>`: verify a credential file; exit
//!   code 1 when it is invalid.
//! - `credguard preview <file> --document-type <TYPE> --wallet-did <DID>`:
//!   parse a document scan and print the credential that would be issued.
//! - `credguard issue <file> --document-type <TYPE> --wallet-did <DID>`:
//!   run the full issuance pipeline and print the result.
//!
//! Collaborators are configured from the same environment variables as the
//! server, so a fresh checkout runs everything in mock mode.

pub mod issue;
pub mod verify;

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use credguard_client::{
    build_agent_client, build_key_set_fetcher, build_vision_client, ClientConfig, KeySetConfig,
};
use credguard_issuance::{issuer_from_env, DocumentExtractor, IssuanceOrchestrator};
use credguard_verify::{SignatureVerifier, VerificationEngine};

/// Verification engine fetching keys per `config`.
pub fn build_verifier(config: &KeySetConfig) -> Result<VerificationEngine> {
    let key_sets = build_key_set_fetcher(config).context("failed to build key-set fetcher")?;
    Ok(VerificationEngine::new(SignatureVerifier::new(key_sets)))
}

/// Issuance pipeline over the configured collaborators and the issuer
/// named by `CREDGUARD_ISSUER_DID` / `CREDGUARD_ISSUER_NAME`.
pub fn build_orchestrator(clients: &ClientConfig) -> Result<IssuanceOrchestrator> {
    let vision = build_vision_client(&clients.vision).context("failed to build vision client")?;
    let agent = build_agent_client(&clients.agent).context("failed to build agent client")?;
    let issuer = issuer_from_env().context("invalid issuer configuration")?;
    Ok(IssuanceOrchestrator::new(
        DocumentExtractor::new(vision),
        agent,
        issuer,
    ))
}

/// File name component of `path`, or empty when it has none.
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Pretty-print `value` as JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render JSON")?;
    println!("{rendered}");
    Ok(())
}
