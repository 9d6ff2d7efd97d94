//! # credguard-issuance — Document-to-Wallet Issuance
//!
//! The credential lifecycle pipeline:
//!
//! 1. [`DocumentExtractor`] reads an upload through the vision collaborator.
//! 2. [`IssuanceOrchestrator`] builds the credential and drives the agent
//!    handshake, returning a [`CredentialIssuanceResult`](credguard_vc::CredentialIssuanceResult).
//! 3. [`JobRegistry`] runs issuance in the background for callers that
//!    poll.
//!
//! Collaborators are injected as trait objects, so the pipeline never
//! branches on mock versus live mode.

pub mod config;
pub mod extractor;
pub mod jobs;
pub mod orchestrator;

pub use config::issuer_from_env;
pub use extractor::DocumentExtractor;
pub use jobs::{JobRegistry, JobStatus, DEFAULT_JOB_RETENTION};
pub use orchestrator::{
    is_active_status, IssuanceOrchestrator, IssuanceRequest, ISSUED_MESSAGE, PREVIEW_MESSAGE,
    STATUS_ERROR,
};
