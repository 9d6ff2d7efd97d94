//! # credguard-vc — Verifiable Credentials
//!
//! The W3C-style credential CredGuard issues to wallets, and everything
//! needed to carry one through issuance:
//!
//! - [`VerifiableCredential`] with its [`IssuanceStatus`] state machine.
//! - [`VerifiableCredential::from_document`], the credential builder.
//! - [`CredentialIssuanceResult`], the typed outcome of one issuance attempt.
//!
//! ## Issuance Lifecycle
//!
//! ```text
//! Created ──▶ OfferSent ──▶ Accepted ──▶ Issued ──▶ Revoked
//!    │            │            │
//!    └────────────┴────────────┴──▶ Failed
//! ```

pub mod builder;
pub mod credential;
pub mod proof;
pub mod result;
pub mod status;

pub use builder::{DEFAULT_CONTEXT, PREVIEW_CONNECTION_ID};
pub use credential::{CredentialSubject, VerifiableCredential};
pub use proof::{Proof, ProofPurpose, ProofType};
pub use result::{elapsed_millis, CredentialIssuanceResult};
pub use status::IssuanceStatus;
