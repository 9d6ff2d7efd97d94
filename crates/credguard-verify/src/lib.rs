//! # credguard-verify — Credential Verification
//!
//! Checks a received [`Credential`](credguard_core::Credential) along three
//! independent dimensions and reports a [`VerificationResult`]:
//!
//! - **Issuer trust**: the issuer is flagged trusted.
//! - **Expiry**: no expiry, or expiry in the future.
//! - **Signature**: the embedded JWS (if any) verifies against the issuer's
//!   published key set; see [`signature`] for the degraded modes.
//!
//! Verification has no error path. Every failure, including network and
//! parse failures in the signature check, lands in `errors`.

pub mod engine;
pub mod signature;
pub mod validation;

pub use engine::{VerificationEngine, VerificationResult};
pub use signature::{SignatureCheck, SignatureVerifier};
pub use validation::{check_expiry, check_issuer_trust, ValidationKind, ValidationOutcome};
