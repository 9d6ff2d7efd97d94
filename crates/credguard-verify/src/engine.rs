//! # Verification Engine
//!
//! Runs issuer trust, expiry, and signature checks over a received
//! credential and folds them into a [`VerificationResult`]. All three checks
//! always run, so a credential failing two dimensions reports two errors.
//! `verify` returns a result value, never an error.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use credguard_core::Credential;

use crate::signature::SignatureVerifier;
use crate::validation::{check_expiry, check_issuer_trust, ValidationKind, ValidationOutcome};

/// Verdict for one credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    /// `true` iff `errors` is empty.
    pub valid: bool,
    /// Issuer-trust dimension.
    pub issuer_trusted: bool,
    /// Signature dimension.
    pub signature_valid: bool,
    /// Expiry dimension.
    pub not_expired: bool,
    /// Failure messages, in check order.
    pub errors: Vec<String>,
    /// Caveats on passing checks.
    pub warnings: Vec<String>,
    /// One-line human-readable summary.
    pub explanation: String,
    /// The credential that was verified.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub credential: Option<Credential>,
}

impl VerificationResult {
    /// Fold individual outcomes into a verdict.
    pub fn from_outcomes(credential: &Credential, outcomes: &[ValidationOutcome]) -> Self {
        let dimension = |kind: ValidationKind| {
            outcomes
                .iter()
                .filter(|o| o.kind == kind)
                .all(|o| o.valid)
        };
        let errors: Vec<String> = outcomes.iter().filter_map(|o| o.error.clone()).collect();
        let warnings: Vec<String> = outcomes.iter().filter_map(|o| o.warning.clone()).collect();
        let explanation = if errors.is_empty() {
            format!(
                "Credential '{}' issued by '{}' is valid. All checks passed.",
                credential.id,
                credential.issuer.display_name()
            )
        } else {
            format!(
                "Credential '{}' verification failed. Issues: {}",
                credential.id,
                errors.join("; ")
            )
        };
        Self {
            valid: errors.is_empty(),
            issuer_trusted: dimension(ValidationKind::IssuerTrust),
            signature_valid: dimension(ValidationKind::Signature),
            not_expired: dimension(ValidationKind::Expiry),
            errors,
            warnings,
            explanation,
            credential: Some(credential.clone()),
        }
    }
}

/// Verifies received credentials.
#[derive(Debug, Clone)]
pub struct VerificationEngine {
    signature: SignatureVerifier,
}

impl VerificationEngine {
    /// Engine using `signature` for the signature dimension.
    pub fn new(signature: SignatureVerifier) -> Self {
        Self { signature }
    }

    /// Verify `credential` against the current time.
    pub async fn verify(&self, credential: &Credential) -> VerificationResult {
        self.verify_at(credential, Utc::now()).await
    }

    /// Verify `credential` as of `now`.
    pub async fn verify_at(&self, credential: &Credential, now: DateTime<Utc>) -> VerificationResult {
        let signature = self
            .signature
            .check(&credential.claims, credential.issuer_public_key_url())
            .await;
        let signature_outcome = match signature.failure_reason() {
            Some(reason) => ValidationOutcome::fail(
                ValidationKind::Signature,
                format!("Signature verification failed: {reason}"),
            ),
            None => {
                let outcome = ValidationOutcome::pass(ValidationKind::Signature);
                match signature.warning() {
                    Some(warning) => outcome.with_warning(warning),
                    None => outcome,
                }
            }
        };

        let outcomes = [
            check_issuer_trust(credential),
            check_expiry(credential, now),
            signature_outcome,
        ];
        let result = VerificationResult::from_outcomes(credential, &outcomes);
        tracing::info!(
            credential_id = %credential.id,
            valid = result.valid,
            issuer_trusted = result.issuer_trusted,
            not_expired = result.not_expired,
            signature_valid = result.signature_valid,
            "credential verified"
        );
        result
    }
}
