//! Independent credential checks.
//!
//! Each check is a pure function returning a [`ValidationOutcome`]; none
//! short-circuits another.

use chrono::{DateTime, Utc};
use serde::Serialize;

use credguard_core::Credential;

/// Which dimension a check covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationKind {
    /// The issuer is on the trusted list.
    IssuerTrust,
    /// The credential has not expired.
    Expiry,
    /// The embedded token's signature holds.
    Signature,
}

/// The result of one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// Dimension checked.
    pub kind: ValidationKind,
    /// Whether the check passed.
    pub valid: bool,
    /// Why it failed; `None` when valid.
    pub error: Option<String>,
    /// Caveat on a passing check.
    pub warning: Option<String>,
}

impl ValidationOutcome {
    /// A passing check.
    pub fn pass(kind: ValidationKind) -> Self {
        Self {
            kind,
            valid: true,
            error: None,
            warning: None,
        }
    }

    /// A failing check.
    pub fn fail(kind: ValidationKind, error: impl Into<String>) -> Self {
        Self {
            kind,
            valid: false,
            error: Some(error.into()),
            warning: None,
        }
    }

    /// Attach a caveat.
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }
}

/// Valid iff the issuer is trusted.
pub fn check_issuer_trust(credential: &Credential) -> ValidationOutcome {
    if credential.issuer.trusted() {
        ValidationOutcome::pass(ValidationKind::IssuerTrust)
    } else {
        ValidationOutcome::fail(
            ValidationKind::IssuerTrust,
            format!(
                "Issuer '{}' is not trusted",
                credential.issuer.display_name()
            ),
        )
    }
}

/// Valid iff the credential never expires or expires after `now`.
pub fn check_expiry(credential: &Credential, now: DateTime<Utc>) -> ValidationOutcome {
    match credential.expires_at {
        Some(expires_at) if expires_at <= now => ValidationOutcome::fail(
            ValidationKind::Expiry,
            format!("Credential expired on {}", expires_at.to_rfc3339()),
        ),
        _ => ValidationOutcome::pass(ValidationKind::Expiry),
    }
}
