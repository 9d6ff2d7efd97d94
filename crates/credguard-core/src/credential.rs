//! # Received Credentials
//!
//! The simpler credential shape presented for verification: a credential
//! someone else already issued, or one recovered from an uploaded image.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Attributes;
use crate::error::CredGuardError;
use crate::issuer::Issuer;

/// Claim key holding an embedded signed token (JWS compact serialization).
pub const JWT_CLAIM: &str = "jwt";

/// Claim key holding the URL of the issuer's published key set.
pub const PUBLIC_KEY_URL_CLAIM: &str = "issuerPublicKeyUrl";

/// An already-issued credential, as presented to the verifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// Credential identifier.
    pub id: String,
    /// Credential type name.
    #[serde(rename = "type")]
    pub credential_type: String,
    /// Who issued it.
    pub issuer: Issuer,
    /// Subject identifier, usually the holder's DID.
    pub subject: String,
    /// Issuance time.
    pub issued_at: DateTime<Utc>,
    /// Expiry time; `None` means the credential never expires.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Free-form claims.
    #[serde(default)]
    pub claims: Attributes,
}

impl Credential {
    /// Reject credentials with blank identifying fields.
    pub fn validate(&self) -> Result<(), CredGuardError> {
        let blank = [
            ("id", &self.id),
            ("type", &self.credential_type),
            ("subject", &self.subject),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty());
        match blank {
            Some((field, _)) => Err(CredGuardError::InvalidInput(format!(
                "{field} must not be blank"
            ))),
            None => Ok(()),
        }
    }

    /// Embedded signed token, if the claims carry a non-blank one.
    pub fn signed_token(&self) -> Option<&str> {
        non_blank_str(self.claims.get(JWT_CLAIM))
    }

    /// URL of the issuer's key set, if the claims name one.
    pub fn issuer_public_key_url(&self) -> Option<&str> {
        non_blank_str(self.claims.get(PUBLIC_KEY_URL_CLAIM))
    }
}

fn non_blank_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}
