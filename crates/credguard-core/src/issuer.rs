//! # Issuer Identity
//!
//! The party that vouches for a credential. Compared by value; an issuer's
//! trust flag is part of its identity, so the same DID with a different
//! trust decision is a different [`Issuer`].

use serde::{Deserialize, Serialize};

use crate::error::CredGuardError;

/// DID of the service's own issuing identity.
pub const DEFAULT_ISSUER_ID: &str = "did:web:credguard.com:issuer";

/// Display name of the service's own issuing identity.
pub const DEFAULT_ISSUER_NAME: &str = "CredGuard Identity Services";

/// A credential issuer. Both `id` and `display_name` are non-blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "IssuerRepr")]
pub struct Issuer {
    id: String,
    display_name: String,
    trusted: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssuerRepr {
    id: String,
    display_name: String,
    #[serde(default)]
    trusted: bool,
}

impl TryFrom<IssuerRepr> for Issuer {
    type Error = CredGuardError;

    fn try_from(repr: IssuerRepr) -> Result<Self, Self::Error> {
        Issuer::new(repr.id, repr.display_name, repr.trusted)
    }
}

impl Issuer {
    /// Build an issuer, rejecting blank identifiers or display names.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        trusted: bool,
    ) -> Result<Self, CredGuardError> {
        let id = id.into();
        let display_name = display_name.into();
        if id.trim().is_empty() {
            return Err(CredGuardError::InvalidInput(
                "issuer id must not be blank".into(),
            ));
        }
        if display_name.trim().is_empty() {
            return Err(CredGuardError::InvalidInput(
                "issuer displayName must not be blank".into(),
            ));
        }
        Ok(Self {
            id,
            display_name,
            trusted,
        })
    }

    /// The service's own trusted issuing identity.
    pub fn credguard() -> Self {
        Self {
            id: DEFAULT_ISSUER_ID.to_string(),
            display_name: DEFAULT_ISSUER_NAME.to_string(),
            trusted: true,
        }
    }

    /// Issuer identifier, usually a DID or URL.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable issuer name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Whether this issuer is on the trust list.
    pub fn trusted(&self) -> bool {
        self.trusted
    }
}

impl std::fmt::Display for Issuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.display_name, self.id)
    }
}
