//! # Issuance Status
//!
//! Where a credential is in its delivery to a wallet. The forward path
//! follows the agent handshake; `Revoked` hangs off `Issued` and `Failed`
//! is reachable from every state before `Issued`.

use serde::{Deserialize, Serialize};

/// Lifecycle stage of a verifiable credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssuanceStatus {
    /// Built, not yet offered.
    Created,
    /// Offer delivered to the holder's wallet.
    OfferSent,
    /// Holder accepted the offer.
    Accepted,
    /// Credential delivered. Terminal unless revoked.
    Issued,
    /// Revoked after issuance. Terminal.
    Revoked,
    /// Issuance failed. Terminal.
    Failed,
}

impl IssuanceStatus {
    /// Whether no forward or failure transition is allowed.
    ///
    /// `Issued` counts as terminal; revocation is the only edge out of it.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Issued | Self::Revoked | Self::Failed)
    }

    /// The canonical string name of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::OfferSent => "OFFER_SENT",
            Self::Accepted => "ACCEPTED",
            Self::Issued => "ISSUED",
            Self::Revoked => "REVOKED",
            Self::Failed => "FAILED",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::OfferSent => "Offer Sent",
            Self::Accepted => "Accepted",
            Self::Issued => "Issued",
            Self::Revoked => "Revoked",
            Self::Failed => "Failed",
        }
    }

    /// Next state on the handshake path, if any.
    ///
    /// No wildcard, so a new variant is a compile error here.
    pub fn next_forward(&self) -> Option<IssuanceStatus> {
        match self {
            Self::Created => Some(Self::OfferSent),
            Self::OfferSent => Some(Self::Accepted),
            Self::Accepted => Some(Self::Issued),
            Self::Issued | Self::Revoked | Self::Failed => None,
        }
    }

    /// Whether `next` is a single edge out of this state.
    pub fn can_transition_to(&self, next: IssuanceStatus) -> bool {
        if self.next_forward() == Some(next) {
            return true;
        }
        match next {
            Self::Revoked => *self == Self::Issued,
            Self::Failed => !self.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for IssuanceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
