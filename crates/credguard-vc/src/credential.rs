//! # Verifiable Credential
//!
//! The credential CredGuard delivers to a holder's wallet. Fields are
//! read-only; every status change consumes the credential and returns a new
//! one, validated against the [`IssuanceStatus`] state machine.

use chrono::{DateTime, Utc};
use serde::Serialize;

use credguard_core::{Attributes, Issuer, TransitionError};

use crate::proof::Proof;
use crate::status::IssuanceStatus;

/// The `credentialSubject` block: who the credential is about and what was
/// read from their document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSubject {
    /// Holder wallet DID.
    pub id: String,
    /// Display name of the source document type.
    pub document_type: String,
    /// Extracted document attributes.
    pub attributes: Attributes,
}

/// A W3C-style verifiable credential with CredGuard issuance tracking.
///
/// ## Field Naming
///
/// Serde renames map snake_case fields to the W3C JSON names
/// (`@context`, `type`, `issuanceDate`, `credentialSubject`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    #[serde(rename = "@context")]
    pub(crate) context: Vec<String>,
    pub(crate) id: String,
    #[serde(rename = "type")]
    pub(crate) credential_type: Vec<String>,
    pub(crate) issuer: Issuer,
    pub(crate) credential_subject: CredentialSubject,
    pub(crate) issuance_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) expiration_date: Option<DateTime<Utc>>,
    pub(crate) proof: Proof,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) connection_id: Option<String>,
    pub(crate) wallet_did: String,
    pub(crate) issuance_status: IssuanceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) status_message: Option<String>,
    pub(crate) source_document_id: String,
}

impl VerifiableCredential {
    /// Move along a single state-machine edge.
    pub fn with_status(
        mut self,
        next: IssuanceStatus,
        message: impl Into<String>,
    ) -> Result<Self, TransitionError> {
        if !self.issuance_status.can_transition_to(next) {
            return Err(self.rejected(next));
        }
        self.issuance_status = next;
        self.status_message = Some(message.into());
        Ok(self)
    }

    /// Walk the handshake path forward until `target`, stamping `message`.
    ///
    /// An agent that auto-accepts reports only the final outcome; this
    /// records the intermediate stages it passed through.
    pub fn advance_to(
        mut self,
        target: IssuanceStatus,
        message: impl Into<String>,
    ) -> Result<Self, TransitionError> {
        let start = self.issuance_status;
        let mut state = start;
        while state != target {
            state = match state.next_forward() {
                Some(next) => next,
                None => {
                    return Err(TransitionError::InvalidTransition {
                        machine: "issuance",
                        from: start.as_str(),
                        to: target.as_str(),
                    })
                }
            };
        }
        if state == start {
            return Err(self.rejected(target));
        }
        self.issuance_status = state;
        self.status_message = Some(message.into());
        Ok(self)
    }

    /// Forward to `Issued`.
    pub fn mark_issued(self, message: impl Into<String>) -> Result<Self, TransitionError> {
        self.advance_to(IssuanceStatus::Issued, message)
    }

    /// Any non-terminal state `→ Failed`.
    pub fn fail(self, message: impl Into<String>) -> Result<Self, TransitionError> {
        self.with_status(IssuanceStatus::Failed, message)
    }

    /// Replace the status message without changing state.
    pub fn with_status_message(mut self, message: impl Into<String>) -> Self {
        self.status_message = Some(message.into());
        self
    }

    fn rejected(&self, next: IssuanceStatus) -> TransitionError {
        if self.issuance_status.is_terminal() && next != IssuanceStatus::Revoked {
            TransitionError::AlreadyTerminal {
                machine: "issuance",
                state: self.issuance_status.as_str(),
            }
        } else {
            TransitionError::InvalidTransition {
                machine: "issuance",
                from: self.issuance_status.as_str(),
                to: next.as_str(),
            }
        }
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// JSON-LD context URIs.
    pub fn context(&self) -> &[String] {
        &self.context
    }

    /// `urn:credential:<sourceDocumentId>`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// `["VerifiableCredential", <subtype>]`.
    pub fn credential_type(&self) -> &[String] {
        &self.credential_type
    }

    /// The issuing identity.
    pub fn issuer(&self) -> &Issuer {
        &self.issuer
    }

    /// Subject block.
    pub fn credential_subject(&self) -> &CredentialSubject {
        &self.credential_subject
    }

    /// When the credential was built.
    pub fn issuance_date(&self) -> DateTime<Utc> {
        self.issuance_date
    }

    /// Issuance date plus the document type's validity period.
    pub fn expiration_date(&self) -> Option<DateTime<Utc>> {
        self.expiration_date
    }

    /// Proof block.
    pub fn proof(&self) -> &Proof {
        &self.proof
    }

    /// Agent connection used for delivery.
    pub fn connection_id(&self) -> Option<&str> {
        self.connection_id.as_deref()
    }

    /// Holder wallet DID.
    pub fn wallet_did(&self) -> &str {
        &self.wallet_did
    }

    /// Current lifecycle stage.
    pub fn issuance_status(&self) -> IssuanceStatus {
        self.issuance_status
    }

    /// Message recorded with the last status change.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Identifier of the document the credential was built from.
    pub fn source_document_id(&self) -> &str {
        &self.source_document_id
    }
}
