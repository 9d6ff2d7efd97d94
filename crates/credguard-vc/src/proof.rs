//! # Proof Metadata
//!
//! The proof block attached at build time records the signature suite and
//! purpose. The agent signs on delivery, so the block carries no signature.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Signature suite named by a proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProofType {
    /// JOSE-based signature suite used for wallet delivery.
    JsonWebSignature2020,
}

impl std::fmt::Display for ProofType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProofType::JsonWebSignature2020 => write!(f, "JsonWebSignature2020"),
        }
    }
}

/// The purpose of a proof, per the W3C proof purpose vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProofPurpose {
    /// The issuer asserts the credential claims are true.
    AssertionMethod,
}

/// A proof block on a verifiable credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    /// Signature suite.
    #[serde(rename = "type")]
    pub proof_type: ProofType,
    /// When the proof was created.
    pub created: DateTime<Utc>,
    /// Why the proof was made.
    pub proof_purpose: ProofPurpose,
}

impl Proof {
    /// Unsigned assertion proof created at `created`.
    pub fn assertion(created: DateTime<Utc>) -> Self {
        Self {
            proof_type: ProofType::JsonWebSignature2020,
            created,
            proof_purpose: ProofPurpose::AssertionMethod,
        }
    }
}
