//! # Issuance Result
//!
//! One value per issuance attempt. Agent failures are reported here as
//! `success = false` rather than raised, so synchronous, async, and batch
//! callers all receive the same typed outcome.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::credential::VerifiableCredential;

/// Outcome of one issuance attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialIssuanceResult {
    verifiable_credential: Option<VerifiableCredential>,
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    processed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    credential_exchange_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    offer_url: Option<String>,
    processing_time_ms: u64,
}

impl CredentialIssuanceResult {
    /// The agent delivered `credential` under `exchange_id`.
    pub fn issued(
        credential: VerifiableCredential,
        exchange_id: String,
        offer_url: Option<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            verifiable_credential: Some(credential),
            success: true,
            error_message: None,
            processed_at: Utc::now(),
            credential_exchange_id: Some(exchange_id),
            offer_url,
            processing_time_ms: elapsed_millis(elapsed),
        }
    }

    /// The attempt failed. `credential` is the `Failed` credential when the
    /// failure happened after it was built.
    pub fn failure(
        credential: Option<VerifiableCredential>,
        message: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            verifiable_credential: credential,
            success: false,
            error_message: Some(message.into()),
            processed_at: Utc::now(),
            credential_exchange_id: None,
            offer_url: None,
            processing_time_ms: elapsed_millis(elapsed),
        }
    }

    /// The credential in its final state for this attempt.
    pub fn verifiable_credential(&self) -> Option<&VerifiableCredential> {
        self.verifiable_credential.as_ref()
    }

    /// Whether the agent reported delivery.
    pub fn success(&self) -> bool {
        self.success
    }

    /// Why the attempt failed.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// When the result was produced.
    pub fn processed_at(&self) -> DateTime<Utc> {
        self.processed_at
    }

    /// Agent exchange identifier, for status polling.
    pub fn credential_exchange_id(&self) -> Option<&str> {
        self.credential_exchange_id.as_deref()
    }

    /// Offer link for the holder's wallet, when the agent provides one.
    pub fn offer_url(&self) -> Option<&str> {
        self.offer_url.as_deref()
    }

    /// Wall-clock time from extraction start to completion.
    pub fn processing_time_ms(&self) -> u64 {
        self.processing_time_ms
    }
}

/// Whole milliseconds in `elapsed`, saturating at `u64::MAX`.
pub fn elapsed_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
