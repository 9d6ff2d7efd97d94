//! # Issuance Orchestrator
//!
//! Drives one document through the full issuance pipeline:
//!
//! ```text
//! parse ──▶ create invitation ──▶ build VC ──▶ issue ──▶ result
//!   │              │                             │
//!   ▼              ▼                             ▼
//! Err(IssuanceFailed)   result(success=false)   VC Failed, result(success=false)
//! ```
//!
//! ## Failure Policy
//!
//! Extraction errors abort the pipeline with
//! [`CredGuardError::IssuanceFailed`]. Agent errors are captured as a failed
//! [`CredentialIssuanceResult`] so synchronous, async, and batch callers get
//! a typed outcome. Each collaborator call is made once per attempt; there
//! is no deduplication of repeated requests for the same document.
//!
//! Status and connection queries never fail: any agent error maps to the
//! [`STATUS_ERROR`] sentinel.

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;

use credguard_client::AgentClient;
use credguard_core::{CredGuardError, DocumentType, Issuer, PhysicalDocument};
use credguard_vc::{
    elapsed_millis, CredentialIssuanceResult, VerifiableCredential, PREVIEW_CONNECTION_ID,
};

use crate::extractor::DocumentExtractor;

/// Returned by status queries when the agent could not be asked.
pub const STATUS_ERROR: &str = "error";

/// Exchange states that count as an active credential.
pub const ACTIVE_EXCHANGE_STATES: [&str; 3] = ["credential_acked", "issued", "active"];

/// Status message stamped on a successfully issued credential.
pub const ISSUED_MESSAGE: &str = "Credential successfully issued";

/// Status message stamped on preview credentials.
pub const PREVIEW_MESSAGE: &str = "Document parsed successfully - preview mode";

/// Whether an agent exchange state means the credential is live.
pub fn is_active_status(status: &str) -> bool {
    ACTIVE_EXCHANGE_STATES.contains(&status)
}

/// One upload to issue.
#[derive(Clone)]
pub struct IssuanceRequest {
    /// Raw document bytes.
    pub file_bytes: Vec<u8>,
    /// Original file name.
    pub file_name: String,
    /// Declared document type.
    pub document_type: DocumentType,
    /// Holder wallet DID.
    pub wallet_did: String,
}

impl std::fmt::Debug for IssuanceRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuanceRequest")
            .field("file_bytes", &format!("[{} bytes]", self.file_bytes.len()))
            .field("file_name", &self.file_name)
            .field("document_type", &self.document_type)
            .field("wallet_did", &self.wallet_did)
            .finish()
    }
}

/// Coordinates extraction, credential construction, and agent issuance.
#[derive(Clone)]
pub struct IssuanceOrchestrator {
    extractor: DocumentExtractor,
    agent: Arc<dyn AgentClient>,
    issuer: Issuer,
}

impl std::fmt::Debug for IssuanceOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuanceOrchestrator")
            .field("extractor", &self.extractor)
            .field("agent", &self.agent.adapter_name())
            .field("issuer", &self.issuer.id())
            .finish()
    }
}

impl IssuanceOrchestrator {
    /// Orchestrator issuing as `issuer`.
    pub fn new(extractor: DocumentExtractor, agent: Arc<dyn AgentClient>, issuer: Issuer) -> Self {
        Self {
            extractor,
            agent,
            issuer,
        }
    }

    /// The issuing identity stamped on every credential.
    pub fn issuer(&self) -> &Issuer {
        &self.issuer
    }

    /// The extractor used for step 1.
    pub fn extractor(&self) -> &DocumentExtractor {
        &self.extractor
    }

    // ── Full pipeline ───────────────────────────────────────────────

    /// Run the full pipeline for one upload.
    ///
    /// # Errors
    ///
    /// Only extraction errors are returned, wrapped as
    /// [`CredGuardError::IssuanceFailed`]. Agent failures come back as
    /// `Ok` with `success == false`.
    pub async fn issue(
        &self,
        request: IssuanceRequest,
    ) -> Result<CredentialIssuanceResult, CredGuardError> {
        let started = Instant::now();
        let IssuanceRequest {
            file_bytes,
            file_name,
            document_type,
            wallet_did,
        } = request;

        let document = self
            .extractor
            .parse(file_bytes, &file_name, document_type)
            .await
            .map_err(|e| CredGuardError::issuance_aborted("document extraction failed", e))?;

        let connection_id = match self.agent.create_connection_invitation(&wallet_did).await {
            Ok(id) => id,
            Err(err) => {
                let message = format!("connection invitation failed: {err}");
                tracing::warn!(document_id = document.id(), wallet_did = %wallet_did, "{message}");
                return Ok(CredentialIssuanceResult::failure(None, message, started.elapsed()));
            }
        };

        let credential =
            VerifiableCredential::from_document(&document, &self.issuer, &wallet_did, &connection_id);
        tracing::info!(
            credential_id = credential.id(),
            document_id = document.id(),
            connection_id = %connection_id,
            "credential built, issuing"
        );

        match self.agent.issue_credential(&credential).await {
            Ok(issued) => {
                let credential = credential.mark_issued(ISSUED_MESSAGE)?;
                let document = document.mark_credential_issued()?;
                let elapsed = started.elapsed();
                tracing::info!(
                    credential_id = credential.id(),
                    document_id = document.id(),
                    exchange_id = %issued.exchange_id,
                    elapsed_ms = elapsed_millis(elapsed),
                    "credential issued"
                );
                Ok(CredentialIssuanceResult::issued(
                    credential,
                    issued.exchange_id,
                    issued.offer_url,
                    elapsed,
                ))
            }
            Err(err) => {
                let message = format!("credential issuance failed: {err}");
                let credential = credential.fail(message.clone())?;
                let elapsed = started.elapsed();
                tracing::warn!(
                    credential_id = credential.id(),
                    document_id = document.id(),
                    elapsed_ms = elapsed_millis(elapsed),
                    "{message}"
                );
                Ok(CredentialIssuanceResult::failure(
                    Some(credential),
                    message,
                    elapsed,
                ))
            }
        }
    }

    /// Run [`issue`](Self::issue) on a background task.
    ///
    /// Dropping the handle detaches the task; in-flight collaborator calls
    /// still complete.
    pub fn spawn_issue(
        &self,
        request: IssuanceRequest,
    ) -> JoinHandle<Result<CredentialIssuanceResult, CredGuardError>> {
        let orchestrator = self.clone();
        tokio::spawn(async move { orchestrator.issue(request).await })
    }

    // ── Preview ─────────────────────────────────────────────────────

    /// Step 1 alone. Extractor errors are returned unwrapped.
    pub async fn parse_only(
        &self,
        file_bytes: Vec<u8>,
        file_name: &str,
        document_type: DocumentType,
    ) -> Result<PhysicalDocument, CredGuardError> {
        self.extractor.parse(file_bytes, file_name, document_type).await
    }

    /// Step 3 alone, against the preview connection placeholder.
    pub fn build_only(&self, document: &PhysicalDocument, wallet_did: &str) -> VerifiableCredential {
        VerifiableCredential::from_document(document, &self.issuer, wallet_did, PREVIEW_CONNECTION_ID)
    }

    /// Parse and build without contacting the agent.
    pub async fn preview(
        &self,
        file_bytes: Vec<u8>,
        file_name: &str,
        document_type: DocumentType,
        wallet_did: &str,
    ) -> Result<VerifiableCredential, CredGuardError> {
        let document = self.parse_only(file_bytes, file_name, document_type).await?;
        Ok(self
            .build_only(&document, wallet_did)
            .with_status_message(PREVIEW_MESSAGE))
    }

    // ── Post-issuance ───────────────────────────────────────────────

    /// Revoke an issued credential.
    ///
    /// `Ok(false)` means the agent rejected the revocation.
    ///
    /// # Errors
    ///
    /// [`CredGuardError::RevocationFailed`] when the agent could not be
    /// reached or answered unexpectedly.
    pub async fn revoke(&self, credential_id: &str) -> Result<bool, CredGuardError> {
        match self.agent.revoke(credential_id).await {
            Ok(revoked) => {
                tracing::info!(credential_id, revoked, "revocation processed");
                Ok(revoked)
            }
            Err(err) => {
                tracing::error!(credential_id, error = %err, "revocation failed");
                Err(CredGuardError::RevocationFailed {
                    credential_id: credential_id.to_string(),
                    reason: err.to_string(),
                })
            }
        }
    }

    /// Agent-side exchange state, or [`STATUS_ERROR`].
    pub async fn status(&self, exchange_id: &str) -> String {
        self.agent
            .exchange_status(exchange_id)
            .await
            .unwrap_or_else(|err| {
                tracing::warn!(exchange_id, error = %err, "exchange status check failed");
                STATUS_ERROR.to_string()
            })
    }

    /// Agent-side connection state, or [`STATUS_ERROR`].
    pub async fn connection_status(&self, connection_id: &str) -> String {
        self.agent
            .connection_status(connection_id)
            .await
            .unwrap_or_else(|err| {
                tracing::warn!(connection_id, error = %err, "connection status check failed");
                STATUS_ERROR.to_string()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credguard_client::{MockAgentClient, MockVisionClient};
    use credguard_vc::IssuanceStatus;

    fn orchestrator() -> IssuanceOrchestrator {
        IssuanceOrchestrator::new(
            DocumentExtractor::new(Arc::new(MockVisionClient)),
            Arc::new(MockAgentClient),
            Issuer::credguard(),
        )
    }

    fn request(bytes: &[u8]) -> IssuanceRequest {
        IssuanceRequest {
            file_bytes: bytes.to_vec(),
            file_name: "degree.png".into(),
            document_type: DocumentType::DegreeCertificate,
            wallet_did: "did:example:holder".into(),
        }
    }

    #[tokio::test]
    async fn mock_pipeline_issues_credential() {
        let result = orchestrator().issue(request(b"scan")).await.unwrap();
        assert!(result.success());
        let vc = result.verifiable_credential().unwrap();
        assert_eq!(vc.issuance_status(), IssuanceStatus::Issued);
        assert_eq!(vc.status_message(), Some(ISSUED_MESSAGE));
        assert!(vc.connection_id().unwrap().starts_with("mock-conn-"));
        assert!(result.credential_exchange_id().unwrap().starts_with("mock-exchange-"));
        assert!(result.offer_url().unwrap().starts_with("https://mock-agent.example.com/offer/"));
    }

    #[tokio::test]
    async fn empty_upload_aborts_as_issuance_failed() {
        let err = orchestrator().issue(request(b"")).await.unwrap_err();
        match err {
            CredGuardError::IssuanceFailed { cause, .. } => {
                assert!(matches!(cause.as_deref(), Some(CredGuardError::InvalidInput(_))));
            }
            other => panic!("expected IssuanceFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn preview_uses_placeholder_connection() {
        let vc = orchestrator()
            .preview(b"scan".to_vec(), "degree.png", DocumentType::DegreeCertificate, "did:w")
            .await
            .unwrap();
        assert_eq!(vc.connection_id(), Some(PREVIEW_CONNECTION_ID));
        assert_eq!(vc.issuance_status(), IssuanceStatus::Created);
        assert_eq!(vc.status_message(), Some(PREVIEW_MESSAGE));
    }

    #[tokio::test]
    async fn parse_only_passes_extractor_errors_through() {
        let err = orchestrator()
            .parse_only(Vec::new(), "x.png", DocumentType::Other)
            .await
            .unwrap_err();
        assert!(matches!(err, CredGuardError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn spawned_issue_resolves_to_same_outcome() {
        let handle = orchestrator().spawn_issue(request(b"scan"));
        let result = handle.await.unwrap().unwrap();
        assert!(result.success());
    }

    #[tokio::test]
    async fn mock_status_queries() {
        let orch = orchestrator();
        assert_eq!(orch.status("x").await, "credential_acked");
        assert_eq!(orch.connection_status("x").await, "active");
        assert!(orch.revoke("urn:credential:doc-1").await.unwrap());
    }

    #[test]
    fn active_states() {
        for state in ["credential_acked", "issued", "active"] {
            assert!(is_active_status(state));
        }
        assert!(!is_active_status("offer_sent"));
        assert!(!is_active_status(STATUS_ERROR));
    }
}
