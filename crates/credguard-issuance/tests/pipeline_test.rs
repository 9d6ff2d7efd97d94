//! End-to-end issuance pipeline scenarios with scripted collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use credguard_client::{AgentClient, ClientError, IssuedCredential, MockAgentClient, MockVisionClient};
use credguard_core::{CredGuardError, DocumentType, Issuer};
use credguard_issuance::{DocumentExtractor, IssuanceOrchestrator, IssuanceRequest, STATUS_ERROR};
use credguard_vc::{IssuanceStatus, VerifiableCredential};

/// Agent whose every call fails, optionally after a working invitation.
struct FailingAgent {
    invitation_works: bool,
    revoke_calls: AtomicUsize,
}

impl FailingAgent {
    fn new(invitation_works: bool) -> Self {
        Self {
            invitation_works,
            revoke_calls: AtomicUsize::new(0),
        }
    }
}

fn unreachable_agent(endpoint: &str) -> ClientError {
    ClientError::ApiError {
        endpoint: endpoint.into(),
        status: 502,
        body: "bad gateway".into(),
    }
}

#[async_trait]
impl AgentClient for FailingAgent {
    fn adapter_name(&self) -> &str {
        "failing"
    }

    async fn create_connection_invitation(&self, _wallet_did: &str) -> Result<String, ClientError> {
        if self.invitation_works {
            Ok("conn-1".into())
        } else {
            Err(unreachable_agent("create-invitation"))
        }
    }

    async fn send_offer(&self, _credential: &VerifiableCredential) -> Result<String, ClientError> {
        Err(unreachable_agent("send-offer"))
    }

    async fn issue_credential(
        &self,
        _credential: &VerifiableCredential,
    ) -> Result<IssuedCredential, ClientError> {
        Err(unreachable_agent("send-credential"))
    }

    async fn exchange_status(&self, _exchange_id: &str) -> Result<String, ClientError> {
        Err(unreachable_agent("records"))
    }

    async fn revoke(&self, _credential_id: &str) -> Result<bool, ClientError> {
        self.revoke_calls.fetch_add(1, Ordering::SeqCst);
        Err(unreachable_agent("revoke"))
    }

    async fn connection_status(&self, _connection_id: &str) -> Result<String, ClientError> {
        Err(unreachable_agent("connections"))
    }
}

fn orchestrator(agent: Arc<dyn AgentClient>) -> IssuanceOrchestrator {
    IssuanceOrchestrator::new(
        DocumentExtractor::new(Arc::new(MockVisionClient)),
        agent,
        Issuer::credguard(),
    )
}

fn request() -> IssuanceRequest {
    IssuanceRequest {
        file_bytes: b"%PDF-1.7".to_vec(),
        file_name: "birth.pdf".into(),
        document_type: DocumentType::BirthCertificate,
        wallet_did: "did:example:holder".into(),
    }
}

#[tokio::test]
async fn agent_issue_failure_is_reported_not_raised() {
    let result = orchestrator(Arc::new(FailingAgent::new(true)))
        .issue(request())
        .await
        .unwrap();

    assert!(!result.success());
    assert!(result.error_message().is_some_and(|m| m.contains("bad gateway")));
    let vc = result.verifiable_credential().unwrap();
    assert_eq!(vc.issuance_status(), IssuanceStatus::Failed);
    assert_eq!(vc.connection_id(), Some("conn-1"));
    assert!(result.credential_exchange_id().is_none());
}

#[tokio::test]
async fn invitation_failure_reports_without_credential() {
    let result = orchestrator(Arc::new(FailingAgent::new(false)))
        .issue(request())
        .await
        .unwrap();
    assert!(!result.success());
    assert!(result.verifiable_credential().is_none());
    assert!(result
        .error_message()
        .is_some_and(|m| m.starts_with("connection invitation failed")));
}

#[tokio::test]
async fn successful_issuance_carries_birth_certificate_policy() {
    let result = orchestrator(Arc::new(MockAgentClient))
        .issue(request())
        .await
        .unwrap();
    let vc = result.verifiable_credential().unwrap();
    assert_eq!(vc.credential_type()[1], "BirthCertificateCredential");
    assert_eq!(
        vc.expiration_date().unwrap() - vc.issuance_date(),
        DocumentType::BirthCertificate.validity_period()
    );
    assert_eq!(vc.credential_subject().id, "did:example:holder");
}

#[tokio::test]
async fn status_queries_degrade_to_sentinel() {
    let orch = orchestrator(Arc::new(FailingAgent::new(true)));
    assert_eq!(orch.status("cx-1").await, STATUS_ERROR);
    assert_eq!(orch.connection_status("conn-1").await, STATUS_ERROR);
}

#[tokio::test]
async fn unexpected_revocation_error_is_raised() {
    let agent = Arc::new(FailingAgent::new(true));
    let err = orchestrator(agent.clone())
        .revoke("urn:credential:doc-1")
        .await
        .unwrap_err();
    assert!(matches!(err, CredGuardError::RevocationFailed { ref credential_id, .. } if credential_id == "urn:credential:doc-1"));
    assert_eq!(agent.revoke_calls.load(Ordering::SeqCst), 1);
}
