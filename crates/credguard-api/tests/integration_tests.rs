//! # Integration Tests for credguard-api
//!
//! Drives the router with `tower::ServiceExt::oneshot` against mock
//! collaborators: health probes, JSON and upload verification, synchronous
//! and async issuance, exchange queries, and revocation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use credguard_api::state::{AppConfig, AppState};
use credguard_client::{
    AgentClient, ClientError, IssuedCredential, KeySetConfig, MockVisionClient,
};
use credguard_core::Issuer;
use credguard_issuance::{DocumentExtractor, IssuanceOrchestrator, PREVIEW_MESSAGE};
use credguard_vc::VerifiableCredential;
use credguard_verify::{SignatureVerifier, VerificationEngine};

const BOUNDARY: &str = "credguard-test-boundary";

/// Helper: build the test app with every collaborator mocked.
fn test_app() -> axum::Router {
    credguard_api::app(AppState::mock().unwrap())
}

/// Agent that accepts invitations but fails everything after.
struct UnreachableAgent;

#[async_trait]
impl AgentClient for UnreachableAgent {
    fn adapter_name(&self) -> &str {
        "unreachable"
    }

    async fn create_connection_invitation(&self, _wallet_did: &str) -> Result<String, ClientError> {
        Ok("conn-1".into())
    }

    async fn send_offer(&self, _credential: &VerifiableCredential) -> Result<String, ClientError> {
        Err(down())
    }

    async fn issue_credential(
        &self,
        _credential: &VerifiableCredential,
    ) -> Result<IssuedCredential, ClientError> {
        Err(down())
    }

    async fn exchange_status(&self, _exchange_id: &str) -> Result<String, ClientError> {
        Err(down())
    }

    async fn revoke(&self, _credential_id: &str) -> Result<bool, ClientError> {
        Ok(false)
    }

    async fn connection_status(&self, _connection_id: &str) -> Result<String, ClientError> {
        Err(down())
    }
}

fn down() -> ClientError {
    ClientError::ApiError {
        endpoint: "agent".into(),
        status: 503,
        body: "agent down".into(),
    }
}

/// Helper: build the test app with an agent that cannot deliver.
fn failing_agent_app() -> axum::Router {
    let orchestrator = IssuanceOrchestrator::new(
        DocumentExtractor::new(Arc::new(MockVisionClient)),
        Arc::new(UnreachableAgent),
        Issuer::credguard(),
    );
    let key_sets = credguard_client::build_key_set_fetcher(&KeySetConfig::default()).unwrap();
    let verifier = VerificationEngine::new(SignatureVerifier::new(key_sets));
    credguard_api::app(AppState::new(orchestrator, verifier, AppConfig::default()))
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Helper: read response body as JSON.
async fn body_json(response: axum::http::Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Helper: multipart body with an optional file part and text fields.
fn multipart_body(file: Option<(&str, &[u8])>, fields: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some((file_name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    for (name, value) in fields {
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_request(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn issuance_form(preview: &str) -> Vec<u8> {
    multipart_body(
        Some(("passport.png", b"scan")),
        &[
            ("documentType", "PASSPORT"),
            ("walletDid", "did:example:holder"),
            ("previewOnly", preview),
        ],
    )
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_health_reports_service() {
    let response = test_app().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "OK");
    assert_eq!(body["service"], "credguard-backend");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_liveness_probe() {
    let response = test_app().oneshot(get("/health/liveness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_probe() {
    let response = test_app().oneshot(get("/health/readiness")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

// -- Verification -------------------------------------------------------------

fn credential_json(trusted: bool, expires_at: Option<&str>) -> Value {
    json!({
        "id": "cred-1",
        "type": "EducationCredential",
        "issuer": {
            "id": "did:example:uni",
            "displayName": "Example University",
            "trusted": trusted
        },
        "subject": "did:example:holder",
        "issuedAt": "2024-01-01T00:00:00Z",
        "expiresAt": expires_at,
        "claims": { "degree": "BSc" }
    })
}

#[tokio::test]
async fn test_verify_valid_credential() {
    let response = test_app()
        .oneshot(json_request(
            "/api/credentials/verify",
            &credential_json(true, Some("2999-01-01T00:00:00Z")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["issuerTrusted"], true);
    assert_eq!(body["errors"], json!([]));
    assert_eq!(body["credential"]["id"], "cred-1");
}

#[tokio::test]
async fn test_verify_invalid_credential_is_400_with_all_errors() {
    let response = test_app()
        .oneshot(json_request(
            "/api/credentials/verify",
            &credential_json(false, Some("2020-01-01T00:00:00Z")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["valid"], false);
    assert_eq!(body["issuerTrusted"], false);
    assert_eq!(body["notExpired"], false);
    assert_eq!(body["errors"].as_array().unwrap().len(), 2);
    assert!(body["explanation"]
        .as_str()
        .unwrap()
        .starts_with("Credential 'cred-1' verification failed."));
}

#[tokio::test]
async fn test_verify_blank_id_is_rejected() {
    let mut credential = credential_json(true, None);
    credential["id"] = json!("  ");
    let response = test_app()
        .oneshot(json_request("/api/credentials/verify", &credential))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("id must not be blank"));
}

#[tokio::test]
async fn test_verify_blank_issuer_name_is_rejected() {
    let mut credential = credential_json(true, None);
    credential["issuer"]["displayName"] = json!("");
    let response = test_app()
        .oneshot(json_request("/api/credentials/verify", &credential))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_verify_malformed_json_is_rejected() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/credentials/verify")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_extracts_and_verifies() {
    let response = test_app()
        .oneshot(multipart_request(
            "/api/credentials/upload",
            multipart_body(Some(("credential.png", b"image")), &[]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["credential"]["id"], MockVisionClient::CREDENTIAL_ID);
}

#[tokio::test]
async fn test_upload_without_file_is_rejected() {
    let response = test_app()
        .oneshot(multipart_request(
            "/api/credentials/upload",
            multipart_body(None, &[("note", "no file")]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("File is required"));
}

#[tokio::test]
async fn test_upload_requires_multipart() {
    let response = test_app()
        .oneshot(json_request("/api/credentials/upload", &json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// -- Issuance -----------------------------------------------------------------

#[tokio::test]
async fn test_preview_builds_without_issuing() {
    let response = test_app()
        .oneshot(multipart_request(
            "/api/credentials/issuance/issue-from-document",
            issuance_form("true"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], PREVIEW_MESSAGE);
    assert!(body["issuance"].is_null());
    assert_eq!(body["document"]["documentType"], "Passport");
    assert_eq!(body["document"]["status"], "Attributes Extracted");
    assert_eq!(body["document"]["fileName"], "passport.png");
    assert_eq!(body["credential"]["status"], "Created");
    assert_eq!(body["credential"]["statusMessage"], PREVIEW_MESSAGE);
    assert_eq!(
        body["credential"]["credentialSubject"]["id"],
        "did:example:holder"
    );
}

#[tokio::test]
async fn test_issue_delivers_credential() {
    let response = test_app()
        .oneshot(multipart_request(
            "/api/credentials/issuance/issue-from-document",
            issuance_form("false"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Credential issued successfully");
    assert_eq!(body["credential"]["status"], "Issued");
    assert_eq!(body["document"]["status"], "Credential Issued");
    assert_eq!(body["issuance"]["walletDid"], "did:example:holder");
    let exchange_id = body["issuance"]["credentialExchangeId"].as_str().unwrap();
    assert!(body["issuance"]["offerUrl"]
        .as_str()
        .unwrap()
        .ends_with(exchange_id));
}

#[tokio::test]
async fn test_issue_agent_failure_is_500_with_body() {
    let response = failing_agent_app()
        .oneshot(multipart_request(
            "/api/credentials/issuance/issue-from-document",
            issuance_form("false"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("agent down"));
    assert!(body["credential"].is_null());
}

#[tokio::test]
async fn test_issue_rejects_unknown_document_type() {
    let response = test_app()
        .oneshot(multipart_request(
            "/api/credentials/issuance/issue-from-document",
            multipart_body(
                Some(("card.png", b"scan")),
                &[("documentType", "LIBRARY_CARD"), ("walletDid", "did:example:holder")],
            ),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_issue_requires_wallet() {
    let response = test_app()
        .oneshot(multipart_request(
            "/api/credentials/issuance/issue-from-document",
            multipart_body(Some(("passport.png", b"scan")), &[("documentType", "PASSPORT")]),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"]["message"].as_str().unwrap().contains("walletDid"));
}

// -- Async Jobs ---------------------------------------------------------------

#[tokio::test]
async fn test_async_issue_runs_job_to_completion() {
    let app = test_app();
    let response = app
        .clone()
        .oneshot(multipart_request(
            "/api/credentials/issuance/issue-from-document/async",
            issuance_form("false"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = body_json(response).await;
    let job_id = body["jobId"].as_str().unwrap().to_string();
    assert!(job_id.starts_with("job-"));
    assert_eq!(
        body["message"],
        format!("Credential issuance started. Job ID: {job_id}")
    );

    let uri = format!("/api/credentials/issuance/jobs/{job_id}");
    let mut last = Value::Null;
    for _ in 0..200 {
        let response = app.clone().oneshot(get(&uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        last = body_json(response).await;
        if last["state"] != "PENDING" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(last["jobId"], job_id.as_str());
    assert_eq!(last["state"], "COMPLETED");
    assert_eq!(last["result"]["success"], true);
}

#[tokio::test]
async fn test_async_rejects_preview() {
    let response = test_app()
        .oneshot(multipart_request(
            "/api/credentials/issuance/issue-from-document/async",
            issuance_form("true"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Preview mode is not supported"));
}

#[tokio::test]
async fn test_unknown_job_is_404() {
    let response = test_app()
        .oneshot(get("/api/credentials/issuance/jobs/job-missing"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], "NOT_FOUND");
}

// -- Exchange Queries & Revocation --------------------------------------------

#[tokio::test]
async fn test_exchange_status_reports_activity() {
    let response = test_app()
        .oneshot(get("/api/credentials/issuance/status/exchange-9"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["exchangeId"], "exchange-9");
    assert_eq!(body["status"], "credential_acked");
    assert_eq!(body["active"], true);
    assert!(body["credentialId"].is_null());
}

#[tokio::test]
async fn test_exchange_status_error_sentinel() {
    let response = failing_agent_app()
        .oneshot(get("/api/credentials/issuance/status/exchange-9"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["active"], false);
}

#[tokio::test]
async fn test_revoke_succeeds_with_mock_agent() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/credentials/issuance/revoke/vc-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "Credential revoked successfully");
}

#[tokio::test]
async fn test_rejected_revocation_is_500() {
    let response = failing_agent_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/credentials/issuance/revoke/vc-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(response).await, "Failed to revoke credential");
}

#[tokio::test]
async fn test_connection_status() {
    let response = test_app()
        .oneshot(get("/api/credentials/issuance/connection/conn-1/status"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "Connection status: active");
}

#[tokio::test]
async fn test_cors_allows_frontend_origin() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .uri("/api/credentials/issuance/connection/conn-1/status")
                .header(header::ORIGIN, "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
}
