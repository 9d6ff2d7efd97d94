//! # Credential Issuance
//!
//! Issue credentials from uploaded physical documents, track background
//! issuance jobs, and query or revoke what the agent holds.
//!
//! ## Endpoints
//!
//! | Method & path | Purpose |
//! |---|---|
//! | `POST /api/credentials/issuance/issue-from-document` | Preview or issue |
//! | `POST /api/credentials/issuance/issue-from-document/async` | Issue on a background job |
//! | `GET /api/credentials/issuance/jobs/:job_id` | Job status |
//! | `GET /api/credentials/issuance/status/:exchange_id` | Agent exchange state |
//! | `POST /api/credentials/issuance/revoke/:credential_id` | Revoke |
//! | `GET /api/credentials/issuance/connection/:connection_id/status` | Wallet connection state |

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use credguard_core::{Attributes, PhysicalDocument, ProcessingStatus};
use credguard_issuance::{is_active_status, JobStatus, PREVIEW_MESSAGE, STATUS_ERROR};
use credguard_vc::{CredentialIssuanceResult, CredentialSubject, VerifiableCredential};

use crate::error::AppError;
use crate::extractors::{IssuanceForm, UploadForm};
use crate::state::AppState;

/// Message on a successful synchronous issuance.
pub const ISSUED_RESPONSE_MESSAGE: &str = "Credential issued successfully";

/// Build the issuance router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/credentials/issuance/issue-from-document",
            post(issue_from_document),
        )
        .route(
            "/api/credentials/issuance/issue-from-document/async",
            post(issue_from_document_async),
        )
        .route("/api/credentials/issuance/jobs/:job_id", get(job_status))
        .route(
            "/api/credentials/issuance/status/:exchange_id",
            get(exchange_status),
        )
        .route(
            "/api/credentials/issuance/revoke/:credential_id",
            post(revoke_credential),
        )
        .route(
            "/api/credentials/issuance/connection/:connection_id/status",
            get(connection_status),
        )
}

// ── Response DTOs ───────────────────────────────────────────────────

/// Body of the issue-from-document endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuanceResponse {
    pub success: bool,
    pub message: String,
    pub document: Option<DocumentInfo>,
    pub credential: Option<CredentialInfo>,
    pub issuance: Option<IssuanceInfo>,
}

impl IssuanceResponse {
    fn preview(document: &PhysicalDocument, credential: &VerifiableCredential) -> Self {
        Self {
            success: true,
            message: PREVIEW_MESSAGE.to_string(),
            document: Some(DocumentInfo::from_document(document)),
            credential: Some(CredentialInfo::from(credential)),
            issuance: None,
        }
    }

    fn issued(result: &CredentialIssuanceResult, file_name: &str) -> Self {
        let credential = result.verifiable_credential();
        Self {
            success: true,
            message: ISSUED_RESPONSE_MESSAGE.to_string(),
            document: credential.map(|vc| DocumentInfo::from_issued(vc, file_name)),
            credential: credential.map(CredentialInfo::from),
            issuance: Some(IssuanceInfo::from(result)),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            document: None,
            credential: None,
            issuance: None,
        }
    }
}

/// The source document, without its bytes.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInfo {
    pub id: String,
    pub document_type: String,
    pub file_name: String,
    pub status: String,
    pub extracted_attributes: Attributes,
    pub uploaded_at: DateTime<Utc>,
}

impl DocumentInfo {
    fn from_document(document: &PhysicalDocument) -> Self {
        Self {
            id: document.id().to_string(),
            document_type: document.document_type().display_name().to_string(),
            file_name: document.file_name().to_string(),
            status: document.status().display_name().to_string(),
            extracted_attributes: document.extracted_attributes().clone(),
            uploaded_at: document.uploaded_at(),
        }
    }

    /// Rebuilt from the credential: the pipeline consumes the document.
    fn from_issued(credential: &VerifiableCredential, file_name: &str) -> Self {
        let subject = credential.credential_subject();
        Self {
            id: credential.source_document_id().to_string(),
            document_type: subject.document_type.clone(),
            file_name: file_name.to_string(),
            status: ProcessingStatus::CredentialIssued.display_name().to_string(),
            extracted_attributes: subject.attributes.clone(),
            uploaded_at: credential.issuance_date(),
        }
    }
}

/// Credential summary with display names.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialInfo {
    pub id: String,
    pub context: Vec<String>,
    #[serde(rename = "type")]
    pub credential_type: Vec<String>,
    pub issuer: String,
    pub credential_subject: CredentialSubject,
    pub issuance_date: DateTime<Utc>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
}

impl From<&VerifiableCredential> for CredentialInfo {
    fn from(credential: &VerifiableCredential) -> Self {
        Self {
            id: credential.id().to_string(),
            context: credential.context().to_vec(),
            credential_type: credential.credential_type().to_vec(),
            issuer: credential.issuer().display_name().to_string(),
            credential_subject: credential.credential_subject().clone(),
            issuance_date: credential.issuance_date(),
            expiration_date: credential.expiration_date(),
            status: credential.issuance_status().display_name().to_string(),
            status_message: credential.status_message().map(str::to_string),
        }
    }
}

/// Agent-side delivery details.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuanceInfo {
    pub credential_exchange_id: Option<String>,
    pub offer_url: Option<String>,
    pub connection_id: Option<String>,
    pub wallet_did: Option<String>,
    pub processing_time_ms: u64,
    pub processed_at: DateTime<Utc>,
}

impl From<&CredentialIssuanceResult> for IssuanceInfo {
    fn from(result: &CredentialIssuanceResult) -> Self {
        let credential = result.verifiable_credential();
        Self {
            credential_exchange_id: result.credential_exchange_id().map(str::to_string),
            offer_url: result.offer_url().map(str::to_string),
            connection_id: credential
                .and_then(VerifiableCredential::connection_id)
                .map(str::to_string),
            wallet_did: credential.map(|vc| vc.wallet_did().to_string()),
            processing_time_ms: result.processing_time_ms(),
            processed_at: result.processed_at(),
        }
    }
}

/// Body of the async endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAccepted {
    pub job_id: String,
    pub message: String,
}

/// Body of the job status endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub job_id: String,
    #[serde(flatten)]
    pub status: JobStatus,
}

/// Body of the exchange status endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialStatusResponse {
    pub credential_id: Option<String>,
    pub exchange_id: String,
    pub status: String,
    pub message: String,
    pub active: bool,
}

// ── Handlers ────────────────────────────────────────────────────────

async fn issue_from_document(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<IssuanceResponse>), AppError> {
    let form = IssuanceForm::from_upload(UploadForm::read(multipart).await?)?;
    tracing::info!(
        file_name = %form.file.file_name,
        document_type = form.document_type.as_str(),
        wallet_did = %form.wallet_did,
        preview = form.preview_only,
        "issuance requested"
    );

    if form.preview_only {
        let document = state
            .orchestrator
            .parse_only(form.file.bytes, &form.file.file_name, form.document_type)
            .await?;
        let credential = state
            .orchestrator
            .build_only(&document, &form.wallet_did)
            .with_status_message(PREVIEW_MESSAGE);
        return Ok((
            StatusCode::OK,
            Json(IssuanceResponse::preview(&document, &credential)),
        ));
    }

    let file_name = form.file.file_name.clone();
    match state.orchestrator.issue(form.into_request()).await {
        Ok(result) if result.success() => Ok((
            StatusCode::OK,
            Json(IssuanceResponse::issued(&result, &file_name)),
        )),
        Ok(result) => {
            let message = result
                .error_message()
                .unwrap_or("credential issuance failed")
                .to_string();
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(IssuanceResponse::failure(message)),
            ))
        }
        Err(err) => {
            let message = error_chain(&err);
            tracing::error!(file_name = %file_name, error = %message, "issuance aborted");
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(IssuanceResponse::failure(message)),
            ))
        }
    }
}

async fn issue_from_document_async(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<JobAccepted>), AppError> {
    let form = IssuanceForm::from_upload(UploadForm::read(multipart).await?)?;
    if form.preview_only {
        return Err(AppError::BadRequest(
            "Preview mode is not supported for async operations".into(),
        ));
    }

    let job_id = state.jobs.submit(&state.orchestrator, form.into_request());
    let message = format!("Credential issuance started. Job ID: {job_id}");
    Ok((StatusCode::ACCEPTED, Json(JobAccepted { job_id, message })))
}

async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobStatusResponse>, AppError> {
    let status = state
        .jobs
        .get(&job_id)
        .ok_or_else(|| AppError::NotFound(format!("job {job_id}")))?;
    Ok(Json(JobStatusResponse { job_id, status }))
}

async fn exchange_status(
    State(state): State<AppState>,
    Path(exchange_id): Path<String>,
) -> (StatusCode, Json<CredentialStatusResponse>) {
    let status = state.orchestrator.status(&exchange_id).await;
    let (code, message) = if status == STATUS_ERROR {
        (StatusCode::INTERNAL_SERVER_ERROR, "Failed to retrieve status")
    } else {
        (StatusCode::OK, "Status retrieved successfully")
    };
    let body = CredentialStatusResponse {
        credential_id: None,
        exchange_id,
        active: is_active_status(&status),
        status,
        message: message.to_string(),
    };
    (code, Json(body))
}

async fn revoke_credential(
    State(state): State<AppState>,
    Path(credential_id): Path<String>,
) -> (StatusCode, String) {
    match state.orchestrator.revoke(&credential_id).await {
        Ok(true) => (StatusCode::OK, "Credential revoked successfully".into()),
        Ok(false) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to revoke credential".into(),
        ),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to revoke credential: {err}"),
        ),
    }
}

async fn connection_status(
    State(state): State<AppState>,
    Path(connection_id): Path<String>,
) -> (StatusCode, String) {
    let status = state.orchestrator.connection_status(&connection_id).await;
    if status == STATUS_ERROR {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to get connection status".into(),
        );
    }
    (StatusCode::OK, format!("Connection status: {status}"))
}

/// `err` followed by each of its sources, joined with `: `.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
