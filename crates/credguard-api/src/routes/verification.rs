//! # Credential Verification
//!
//! - `POST /api/credentials/verify`: verify a credential given as JSON.
//! - `POST /api/credentials/upload`: read a credential from an uploaded
//!   image, then verify it.
//!
//! Both answer with the full [`VerificationResult`]; the status is 200 when
//! the credential is valid and 400 otherwise.

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};

use credguard_core::Credential;
use credguard_verify::VerificationResult;

use crate::error::AppError;
use crate::extractors::{extract_json, UploadForm};
use crate::state::AppState;

/// Build the verification router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/credentials/verify", post(verify_credential))
        .route("/api/credentials/upload", post(upload_and_verify))
}

fn verdict(result: VerificationResult) -> (StatusCode, Json<VerificationResult>) {
    let status = if result.valid {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, Json(result))
}

async fn verify_credential(
    State(state): State<AppState>,
    body: Result<Json<Credential>, JsonRejection>,
) -> Result<(StatusCode, Json<VerificationResult>), AppError> {
    let credential = extract_json(body)?;
    credential.validate()?;
    tracing::info!(credential_id = %credential.id, "verification requested");

    let result = state.verifier.verify(&credential).await;
    Ok(verdict(result))
}

async fn upload_and_verify(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<VerificationResult>), AppError> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file()?;
    tracing::info!(file_name = %file.file_name, bytes = file.bytes.len(), "credential upload received");

    let credential = state
        .orchestrator
        .extractor()
        .extract_credential(&file.bytes, &file.file_name)
        .await
        .map_err(|err| {
            tracing::error!(file_name = %file.file_name, error = %err, "credential extraction failed");
            AppError::from(err)
        })?;

    let result = state.verifier.verify(&credential).await;
    Ok(verdict(result))
}
