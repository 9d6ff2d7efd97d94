//! # Request Extraction
//!
//! JSON and multipart helpers that turn extractor rejections into
//! [`AppError`]s, plus the typed issuance form.

use std::collections::HashMap;
use std::str::FromStr;

use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;

use credguard_core::DocumentType;
use credguard_issuance::IssuanceRequest;

use crate::error::AppError;

/// Multipart field carrying the uploaded document.
pub const FILE_FIELD: &str = "file";

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

// ── Multipart ───────────────────────────────────────────────────────

/// One uploaded file.
pub struct UploadedFile {
    /// Client-supplied file name; empty when the part carried none.
    pub file_name: String,
    /// File content.
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedFile")
            .field("file_name", &self.file_name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// A fully-read multipart form: the `file` part and every text field.
#[derive(Debug, Default)]
pub struct UploadForm {
    file: Option<UploadedFile>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    /// Read every part of `multipart`.
    pub async fn read(multipart: Result<Multipart, MultipartRejection>) -> Result<Self, AppError> {
        let mut multipart = multipart.map_err(|err| AppError::BadRequest(err.body_text()))?;
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            if name == FILE_FIELD {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                form.file = Some(UploadedFile {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            } else {
                let value = field.text().await.map_err(multipart_error)?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    /// The uploaded file. Missing or empty files are rejected.
    pub fn take_file(&mut self) -> Result<UploadedFile, AppError> {
        match self.file.take() {
            Some(file) if !file.bytes.is_empty() => Ok(file),
            _ => Err(AppError::BadRequest(
                "File is required and cannot be empty".into(),
            )),
        }
    }

    /// A text field, if present.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}

// ── Issuance Form ───────────────────────────────────────────────────

/// The issue-from-document form: `file`, `documentType`, `walletDid`,
/// and optional `previewOnly`.
#[derive(Debug)]
pub struct IssuanceForm {
    pub file: UploadedFile,
    pub document_type: DocumentType,
    pub wallet_did: String,
    pub preview_only: bool,
}

impl IssuanceForm {
    /// Validate a read form.
    pub fn from_upload(mut form: UploadForm) -> Result<Self, AppError> {
        let file = form.take_file()?;
        let document_type = form
            .field("documentType")
            .ok_or_else(|| AppError::BadRequest("documentType must not be null".into()))
            .and_then(|raw| DocumentType::from_str(raw).map_err(AppError::from))?;
        let wallet_did = form
            .field("walletDid")
            .map(str::trim)
            .filter(|did| !did.is_empty())
            .ok_or_else(|| AppError::BadRequest("walletDid must not be blank".into()))?
            .to_string();
        let preview_only = match form.field("previewOnly").map(str::trim) {
            None | Some("") => false,
            Some(raw) => raw
                .to_ascii_lowercase()
                .parse::<bool>()
                .map_err(|_| AppError::BadRequest(format!("previewOnly must be a boolean: {raw}")))?,
        };
        Ok(Self {
            file,
            document_type,
            wallet_did,
            preview_only,
        })
    }

    /// Hand the form to the issuance pipeline.
    pub fn into_request(self) -> IssuanceRequest {
        IssuanceRequest {
            file_bytes: self.file.bytes,
            file_name: self.file.file_name,
            document_type: self.document_type,
            wallet_did: self.wallet_did,
        }
    }
}
