//! # Document Extractor
//!
//! Turns uploaded bytes into an [`Extracted`](credguard_core::ProcessingStatus::Extracted)
//! [`PhysicalDocument`] by asking the vision collaborator to read the
//! document-type-specific claim schema.
//!
//! ## Required Fields
//!
//! Each [`DocumentType`] names a few required fields. Missing ones are
//! logged as warnings and the document still extracts: extraction is
//! best-effort and downstream consumers decide what partial data is
//! acceptable.
//!
//! ## Errors
//!
//! - Empty bytes: [`CredGuardError::InvalidInput`], before any call.
//! - Missing live credentials: [`CredGuardError::ConfigurationInvalid`].
//! - Any other collaborator failure: the document moves to `Failed` and
//!   the call returns [`CredGuardError::ExtractionFailed`].

use std::sync::Arc;

use serde_json::Value;

use credguard_client::{ClientError, VisionClient};
use credguard_core::{Attributes, CredGuardError, Credential, DocumentType, PhysicalDocument};

/// Attribute key carrying the document type's display name.
pub const DOCUMENT_TYPE_ATTRIBUTE: &str = "documentType";

/// Attribute key carrying the extraction timestamp.
pub const EXTRACTED_AT_ATTRIBUTE: &str = "extractedAt";

/// Reads physical documents through a [`VisionClient`].
#[derive(Clone)]
pub struct DocumentExtractor {
    vision: Arc<dyn VisionClient>,
}

impl std::fmt::Debug for DocumentExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentExtractor")
            .field("vision", &self.vision.client_name())
            .finish()
    }
}

impl DocumentExtractor {
    /// Extractor backed by `vision`.
    pub fn new(vision: Arc<dyn VisionClient>) -> Self {
        Self { vision }
    }

    /// Parse an upload into an extracted document.
    pub async fn parse(
        &self,
        file_bytes: Vec<u8>,
        file_name: &str,
        document_type: DocumentType,
    ) -> Result<PhysicalDocument, CredGuardError> {
        let document = PhysicalDocument::uploaded(file_bytes, file_name, document_type)?;
        let document = document.start_processing()?;
        tracing::info!(
            document_id = document.id(),
            file_name = document.file_name(),
            document_type = document_type.as_str(),
            "extracting document"
        );

        let instruction = document_type.extraction_instruction();
        let extracted = self
            .vision
            .extract(document.file_bytes(), document.file_name(), Some(&instruction))
            .await;

        let bundle = match extracted {
            Ok(bundle) => bundle,
            Err(err) => {
                let stage_error = extraction_error(document.file_name(), err);
                let failed = document.fail(stage_error.to_string())?;
                tracing::warn!(
                    document_id = failed.id(),
                    status = failed.status().as_str(),
                    error = failed.error_message().unwrap_or_default(),
                    "document extraction failed"
                );
                return Err(stage_error);
            }
        };

        let mut attributes: Attributes = bundle.claims;
        attributes.insert(
            DOCUMENT_TYPE_ATTRIBUTE.into(),
            Value::String(document_type.display_name().into()),
        );
        attributes.insert(
            EXTRACTED_AT_ATTRIBUTE.into(),
            Value::String(bundle.issued_at.to_rfc3339()),
        );

        let document = document.with_extracted_attributes(attributes)?;
        let missing = document.missing_required_fields();
        if !missing.is_empty() {
            tracing::warn!(
                document_id = document.id(),
                document_type = document_type.as_str(),
                missing = ?missing,
                "extracted document is missing required fields"
            );
        }
        tracing::info!(
            document_id = document.id(),
            attributes = document.extracted_attributes().len(),
            "document extracted"
        );
        Ok(document)
    }

    /// Read an already-issued credential from an image of it.
    pub async fn extract_credential(
        &self,
        file_bytes: &[u8],
        file_name: &str,
    ) -> Result<Credential, CredGuardError> {
        if file_bytes.is_empty() {
            return Err(CredGuardError::InvalidInput(
                "file bytes must not be empty".into(),
            ));
        }
        tracing::info!(file_name, bytes = file_bytes.len(), "extracting credential");
        self.vision
            .extract(file_bytes, file_name, None)
            .await
            .map_err(|err| extraction_error(file_name, err))
    }
}

fn extraction_error(file_name: &str, err: ClientError) -> CredGuardError {
    if err.is_configuration() {
        return CredGuardError::ConfigurationInvalid(err.to_string());
    }
    CredGuardError::ExtractionFailed {
        file_name: file_name.to_string(),
        reason: err.to_string(),
    }
}
