//! # Physical Documents
//!
//! A scanned identity document moving through extraction. The document
//! lifecycle is linear with a failure exit:
//!
//! ```text
//! Uploaded ──▶ Processing ──▶ Extracted ──▶ CredentialIssued
//!     │             │             │
//!     └─────────────┴─────────────┴──▶ Failed
//! ```
//!
//! `CredentialIssued` and `Failed` are terminal. Every transition consumes
//! the document and returns a new value.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{CredGuardError, TransitionError};

/// Ordered attribute map extracted from a document.
pub type Attributes = serde_json::Map<String, Value>;

/// File name recorded when the caller supplies none.
pub const UNKNOWN_FILE_NAME: &str = "unknown";

// ── Document Type ───────────────────────────────────────────────────

/// Supported physical document kinds and their issuance policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    /// Travel passport.
    Passport,
    /// Driver's license.
    DriversLicense,
    /// University degree certificate.
    DegreeCertificate,
    /// Civil birth certificate.
    BirthCertificate,
    /// Any other identity document.
    Other,
}

impl DocumentType {
    /// Every document type, in declaration order.
    pub const ALL: [DocumentType; 5] = [
        Self::Passport,
        Self::DriversLicense,
        Self::DegreeCertificate,
        Self::BirthCertificate,
        Self::Other,
    ];

    /// Wire name, as used in form fields and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passport => "PASSPORT",
            Self::DriversLicense => "DRIVERS_LICENSE",
            Self::DegreeCertificate => "DEGREE_CERTIFICATE",
            Self::BirthCertificate => "BIRTH_CERTIFICATE",
            Self::Other => "OTHER",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Passport => "Passport",
            Self::DriversLicense => "Driver's License",
            Self::DegreeCertificate => "Degree Certificate",
            Self::BirthCertificate => "Birth Certificate",
            Self::Other => "Other Document",
        }
    }

    /// Fields whose absence is logged after extraction. Never enforced.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Passport => &["passportNumber", "fullName", "nationality"],
            Self::DriversLicense => &["licenseNumber", "fullName"],
            Self::DegreeCertificate => &["studentName", "degreeName", "university"],
            Self::BirthCertificate => &["fullName", "dateOfBirth"],
            Self::Other => &["holderName"],
        }
    }

    /// Full claim schema requested from the vision collaborator.
    pub fn claim_fields(&self) -> &'static [&'static str] {
        match self {
            Self::Passport => &[
                "passportNumber",
                "fullName",
                "nationality",
                "dateOfBirth",
                "placeOfBirth",
                "gender",
                "issuingCountry",
                "issueDate",
                "expiryDate",
            ],
            Self::DriversLicense => &[
                "licenseNumber",
                "fullName",
                "address",
                "dateOfBirth",
                "gender",
                "licenseClass",
                "issueDate",
                "expiryDate",
                "issuingState",
            ],
            Self::DegreeCertificate => &[
                "studentName",
                "degreeName",
                "major",
                "university",
                "graduationDate",
                "gpa",
                "honors",
            ],
            Self::BirthCertificate => &[
                "fullName",
                "dateOfBirth",
                "placeOfBirth",
                "parentNames",
                "gender",
                "registrationNumber",
                "issuingAuthority",
            ],
            Self::Other => &[
                "documentNumber",
                "holderName",
                "issueDate",
                "expiryDate",
                "issuingAuthority",
                "additionalInfo",
            ],
        }
    }

    /// Credential validity in years.
    pub fn validity_years(&self) -> i64 {
        match self {
            Self::Passport => 10,
            Self::DriversLicense => 5,
            Self::DegreeCertificate => 50,
            Self::BirthCertificate => 100,
            Self::Other => 2,
        }
    }

    /// Credential validity as a duration of `years × 365` days.
    pub fn validity_period(&self) -> Duration {
        Duration::days(self.validity_years() * 365)
    }

    /// Second entry of the VC `type` list.
    pub fn credential_subtype(&self) -> &'static str {
        match self {
            Self::Passport => "PassportCredential",
            Self::DriversLicense => "DriversLicenseCredential",
            Self::DegreeCertificate => "EducationCredential",
            Self::BirthCertificate => "BirthCertificateCredential",
            Self::Other => "DocumentCredential",
        }
    }

    /// Extraction instruction handed to the vision collaborator.
    ///
    /// Asks for the credential bundle shape with a `claims` object holding
    /// this type's claim schema.
    pub fn extraction_instruction(&self) -> String {
        let claims: serde_json::Map<String, Value> = self
            .claim_fields()
            .iter()
            .map(|field| ((*field).to_string(), Value::String("string".into())))
            .collect();
        let shape = serde_json::json!({
            "id": "string",
            "type": "string",
            "issuer": { "id": "string", "displayName": "string", "trusted": "boolean" },
            "subject": "string",
            "issuedAt": "ISO-8601 date-time",
            "expiresAt": "ISO-8601 date-time or null",
            "claims": claims,
        });
        let shape = serde_json::to_string_pretty(&shape).unwrap_or_default();
        format!(
            "Extract all information from this {} image. Respond with a single JSON object \
             of exactly this shape, using null for any value that cannot be read:\n{}",
            self.display_name(),
            shape
        )
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = CredGuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CredGuardError::InvalidInput(format!("unknown document type: {s}")))
    }
}

// ── Processing Status ───────────────────────────────────────────────

/// Where a document is in the extraction lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStatus {
    /// Received, not yet sent for extraction.
    Uploaded,
    /// Extraction in progress.
    Processing,
    /// Attributes attached.
    Extracted,
    /// A credential was issued from this document.
    CredentialIssued,
    /// Extraction failed; see the document's error message.
    Failed,
}

impl ProcessingStatus {
    /// Whether no further transitions are allowed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::CredentialIssued | Self::Failed)
    }

    /// Canonical state name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploaded => "UPLOADED",
            Self::Processing => "PROCESSING",
            Self::Extracted => "EXTRACTED",
            Self::CredentialIssued => "CREDENTIAL_ISSUED",
            Self::Failed => "FAILED",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Uploaded => "Uploaded",
            Self::Processing => "Processing",
            Self::Extracted => "Attributes Extracted",
            Self::CredentialIssued => "Credential Issued",
            Self::Failed => "Processing Failed",
        }
    }

    /// Whether `next` is an edge out of this state.
    pub fn can_transition_to(&self, next: ProcessingStatus) -> bool {
        use ProcessingStatus::*;
        match (self, next) {
            (Uploaded, Processing) | (Processing, Extracted) | (Extracted, CredentialIssued) => {
                true
            }
            (from, Failed) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Physical Document ───────────────────────────────────────────────

/// An uploaded document and whatever has been extracted from it so far.
#[derive(Clone, PartialEq)]
pub struct PhysicalDocument {
    id: String,
    document_type: DocumentType,
    file_name: String,
    uploaded_at: DateTime<Utc>,
    file_bytes: Vec<u8>,
    extracted_attributes: Attributes,
    status: ProcessingStatus,
    error_message: Option<String>,
}

impl std::fmt::Debug for PhysicalDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicalDocument")
            .field("id", &self.id)
            .field("document_type", &self.document_type)
            .field("file_name", &self.file_name)
            .field("uploaded_at", &self.uploaded_at)
            .field("file_bytes", &format!("[{} bytes]", self.file_bytes.len()))
            .field("extracted_attributes", &self.extracted_attributes)
            .field("status", &self.status)
            .field("error_message", &self.error_message)
            .finish()
    }
}

impl PhysicalDocument {
    /// Accept an upload. The document starts in [`ProcessingStatus::Uploaded`]
    /// with a fresh `doc-<uuid>` identifier.
    ///
    /// # Errors
    ///
    /// [`CredGuardError::InvalidInput`] when `file_bytes` is empty.
    pub fn uploaded(
        file_bytes: Vec<u8>,
        file_name: &str,
        document_type: DocumentType,
    ) -> Result<Self, CredGuardError> {
        if file_bytes.is_empty() {
            return Err(CredGuardError::InvalidInput(
                "file bytes must not be empty".into(),
            ));
        }
        let file_name = match file_name.trim() {
            "" => UNKNOWN_FILE_NAME.to_string(),
            name => name.to_string(),
        };
        Ok(Self {
            id: format!("doc-{}", Uuid::new_v4()),
            document_type,
            file_name,
            uploaded_at: Utc::now(),
            file_bytes,
            extracted_attributes: Attributes::new(),
            status: ProcessingStatus::Uploaded,
            error_message: None,
        })
    }

    /// `Uploaded → Processing`.
    pub fn start_processing(self) -> Result<Self, TransitionError> {
        self.transition(ProcessingStatus::Processing)
    }

    /// `Processing → Extracted`, attaching the extracted attributes.
    pub fn with_extracted_attributes(self, attributes: Attributes) -> Result<Self, TransitionError> {
        let mut next = self.transition(ProcessingStatus::Extracted)?;
        next.extracted_attributes = attributes;
        Ok(next)
    }

    /// `Extracted → CredentialIssued`.
    pub fn mark_credential_issued(self) -> Result<Self, TransitionError> {
        self.transition(ProcessingStatus::CredentialIssued)
    }

    /// Any non-terminal state `→ Failed`, recording why.
    pub fn fail(self, message: impl Into<String>) -> Result<Self, TransitionError> {
        let mut next = self.transition(ProcessingStatus::Failed)?;
        next.error_message = Some(message.into());
        Ok(next)
    }

    fn transition(mut self, next: ProcessingStatus) -> Result<Self, TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::AlreadyTerminal {
                machine: "document",
                state: self.status.as_str(),
            });
        }
        if !self.status.can_transition_to(next) {
            return Err(TransitionError::InvalidTransition {
                machine: "document",
                from: self.status.as_str(),
                to: next.as_str(),
            });
        }
        self.status = next;
        Ok(self)
    }

    /// Required fields for this document's type that are absent, null, or
    /// blank text in the extracted attributes.
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        self.document_type
            .required_fields()
            .iter()
            .copied()
            .filter(|field| match self.extracted_attributes.get(*field) {
                None | Some(Value::Null) => true,
                Some(Value::String(s)) => s.trim().is_empty(),
                Some(_) => false,
            })
            .collect()
    }

    /// Document identifier (`doc-<uuid>`).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Declared document type.
    pub fn document_type(&self) -> DocumentType {
        self.document_type
    }

    /// Uploaded file name, `unknown` when none was given.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Upload time.
    pub fn uploaded_at(&self) -> DateTime<Utc> {
        self.uploaded_at
    }

    /// Raw file content.
    pub fn file_bytes(&self) -> &[u8] {
        &self.file_bytes
    }

    /// Attributes attached by extraction; empty before `Extracted`.
    pub fn extracted_attributes(&self) -> &Attributes {
        &self.extracted_attributes
    }

    /// Current lifecycle state.
    pub fn status(&self) -> ProcessingStatus {
        self.status
    }

    /// Failure reason, set only in [`ProcessingStatus::Failed`].
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }
}
