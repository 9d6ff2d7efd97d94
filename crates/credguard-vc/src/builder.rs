//! # Credential Builder
//!
//! Assembles a [`VerifiableCredential`] from an extracted document. Pure
//! data assembly: the only inputs not taken from the arguments are the
//! current time (issuance date and proof creation).

use chrono::{DateTime, Utc};

use credguard_core::{Issuer, PhysicalDocument};

use crate::credential::{CredentialSubject, VerifiableCredential};
use crate::proof::Proof;
use crate::status::IssuanceStatus;

/// JSON-LD contexts on every credential, in order.
pub const DEFAULT_CONTEXT: [&str; 2] = [
    "https://www.w3.org/2018/credentials/v1",
    "https://www.w3.org/2018/credentials/examples/v1",
];

/// Base credential type, always first in the `type` list.
pub const BASE_CREDENTIAL_TYPE: &str = "VerifiableCredential";

/// Connection placeholder for credentials built without an agent handshake.
pub const PREVIEW_CONNECTION_ID: &str = "preview-connection";

impl VerifiableCredential {
    /// Build a `Created` credential for `wallet_did` from an extracted document.
    pub fn from_document(
        document: &PhysicalDocument,
        issuer: &Issuer,
        wallet_did: &str,
        connection_id: &str,
    ) -> Self {
        Self::from_document_at(document, issuer, wallet_did, connection_id, Utc::now())
    }

    /// [`from_document`](Self::from_document) with an explicit clock reading.
    ///
    /// Issuance date, expiration date, and proof creation all derive from the
    /// same `now`, so `expiration_date - issuance_date` equals the document
    /// type's validity period exactly.
    pub fn from_document_at(
        document: &PhysicalDocument,
        issuer: &Issuer,
        wallet_did: &str,
        connection_id: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let document_type = document.document_type();
        Self {
            context: DEFAULT_CONTEXT.iter().map(|c| (*c).to_string()).collect(),
            id: format!("urn:credential:{}", document.id()),
            credential_type: vec![
                BASE_CREDENTIAL_TYPE.to_string(),
                document_type.credential_subtype().to_string(),
            ],
            issuer: issuer.clone(),
            credential_subject: CredentialSubject {
                id: wallet_did.to_string(),
                document_type: document_type.display_name().to_string(),
                attributes: document.extracted_attributes().clone(),
            },
            issuance_date: now,
            expiration_date: Some(now + document_type.validity_period()),
            proof: Proof::assertion(now),
            connection_id: Some(connection_id.to_string()),
            wallet_did: wallet_did.to_string(),
            issuance_status: IssuanceStatus::Created,
            status_message: Some(format!(
                "Credential created from document: {}",
                document.file_name()
            )),
            source_document_id: document.id().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use credguard_core::{Attributes, DocumentType};
    use proptest::prelude::*;
    use serde_json::json;

    fn extracted(doc_type: DocumentType) -> PhysicalDocument {
        let mut attrs = Attributes::new();
        attrs.insert("fullName".into(), json!("Ada Lovelace"));
        attrs.insert("documentType".into(), json!(doc_type.display_name()));
        PhysicalDocument::uploaded(b"scan".to_vec(), "scan.jpg", doc_type)
            .unwrap()
            .start_processing()
            .unwrap()
            .with_extracted_attributes(attrs)
            .unwrap()
    }

    #[test]
    fn builds_created_credential_from_document() {
        let doc = extracted(DocumentType::Passport);
        let vc = VerifiableCredential::from_document(
            &doc,
            &Issuer::credguard(),
            "did:example:wallet",
            "conn-42",
        );

        assert_eq!(vc.id(), format!("urn:credential:{}", doc.id()));
        assert_eq!(vc.source_document_id(), doc.id());
        assert_eq!(vc.credential_type(), ["VerifiableCredential", "PassportCredential"]);
        assert_eq!(vc.context(), DEFAULT_CONTEXT);
        assert_eq!(vc.issuance_status(), IssuanceStatus::Created);
        assert_eq!(vc.connection_id(), Some("conn-42"));
        assert_eq!(vc.wallet_did(), "did:example:wallet");
        assert_eq!(vc.credential_subject().id, "did:example:wallet");
        assert_eq!(vc.credential_subject().document_type, "Passport");
        assert_eq!(vc.credential_subject().attributes["fullName"], "Ada Lovelace");
        assert_eq!(
            vc.status_message(),
            Some("Credential created from document: scan.jpg")
        );
    }

    #[test]
    fn proof_is_created_with_the_credential() {
        let now: DateTime<Utc> = "2025-06-01T08:30:00Z".parse().unwrap();
        let doc = extracted(DocumentType::Other);
        let vc = VerifiableCredential::from_document_at(&doc, &Issuer::credguard(), "w", "c", now);
        assert_eq!(vc.proof().created, now);
        assert_eq!(vc.issuance_date(), now);
        assert_eq!(vc.expiration_date(), Some(now + Duration::days(730)));
    }

    #[test]
    fn identical_inputs_build_identical_content() {
        let doc = extracted(DocumentType::DegreeCertificate);
        let issuer = Issuer::credguard();
        let a = VerifiableCredential::from_document(&doc, &issuer, "did:w", "conn");
        let b = VerifiableCredential::from_document(&doc, &issuer, "did:w", "conn");
        assert_eq!(a.id(), b.id());
        assert_eq!(a.credential_type(), b.credential_type());
        assert_eq!(a.credential_subject(), b.credential_subject());
    }

    fn any_document_type() -> impl Strategy<Value = DocumentType> {
        prop::sample::select(DocumentType::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn expiration_is_issuance_plus_policy(doc_type in any_document_type(), offset in 0i64..4_000_000_000) {
            let now = DateTime::<Utc>::from_timestamp(offset, 0).unwrap();
            let doc = extracted(doc_type);
            let vc = VerifiableCredential::from_document_at(&doc, &Issuer::credguard(), "did:w", "conn", now);
            let expiry = vc.expiration_date().unwrap();
            prop_assert_eq!(expiry - vc.issuance_date(), doc_type.validity_period());
            prop_assert_eq!(vc.source_document_id(), doc.id());
        }
    }
}
