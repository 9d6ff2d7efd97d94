//! # Vision Collaborator
//!
//! Turns a document image into a credential-shaped attribute bundle.
//!
//! ## Architecture
//!
//! The [`VisionClient`] trait abstracts over the backend. Deployments pick
//! [`OpenAiVisionClient`] (an OpenAI-compatible chat-completions endpoint
//! with image input) or [`MockVisionClient`], which returns the same
//! canonical sample for every input so pipelines are reproducible in tests.
//!
//! ## Response Mapping
//!
//! The model is asked for a JSON object shaped like [`Credential`]. Missing
//! envelope fields fall back to neutral defaults because extraction is
//! best-effort; only a response that is not a JSON object at all fails.
//! Dates accept RFC 3339 instants or bare `YYYY-MM-DD` (midnight UTC).

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use credguard_core::{Attributes, Credential, Issuer};

use crate::config::VisionConfig;
use crate::error::ClientError;

/// Instruction used when the caller supplies none.
pub const DEFAULT_INSTRUCTION: &str = "Extract the verifiable credential shown in this image. \
Respond with a single JSON object with the keys id, type, issuer {id, displayName, trusted}, \
subject, issuedAt, expiresAt, and claims (an object of every other field you can read).";

const ENDPOINT: &str = "POST chat/completions";

/// Backend that reads documents.
#[async_trait]
pub trait VisionClient: Send + Sync {
    /// Short name for logs.
    fn client_name(&self) -> &str;

    /// Read `file_bytes` and return what it says as a credential bundle.
    ///
    /// `instruction` overrides [`DEFAULT_INSTRUCTION`], e.g. with a
    /// document-type-specific claim schema.
    async fn extract(
        &self,
        file_bytes: &[u8],
        file_name: &str,
        instruction: Option<&str>,
    ) -> Result<Credential, ClientError>;
}

// ── Mock ────────────────────────────────────────────────────────────

/// Deterministic vision backend.
///
/// Every call returns [`MockVisionClient::sample`] with expiry 365 days out.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockVisionClient;

impl MockVisionClient {
    /// Identifier of the canned credential.
    pub const CREDENTIAL_ID: &'static str = "mock-credential-123";

    /// The canned credential, issued at `now`.
    pub fn sample(now: DateTime<Utc>) -> Result<Credential, ClientError> {
        let issuer = Issuer::new("did:example:issuer", "Mock Issuer", true).map_err(|e| {
            ClientError::MalformedResponse {
                endpoint: "mock".into(),
                reason: e.to_string(),
            }
        })?;
        let mut claims = Attributes::new();
        claims.insert("degree".into(), json!("Bachelor of Science"));
        claims.insert("university".into(), json!("Example University"));
        Ok(Credential {
            id: Self::CREDENTIAL_ID.to_string(),
            credential_type: "VerifiableCredential".to_string(),
            issuer,
            subject: "did:example:subject".to_string(),
            issued_at: now,
            expires_at: Some(now + chrono::Duration::days(365)),
            claims,
        })
    }
}

#[async_trait]
impl VisionClient for MockVisionClient {
    fn client_name(&self) -> &str {
        "mock"
    }

    async fn extract(
        &self,
        file_bytes: &[u8],
        file_name: &str,
        _instruction: Option<&str>,
    ) -> Result<Credential, ClientError> {
        tracing::debug!(file_name, bytes = file_bytes.len(), "mock vision extraction");
        Self::sample(Utc::now())
    }
}

// ── Live ────────────────────────────────────────────────────────────

/// OpenAI-compatible chat-completions vision backend.
#[derive(Debug, Clone)]
pub struct OpenAiVisionClient {
    http: reqwest::Client,
    config: VisionConfig,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl OpenAiVisionClient {
    /// Build a client. A missing API key is accepted here; each call then
    /// fails with [`ClientError::NotConfigured`].
    pub fn new(config: VisionConfig) -> Result<Self, ClientError> {
        if config.api_key.is_none() {
            tracing::warn!("vision API key not set; live extraction calls will fail");
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ClientError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;
        Ok(Self { http, config })
    }

    fn request_body(&self, file_bytes: &[u8], file_name: &str, instruction: &str) -> Value {
        let data_url = format!(
            "data:{};base64,{}",
            mime_type_for(file_name),
            STANDARD.encode(file_bytes)
        );
        json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "response_format": { "type": "json_object" },
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": instruction },
                    { "type": "image_url", "image_url": { "url": data_url } }
                ]
            }]
        })
    }
}

#[async_trait]
impl VisionClient for OpenAiVisionClient {
    fn client_name(&self) -> &str {
        "openai"
    }

    async fn extract(
        &self,
        file_bytes: &[u8],
        file_name: &str,
        instruction: Option<&str>,
    ) -> Result<Credential, ClientError> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| ClientError::NotConfigured("OPENAI_API_KEY".into()))?;
        let body = self.request_body(file_bytes, file_name, instruction.unwrap_or(DEFAULT_INSTRUCTION));

        tracing::info!(file_name, model = %self.config.model, "requesting vision extraction");
        let resp = self
            .http
            .post(self.config.api_url.clone())
            .bearer_auth(api_key.as_str())
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: ENDPOINT.into(),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::ApiError {
                endpoint: ENDPOINT.into(),
                status,
                body,
            });
        }

        let completion: ChatCompletion =
            resp.json().await.map_err(|e| ClientError::Deserialization {
                endpoint: ENDPOINT.into(),
                source: e,
            })?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| malformed("response has no message content"))?;
        let parsed: Value = serde_json::from_str(&content)
            .map_err(|e| malformed(format!("message content is not JSON: {e}")))?;
        credential_from_json(&parsed)
    }
}

fn malformed(reason: impl Into<String>) -> ClientError {
    ClientError::MalformedResponse {
        endpoint: ENDPOINT.into(),
        reason: reason.into(),
    }
}

/// Map a model response object onto a [`Credential`].
pub fn credential_from_json(value: &Value) -> Result<Credential, ClientError> {
    let obj = value
        .as_object()
        .ok_or_else(|| malformed("extraction result is not a JSON object"))?;
    let text = |v: Option<&Value>, default: &str| -> String {
        v.and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(default)
            .to_string()
    };

    let issuer_obj = obj.get("issuer");
    let issuer = Issuer::new(
        text(issuer_obj.and_then(|i| i.get("id")), "did:unknown:issuer"),
        text(issuer_obj.and_then(|i| i.get("displayName")), "Unknown Issuer"),
        issuer_obj
            .and_then(|i| i.get("trusted"))
            .and_then(Value::as_bool)
            .unwrap_or(false),
    )
    .map_err(|e| malformed(e.to_string()))?;

    let claims = match obj.get("claims") {
        Some(Value::Object(map)) => map.clone(),
        _ => Attributes::new(),
    };

    Ok(Credential {
        id: text(obj.get("id"), &format!("extracted-{}", uuid::Uuid::new_v4())),
        credential_type: text(obj.get("type"), "VerifiableCredential"),
        issuer,
        subject: text(obj.get("subject"), "unknown"),
        issued_at: obj
            .get("issuedAt")
            .and_then(parse_instant)
            .unwrap_or_else(Utc::now),
        expires_at: obj.get("expiresAt").and_then(parse_instant),
        claims,
    })
}

/// Parse an RFC 3339 instant or a `YYYY-MM-DD` date at midnight UTC.
pub fn parse_instant(value: &Value) -> Option<DateTime<Utc>> {
    let raw = value.as_str()?.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
}

/// MIME type for the data URL, from the file extension.
pub fn mime_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn mock_returns_canonical_sample() {
        let cred = MockVisionClient.extract(b"anything", "x.png", None).await.unwrap();
        assert_eq!(cred.id, "mock-credential-123");
        assert_eq!(cred.claims["degree"], "Bachelor of Science");
        assert_eq!(cred.claims["university"], "Example University");
        assert_eq!(cred.issuer.id(), "did:example:issuer");
        assert_eq!(cred.issuer.display_name(), "Mock Issuer");
        assert!(cred.issuer.trusted());
        assert_eq!(cred.subject, "did:example:subject");
        let expiry = cred.expires_at.unwrap();
        assert_eq!((expiry - cred.issued_at).num_days(), 365);
    }

    #[test]
    fn client_trait_is_object_safe() {
        let client: Arc<dyn VisionClient> = Arc::new(MockVisionClient);
        assert_eq!(client.client_name(), "mock");
    }

    #[test]
    fn maps_full_response() {
        let cred = credential_from_json(&json!({
            "id": "passport-77",
            "type": "PassportCredential",
            "issuer": { "id": "did:gov:nz", "displayName": "NZ Passport Office", "trusted": true },
            "subject": "did:example:kiri",
            "issuedAt": "2020-02-01",
            "expiresAt": "2030-02-01T00:00:00Z",
            "claims": { "passportNumber": "LA123456", "fullName": "Kiri Smith" }
        }))
        .unwrap();
        assert_eq!(cred.id, "passport-77");
        assert_eq!(cred.issuer.display_name(), "NZ Passport Office");
        assert_eq!(cred.issued_at.to_rfc3339(), "2020-02-01T00:00:00+00:00");
        assert_eq!(cred.expires_at.unwrap().to_rfc3339(), "2030-02-01T00:00:00+00:00");
        assert_eq!(cred.claims["passportNumber"], "LA123456");
    }

    #[test]
    fn sparse_response_gets_neutral_defaults() {
        let cred = credential_from_json(&json!({ "claims": { "holderName": "Sam" } })).unwrap();
        assert!(cred.id.starts_with("extracted-"));
        assert_eq!(cred.credential_type, "VerifiableCredential");
        assert!(!cred.issuer.trusted());
        assert!(cred.expires_at.is_none());
        assert_eq!(cred.claims["holderName"], "Sam");
    }

    #[test]
    fn non_object_response_is_malformed() {
        let err = credential_from_json(&json!(["not", "an", "object"])).unwrap_err();
        assert!(matches!(err, ClientError::MalformedResponse { .. }));
    }

    #[test]
    fn unparseable_dates_are_dropped() {
        assert!(parse_instant(&json!("next tuesday")).is_none());
        assert!(parse_instant(&json!(20240101)).is_none());
    }

    #[test]
    fn mime_types_follow_extension() {
        assert_eq!(mime_type_for("scan.PDF"), "application/pdf");
        assert_eq!(mime_type_for("photo.jpeg"), "image/jpeg");
        assert_eq!(mime_type_for("photo.webp"), "image/webp");
        assert_eq!(mime_type_for("no-extension"), "image/png");
    }

    #[tokio::test]
    async fn live_client_without_key_is_not_configured() {
        let config = VisionConfig::live("http://127.0.0.1:1/v1/chat/completions", None).unwrap();
        let client = OpenAiVisionClient::new(config).unwrap();
        let err = client.extract(b"img", "a.png", None).await.unwrap_err();
        assert!(err.is_configuration());
    }
}
