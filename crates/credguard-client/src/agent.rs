//! # Agent Collaborator (Aries credential exchange)
//!
//! Connection and credential-exchange handshake with the holder's wallet,
//! through an Aries Cloud Agent admin API.
//!
//! ## Endpoints
//!
//! | Operation | Request |
//! |-----------|---------|
//! | invitation | `POST /connections/create-invitation` |
//! | offer | `POST /issue-credential-2.0/send-offer` |
//! | issue | offer, then `POST /issue-credential-2.0/records/{id}/send-credential` |
//! | exchange status | `GET /issue-credential-2.0/records/{id}` |
//! | revoke | `POST /revocation/revoke` |
//! | connection status | `GET /connections/{id}` |
//!
//! Status reads are retried on transport errors. Writes are sent once.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};
use uuid::Uuid;

use credguard_vc::VerifiableCredential;

use crate::config::AgentConfig;
use crate::error::ClientError;
use crate::retry::RetryPolicy;

/// What the agent reports after delivering a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCredential {
    /// Credential exchange record identifier.
    pub exchange_id: String,
    /// Wallet offer link, when the agent provides one.
    pub offer_url: Option<String>,
}

/// Credential-exchange backend.
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Short name for logs.
    fn adapter_name(&self) -> &str;

    /// Open a connection for `wallet_did`; returns the connection id.
    async fn create_connection_invitation(&self, wallet_did: &str) -> Result<String, ClientError>;

    /// Offer `credential` over its connection; returns the exchange id.
    async fn send_offer(&self, credential: &VerifiableCredential) -> Result<String, ClientError>;

    /// Offer and deliver `credential`.
    async fn issue_credential(
        &self,
        credential: &VerifiableCredential,
    ) -> Result<IssuedCredential, ClientError>;

    /// Agent-side state of an exchange, e.g. `credential_acked`.
    async fn exchange_status(&self, exchange_id: &str) -> Result<String, ClientError>;

    /// Revoke a credential. `Ok(false)` means the agent rejected it.
    async fn revoke(&self, credential_id: &str) -> Result<bool, ClientError>;

    /// Agent-side state of a connection, e.g. `active`.
    async fn connection_status(&self, connection_id: &str) -> Result<String, ClientError>;
}

// ── Mock ────────────────────────────────────────────────────────────

/// Deterministic agent backend. Never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockAgentClient;

impl MockAgentClient {
    /// Exchange state reported for every exchange.
    pub const EXCHANGE_STATE: &'static str = "credential_acked";
    /// Connection state reported for every connection.
    pub const CONNECTION_STATE: &'static str = "active";
    /// Prefix of generated offer links.
    pub const OFFER_URL_PREFIX: &'static str = "https://mock-agent.example.com/offer/";
}

#[async_trait]
impl AgentClient for MockAgentClient {
    fn adapter_name(&self) -> &str {
        "mock"
    }

    async fn create_connection_invitation(&self, wallet_did: &str) -> Result<String, ClientError> {
        let connection_id = format!("mock-conn-{}", Uuid::new_v4());
        tracing::debug!(wallet_did, %connection_id, "mock connection invitation");
        Ok(connection_id)
    }

    async fn send_offer(&self, credential: &VerifiableCredential) -> Result<String, ClientError> {
        let exchange_id = format!("mock-exchange-{}", Uuid::new_v4());
        tracing::debug!(credential_id = credential.id(), %exchange_id, "mock offer");
        Ok(exchange_id)
    }

    async fn issue_credential(
        &self,
        credential: &VerifiableCredential,
    ) -> Result<IssuedCredential, ClientError> {
        let exchange_id = self.send_offer(credential).await?;
        Ok(IssuedCredential {
            offer_url: Some(format!("{}{}", Self::OFFER_URL_PREFIX, exchange_id)),
            exchange_id,
        })
    }

    async fn exchange_status(&self, _exchange_id: &str) -> Result<String, ClientError> {
        Ok(Self::EXCHANGE_STATE.to_string())
    }

    async fn revoke(&self, credential_id: &str) -> Result<bool, ClientError> {
        tracing::debug!(credential_id, "mock revocation");
        Ok(true)
    }

    async fn connection_status(&self, _connection_id: &str) -> Result<String, ClientError> {
        Ok(Self::CONNECTION_STATE.to_string())
    }
}

// ── Live ────────────────────────────────────────────────────────────

/// Aries Cloud Agent admin API client.
#[derive(Debug, Clone)]
pub struct AriesAgentClient {
    http: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
    config: AgentConfig,
}

impl AriesAgentClient {
    /// Build a client; `X-API-Key` is attached to every request when configured.
    pub fn new(config: AgentConfig) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let mut value = HeaderValue::from_str(key.as_str())
                .map_err(|_| ClientError::NotConfigured("a valid ARIES_API_KEY".into()))?;
            value.set_sensitive(true);
            headers.insert("X-API-Key", value);
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;
        let base_url = config.agent_url.as_str().trim_end_matches('/').to_string();
        Ok(Self {
            http,
            base_url,
            retry: RetryPolicy::with_retries(config.max_retries),
            config,
        })
    }

    async fn post_json(&self, endpoint: &str, path: &str, body: &Value) -> Result<Value, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.to_string(),
                source: e,
            })?;
        read_json(endpoint, resp).await
    }

    async fn get_json(&self, endpoint: &str, path: &str) -> Result<Value, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .retry
            .send(endpoint, || self.http.get(&url).send())
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.to_string(),
                source: e,
            })?;
        read_json(endpoint, resp).await
    }
}

async fn read_json(endpoint: &str, resp: reqwest::Response) -> Result<Value, ClientError> {
    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::ApiError {
            endpoint: endpoint.to_string(),
            status,
            body,
        });
    }
    resp.json().await.map_err(|e| ClientError::Deserialization {
        endpoint: endpoint.to_string(),
        source: e,
    })
}

fn required_str(endpoint: &str, body: &Value, field: &str) -> Result<String, ClientError> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ClientError::MalformedResponse {
            endpoint: endpoint.to_string(),
            reason: format!("missing {field}"),
        })
}

/// Credential preview attributes: the subject id plus every extracted
/// attribute, values rendered as text.
fn preview_attributes(credential: &VerifiableCredential) -> Vec<Value> {
    let subject = credential.credential_subject();
    let mut attributes = vec![
        json!({ "name": "id", "value": subject.id }),
        json!({ "name": "documentType", "value": subject.document_type }),
    ];
    attributes.extend(subject.attributes.iter().map(|(name, value)| {
        let value = match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        json!({ "name": name, "value": value })
    }));
    attributes
}

#[async_trait]
impl AgentClient for AriesAgentClient {
    fn adapter_name(&self) -> &str {
        "aries"
    }

    async fn create_connection_invitation(&self, wallet_did: &str) -> Result<String, ClientError> {
        let endpoint = "POST /connections/create-invitation";
        let body = json!({ "my_label": self.config.connection_label, "accept": "auto" });
        let resp = self.post_json(endpoint, "/connections/create-invitation", &body).await?;
        let connection_id = required_str(endpoint, &resp, "connection_id")?;
        tracing::info!(wallet_did, %connection_id, "connection invitation created");
        Ok(connection_id)
    }

    async fn send_offer(&self, credential: &VerifiableCredential) -> Result<String, ClientError> {
        let endpoint = "POST /issue-credential-2.0/send-offer";
        let connection_id = credential.connection_id().ok_or_else(|| ClientError::InvalidRequest {
            endpoint: endpoint.to_string(),
            reason: format!("credential {} has no connection", credential.id()),
        })?;
        let mut body = json!({
            "connection_id": connection_id,
            "auto_issue": true,
            "auto_remove": false,
            "credential_proposal": {
                "@type": "issue-credential/2.0/credential-preview",
                "attributes": preview_attributes(credential),
            },
        });
        if let Some(cred_def) = &self.config.credential_definition_id {
            body["credential_definition_id"] = json!(cred_def);
        }
        let resp = self.post_json(endpoint, "/issue-credential-2.0/send-offer", &body).await?;
        let exchange_id = required_str(endpoint, &resp, "credential_exchange_id")?;
        tracing::info!(credential_id = credential.id(), %exchange_id, "credential offer sent");
        Ok(exchange_id)
    }

    async fn issue_credential(
        &self,
        credential: &VerifiableCredential,
    ) -> Result<IssuedCredential, ClientError> {
        let exchange_id = self.send_offer(credential).await?;
        let endpoint = "POST /issue-credential-2.0/records/{id}/send-credential";
        let path = format!("/issue-credential-2.0/records/{exchange_id}/send-credential");
        let body = json!({
            "credential": {
                "@context": credential.context(),
                "type": credential.credential_type(),
                "issuer": credential.issuer().id(),
                "credentialSubject": credential.credential_subject(),
                "issuanceDate": credential.issuance_date(),
                "expirationDate": credential.expiration_date(),
            }
        });
        let resp = self.post_json(endpoint, &path, &body).await?;
        let offer_url = resp
            .get("offer_url")
            .and_then(Value::as_str)
            .map(str::to_string);
        tracing::info!(credential_id = credential.id(), %exchange_id, "credential sent");
        Ok(IssuedCredential {
            exchange_id,
            offer_url,
        })
    }

    async fn exchange_status(&self, exchange_id: &str) -> Result<String, ClientError> {
        let endpoint = "GET /issue-credential-2.0/records/{id}";
        let resp = self
            .get_json(endpoint, &format!("/issue-credential-2.0/records/{exchange_id}"))
            .await?;
        required_str(endpoint, &resp, "state")
    }

    async fn revoke(&self, credential_id: &str) -> Result<bool, ClientError> {
        let endpoint = "POST /revocation/revoke";
        let url = format!("{}/revocation/revoke", self.base_url);
        let resp = self
            .http
            .post(&url)
            .json(&json!({ "credential_id": credential_id, "publish": true }))
            .send()
            .await
            .map_err(|e| ClientError::Http {
                endpoint: endpoint.to_string(),
                source: e,
            })?;
        let status = resp.status();
        if status.is_success() {
            tracing::info!(credential_id, "credential revoked");
            Ok(true)
        } else {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(credential_id, status = status.as_u16(), %body, "agent rejected revocation");
            Ok(false)
        }
    }

    async fn connection_status(&self, connection_id: &str) -> Result<String, ClientError> {
        let endpoint = "GET /connections/{id}";
        let resp = self
            .get_json(endpoint, &format!("/connections/{connection_id}"))
            .await?;
        required_str(endpoint, &resp, "state")
    }
}
