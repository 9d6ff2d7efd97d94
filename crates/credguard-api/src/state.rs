//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor. Every field is cheap to clone: collaborators
//! sit behind `Arc`s and the job registry shares one map.

use std::time::Duration;

use axum::http::HeaderValue;
use thiserror::Error;

use credguard_client::{
    build_agent_client, build_key_set_fetcher, build_vision_client, ClientConfig, ClientError,
    ConfigError,
};
use credguard_core::{CredGuardError, Issuer};
use credguard_issuance::{
    issuer_from_env, DocumentExtractor, IssuanceOrchestrator, JobRegistry, DEFAULT_JOB_RETENTION,
};
use credguard_verify::{SignatureVerifier, VerificationEngine};

/// Listen port when `PORT` is unset or unparseable.
pub const DEFAULT_PORT: u16 = 8080;

/// Browser origin allowed by CORS when `CREDGUARD_CORS_ORIGIN` is unset.
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

/// Error assembling the application state at startup.
#[derive(Error, Debug)]
pub enum StateError {
    /// An environment setting could not be used.
    #[error("invalid {var}: {reason}")]
    InvalidSetting { var: &'static str, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Issuer(#[from] CredGuardError),
}

/// Server settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Origin allowed to call the API from a browser.
    pub cors_origin: HeaderValue,
    /// How long finished async issuance jobs stay readable.
    pub job_retention: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            cors_origin: HeaderValue::from_static(DEFAULT_CORS_ORIGIN),
            job_retention: DEFAULT_JOB_RETENTION,
        }
    }
}

impl AppConfig {
    /// Load from `PORT`, `CREDGUARD_CORS_ORIGIN` and
    /// `CREDGUARD_JOB_RETENTION_SECS`.
    pub fn from_env() -> Result<Self, StateError> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let cors_origin = match std::env::var("CREDGUARD_CORS_ORIGIN") {
            Ok(raw) => HeaderValue::from_str(raw.trim()).map_err(|e| StateError::InvalidSetting {
                var: "CREDGUARD_CORS_ORIGIN",
                reason: e.to_string(),
            })?,
            Err(_) => HeaderValue::from_static(DEFAULT_CORS_ORIGIN),
        };
        let job_retention = std::env::var("CREDGUARD_JOB_RETENTION_SECS")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_JOB_RETENTION);
        Ok(Self {
            port,
            cors_origin,
            job_retention,
        })
    }
}

/// Handles shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Issuance pipeline.
    pub orchestrator: IssuanceOrchestrator,
    /// Verification pipeline.
    pub verifier: VerificationEngine,
    /// Background issuance jobs.
    pub jobs: JobRegistry,
    /// Server settings.
    pub config: AppConfig,
}

impl AppState {
    /// State over already-built pipelines, with an empty job registry.
    pub fn new(
        orchestrator: IssuanceOrchestrator,
        verifier: VerificationEngine,
        config: AppConfig,
    ) -> Self {
        Self {
            orchestrator,
            verifier,
            jobs: JobRegistry::with_retention(config.job_retention),
            config,
        }
    }

    /// Build both pipelines from collaborator settings.
    pub fn from_clients(
        clients: &ClientConfig,
        issuer: Issuer,
        config: AppConfig,
    ) -> Result<Self, StateError> {
        let vision = build_vision_client(&clients.vision)?;
        let agent = build_agent_client(&clients.agent)?;
        let key_sets = build_key_set_fetcher(&clients.key_set)?;
        tracing::info!(
            vision = vision.client_name(),
            agent = agent.adapter_name(),
            issuer = issuer.id(),
            "collaborators configured"
        );

        let orchestrator = IssuanceOrchestrator::new(DocumentExtractor::new(vision), agent, issuer);
        let verifier = VerificationEngine::new(SignatureVerifier::new(key_sets));
        Ok(Self::new(orchestrator, verifier, config))
    }

    /// Everything mocked, default issuer and server settings.
    pub fn mock() -> Result<Self, StateError> {
        Self::from_clients(&ClientConfig::mock()?, Issuer::credguard(), AppConfig::default())
    }

    /// Load every setting from the environment.
    pub fn from_env() -> Result<Self, StateError> {
        Self::from_clients(&ClientConfig::from_env()?, issuer_from_env()?, AppConfig::from_env()?)
    }
}
