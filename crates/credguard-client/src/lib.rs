//! # credguard-client — External Collaborator Clients
//!
//! CredGuard depends on three external systems. Each sits behind an
//! `async_trait` seam with a deterministic mock and a live HTTP client:
//!
//! | Collaborator | Trait | Mock | Live |
//! |--------------|-------|------|------|
//! | Document vision extraction | [`VisionClient`] | [`MockVisionClient`] | [`OpenAiVisionClient`] |
//! | Credential-exchange agent | [`AgentClient`] | [`MockAgentClient`] | [`AriesAgentClient`] |
//! | Issuer key sets | [`KeySetFetcher`] | n/a | [`HttpKeySetFetcher`] |
//!
//! The `build_*` factories choose mock or live from [`ClientConfig`].
//! Services hold the results as `Arc<dyn Trait>` and never see which
//! implementation they got.

pub mod agent;
pub mod config;
pub mod error;
pub mod jwks;
pub(crate) mod retry;
pub mod vision;

use std::sync::Arc;
use std::time::Duration;

pub use agent::{AgentClient, AriesAgentClient, IssuedCredential, MockAgentClient};
pub use config::{AgentConfig, ClientConfig, ConfigError, KeySetConfig, VisionConfig};
pub use error::ClientError;
pub use jwks::{CachingKeySetFetcher, HttpKeySetFetcher, KeySetFetcher};
pub use vision::{MockVisionClient, OpenAiVisionClient, VisionClient};

/// Vision backend for `config`.
pub fn build_vision_client(config: &VisionConfig) -> Result<Arc<dyn VisionClient>, ClientError> {
    if config.mock_mode {
        tracing::info!("vision extraction running in mock mode");
        return Ok(Arc::new(MockVisionClient));
    }
    Ok(Arc::new(OpenAiVisionClient::new(config.clone())?))
}

/// Agent backend for `config`.
pub fn build_agent_client(config: &AgentConfig) -> Result<Arc<dyn AgentClient>, ClientError> {
    if config.mock_mode {
        tracing::info!("credential agent running in mock mode");
        return Ok(Arc::new(MockAgentClient));
    }
    Ok(Arc::new(AriesAgentClient::new(config.clone())?))
}

/// Key-set fetcher for `config`, cached when a lifetime is configured.
pub fn build_key_set_fetcher(config: &KeySetConfig) -> Result<Arc<dyn KeySetFetcher>, ClientError> {
    let http: Arc<dyn KeySetFetcher> = Arc::new(HttpKeySetFetcher::new(config)?);
    if config.cache_ttl_secs == 0 {
        return Ok(http);
    }
    Ok(Arc::new(CachingKeySetFetcher::new(
        http,
        Duration::from_secs(config.cache_ttl_secs),
    )))
}
