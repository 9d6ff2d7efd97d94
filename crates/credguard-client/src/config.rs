//! Collaborator client configuration.
//!
//! Both collaborators default to mock mode so a fresh checkout runs without
//! credentials. Live mode is opt-in per collaborator via environment
//! variables or explicit construction.

use url::Url;
use zeroize::Zeroizing;

use crate::retry::DEFAULT_MAX_RETRIES;

/// Default chat-completions endpoint for live vision extraction.
pub const DEFAULT_VISION_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Default vision model.
pub const DEFAULT_VISION_MODEL: &str = "gpt-4o";

/// Default Aries agent admin API.
pub const DEFAULT_AGENT_URL: &str = "http://localhost:8040";

/// Label sent with connection invitations.
pub const DEFAULT_CONNECTION_LABEL: &str = "CredGuard Identity Issuer";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Vision collaborator settings.
///
/// Custom `Debug` implementation redacts the `api_key` field.
#[derive(Clone)]
pub struct VisionConfig {
    /// Use the deterministic mock instead of the live API.
    pub mock_mode: bool,
    /// Chat-completions endpoint.
    pub api_url: Url,
    /// Bearer key. Live calls fail with `NotConfigured` when absent.
    pub api_key: Option<Zeroizing<String>>,
    /// Model name.
    pub model: String,
    /// Completion token budget.
    pub max_tokens: u32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for VisionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionConfig")
            .field("mock_mode", &self.mock_mode)
            .field("api_url", &self.api_url)
            .field("api_key", &redacted(&self.api_key))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl VisionConfig {
    /// Deterministic mock.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidUrl` if the built-in default URL cannot be
    /// parsed.
    pub fn mock() -> Result<Self, ConfigError> {
        Ok(Self {
            mock_mode: true,
            api_url: parse_url("api_url", DEFAULT_VISION_URL)?,
            api_key: None,
            model: DEFAULT_VISION_MODEL.to_string(),
            max_tokens: 2000,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }

    /// Live client against `api_url`.
    pub fn live(api_url: &str, api_key: Option<&str>) -> Result<Self, ConfigError> {
        Ok(Self {
            mock_mode: false,
            api_url: parse_url("api_url", api_url)?,
            api_key: api_key.map(|k| Zeroizing::new(k.to_string())),
            ..Self::mock()?
        })
    }

    /// Load from environment variables.
    ///
    /// Variables:
    /// - `CREDGUARD_VISION_MOCK` (default: `true`)
    /// - `OPENAI_API_URL` (default: `https://api.openai.com/v1/chat/completions`)
    /// - `OPENAI_API_KEY` (required for live calls)
    /// - `OPENAI_MODEL` (default: `gpt-4o`)
    /// - `OPENAI_MAX_TOKENS` (default: 2000)
    /// - `CREDGUARD_HTTP_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            mock_mode: env_flag("CREDGUARD_VISION_MOCK", true)?,
            api_url: env_url("OPENAI_API_URL", DEFAULT_VISION_URL)?,
            api_key: env_secret("OPENAI_API_KEY"),
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_VISION_MODEL.into()),
            max_tokens: env_parse("OPENAI_MAX_TOKENS", 2000),
            timeout_secs: env_parse("CREDGUARD_HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
        })
    }
}

/// Agent collaborator settings.
///
/// Custom `Debug` implementation redacts the `api_key` field.
#[derive(Clone)]
pub struct AgentConfig {
    /// Use the deterministic mock instead of the live agent.
    pub mock_mode: bool,
    /// Admin API base URL.
    pub agent_url: Url,
    /// Sent as `X-API-Key` when present.
    pub api_key: Option<Zeroizing<String>>,
    /// Credential definition included in offers, when present.
    pub credential_definition_id: Option<String>,
    /// Label on connection invitations.
    pub connection_label: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Transport retries for status reads.
    pub max_retries: u32,
}

impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field("mock_mode", &self.mock_mode)
            .field("agent_url", &self.agent_url)
            .field("api_key", &redacted(&self.api_key))
            .field("credential_definition_id", &self.credential_definition_id)
            .field("connection_label", &self.connection_label)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl AgentConfig {
    /// Deterministic mock.
    pub fn mock() -> Result<Self, ConfigError> {
        Ok(Self {
            mock_mode: true,
            agent_url: parse_url("agent_url", DEFAULT_AGENT_URL)?,
            api_key: None,
            credential_definition_id: None,
            connection_label: DEFAULT_CONNECTION_LABEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Live client against the admin API at `agent_url`.
    pub fn live(agent_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            mock_mode: false,
            agent_url: parse_url("agent_url", agent_url)?,
            ..Self::mock()?
        })
    }

    /// Load from environment variables.
    ///
    /// Variables:
    /// - `CREDGUARD_AGENT_MOCK` (default: `true`)
    /// - `ARIES_AGENT_URL` (default: `http://localhost:8040`)
    /// - `ARIES_API_KEY` (optional)
    /// - `ARIES_CREDENTIAL_DEFINITION_ID` (optional)
    /// - `CREDGUARD_HTTP_TIMEOUT_SECS` (default: 30)
    /// - `CREDGUARD_HTTP_MAX_RETRIES` (default: 3)
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            mock_mode: env_flag("CREDGUARD_AGENT_MOCK", true)?,
            agent_url: env_url("ARIES_AGENT_URL", DEFAULT_AGENT_URL)?,
            api_key: env_secret("ARIES_API_KEY"),
            credential_definition_id: std::env::var("ARIES_CREDENTIAL_DEFINITION_ID")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            connection_label: DEFAULT_CONNECTION_LABEL.to_string(),
            timeout_secs: env_parse("CREDGUARD_HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
            max_retries: env_parse("CREDGUARD_HTTP_MAX_RETRIES", DEFAULT_MAX_RETRIES),
        })
    }
}

/// Key-set fetch settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeySetConfig {
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Cache lifetime for fetched key sets; `0` disables caching.
    pub cache_ttl_secs: u64,
    /// Transport retries per fetch.
    pub max_retries: u32,
}

impl Default for KeySetConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            cache_ttl_secs: 0,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl KeySetConfig {
    /// Load from `CREDGUARD_HTTP_TIMEOUT_SECS`, `CREDGUARD_JWKS_CACHE_SECS`
    /// and `CREDGUARD_HTTP_MAX_RETRIES`.
    pub fn from_env() -> Self {
        Self {
            timeout_secs: env_parse("CREDGUARD_HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS),
            cache_ttl_secs: env_parse("CREDGUARD_JWKS_CACHE_SECS", 0),
            max_retries: env_parse("CREDGUARD_HTTP_MAX_RETRIES", DEFAULT_MAX_RETRIES),
        }
    }
}

/// All collaborator settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Vision collaborator.
    pub vision: VisionConfig,
    /// Agent collaborator.
    pub agent: AgentConfig,
    /// Key-set fetch.
    pub key_set: KeySetConfig,
}

impl ClientConfig {
    /// Everything mocked.
    pub fn mock() -> Result<Self, ConfigError> {
        Ok(Self {
            vision: VisionConfig::mock()?,
            agent: AgentConfig::mock()?,
            key_set: KeySetConfig::default(),
        })
    }

    /// Load every section from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            vision: VisionConfig::from_env()?,
            agent: AgentConfig::from_env()?,
            key_set: KeySetConfig::from_env(),
        })
    }
}

fn redacted(secret: &Option<Zeroizing<String>>) -> &'static str {
    match secret {
        Some(_) => "[REDACTED]",
        None => "<unset>",
    }
}

fn parse_url(name: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(name.to_string(), e.to_string()))
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    parse_url(var, &raw)
}

fn env_flag(var: &str, default: bool) -> Result<bool, ConfigError> {
    match std::env::var(var) {
        Err(_) => Ok(default),
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::InvalidFlag(var.to_string(), raw)),
        },
    }
}

fn env_parse<T: std::str::FromStr>(var: &str, default: T) -> T {
    std::env::var(var)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_secret(var: &str) -> Option<Zeroizing<String>> {
    std::env::var(var)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(Zeroizing::new)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid boolean for {0}: {1:?}")]
    InvalidFlag(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_configs_default_to_mock_mode() {
        let cfg = ClientConfig::mock().unwrap();
        assert!(cfg.vision.mock_mode);
        assert!(cfg.agent.mock_mode);
        assert_eq!(cfg.vision.model, "gpt-4o");
        assert_eq!(cfg.agent.agent_url.as_str(), "http://localhost:8040/");
        assert_eq!(cfg.key_set.cache_ttl_secs, 0);
        assert_eq!(cfg.agent.max_retries, 3);
        assert_eq!(cfg.key_set.max_retries, 3);
    }

    #[test]
    fn debug_redacts_api_keys() {
        let vision = VisionConfig::live("https://vision.example/v1", Some("sk-secret")).unwrap();
        let rendered = format!("{vision:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("sk-secret"));

        let mut agent = AgentConfig::live("http://agent.example:8040").unwrap();
        assert!(format!("{agent:?}").contains("<unset>"));
        agent.api_key = Some(Zeroizing::new("agent-key".into()));
        assert!(!format!("{agent:?}").contains("agent-key"));
    }

    #[test]
    fn live_rejects_invalid_url() {
        assert!(matches!(
            AgentConfig::live("not a url"),
            Err(ConfigError::InvalidUrl(_, _))
        ));
    }

    #[test]
    fn env_url_uses_default_when_var_absent() {
        let url = env_url("CREDGUARD_TEST_UNSET_URL_4711", "https://example.com").unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn env_flag_parses_common_spellings() {
        std::env::set_var("CREDGUARD_TEST_FLAG_ON", "Yes");
        std::env::set_var("CREDGUARD_TEST_FLAG_BAD", "maybe");
        assert!(env_flag("CREDGUARD_TEST_FLAG_ON", false).unwrap());
        assert!(env_flag("CREDGUARD_TEST_FLAG_BAD", false).is_err());
        assert!(!env_flag("CREDGUARD_TEST_FLAG_UNSET", false).unwrap());
        std::env::remove_var("CREDGUARD_TEST_FLAG_ON");
        std::env::remove_var("CREDGUARD_TEST_FLAG_BAD");
    }

    #[test]
    fn env_parse_falls_back_on_garbage() {
        std::env::set_var("CREDGUARD_TEST_TIMEOUT", "soon");
        assert_eq!(env_parse("CREDGUARD_TEST_TIMEOUT", 30u64), 30);
        std::env::remove_var("CREDGUARD_TEST_TIMEOUT");
    }
}
