//! LLM provider configuration.
//!
//! Single source of truth for supported providers, their defaults, and the
//! per-call provider record handed to the generation core.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Default completion budget, matching what the hosted APIs accept without tuning
pub const DEFAULT_MAX_TOKENS: u32 = 2000;
/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Supported LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    OpenAI,
    Anthropic,
    Google,
    Ollama,
    Custom,
}

impl Provider {
    /// All available providers
    pub const ALL: &'static [Provider] = &[
        Provider::OpenAI,
        Provider::Anthropic,
        Provider::Google,
        Provider::Ollama,
        Provider::Custom,
    ];

    /// Provider name as used in config files and CLI
    pub const fn name(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Anthropic => "anthropic",
            Self::Google => "google",
            Self::Ollama => "ollama",
            Self::Custom => "custom",
        }
    }

    /// Human readable label
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Google => "Google",
            Self::Ollama => "Ollama (Local)",
            Self::Custom => "Custom API",
        }
    }

    /// Base endpoint used when the caller does not supply one
    pub const fn default_endpoint(&self) -> &'static str {
        match self {
            Self::OpenAI => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
            Self::Google => "https://generativelanguage.googleapis.com/v1beta",
            Self::Ollama => "http://localhost:11434",
            Self::Custom => "http://localhost:8000/v1",
        }
    }

    /// Default model identifier
    pub const fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAI => "gpt-4o",
            Self::Anthropic => "claude-sonnet-4-5-20250929",
            Self::Google => "gemini-2.5-flash",
            Self::Ollama => "llama3",
            Self::Custom => "default",
        }
    }

    /// Whether calls to this provider need a credential
    pub const fn requires_api_key(&self) -> bool {
        !matches!(self, Self::Ollama)
    }

    /// Environment variable name for the API key
    pub const fn api_key_env(&self) -> Option<&'static str> {
        match self {
            Self::OpenAI => Some("OPENAI_API_KEY"),
            Self::Anthropic => Some("ANTHROPIC_API_KEY"),
            Self::Google => Some("GOOGLE_API_KEY"),
            Self::Ollama => None,
            Self::Custom => Some("TESTFORGE_CUSTOM_API_KEY"),
        }
    }

    /// Get all provider names as strings
    pub fn all_names() -> Vec<&'static str> {
        Self::ALL.iter().map(Self::name).collect()
    }
}

impl FromStr for Provider {
    type Err = ProviderConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        // Handle common aliases
        let normalized = match lower.as_str() {
            "claude" => "anthropic",
            "gemini" => "google",
            "local" => "ollama",
            other => other,
        };

        Self::ALL
            .iter()
            .find(|p| p.name() == normalized)
            .copied()
            .ok_or_else(|| ProviderConfigError::Unknown(s.to_string()))
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Provider configuration error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderConfigError {
    #[error("Unknown provider: {0}. Supported: openai, anthropic, google, ollama, custom")]
    Unknown(String),
    #[error("API key required for provider: {0}")]
    MissingApiKey(Provider),
    #[error("Provider {0} is not active")]
    Inactive(Provider),
    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("No model configured for provider: {0}")]
    MissingModel(Provider),
}

/// An opaque credential. Never printed, never serialized.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw credential for the outbound request
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Secret(<empty>)")
        } else {
            f.write_str("Secret(***)")
        }
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Provider record used for a single generation call.
///
/// Callers supply it fully populated; the generation core only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub provider: Provider,
    /// Base endpoint; each adapter appends its own route
    pub endpoint: String,
    /// Write-only credential
    #[serde(default, skip_serializing)]
    pub api_key: Secret,
    pub model: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_active() -> bool {
    true
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

impl ProviderConfig {
    /// Create config with defaults for a provider
    pub fn with_defaults(provider: Provider) -> Self {
        Self {
            provider,
            endpoint: provider.default_endpoint().to_string(),
            api_key: Secret::default(),
            model: provider.default_model().to_string(),
            is_active: true,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<Secret>) -> Self {
        self.api_key = api_key.into();
        self
    }

    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Check if this config has an API key set
    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Parse the configured endpoint
    pub fn endpoint_url(&self) -> Result<Url, ProviderConfigError> {
        let url = Url::parse(self.endpoint.trim()).map_err(|e| {
            ProviderConfigError::InvalidEndpoint {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            }
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ProviderConfigError::InvalidEndpoint {
                endpoint: self.endpoint.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        Ok(url)
    }

    /// Check everything an adapter needs before a request can be built
    pub fn validate(&self) -> Result<(), ProviderConfigError> {
        if !self.is_active {
            return Err(ProviderConfigError::Inactive(self.provider));
        }
        self.endpoint_url()?;
        if self.model.trim().is_empty() {
            return Err(ProviderConfigError::MissingModel(self.provider));
        }
        if self.provider.requires_api_key() && !self.has_api_key() {
            return Err(ProviderConfigError::MissingApiKey(self.provider));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_from_str() {
        assert_eq!("openai".parse::<Provider>().ok(), Some(Provider::OpenAI));
        assert_eq!(
            "ANTHROPIC".parse::<Provider>().ok(),
            Some(Provider::Anthropic)
        );
        assert_eq!("claude".parse::<Provider>().ok(), Some(Provider::Anthropic)); // Legacy alias
        assert_eq!("local".parse::<Provider>().ok(), Some(Provider::Ollama));
        assert!("invalid".parse::<Provider>().is_err());
    }

    #[test]
    fn test_provider_defaults() {
        assert_eq!(Provider::Ollama.default_endpoint(), "http://localhost:11434");
        assert!(!Provider::Ollama.requires_api_key());
        assert!(Provider::Custom.requires_api_key());
        assert_eq!(Provider::Google.api_key_env(), Some("GOOGLE_API_KEY"));
    }

    #[test]
    fn test_secret_is_redacted() {
        let config = ProviderConfig::with_defaults(Provider::OpenAI).with_api_key("sk-live-123");
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-live-123"));
        assert!(debug.contains("Secret(***)"));
    }

    #[test]
    fn test_secret_is_write_only() {
        let config = ProviderConfig::with_defaults(Provider::Anthropic).with_api_key("secret-key");
        let json = serde_json::to_string(&config).expect("serialize config");
        assert!(!json.contains("secret-key"));
        assert!(!json.contains("api_key"));

        let parsed: ProviderConfig = serde_json::from_str(
            r#"{"provider":"anthropic","endpoint":"https://api.anthropic.com/v1","api_key":"k","model":"m"}"#,
        )
        .expect("deserialize config");
        assert_eq!(parsed.api_key.expose(), "k");
        assert!(parsed.is_active);
        assert_eq!(parsed.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_validate() {
        let ollama = ProviderConfig::with_defaults(Provider::Ollama);
        assert!(ollama.validate().is_ok());

        let openai = ProviderConfig::with_defaults(Provider::OpenAI);
        assert_eq!(
            openai.validate(),
            Err(ProviderConfigError::MissingApiKey(Provider::OpenAI))
        );

        let bad_url = ProviderConfig::with_defaults(Provider::Ollama).with_endpoint("not a url");
        assert!(matches!(
            bad_url.validate(),
            Err(ProviderConfigError::InvalidEndpoint { .. })
        ));

        let mut inactive = ProviderConfig::with_defaults(Provider::Ollama);
        inactive.is_active = false;
        assert_eq!(
            inactive.validate(),
            Err(ProviderConfigError::Inactive(Provider::Ollama))
        );
    }
}
