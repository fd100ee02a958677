use crate::generation::{GenerationOptions, RetryPolicy};
use crate::log_debug;
use crate::providers::{Provider, ProviderConfig};
use crate::types::{Browser, Framework, Language};

use anyhow::{Context, Result, anyhow};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted testforge settings
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Config {
    /// Provider used when a command does not name one
    pub default_provider: String,
    /// Per-provider settings keyed by provider name
    #[serde(default)]
    pub providers: HashMap<String, ProviderSettings>,
    #[serde(default)]
    pub generation: GenerationDefaults,
    #[serde(default)]
    pub performance: PerformanceConfig,
}

/// Stored settings for one provider
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct ProviderSettings {
    /// Falls back to the provider's environment variable when empty
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub model: String,
    /// Overrides the provider's default base URL
    pub endpoint: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Defaults applied to `generate` when flags are absent
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct GenerationDefaults {
    pub framework: Framework,
    pub language: Language,
    pub browser: Browser,
    pub headless: bool,
    pub timeout_ms: u32,
    pub request_timeout_secs: u64,
    /// Provider calls in flight at once
    pub concurrency: usize,
    /// Extra attempts after a transient failure
    pub max_retries: u32,
    pub output_dir: String,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        let options = GenerationOptions::default();
        Self {
            framework: Framework::default(),
            language: Language::default(),
            browser: options.browser,
            headless: options.headless,
            timeout_ms: options.timeout_ms,
            request_timeout_secs: options.request_timeout_secs,
            concurrency: 1,
            max_retries: 0,
            output_dir: "tests".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct PerformanceConfig {
    /// Include HTTP client internals in the debug log
    #[serde(default)]
    pub verbose_logging: bool,
}

impl Config {
    /// Load the configuration from the user's config directory
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load from an explicit path; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log_debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config file format in {}", path.display()))?;
        let config = config.normalize_provider_names();

        log_debug!(
            "Configuration loaded from {} (default provider: {})",
            path.display(),
            config.default_provider
        );
        Ok(config)
    }

    /// Rewrite alias keys (`claude`, `gemini`, `local`) to canonical provider names
    fn normalize_provider_names(mut self) -> Self {
        let aliased: Vec<String> = self
            .providers
            .keys()
            .filter(|name| {
                name.parse::<Provider>()
                    .is_ok_and(|provider| provider.name() != name.as_str())
            })
            .cloned()
            .collect();

        for alias in aliased {
            if let (Ok(provider), Some(settings)) =
                (alias.parse::<Provider>(), self.providers.remove(&alias))
            {
                log_debug!("Renaming provider '{}' to '{}'", alias, provider);
                self.providers
                    .entry(provider.name().to_string())
                    .or_insert(settings);
            }
        }

        if let Ok(provider) = self.default_provider.parse::<Provider>() {
            self.default_provider = provider.name().to_string();
        }
        self
    }

    /// Save the configuration to the user's config directory
    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        log_debug!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Path of the user config file
    pub fn get_config_path() -> Result<PathBuf> {
        let mut path =
            config_dir().ok_or_else(|| anyhow!("Unable to determine config directory"))?;
        path.push("testforge");
        path.push("config.toml");
        Ok(path)
    }

    /// Apply `testforge config` flags
    pub fn update(
        &mut self,
        provider: Option<String>,
        api_key: Option<String>,
        model: Option<String>,
        endpoint: Option<String>,
    ) -> Result<()> {
        if let Some(name) = provider {
            let provider: Provider = name.parse()?;
            self.default_provider = provider.name().to_string();
        }

        let default_provider = self.default_provider.clone();
        let settings = self
            .providers
            .entry(default_provider)
            .or_insert_with_key(|name| {
                name.parse::<Provider>()
                    .map(ProviderSettings::default_for)
                    .unwrap_or_default()
            });

        if let Some(key) = api_key {
            settings.api_key = key;
        }
        if let Some(model) = model {
            settings.model = model;
        }
        if let Some(endpoint) = endpoint {
            settings.endpoint = Some(endpoint);
        }

        log_debug!("Configuration updated for {}", self.default_provider);
        Ok(())
    }

    /// Stored settings for a provider
    pub fn get_provider_settings(&self, provider: Provider) -> Option<&ProviderSettings> {
        self.providers.get(provider.name())
    }

    /// Build the per-call provider record for `provider_name`, or the default provider.
    ///
    /// An empty stored key falls back to the provider's environment variable.
    pub fn provider_config(&self, provider_name: Option<&str>) -> Result<ProviderConfig> {
        let name = provider_name.unwrap_or(&self.default_provider);
        let provider: Provider = name
            .parse()
            .with_context(|| format!("Cannot use provider '{name}'"))?;

        let mut config = ProviderConfig::with_defaults(provider);
        if let Some(settings) = self.get_provider_settings(provider) {
            if !settings.model.trim().is_empty() {
                config.model.clone_from(&settings.model);
            }
            if let Some(endpoint) = settings.endpoint.as_deref().filter(|e| !e.trim().is_empty()) {
                config.endpoint = endpoint.to_string();
            }
            if let Some(max_tokens) = settings.max_tokens {
                config.max_tokens = max_tokens;
            }
            if let Some(temperature) = settings.temperature {
                config.temperature = temperature;
            }
            if !settings.api_key.trim().is_empty() {
                config = config.with_api_key(settings.api_key.clone());
            }
        }

        if !config.has_api_key()
            && let Some(var) = provider.api_key_env()
            && let Ok(key) = std::env::var(var)
        {
            log_debug!("Using API key from {}", var);
            config = config.with_api_key(key);
        }

        Ok(config)
    }

    /// Generation options seeded from the stored defaults
    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            browser: self.generation.browser,
            headless: self.generation.headless,
            timeout_ms: self.generation.timeout_ms,
            request_timeout_secs: self.generation.request_timeout_secs,
            ..GenerationOptions::default()
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::attempts(self.generation.max_retries.saturating_add(1))
    }
}

impl Default for Config {
    fn default() -> Self {
        let providers = Provider::ALL
            .iter()
            .map(|p| (p.name().to_string(), ProviderSettings::default_for(*p)))
            .collect();

        Self {
            default_provider: Provider::default().name().to_string(),
            providers,
            generation: GenerationDefaults::default(),
            performance: PerformanceConfig::default(),
        }
    }
}

impl ProviderSettings {
    pub fn default_for(provider: Provider) -> Self {
        Self {
            model: provider.default_model().to_string(),
            ..Self::default()
        }
    }
}
