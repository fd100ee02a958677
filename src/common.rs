use crate::config::Config;
use crate::providers::{Provider, ProviderConfig};
use anyhow::Result;
use clap::Args;

/// Provider flags shared by commands that call an LLM
#[derive(Args, Clone, Default, Debug)]
pub struct CommonParams {
    /// Override default LLM provider
    #[arg(long, help = "Override default LLM provider", value_parser = available_providers_parser)]
    pub provider: Option<String>,

    /// Override the configured model for this run
    #[arg(long, help = "Override the configured model for this run")]
    pub model: Option<String>,

    /// Override the provider endpoint for this run
    #[arg(long, help = "Override the provider base URL for this run")]
    pub endpoint: Option<String>,
}

impl CommonParams {
    /// Resolve the provider record for this run from config plus overrides
    pub fn provider_config(&self, config: &Config) -> Result<ProviderConfig> {
        let mut provider = config.provider_config(self.provider.as_deref())?;
        if let Some(model) = &self.model {
            provider = provider.with_model(model.clone());
        }
        if let Some(endpoint) = &self.endpoint {
            provider = provider.with_endpoint(endpoint.clone());
        }
        Ok(provider)
    }
}

/// Validates that a provider name is available in the system
pub fn available_providers_parser(s: &str) -> Result<String, String> {
    match s.parse::<Provider>() {
        Ok(provider) => Ok(provider.name().to_string()),
        Err(_) => Err(format!(
            "Invalid provider '{}'. Available providers: {}",
            s,
            Provider::all_names().join(", ")
        )),
    }
}
