use super::{Completion, ProviderError, adapter_for};
use crate::{log_debug, trace_debug};
use crate::providers::ProviderConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::{Duration, Instant};

/// Anything that can turn a prompt into a completion.
///
/// The generation service only talks to this trait, so tests can swap in
/// canned backends without a network.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(
        &self,
        config: &ProviderConfig,
        prompt: &str,
        timeout: Duration,
    ) -> Result<Completion, ProviderError>;
}

/// Backend that performs the real HTTP round trip through the provider's adapter
#[derive(Clone, Default)]
pub struct HttpBackend {
    client: Client,
}

impl HttpBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse an existing client (proxies, custom TLS roots)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CompletionBackend for HttpBackend {
    async fn complete(
        &self,
        config: &ProviderConfig,
        prompt: &str,
        timeout: Duration,
    ) -> Result<Completion, ProviderError> {
        if prompt.trim().is_empty() {
            return Err(ProviderError::invalid_request("prompt must not be empty"));
        }
        config.validate()?;

        let adapter = adapter_for(config.provider);
        let request = adapter.build_request(config, prompt)?;
        log_debug!(
            "Calling {} at {} with model {}",
            config.provider,
            request.url.path(),
            config.model
        );

        let started = Instant::now();
        let mut builder = self
            .client
            .post(request.url)
            .timeout(timeout)
            .json(&request.body);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ProviderError::from_transport(&e))?;
        let status = response.status();
        let raw_response = response
            .text()
            .await
            .map_err(|e| ProviderError::from_transport(&e))?;
        trace_debug!(
            provider = config.provider.name(),
            status = status.as_u16(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "provider response received"
        );

        if !status.is_success() {
            let err = adapter.classify_status(status, &raw_response);
            log_debug!("{} call failed: {}", config.provider, err);
            return Err(err);
        }

        let body: Value = serde_json::from_str(&raw_response).map_err(|e| {
            ProviderError::malformed(format!(
                "{} API returned a non-JSON body: {e}",
                config.provider.display_name()
            ))
        })?;
        let parsed = adapter.parse_response(&body)?;
        let elapsed = started.elapsed();

        log_debug!(
            "{} responded in {:?} ({} chars)",
            config.provider,
            elapsed,
            parsed.text.len()
        );

        Ok(Completion {
            text: parsed.text,
            model: parsed.model.unwrap_or_else(|| config.model.clone()),
            usage: parsed.usage,
            raw_response,
            elapsed,
        })
    }
}
