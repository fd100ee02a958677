use super::{
    ParsedResponse, ProviderAdapter, ProviderError, ProviderRequest, SYSTEM_PROMPT, TokenUsage,
    endpoint_with_route, non_empty, optional_string, optional_u64, required_str,
};
use crate::providers::{Provider, ProviderConfig};
use reqwest::StatusCode;
use serde_json::{Value, json};

/// Local inference via Ollama's `/api/generate`: single prompt field, no credential
pub struct OllamaAdapter;

impl ProviderAdapter for OllamaAdapter {
    fn provider(&self) -> Provider {
        Provider::Ollama
    }

    fn build_request(
        &self,
        config: &ProviderConfig,
        prompt: &str,
    ) -> Result<ProviderRequest, ProviderError> {
        let mut headers = Vec::new();
        // A reverse proxy in front of Ollama may still want a token
        if config.has_api_key() {
            headers.push((
                "Authorization",
                format!("Bearer {}", config.api_key.expose()),
            ));
        }

        Ok(ProviderRequest {
            url: endpoint_with_route(config, "api/generate")?,
            headers,
            body: json!({
                "model": config.model,
                "system": SYSTEM_PROMPT,
                "prompt": prompt,
                "stream": false,
                "options": {
                    "num_predict": config.max_tokens,
                    "temperature": config.temperature,
                }
            }),
        })
    }

    fn parse_response(&self, body: &Value) -> Result<ParsedResponse, ProviderError> {
        let text = required_str(body, "/response", Provider::Ollama)?;
        let usage = if body.get("prompt_eval_count").is_some() || body.get("eval_count").is_some()
        {
            Some(TokenUsage::new(
                optional_u64(body, "/prompt_eval_count"),
                optional_u64(body, "/eval_count"),
            ))
        } else {
            None
        };

        Ok(ParsedResponse {
            text: non_empty(text.to_string(), Provider::Ollama)?,
            model: optional_string(body, "/model"),
            usage,
        })
    }

    fn classify_status(&self, status: StatusCode, body: &str) -> ProviderError {
        // Ollama answers 404 when the model has not been pulled
        if status == StatusCode::NOT_FOUND {
            return ProviderError::invalid_request(format!(
                "Ollama model not available locally: {}",
                body.trim()
            ));
        }
        ProviderError::from_status(Provider::Ollama, status, body)
    }
}
