use super::{
    ParsedResponse, ProviderAdapter, ProviderError, ProviderRequest, SYSTEM_PROMPT, TokenUsage,
    endpoint_with_route, non_empty, optional_string, optional_u64,
};
use crate::providers::{Provider, ProviderConfig};
use reqwest::StatusCode;
use serde_json::{Value, json};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Messages protocol: top-level `system`, content returned as typed blocks
pub struct AnthropicAdapter;

impl ProviderAdapter for AnthropicAdapter {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    fn build_request(
        &self,
        config: &ProviderConfig,
        prompt: &str,
    ) -> Result<ProviderRequest, ProviderError> {
        Ok(ProviderRequest {
            url: endpoint_with_route(config, "messages")?,
            headers: vec![
                ("x-api-key", config.api_key.expose().to_string()),
                ("anthropic-version", ANTHROPIC_VERSION.to_string()),
            ],
            body: json!({
                "model": config.model,
                "max_tokens": config.max_tokens,
                "system": SYSTEM_PROMPT,
                "messages": [
                    {"role": "user", "content": prompt}
                ],
                "temperature": config.temperature,
            }),
        })
    }

    fn parse_response(&self, body: &Value) -> Result<ParsedResponse, ProviderError> {
        let blocks = body
            .get("content")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                ProviderError::malformed("Failed to extract content from Anthropic API response")
            })?;

        // Only text blocks carry the answer; tool or thinking blocks are skipped
        let text = blocks
            .iter()
            .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
            .filter_map(|block| block.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("");

        let usage = body.get("usage").map(|_| {
            TokenUsage::new(
                optional_u64(body, "/usage/input_tokens"),
                optional_u64(body, "/usage/output_tokens"),
            )
        });

        Ok(ParsedResponse {
            text: non_empty(text, Provider::Anthropic)?,
            model: optional_string(body, "/model"),
            usage,
        })
    }

    fn classify_status(&self, status: StatusCode, body: &str) -> ProviderError {
        // 529 means the API is overloaded
        if status.as_u16() == 529 {
            return ProviderError::rate_limit(format!(
                "Anthropic API overloaded (status {status})"
            ));
        }
        ProviderError::from_status(Provider::Anthropic, status, body)
    }
}
