use super::openai::{chat_completion_body, parse_chat_completion};
use super::{
    ParsedResponse, ProviderAdapter, ProviderError, ProviderRequest, endpoint_with_route,
    non_empty, optional_string,
};
use crate::providers::{Provider, ProviderConfig};
use serde_json::Value;

const CHAT_ROUTE: &str = "chat/completions";

/// Any OpenAI-compatible endpoint (vLLM, LM Studio, gateways)
pub struct CustomAdapter;

impl ProviderAdapter for CustomAdapter {
    fn provider(&self) -> Provider {
        Provider::Custom
    }

    fn build_request(
        &self,
        config: &ProviderConfig,
        prompt: &str,
    ) -> Result<ProviderRequest, ProviderError> {
        let base = config.endpoint_url()?;
        let url = if base.path().trim_end_matches('/').ends_with(CHAT_ROUTE) {
            base
        } else {
            endpoint_with_route(config, CHAT_ROUTE)?
        };

        let mut headers = Vec::new();
        if config.has_api_key() {
            headers.push((
                "Authorization",
                format!("Bearer {}", config.api_key.expose()),
            ));
        }

        Ok(ProviderRequest {
            url,
            headers,
            body: chat_completion_body(config, prompt),
        })
    }

    fn parse_response(&self, body: &Value) -> Result<ParsedResponse, ProviderError> {
        if body.get("choices").is_some() {
            return parse_chat_completion(body, Provider::Custom);
        }

        // Looser gateways answer with a flat text field
        let text = ["content", "text", "response"]
            .iter()
            .find_map(|field| body.get(*field).and_then(Value::as_str))
            .ok_or_else(|| {
                ProviderError::malformed(
                    "Custom API response has neither choices nor a content/text/response field",
                )
            })?;

        Ok(ParsedResponse {
            text: non_empty(text.to_string(), Provider::Custom)?,
            model: optional_string(body, "/model"),
            usage: None,
        })
    }
}
