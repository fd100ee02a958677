use super::{
    ParsedResponse, ProviderAdapter, ProviderError, ProviderRequest, SYSTEM_PROMPT, TokenUsage,
    endpoint_with_route, non_empty, optional_string, optional_u64, required_str,
};
use crate::providers::{Provider, ProviderConfig};
use serde_json::{Value, json};

/// Chat-completions protocol: a `messages` array with a system turn
pub struct OpenAiAdapter;

/// Payload shared with OpenAI-compatible endpoints
pub(super) fn chat_completion_body(config: &ProviderConfig, prompt: &str) -> Value {
    json!({
        "model": config.model,
        "messages": [
            {"role": "system", "content": SYSTEM_PROMPT},
            {"role": "user", "content": prompt}
        ],
        "max_tokens": config.max_tokens,
        "temperature": config.temperature,
    })
}

/// Parse `choices[0].message.content` plus usage
pub(super) fn parse_chat_completion(
    body: &Value,
    provider: Provider,
) -> Result<ParsedResponse, ProviderError> {
    let text = required_str(body, "/choices/0/message/content", provider)?;
    let usage = body.get("usage").map(|_| {
        TokenUsage::new(
            optional_u64(body, "/usage/prompt_tokens"),
            optional_u64(body, "/usage/completion_tokens"),
        )
        .with_total(optional_u64(body, "/usage/total_tokens"))
    });

    Ok(ParsedResponse {
        text: non_empty(text.to_string(), provider)?,
        model: optional_string(body, "/model"),
        usage,
    })
}

impl ProviderAdapter for OpenAiAdapter {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    fn build_request(
        &self,
        config: &ProviderConfig,
        prompt: &str,
    ) -> Result<ProviderRequest, ProviderError> {
        Ok(ProviderRequest {
            url: endpoint_with_route(config, "chat/completions")?,
            headers: vec![(
                "Authorization",
                format!("Bearer {}", config.api_key.expose()),
            )],
            body: chat_completion_body(config, prompt),
        })
    }

    fn parse_response(&self, body: &Value) -> Result<ParsedResponse, ProviderError> {
        parse_chat_completion(body, Provider::OpenAI)
    }
}
