use super::{
    ParsedResponse, ProviderAdapter, ProviderError, ProviderRequest, SYSTEM_PROMPT, TokenUsage,
    endpoint_with_route, non_empty, optional_string, optional_u64,
};
use crate::providers::{Provider, ProviderConfig};
use reqwest::StatusCode;
use serde_json::{Value, json};

/// Gemini `generateContent` protocol
pub struct GoogleAdapter;

impl GoogleAdapter {
    fn url(config: &ProviderConfig) -> Result<url::Url, ProviderError> {
        let base = config.endpoint_url()?;
        // Endpoints saved as the full method URL are used verbatim
        if base.path().ends_with(":generateContent") {
            return Ok(base);
        }
        endpoint_with_route(config, &format!("models/{}:generateContent", config.model))
    }
}

impl ProviderAdapter for GoogleAdapter {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    fn build_request(
        &self,
        config: &ProviderConfig,
        prompt: &str,
    ) -> Result<ProviderRequest, ProviderError> {
        Ok(ProviderRequest {
            url: Self::url(config)?,
            headers: vec![("x-goog-api-key", config.api_key.expose().to_string())],
            body: json!({
                "contents": [
                    {
                        "role": "user",
                        "parts": [
                            {"text": format!("{SYSTEM_PROMPT}\n\n{prompt}")}
                        ]
                    }
                ],
                "generationConfig": {
                    // Model is specified in the URL, not here
                    "maxOutputTokens": config.max_tokens,
                    "temperature": config.temperature,
                }
            }),
        })
    }

    fn parse_response(&self, body: &Value) -> Result<ParsedResponse, ProviderError> {
        let parts = body
            .pointer("/candidates/0/content/parts")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                let reason = optional_string(body, "/promptFeedback/blockReason");
                ProviderError::malformed(match reason {
                    Some(reason) => format!("Gemini API blocked the prompt: {reason}"),
                    None => "Failed to extract content from Gemini API response".to_string(),
                })
            })?;

        let text = parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("");

        let usage = body.get("usageMetadata").map(|_| {
            TokenUsage::new(
                optional_u64(body, "/usageMetadata/promptTokenCount"),
                optional_u64(body, "/usageMetadata/candidatesTokenCount"),
            )
            .with_total(optional_u64(body, "/usageMetadata/totalTokenCount"))
        });

        Ok(ParsedResponse {
            text: non_empty(text, Provider::Google)?,
            model: optional_string(body, "/modelVersion"),
            usage,
        })
    }

    fn classify_status(&self, status: StatusCode, body: &str) -> ProviderError {
        // Gemini reports a bad key as 400 rather than 401
        if status == StatusCode::BAD_REQUEST && body.contains("API_KEY_INVALID") {
            return ProviderError::authentication("Gemini API rejected the API key");
        }
        ProviderError::from_status(Provider::Google, status, body)
    }
}
