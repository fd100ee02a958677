//! Provider adapters
//!
//! Every supported vendor protocol gets one adapter implementing
//! [`ProviderAdapter`]. The adapter shapes the outbound payload, turns the
//! vendor's success payload into plain text, and classifies failures. The
//! HTTP round trip itself lives in [`client`], which is the only place that
//! touches the network.

mod anthropic;
mod client;
mod custom;
mod google;
mod ollama;
mod openai;

pub use anthropic::AnthropicAdapter;
pub use client::{CompletionBackend, HttpBackend};
pub use custom::CustomAdapter;
pub use google::GoogleAdapter;
pub use ollama::OllamaAdapter;
pub use openai::OpenAiAdapter;

use crate::providers::{Provider, ProviderConfig, ProviderConfigError};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use url::Url;

/// System instruction sent by adapters whose protocol has a system slot
pub const SYSTEM_PROMPT: &str =
    "You are an expert test automation engineer. Generate clean, executable test code.";

const MAX_ERROR_DETAIL_CHARS: usize = 500;

/// Failure categories surfaced by every adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderErrorKind {
    Timeout,
    Authentication,
    RateLimit,
    MalformedResponse,
    Network,
    InvalidRequest,
}

impl ProviderErrorKind {
    /// Failures worth retrying when the caller opts in
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Timeout | Self::RateLimit | Self::Network)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Authentication => "authentication",
            Self::RateLimit => "rate-limit",
            Self::MalformedResponse => "malformed-response",
            Self::Network => "network",
            Self::InvalidRequest => "invalid-request",
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by a provider call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {detail}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub detail: String,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Timeout, detail)
    }

    pub fn authentication(detail: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Authentication, detail)
    }

    pub fn rate_limit(detail: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::RateLimit, detail)
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::MalformedResponse, detail)
    }

    pub fn network(detail: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Network, detail)
    }

    pub fn invalid_request(detail: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InvalidRequest, detail)
    }

    /// Map a transport-level failure from reqwest
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(format!("request timed out: {err}"))
        } else if err.is_decode() {
            Self::malformed(format!("failed to decode response body: {err}"))
        } else if err.is_connect() {
            Self::network(format!("connection failed: {err}"))
        } else {
            Self::network(err.to_string())
        }
    }

    /// Default mapping from an HTTP error status to a failure category
    pub fn from_status(provider: Provider, status: StatusCode, body: &str) -> Self {
        let detail = format!(
            "{} API request failed with status {}: {}",
            provider.display_name(),
            status,
            truncate_detail(body)
        );
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::authentication(detail),
            StatusCode::TOO_MANY_REQUESTS => Self::rate_limit(detail),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => Self::timeout(detail),
            _ => Self::network(detail),
        }
    }
}

impl From<ProviderConfigError> for ProviderError {
    fn from(err: ProviderConfigError) -> Self {
        Self::invalid_request(err.to_string())
    }
}

/// Token accounting reported by the provider, when it reports any
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}

impl TokenUsage {
    pub fn new(prompt_tokens: Option<u64>, completion_tokens: Option<u64>) -> Self {
        let total_tokens = match (prompt_tokens, completion_tokens) {
            (Some(p), Some(c)) => Some(p + c),
            _ => None,
        };
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens,
        }
    }

    #[must_use]
    pub fn with_total(mut self, total_tokens: Option<u64>) -> Self {
        if total_tokens.is_some() {
            self.total_tokens = total_tokens;
        }
        self
    }
}

/// Outbound request produced by an adapter
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub url: Url,
    pub headers: Vec<(&'static str, String)>,
    pub body: Value,
}

/// What an adapter recovered from a success payload
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    pub text: String,
    pub model: Option<String>,
    pub usage: Option<TokenUsage>,
}

/// Result of one completed provider call
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    /// Model reported by the provider, or the configured one
    pub model: String,
    pub usage: Option<TokenUsage>,
    /// Response body exactly as received
    pub raw_response: String,
    pub elapsed: Duration,
}

/// One vendor protocol
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> Provider;

    /// Shape the outbound payload for `prompt`
    fn build_request(
        &self,
        config: &ProviderConfig,
        prompt: &str,
    ) -> Result<ProviderRequest, ProviderError>;

    /// Pull plain text and usage out of a success payload
    fn parse_response(&self, body: &Value) -> Result<ParsedResponse, ProviderError>;

    /// Classify a non-success HTTP status
    fn classify_status(&self, status: StatusCode, body: &str) -> ProviderError {
        ProviderError::from_status(self.provider(), status, body)
    }
}

/// Resolve the adapter for a provider kind
pub fn adapter_for(provider: Provider) -> &'static dyn ProviderAdapter {
    match provider {
        Provider::OpenAI => &OpenAiAdapter,
        Provider::Anthropic => &AnthropicAdapter,
        Provider::Google => &GoogleAdapter,
        Provider::Ollama => &OllamaAdapter,
        Provider::Custom => &CustomAdapter,
    }
}

/// Append `route` to the configured base endpoint
pub(crate) fn endpoint_with_route(
    config: &ProviderConfig,
    route: &str,
) -> Result<Url, ProviderError> {
    let mut url = config.endpoint_url()?;
    let path = format!(
        "{}/{}",
        url.path().trim_end_matches('/'),
        route.trim_start_matches('/')
    );
    url.set_path(&path);
    Ok(url)
}

/// Read a string at a JSON pointer, failing as a malformed response
pub(crate) fn required_str<'a>(
    body: &'a Value,
    pointer: &str,
    provider: Provider,
) -> Result<&'a str, ProviderError> {
    body.pointer(pointer).and_then(Value::as_str).ok_or_else(|| {
        ProviderError::malformed(format!(
            "Failed to extract content from {} API response (missing {pointer})",
            provider.display_name()
        ))
    })
}

pub(crate) fn optional_u64(body: &Value, pointer: &str) -> Option<u64> {
    body.pointer(pointer).and_then(Value::as_u64)
}

pub(crate) fn optional_string(body: &Value, pointer: &str) -> Option<String> {
    body.pointer(pointer)
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

pub(crate) fn non_empty(text: String, provider: Provider) -> Result<String, ProviderError> {
    if text.trim().is_empty() {
        Err(ProviderError::malformed(format!(
            "{} API returned an empty completion",
            provider.display_name()
        )))
    } else {
        Ok(text)
    }
}

fn truncate_detail(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() > MAX_ERROR_DETAIL_CHARS {
        let mut out: String = trimmed.chars().take(MAX_ERROR_DETAIL_CHARS).collect();
        out.push_str("...");
        out
    } else {
        trimmed.to_string()
    }
}
