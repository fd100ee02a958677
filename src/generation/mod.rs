//! Batch test generation
//!
//! [`TestGenerator`] drives a [`GenerationRequest`] scenario by scenario:
//! prompt, provider call, code extraction. Failures stay inside the
//! [`GeneratedItem`] they belong to; only a malformed request fails the call.

mod item;
mod request;
mod retry;
mod service;

pub use item::{BatchResult, GeneratedItem, GenerationStatus};
pub use request::{GenerationOptions, GenerationRequest, TIMEOUT_MS_RANGE, TargetContext};
pub use retry::RetryPolicy;
pub use service::{GenerationObserver, TestGenerator};

use crate::providers::ProviderConfigError;

/// Structural problems with a request; the batch never starts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("No test scenarios supplied")]
    NoScenarios,
    #[error("LLM provider not configured for this request")]
    MissingProvider,
    #[error("Invalid provider configuration: {0}")]
    InvalidProvider(#[from] ProviderConfigError),
    #[error("Timeout of {0} ms is outside the allowed range of 1000..=120000 ms")]
    TimeoutOutOfRange(u32),
    #[error("Provider request timeout must be at least one second")]
    ZeroRequestTimeout,
    #[error("Regeneration expects exactly one non-empty scenario, got {0}")]
    ExpectedSingleScenario(usize),
}
