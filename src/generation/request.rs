use super::GeneratedItem;
use crate::providers::ProviderConfig;
use crate::types::{Browser, Framework, Language};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::Duration;

/// Allowed range for the test's own default timeout, in milliseconds
pub const TIMEOUT_MS_RANGE: RangeInclusive<u32> = 1_000..=120_000;

const DEFAULT_TIMEOUT_MS: u32 = 30_000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Per-batch generation options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    pub include_setup: bool,
    pub include_teardown: bool,
    pub headless: bool,
    pub browser: Browser,
    /// Default wait the generated test should use
    pub timeout_ms: u32,
    /// Upper bound for each provider call
    pub request_timeout_secs: u64,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            include_setup: true,
            include_teardown: true,
            headless: true,
            browser: Browser::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl GenerationOptions {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Where the generated test will point
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetContext {
    pub website_url: Option<String>,
    pub base_url: Option<String>,
}

/// One batch of scenarios to turn into tests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub scenarios: Vec<String>,
    pub framework: Framework,
    pub language: Language,
    pub provider: Option<ProviderConfig>,
    #[serde(default)]
    pub options: GenerationOptions,
    #[serde(default)]
    pub target: TargetContext,
}

impl GenerationRequest {
    pub fn new<I, S>(
        provider: ProviderConfig,
        framework: Framework,
        language: Language,
        scenarios: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scenarios: scenarios.into_iter().map(Into::into).collect(),
            framework,
            language,
            provider: Some(provider),
            options: GenerationOptions::default(),
            target: TargetContext::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: TargetContext) -> Self {
        self.target = target;
        self
    }

    /// Scenarios that survive blank filtering, with their original positions
    pub fn effective_scenarios(&self) -> impl Iterator<Item = (usize, &str)> {
        self.scenarios
            .iter()
            .enumerate()
            .map(|(index, scenario)| (index, scenario.trim()))
            .filter(|(_, scenario)| !scenario.is_empty())
    }

    /// A single-scenario request that reruns `item` with the same settings
    #[must_use]
    pub fn regeneration(&self, item: &GeneratedItem) -> Self {
        Self {
            scenarios: vec![item.scenario.clone()],
            ..self.clone()
        }
    }
}
