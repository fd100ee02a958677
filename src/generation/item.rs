use crate::extractor::{self, ExtractedCode};
use crate::llm_providers::{Completion, ProviderErrorKind, TokenUsage};
use crate::log_warn;
use crate::types::Language;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum_macros::{Display, EnumString};

/// Lifecycle of one generated test
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GenerationStatus {
    #[default]
    Pending,
    Generating,
    Completed,
    Failed,
}

impl GenerationStatus {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// `pending -> generating -> completed | failed`, nothing leaves a terminal state
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Generating)
                | (Self::Generating, Self::Completed | Self::Failed)
                // Prompt construction can fail before the provider is ever called
                | (Self::Pending, Self::Failed)
        )
    }
}

/// Result for one scenario. The caller persists it; this crate only builds it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedItem {
    /// Position of the scenario in the originating request
    pub index: usize,
    pub scenario: String,
    /// Derived name, `test_<slug>`
    pub name: String,
    pub status: GenerationStatus,
    pub code: String,
    pub file_name: String,
    pub error: String,
    pub error_kind: Option<ProviderErrorKind>,
    pub elapsed: Duration,
    pub prompt: String,
    pub raw_response: String,
    pub model: Option<String>,
    pub usage: Option<TokenUsage>,
}

impl GeneratedItem {
    pub fn pending(index: usize, scenario: &str, language: Language) -> Self {
        Self {
            index,
            scenario: scenario.to_string(),
            name: extractor::test_name(scenario),
            status: GenerationStatus::Pending,
            code: String::new(),
            file_name: extractor::file_name(scenario, language),
            error: String::new(),
            error_kind: None,
            elapsed: Duration::ZERO,
            prompt: String::new(),
            raw_response: String::new(),
            model: None,
            usage: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == GenerationStatus::Completed
    }

    pub fn is_failed(&self) -> bool {
        self.status == GenerationStatus::Failed
    }

    fn advance(&mut self, next: GenerationStatus) -> bool {
        if self.status.can_transition_to(next) {
            self.status = next;
            true
        } else {
            log_warn!(
                "Ignoring illegal status change {} -> {} for '{}'",
                self.status,
                next,
                self.name
            );
            false
        }
    }

    pub(crate) fn start(&mut self, prompt: String) {
        self.prompt = prompt;
        self.advance(GenerationStatus::Generating);
    }

    pub(crate) fn complete(&mut self, extracted: ExtractedCode, completion: Completion) {
        if self.advance(GenerationStatus::Completed) {
            self.code = extracted.code;
            self.file_name = extracted.file_name;
            self.raw_response = completion.raw_response;
            self.model = Some(completion.model);
            self.usage = completion.usage;
        }
    }

    pub(crate) fn fail(&mut self, kind: ProviderErrorKind, detail: impl Into<String>) {
        if self.advance(GenerationStatus::Failed) {
            self.error_kind = Some(kind);
            self.error = detail.into();
        }
    }

    /// Failure after a response arrived; keeps the response for inspection
    pub(crate) fn fail_with_response(
        &mut self,
        kind: ProviderErrorKind,
        detail: impl Into<String>,
        completion: Completion,
    ) {
        if self.advance(GenerationStatus::Failed) {
            self.error_kind = Some(kind);
            self.error = detail.into();
            self.raw_response = completion.raw_response;
            self.model = Some(completion.model);
            self.usage = completion.usage;
        }
    }
}

/// Outcome of one batch, items in request order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub items: Vec<GeneratedItem>,
    pub successful: usize,
    pub failed: usize,
    /// Set when the caller cancelled before every scenario finished
    pub cancelled: bool,
}

impl BatchResult {
    pub fn from_items(items: Vec<GeneratedItem>, cancelled: bool) -> Self {
        let (successful, failed) =
            items
                .iter()
                .fold((0, 0), |(ok, failed), item| match item.status {
                    GenerationStatus::Completed => (ok + 1, failed),
                    GenerationStatus::Failed => (ok, failed + 1),
                    GenerationStatus::Pending | GenerationStatus::Generating => (ok, failed),
                });

        Self {
            items,
            successful,
            failed,
            cancelled,
        }
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    /// Items worth offering for regeneration
    pub fn failed_items(&self) -> impl Iterator<Item = &GeneratedItem> {
        self.items.iter().filter(|item| item.is_failed())
    }
}
