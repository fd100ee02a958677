//! testforge - LLM-assisted browser test generation
//!
//! Turns natural-language scenarios into Playwright or Selenium test files
//! through a pluggable set of LLM providers, and renders the CI pipeline
//! that runs them.

#![allow(clippy::uninlined_format_args)] // Style preference
#![allow(clippy::format_push_string)] // Performance improvement but stylistic
#![allow(clippy::return_self_not_must_use)] // Builder pattern is clear enough
#![allow(clippy::items_after_statements)] // Locally-scoped use statements are fine

pub mod cli;
pub mod commands;
pub mod common;
pub mod config;
pub mod extractor;
pub mod generation;
pub mod llm_providers;
pub mod logger;
pub mod pipeline;
pub mod prompt;
pub mod providers;
pub mod types;
pub mod ui;

// Re-exports for library callers and the integration tests
pub use config::Config;
pub use extractor::{CodeExtractor, ExtractedCode, ExtractionError};
pub use generation::{
    BatchResult, GeneratedItem, GenerationError, GenerationOptions, GenerationRequest,
    GenerationStatus, RetryPolicy, TargetContext, TestGenerator,
};
pub use llm_providers::{CompletionBackend, HttpBackend, ProviderError, ProviderErrorKind};
pub use pipeline::{CiProvider, PipelineDocument, PipelineError, PipelineSpec, render_pipeline};
pub use prompt::PromptBuilder;
pub use providers::{Provider, ProviderConfig, Secret};
pub use types::{Browser, Framework, Language};
