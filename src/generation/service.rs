use super::{
    BatchResult, GeneratedItem, GenerationError, GenerationRequest, RetryPolicy, TIMEOUT_MS_RANGE,
};
use crate::extractor::CodeExtractor;
use crate::llm_providers::{
    Completion, CompletionBackend, HttpBackend, ProviderError, ProviderErrorKind,
};
use crate::prompt::PromptBuilder;
use crate::providers::ProviderConfig;
use crate::{log_debug, log_info, log_warn};
use futures::future;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_retry::RetryIf;
use tokio_util::sync::CancellationToken;

/// Hooks for progress reporting. Both methods default to no-ops.
pub trait GenerationObserver: Send + Sync {
    fn on_started(&self, _index: usize, _scenario: &str) {}
    fn on_finished(&self, _item: &GeneratedItem) {}
}

struct SilentObserver;

impl GenerationObserver for SilentObserver {}

/// Service that turns scenario batches into generated tests
#[derive(Clone)]
pub struct TestGenerator {
    backend: Arc<dyn CompletionBackend>,
    observer: Arc<dyn GenerationObserver>,
    prompts: PromptBuilder,
    extractor: CodeExtractor,
    concurrency: usize,
    retry: RetryPolicy,
}

impl TestGenerator {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            backend,
            observer: Arc::new(SilentObserver),
            prompts: PromptBuilder::new(),
            extractor: CodeExtractor::new(),
            concurrency: 1,
            retry: RetryPolicy::none(),
        }
    }

    /// Generator backed by real HTTP calls
    pub fn with_http_backend() -> Self {
        Self::new(Arc::new(HttpBackend::new()))
    }

    /// Number of provider calls allowed in flight at once (default 1)
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn GenerationObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Generate one test per non-empty scenario, in request order
    pub async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<BatchResult, GenerationError> {
        self.generate_with_cancellation(request, &CancellationToken::new())
            .await
    }

    /// Like [`generate`](Self::generate), stopping early once `cancel` fires.
    ///
    /// Items that reached a terminal state before cancellation are returned
    /// and the result is flagged `cancelled`.
    pub async fn generate_with_cancellation(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<BatchResult, GenerationError> {
        let provider = validate_request(request)?;
        let scenarios: Vec<(usize, &str)> = request.effective_scenarios().collect();
        let expected = scenarios.len();

        log_info!(
            "Generating {} {} {} test(s) with {} ({} blank scenario(s) skipped)",
            expected,
            request.framework,
            request.language,
            provider.provider,
            request.scenarios.len() - expected
        );

        // `buffered` yields in input order; stopping at the first abandoned
        // scenario keeps a cancelled batch a prefix of the request
        let items: Vec<GeneratedItem> = stream::iter(scenarios)
            .map(|(index, scenario)| self.generate_one(request, provider, index, scenario, cancel))
            .buffered(self.concurrency)
            .take_while(|outcome| future::ready(outcome.is_some()))
            .filter_map(future::ready)
            .collect()
            .await;
        let cancelled = items.len() < expected;
        let batch = BatchResult::from_items(items, cancelled);

        log_info!(
            "Batch finished: {} succeeded, {} failed{}",
            batch.successful,
            batch.failed,
            if batch.cancelled { " (cancelled)" } else { "" }
        );
        Ok(batch)
    }

    /// Rerun a single scenario; a batch of one
    pub async fn regenerate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedItem, GenerationError> {
        let count = request.effective_scenarios().count();
        if count != 1 {
            return Err(GenerationError::ExpectedSingleScenario(count));
        }

        let batch = self.generate(request).await?;
        batch
            .items
            .into_iter()
            .next()
            .ok_or(GenerationError::ExpectedSingleScenario(0))
    }

    async fn generate_one(
        &self,
        request: &GenerationRequest,
        provider: &ProviderConfig,
        index: usize,
        scenario: &str,
        cancel: &CancellationToken,
    ) -> Option<GeneratedItem> {
        if cancel.is_cancelled() {
            log_debug!("Skipping scenario {}: batch cancelled", index);
            return None;
        }

        self.observer.on_started(index, scenario);
        let started = Instant::now();
        let mut item = GeneratedItem::pending(index, scenario, request.language);
        let prompt = self.prompts.build(
            scenario,
            request.framework,
            request.language,
            &request.options,
            &request.target,
        );
        item.start(prompt);

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                log_debug!("Abandoning in-flight call for '{}'", item.name);
                return None;
            }
            outcome = self.call_provider(provider, &item.prompt, request.options.request_timeout()) => outcome,
        };

        match outcome {
            Ok(completion) => {
                match self
                    .extractor
                    .extract(&completion.text, scenario, request.language)
                {
                    Ok(extracted) => item.complete(extracted, completion),
                    Err(err) => {
                        log_warn!("No usable code for '{}': {}", item.name, err);
                        item.fail_with_response(
                            ProviderErrorKind::MalformedResponse,
                            err.to_string(),
                            completion,
                        );
                    }
                }
            }
            Err(err) => {
                log_warn!("Generation failed for '{}': {}", item.name, err);
                item.fail(err.kind, err.detail);
            }
        }

        item.elapsed = started.elapsed();
        self.observer.on_finished(&item);
        Some(item)
    }

    async fn call_provider(
        &self,
        provider: &ProviderConfig,
        prompt: &str,
        timeout: Duration,
    ) -> Result<Completion, ProviderError> {
        let attempt = || self.attempt(provider, prompt, timeout);
        if !self.retry.is_enabled() {
            return attempt().await;
        }

        RetryIf::spawn(self.retry.delays(), attempt, |err: &ProviderError| {
            let transient = err.kind.is_transient();
            if transient {
                log_debug!("Retrying provider call after {}", err);
            }
            transient
        })
        .await
    }

    async fn attempt(
        &self,
        provider: &ProviderConfig,
        prompt: &str,
        timeout: Duration,
    ) -> Result<Completion, ProviderError> {
        match tokio::time::timeout(timeout, self.backend.complete(provider, prompt, timeout)).await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::timeout(format!(
                "provider call exceeded {timeout:?}"
            ))),
        }
    }
}

fn validate_request(request: &GenerationRequest) -> Result<&ProviderConfig, GenerationError> {
    if request.scenarios.is_empty() {
        return Err(GenerationError::NoScenarios);
    }
    let provider = request
        .provider
        .as_ref()
        .ok_or(GenerationError::MissingProvider)?;
    provider.validate()?;
    if !TIMEOUT_MS_RANGE.contains(&request.options.timeout_ms) {
        return Err(GenerationError::TimeoutOutOfRange(
            request.options.timeout_ms,
        ));
    }
    if request.options.request_timeout_secs == 0 {
        return Err(GenerationError::ZeroRequestTimeout);
    }
    Ok(provider)
}
