/*!
 * Core translation functionality.
 *
 * This module contains the main TranslationService struct, which translates
 * one piece of text into one target language. Every attempt takes a token from
 * the shared rate limiter, runs under its own timeout, and transient failures
 * are retried with exponential backoff. When retries run out the caller gets a
 * sentinel string instead of an error, so one bad cue never stops a file.
 */

use log::{error, warn};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::Config;
use crate::errors::{ProviderError, TranslationError};
use crate::providers::Provider;
use crate::rate_limiter::TokenBucket;

use super::prompts::PromptTemplate;

/// Prefix marking a cue whose translation failed
pub const FAILURE_SENTINEL: &str = "TRANSLATION_FAILED";

/// Characters of source text included in failure logs
const PREVIEW_CHARS: usize = 50;

/// Text written in place of a translation that could not be obtained
pub fn failure_sentinel(source_text: &str) -> String {
    format!("{}: {}", FAILURE_SENTINEL, source_text)
}

fn preview(text: &str) -> String {
    let mut preview: String = text.chars().take(PREVIEW_CHARS).collect();
    if text.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview.replace('\n', " ")
}

/// Retry schedule: `max_retries` attempts after the first, delay doubling from `backoff_base`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_base: Duration) -> Self {
        Self { max_retries, backoff_base }
    }

    /// Upper bound on attempts, including the first
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Delay before retry number `retry` (1-based): `backoff_base * 2^(retry-1)`
    pub fn delay_before_retry(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.backoff_base.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// One cue in one target language
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    /// Index of the cue as written in the source file
    pub cue_index: usize,
    /// Position of the cue in its document
    pub position: usize,
    /// Target language code
    pub target_language: String,
    /// Text to translate
    pub source_text: String,
}

/// Whether a translation succeeded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    Success,
    Failed { reason: String },
}

/// Result for one [`TranslationRequest`]
#[derive(Debug, Clone)]
pub struct TranslationResult {
    pub cue_index: usize,
    pub position: usize,
    pub target_language: String,
    /// Translation, or the failure sentinel
    pub translated_text: String,
    pub outcome: TranslationOutcome,
}

impl TranslationResult {
    pub fn is_success(&self) -> bool {
        self.outcome == TranslationOutcome::Success
    }
}

/// Main translation service for cue translation
#[derive(Debug)]
pub struct TranslationService {
    /// Completion backend
    provider: Arc<dyn Provider>,

    /// Limiter shared with every other service and task
    limiter: Arc<TokenBucket>,

    /// Prompt rendered for every request
    prompt: PromptTemplate,

    /// Retry schedule
    retry: RetryPolicy,

    /// Deadline for a single provider call
    request_timeout: Duration,
}

impl TranslationService {
    /// Create a new translation service
    pub fn new(
        provider: Arc<dyn Provider>,
        limiter: Arc<TokenBucket>,
        prompt: PromptTemplate,
        retry: RetryPolicy,
        request_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            limiter,
            prompt,
            retry,
            request_timeout,
        }
    }

    /// Create a translation service from the application configuration
    pub fn from_config(config: &Config, provider: Arc<dyn Provider>, limiter: Arc<TokenBucket>) -> Self {
        let common = &config.translation.common;
        Self::new(
            provider,
            limiter,
            PromptTemplate::new(&common.prompt_template, &config.source_language),
            RetryPolicy::new(common.retry_count, Duration::from_millis(common.retry_backoff_ms)),
            config.translation.ollama.timeout(),
        )
    }

    /// The shared rate limiter
    pub fn limiter(&self) -> &Arc<TokenBucket> {
        &self.limiter
    }

    /// The retry schedule
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Translate one request, never failing.
    ///
    /// Errors are logged and turned into a [`TranslationOutcome::Failed`]
    /// result whose text is the failure sentinel.
    pub async fn translate(&self, request: TranslationRequest) -> TranslationResult {
        let (translated_text, outcome) =
            match self.translate_text(&request.source_text, &request.target_language).await {
                Ok(text) => (text, TranslationOutcome::Success),
                Err(e) => {
                    error!(
                        "Cue {} ({}) failed: {} - text: {}",
                        request.cue_index,
                        request.target_language,
                        e,
                        preview(&request.source_text)
                    );
                    (
                        failure_sentinel(&request.source_text),
                        TranslationOutcome::Failed { reason: e.to_string() },
                    )
                }
            };

        TranslationResult {
            cue_index: request.cue_index,
            position: request.position,
            target_language: request.target_language,
            translated_text,
            outcome,
        }
    }

    /// Translate text into one language, retrying transient failures.
    ///
    /// Empty text is returned as-is without contacting the provider.
    pub async fn translate_text(&self, text: &str, target_language: &str) -> Result<String, TranslationError> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        let prompt = self.prompt.render(text, target_language);
        let mut attempts = 0;

        loop {
            attempts += 1;
            let error = match self.attempt(&prompt).await {
                Ok(translated) => return Ok(translated.trim().to_string()),
                Err(e) if !e.is_retryable() => return Err(TranslationError::NonRetryable(e)),
                Err(e) => e,
            };

            if attempts >= self.retry.max_attempts() {
                return Err(TranslationError::RetriesExhausted { attempts, source: error });
            }

            let delay = self.retry.delay_before_retry(attempts);
            warn!(
                "Attempt {}/{} to {} failed: {} - retrying in {:?}",
                attempts,
                self.retry.max_attempts(),
                target_language,
                error,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// One provider call: take a token, then call under the request timeout
    async fn attempt(&self, prompt: &str) -> Result<String, ProviderError> {
        self.limiter.acquire().await;

        match tokio::time::timeout(self.request_timeout, self.provider.complete(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(self.request_timeout)),
        }
    }
}
