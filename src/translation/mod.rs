/*!
 * Cue translation.
 *
 * This module contains the translation client and the per-file pipeline
 * built on top of it. It is split into several submodules:
 *
 * - `core`: TranslationService with rate limiting, timeouts and retries
 * - `pipeline`: FilePipeline, concurrent translation of a whole file
 * - `prompts`: Prompt template rendering
 */

// Re-export main types for easier usage
pub use self::core::{
    FAILURE_SENTINEL, RetryPolicy, TranslationOutcome, TranslationRequest, TranslationResult,
    TranslationService, failure_sentinel,
};
pub use self::pipeline::{FilePipeline, FileReport, LanguageOutput};
pub use self::prompts::PromptTemplate;

// Submodules
pub mod core;
pub mod pipeline;
pub mod prompts;
