/*!
 * # subvtt - concurrent SRT to multi-language WebVTT translator
 *
 * A Rust library for translating SRT subtitle files into one WebVTT file per
 * target language through a local Ollama server.
 *
 * ## Features
 *
 * - Tolerant SRT parsing, lossless SRT to VTT timestamp conversion
 * - Every cue translated into every target language concurrently
 * - One token-bucket rate limit shared by all requests
 * - Per-request timeouts, exponential backoff retries and failure sentinels
 * - Bounded per-file concurrency for batch runs over a directory
 * - Audit of missing subtitles and missing translations
 * - ISO 639-1 and ISO 639-2 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `subtitle_processor`: Cue parsing and VTT output
 * - `rate_limiter`: Token bucket shared by all translation requests
 * - `translation`: Translation services:
 *   - `translation::core`: TranslationService with retries
 *   - `translation::pipeline`: Concurrent translation of whole files
 *   - `translation::prompts`: Prompt template rendering
 * - `file_utils`: Discovery, output paths and audit
 * - `app_controller`: Batch and single-file runs
 * - `language_utils`: ISO language code utilities
 * - `providers`: Completion backends:
 *   - `providers::ollama`: Ollama API client
 *   - `providers::mock`: In-process provider for tests
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod file_utils;
pub mod language_utils;
pub mod providers;
pub mod rate_limiter;
pub mod subtitle_processor;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{BatchReport, Controller};
pub use rate_limiter::TokenBucket;
pub use subtitle_processor::{Cue, Document, OutputDocument};
pub use translation::{FilePipeline, FileReport, TranslationService};
