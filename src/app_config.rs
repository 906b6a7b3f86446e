use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::time::Duration;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Source language code (ISO)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Target language codes (ISO), one output file per language
    #[serde(default = "default_target_languages")]
    pub target_languages: Vec<String>,

    /// Translation config
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Batch and discovery config
    #[serde(default)]
    pub batch: BatchConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Ollama service configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OllamaConfig {
    /// Model name (e.g., "gemma2", "llama3")
    #[serde(default = "default_ollama_model")]
    pub model: String,

    /// Service endpoint URL
    #[serde(default = "default_ollama_endpoint")]
    pub endpoint: String,

    /// Per-call timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            model: default_ollama_model(),
            endpoint: default_ollama_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl OllamaConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Translation service configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct TranslationConfig {
    /// Ollama connection settings
    #[serde(default)]
    pub ollama: OllamaConfig,

    /// Common translation settings
    #[serde(default)]
    pub common: TranslationCommonConfig,
}

/// Common translation settings applicable to every request
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TranslationCommonConfig {
    /// Prompt template sent for every cue
    /// Placeholders: {source_language}, {target_language}, {text}
    #[serde(default = "default_prompt_template")]
    pub prompt_template: String,

    /// Token bucket capacity and refill rate, in requests per second
    #[serde(default = "default_rate_limit")]
    pub rate_limit: u32,

    /// Retry count for failed requests (attempts beyond the first)
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base backoff in milliseconds, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Temperature parameter for text generation (0.0 to 1.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl Default for TranslationCommonConfig {
    fn default() -> Self {
        Self {
            prompt_template: default_prompt_template(),
            rate_limit: default_rate_limit(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            temperature: None,
        }
    }
}

/// Configuration for discovery and per-file concurrency
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BatchConfig {
    /// Maximum number of files translated at the same time
    #[serde(default = "default_max_concurrent_files")]
    pub max_concurrent_files: usize,

    /// Extension of input subtitle files
    #[serde(default = "default_subtitle_extension")]
    pub subtitle_extension: String,

    /// Extensions of media files expected to have a subtitle counterpart
    #[serde(default = "default_media_extensions")]
    pub media_extensions: Vec<String>,

    /// Whether to descend into subdirectories
    #[serde(default)]
    pub recursive: bool,

    /// Whether to append a run summary to the issues log in the input directory
    #[serde(default = "default_true")]
    pub write_issues_log: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_files: default_max_concurrent_files(),
            subtitle_extension: default_subtitle_extension(),
            media_extensions: default_media_extensions(),
            recursive: false,
            write_issues_log: true,
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "zh".to_string()
}

fn default_target_languages() -> Vec<String> {
    vec!["en".to_string(), "vi".to_string()]
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_rate_limit() -> u32 {
    10 // 10 requests per second, burst of 10
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_max_concurrent_files() -> usize {
    5
}

fn default_subtitle_extension() -> String {
    "srt".to_string()
}

fn default_media_extensions() -> Vec<String> {
    vec!["mp4".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_ollama_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_ollama_model() -> String {
    "gemma2".to_string()
}

fn default_prompt_template() -> String {
    "Translate the following {source_language} text to {target_language}. Provide only the direct translation without any explanations or additional text:\n\n{text}".to_string()
}

impl Config {
    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        // Validate languages
        let _source_name = crate::language_utils::get_language_name(&self.source_language)?;

        if self.target_languages.is_empty() {
            return Err(anyhow!("At least one target language is required"));
        }

        for (i, target) in self.target_languages.iter().enumerate() {
            crate::language_utils::get_language_name(target)?;
            if self.target_languages[..i]
                .iter()
                .any(|earlier| crate::language_utils::language_codes_match(earlier, target))
            {
                return Err(anyhow!("Duplicate target language: {}", target));
            }
        }

        if self.translation.common.rate_limit == 0 {
            return Err(anyhow!("Rate limit must be at least 1 request per second"));
        }

        if self.translation.ollama.timeout_secs == 0 {
            return Err(anyhow!("Request timeout must be greater than zero"));
        }

        if self.batch.max_concurrent_files == 0 {
            return Err(anyhow!("max_concurrent_files must be at least 1"));
        }

        if !self.translation.common.prompt_template.contains("{text}") {
            return Err(anyhow!("Prompt template must contain the {{text}} placeholder"));
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            source_language: default_source_language(),
            target_languages: default_target_languages(),
            translation: TranslationConfig::default(),
            batch: BatchConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
