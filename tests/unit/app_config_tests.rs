/*!
 * Tests for application configuration functionality
 */

use subvtt::app_config::{Config, LogLevel};

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "zh");
    assert_eq!(config.target_languages, vec!["en".to_string(), "vi".to_string()]);
    assert_eq!(config.translation.ollama.model, "gemma2");
    assert_eq!(config.translation.ollama.endpoint, "http://localhost:11434");
    assert_eq!(config.translation.ollama.timeout_secs, 60);
    assert_eq!(config.translation.common.rate_limit, 10);
    assert_eq!(config.translation.common.retry_count, 3);
    assert_eq!(config.translation.common.retry_backoff_ms, 1000);
    assert_eq!(config.batch.max_concurrent_files, 5);
    assert_eq!(config.batch.subtitle_extension, "srt");
    assert_eq!(config.batch.media_extensions, vec!["mp4".to_string()]);
    assert!(!config.batch.recursive);
    assert_eq!(config.log_level, LogLevel::Info);
    assert!(config.validate().is_ok());
}

/// Test that a partial file is completed with defaults
#[test]
fn test_deserialize_withPartialJson_shouldFillDefaults() {
    let json = r#"{
        "target_languages": ["fr"],
        "translation": { "common": { "rate_limit": 2 } },
        "log_level": "debug"
    }"#;

    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.source_language, "zh");
    assert_eq!(config.target_languages, vec!["fr".to_string()]);
    assert_eq!(config.translation.common.rate_limit, 2);
    assert_eq!(config.translation.common.retry_count, 3);
    assert_eq!(config.translation.ollama.model, "gemma2");
    assert_eq!(config.log_level, LogLevel::Debug);
}

/// Test that serialising and reading back keeps every setting
#[test]
fn test_serialize_withDefaultConfig_shouldBeReadable() {
    let json = serde_json::to_string_pretty(&Config::default()).unwrap();
    let config: Config = serde_json::from_str(&json).unwrap();

    assert_eq!(config.target_languages, Config::default().target_languages);
    assert_eq!(config.translation.common.prompt_template, Config::default().translation.common.prompt_template);
    assert!(config.translation.common.temperature.is_none());
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let mut config = Config::default();

    config.source_language = "xyz".to_string();
    assert!(config.validate().is_err());
    config.source_language = "zh".to_string();

    config.target_languages.clear();
    assert!(config.validate().is_err());

    config.target_languages = vec!["en".to_string(), "qqq".to_string()];
    assert!(config.validate().is_err());

    config.target_languages = vec!["fr".to_string(), "fra".to_string()];
    assert!(config.validate().is_err(), "fr and fra name the same language");

    config.target_languages = vec!["en".to_string(), "vi".to_string()];
    assert!(config.validate().is_ok());

    config.translation.common.rate_limit = 0;
    assert!(config.validate().is_err());
    config.translation.common.rate_limit = 10;

    config.translation.ollama.timeout_secs = 0;
    assert!(config.validate().is_err());
    config.translation.ollama.timeout_secs = 60;

    config.batch.max_concurrent_files = 0;
    assert!(config.validate().is_err());
    config.batch.max_concurrent_files = 5;

    config.translation.common.prompt_template = "Translate to {target_language}".to_string();
    assert!(config.validate().is_err());
}

/// Test log level conversion
#[test]
fn test_logLevel_intoLevelFilter_shouldMatch() {
    assert_eq!(log::LevelFilter::from(LogLevel::Warn), log::LevelFilter::Warn);
    assert_eq!(log::LevelFilter::from(LogLevel::Trace), log::LevelFilter::Trace);
}
