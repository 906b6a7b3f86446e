/*!
 * Integration tests for directory runs through the controller
 */

use anyhow::Result;
use async_trait::async_trait;
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use subvtt::app_config::Config;
use subvtt::app_controller::Controller;
use subvtt::errors::ProviderError;
use subvtt::file_utils::ISSUES_LOG_NAME;
use subvtt::providers::Provider;
use subvtt::providers::mock::MockProvider;

use crate::common;

fn test_config() -> Config {
    let mut config = Config::default();
    config.translation.common.rate_limit = 100;
    config.translation.common.retry_count = 1;
    config.translation.common.retry_backoff_ms = 1;
    config
}

fn controller(config: Config, provider: MockProvider) -> Result<Controller> {
    Ok(Controller::with_provider(config, Arc::new(provider))?.with_progress(false))
}

/// Test a directory run translates every subtitle and reports missing counterparts
#[tokio::test]
async fn test_run_withMediaAndSubtitles_shouldTranslateAndWarn() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    common::create_test_file(dir, "a.mp4", "")?;
    common::create_test_file(dir, "b.mp4", "")?;
    common::create_test_subtitle(dir, "a.srt")?;
    common::create_test_subtitle(dir, "c.srt")?;

    let provider = MockProvider::working();
    let report = controller(test_config(), provider.clone())?.run(dir).await?;

    assert_eq!(report.files.len(), 2);
    assert_eq!(report.translated_count(), 2);
    assert!(report.failed_files.is_empty());
    assert_eq!(report.discovery_warnings, vec![format!("Missing subtitle for {}", dir.join("b.mp4").display())]);
    // 2 files x 3 cues x 2 languages
    assert_eq!(provider.request_count(), 12);

    for name in ["a_en.vtt", "a_vi.vtt", "c_en.vtt", "c_vi.vtt"] {
        let content = fs::read_to_string(dir.join(name))?;
        assert!(content.starts_with("WEBVTT\n\n1\n00:00:01.000 --> 00:00:04.000\n"), "{}", name);
    }
    Ok(())
}

/// Test an empty directory ends with a warning, not an error
#[tokio::test]
async fn test_run_withNoSubtitles_shouldFinishWithoutError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "lonely.mp4", "")?;

    let provider = MockProvider::working();
    let report = controller(test_config(), provider.clone())?.run(temp_dir.path()).await?;

    assert!(report.files.is_empty());
    assert_eq!(report.discovery_warnings.len(), 1);
    assert_eq!(provider.request_count(), 0);
    Ok(())
}

/// Test a file that cannot be processed does not stop the others
#[tokio::test]
async fn test_run_withUnwritableOutput_shouldContinueWithOtherFiles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    common::create_test_subtitle(dir, "good.srt")?;
    common::create_test_subtitle(dir, "bad.srt")?;
    // A directory where the output file should go makes the write fail
    fs::create_dir(dir.join("bad_en.vtt"))?;

    let mut config = test_config();
    config.target_languages = vec!["en".to_string()];
    let report = controller(config, MockProvider::working())?
        .with_force_overwrite(true)
        .run(dir)
        .await?;

    assert_eq!(report.files.len(), 1);
    assert_eq!(report.files[0].input, dir.join("good.srt"));
    assert_eq!(report.failed_files.len(), 1);
    assert_eq!(report.failed_files[0].0, dir.join("bad.srt"));
    assert!(dir.join("good_en.vtt").is_file());
    Ok(())
}

/// Test the issues log collects the run summary and warnings
#[tokio::test]
async fn test_run_withWarnings_shouldAppendIssuesLog() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    common::create_test_file(dir, "movie.mp4", "")?;
    common::create_test_subtitle(dir, "other.srt")?;

    controller(test_config(), MockProvider::working())?.run(dir).await?;

    let log = fs::read_to_string(dir.join(ISSUES_LOG_NAME))?;
    assert!(log.contains("Batch run: 1 translated"));
    assert!(log.contains("Missing subtitle for"));
    Ok(())
}

/// Test a failing service still completes the run with sentinel output
#[tokio::test(start_paused = true)]
async fn test_run_withFailingProvider_shouldWriteSentinels() -> Result<()> {
    common::init_logging();
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    common::create_test_file(dir, "one.srt", "1\n00:00:01,000 --> 00:00:02,000\n你好\n")?;

    let mut config = test_config();
    config.target_languages = vec!["en".to_string()];
    config.batch.write_issues_log = false;
    let report = controller(config, MockProvider::failing())?.run(dir).await?;

    assert_eq!(report.failed_cue_count(), 1);
    assert!(!dir.join(ISSUES_LOG_NAME).exists());
    let vtt = fs::read_to_string(dir.join("one_en.vtt"))?;
    assert!(vtt.contains("TRANSLATION_FAILED: 你好"));
    Ok(())
}

/// Test single-file mode and the connection check
#[tokio::test]
async fn test_run_file_withSingleSubtitle_shouldTranslateIt() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "single.srt")?;

    let controller = controller(test_config(), MockProvider::working())?;
    assert!(controller.check_connection().await);

    let report = controller.run_file(&input).await?;
    assert_eq!(report.outputs.len(), 2);
    assert!(controller.run_file(&temp_dir.path().join("missing.srt")).await.is_err());
    Ok(())
}

/// Test an invalid configuration is rejected up front
#[test]
fn test_with_provider_withInvalidConfig_shouldFail() {
    let mut config = Config::default();
    config.target_languages.clear();

    assert!(Controller::with_provider(config, Arc::new(MockProvider::working())).is_err());
}

/// Holds every call for one second and remembers how many overlapped
#[derive(Debug, Default)]
struct InFlightProvider {
    current: AtomicUsize,
    peak: AtomicUsize,
}

#[async_trait]
impl Provider for InFlightProvider {
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(1)).await;
        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(prompt.to_string())
    }

    async fn test_connection(&self) -> Result<String, ProviderError> {
        Ok("in-flight".to_string())
    }
}

/// Test no more than max_concurrent_files files are translated at once
#[tokio::test(start_paused = true)]
async fn test_run_withMoreFilesThanCap_shouldLimitFilesInFlight() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    for i in 0..7 {
        let content = format!("1\n00:00:01,000 --> 00:00:02,000\nline {}\n", i);
        common::create_test_file(dir, &format!("file{}.srt", i), &content)?;
    }

    let mut config = test_config();
    config.target_languages = vec!["en".to_string()];
    config.batch.max_concurrent_files = 2;
    config.batch.write_issues_log = false;

    // One cue and one language per file, so requests in flight equal files in flight
    let provider = Arc::new(InFlightProvider::default());
    let controller = Controller::with_provider(config, provider.clone())?.with_progress(false);
    let report = controller.run(dir).await?;

    assert_eq!(report.translated_count(), 7);
    assert_eq!(provider.peak.load(Ordering::SeqCst), 2);
    assert_eq!(provider.current.load(Ordering::SeqCst), 0);
    Ok(())
}

/// Test requests from different files draw from the same rate limiter
#[tokio::test(start_paused = true)]
async fn test_run_withSeveralFiles_shouldShareOneRateLimit() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    for name in ["one.srt", "two.srt", "three.srt"] {
        common::create_test_subtitle(dir, name)?;
    }

    let mut config = test_config();
    config.target_languages = vec!["en".to_string()];
    config.translation.common.rate_limit = 2;
    config.batch.write_issues_log = false;

    let provider = MockProvider::working();
    let report = controller(config, provider.clone())?.run(dir).await?;
    assert_eq!(report.translated_count(), 3);

    // 3 files x 3 cues: a burst of 2, then one request every 500ms
    let mut times: Vec<_> = provider.calls().into_iter().map(|call| call.at).collect();
    times.sort();
    assert_eq!(times.len(), 9);

    let span = times[8] - times[0];
    assert!(span >= Duration::from_millis(3_490), "9 requests took {:?}", span);
    for window in times.windows(5) {
        // A 2-token bucket refilling 2/s never admits 5 requests within one second
        assert!(window[4] - window[0] > Duration::from_secs(1), "{:?}", window);
    }
    Ok(())
}

/// Test same-named files in different subdirectories keep separate outputs
#[tokio::test]
async fn test_run_withRecursiveOutputDir_shouldMirrorSubdirectories() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path().join("library");
    let out_dir = temp_dir.path().join("out");
    common::create_test_file(&dir, "s1/ep.srt", "1\n00:00:01,000 --> 00:00:02,000\nfrom s1\n")?;
    common::create_test_file(&dir, "s2/ep.srt", "1\n00:00:01,000 --> 00:00:02,000\nfrom s2\n")?;

    let mut config = test_config();
    config.target_languages = vec!["en".to_string()];
    config.translation.common.prompt_template = common::TEXT_ONLY_PROMPT.to_string();
    config.batch.recursive = true;
    config.batch.write_issues_log = false;

    let provider = MockProvider::working().with_custom_response(|prompt| common::split_prompt(prompt).1.to_string());
    let report = controller(config, provider)?
        .with_output_dir(Some(out_dir.clone()))
        .run(&dir)
        .await?;

    assert_eq!(report.translated_count(), 2);
    assert_eq!(report.skipped_count(), 0);
    assert!(fs::read_to_string(out_dir.join("s1").join("ep_en.vtt"))?.contains("from s1"));
    assert!(fs::read_to_string(out_dir.join("s2").join("ep_en.vtt"))?.contains("from s2"));
    assert!(!out_dir.join("ep_en.vtt").exists());
    Ok(())
}
