use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

use crate::app_config::Config;
use crate::file_utils::{FileManager, ISSUES_LOG_NAME};
use crate::providers::Provider;
use crate::rate_limiter::TokenBucket;
use crate::translation::{FilePipeline, FileReport, TranslationService};

// @module: Application controller for batch translation

/// Summary of one batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Reports of files that were processed, in completion order
    pub files: Vec<FileReport>,
    /// Files that could not be processed, with the reason
    pub failed_files: Vec<(PathBuf, String)>,
    /// Warnings raised while discovering files
    pub discovery_warnings: Vec<String>,
    /// Wall-clock time of the whole run
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn translated_count(&self) -> usize {
        self.files.iter().filter(|file| !file.is_skipped()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.files.iter().filter(|file| file.is_skipped()).count()
    }

    pub fn failed_cue_count(&self) -> usize {
        self.files.iter().map(|file| file.failed_cues).sum()
    }

    /// Every warning of the run: discovery, per-file and failed files
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = self.discovery_warnings.clone();
        for file in &self.files {
            warnings.extend(file.warnings.iter().cloned());
        }
        for (path, reason) in &self.failed_files {
            warnings.push(format!("Failed to process {}: {}", path.display(), reason));
        }
        warnings
    }

    /// One-line summary
    pub fn summary(&self) -> String {
        format!(
            "{} translated, {} skipped, {} failed, {} failed cues in {}",
            self.translated_count(),
            self.skipped_count(),
            self.failed_files.len(),
            self.failed_cue_count(),
            Controller::format_duration(self.elapsed)
        )
    }
}

/// Main application controller for subtitle translation
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Completion backend, shared with the pipeline
    provider: Arc<dyn Provider>,

    // @field: File pipeline holding the shared limiter and file gate
    pipeline: FilePipeline,

    // @field: Draw a progress bar during batch runs
    show_progress: bool,
}

impl Controller {
    // @method: Create a controller with the given configuration and provider
    pub fn with_provider(config: Config, provider: Arc<dyn Provider>) -> Result<Self> {
        config.validate()?;

        let limiter = Arc::new(TokenBucket::new(config.translation.common.rate_limit));
        let service = Arc::new(TranslationService::from_config(&config, Arc::clone(&provider), limiter));
        let pipeline = FilePipeline::new(
            service,
            config.target_languages.clone(),
            config.batch.max_concurrent_files,
        );

        Ok(Self {
            config,
            provider,
            pipeline,
            show_progress: true,
        })
    }

    /// Write outputs into `output_dir` instead of next to each input
    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.pipeline = self.pipeline.with_output_dir(output_dir);
        self
    }

    /// Re-translate outputs that are already up to date
    pub fn with_force_overwrite(mut self, force_overwrite: bool) -> Self {
        self.pipeline = self.pipeline.with_force_overwrite(force_overwrite);
        self
    }

    /// Enable or disable the progress bar
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Probe the provider; failure is only a warning since requests are retried anyway
    pub async fn check_connection(&self) -> bool {
        match self.provider.test_connection().await {
            Ok(description) => {
                info!("Connected: {}", description);
                true
            }
            Err(e) => {
                warn!("Translation service unreachable, continuing anyway: {}", e);
                false
            }
        }
    }

    fn progress_bar(&self, total: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress_bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar
    }

    /// Translate every subtitle file found in `input_dir`.
    ///
    /// Files run concurrently up to the configured limit. A file that fails is
    /// recorded in the report and does not stop the others.
    pub async fn run(&self, input_dir: &Path) -> Result<BatchReport> {
        let start_time = Instant::now();

        let discovery = FileManager::discover(input_dir, &self.config.batch)
            .with_context(|| format!("Failed to scan {:?}", input_dir))?;

        let mut report = BatchReport {
            discovery_warnings: discovery.warnings(),
            ..Default::default()
        };
        for warning in &report.discovery_warnings {
            warn!("{}", warning);
        }

        let pipeline = self.pipeline.clone().with_input_root(Some(input_dir.to_path_buf()));
        let (subtitle_files, collisions) = Self::drop_colliding_outputs(&pipeline, discovery.subtitle_files);
        for warning in collisions {
            warn!("{}", warning);
            report.discovery_warnings.push(warning);
        }

        if subtitle_files.is_empty() {
            warn!(
                "No .{} files found in {}",
                self.config.batch.subtitle_extension,
                input_dir.display()
            );
            report.elapsed = start_time.elapsed();
            self.write_issues_log(input_dir, &report);
            return Ok(report);
        }

        info!(
            "Translating {} files from {} to {}",
            subtitle_files.len(),
            self.config.source_language,
            self.config.target_languages.join(", ")
        );

        let progress_bar = self.progress_bar(subtitle_files.len());

        let mut tasks = JoinSet::new();
        for path in subtitle_files {
            let pipeline = pipeline.clone();
            tasks.spawn(async move {
                let result = pipeline.process_file(&path).await;
                (path, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(file_report))) => {
                    progress_bar.suspend(|| Self::log_file_report(&file_report));
                    report.files.push(file_report);
                }
                Ok((path, Err(e))) => {
                    progress_bar.suspend(|| error!("Failed: {}: {}", path.display(), e));
                    report.failed_files.push((path, e.to_string()));
                }
                Err(e) => {
                    progress_bar.suspend(|| error!("Translation task aborted: {}", e));
                    report.failed_files.push((PathBuf::new(), e.to_string()));
                }
            }
            progress_bar.inc(1);
        }
        progress_bar.finish_and_clear();

        report.elapsed = start_time.elapsed();
        info!("Batch complete: {}", report.summary());

        self.write_issues_log(input_dir, &report);
        Ok(report)
    }

    /// Translate a single subtitle file
    pub async fn run_file(&self, input_file: &Path) -> Result<FileReport> {
        if !FileManager::file_exists(input_file) {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let start_time = Instant::now();
        let report = self.pipeline.process_file(input_file).await?;
        Self::log_file_report(&report);
        info!("Translation completed in {}.", Self::format_duration(start_time.elapsed()));

        Ok(report)
    }

    /// Keep the first file for each output path; later files would overwrite or skip against it
    fn drop_colliding_outputs(pipeline: &FilePipeline, files: Vec<PathBuf>) -> (Vec<PathBuf>, Vec<String>) {
        let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();
        let mut kept = Vec::with_capacity(files.len());
        let mut warnings = Vec::new();

        for file in files {
            let outputs: Vec<PathBuf> = pipeline
                .languages()
                .iter()
                .map(|language| pipeline.output_path(&file, language))
                .collect();

            match outputs.iter().find_map(|output| claimed.get(output).map(|owner| (output, owner))) {
                Some((output, owner)) => warnings.push(format!(
                    "Skipping {}: output {} is already produced by {}",
                    file.display(),
                    output.display(),
                    owner.display()
                )),
                None => {
                    for output in outputs {
                        claimed.insert(output, file.clone());
                    }
                    kept.push(file);
                }
            }
        }

        (kept, warnings)
    }

    fn log_file_report(report: &FileReport) {
        if report.is_skipped() {
            info!("Skipped: {} (up to date)", report.input.display());
        } else if report.failed_cues > 0 {
            warn!(
                "Done with {} failed cues: {}",
                report.failed_cues,
                report.input.display()
            );
        } else {
            info!("Success: {} ({} cues)", report.input.display(), report.cue_count);
        }
    }

    fn write_issues_log(&self, input_dir: &Path, report: &BatchReport) {
        if !self.config.batch.write_issues_log {
            return;
        }

        let log_path = input_dir.join(ISSUES_LOG_NAME);
        let mut lines = vec![format!("Batch run: {}", report.summary())];
        lines.extend(report.warnings().into_iter().map(|warning| format!("  {}", warning)));

        if let Err(e) = FileManager::append_to_log_file(&log_path, &lines.join("\n")) {
            warn!("Failed to write issues log: {}", e);
        }
    }

    // Format duration in a human-readable format
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:01}s", seconds, duration.subsec_millis() / 100)
        }
    }
}
