/*!
 * Per-file translation pipeline.
 *
 * A file is parsed once, then every cue is translated into every pending
 * language concurrently. Results arrive in completion order and are placed
 * into a grid indexed by (language, cue position), so each output document
 * keeps the source cue order. The number of files in flight is bounded by
 * an admission gate shared by every caller of the same pipeline.
 */

use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::errors::{AppError, SubtitleError};
use crate::file_utils::FileManager;
use crate::subtitle_processor::{Document, OutputDocument};

use super::core::{TranslationRequest, TranslationResult, TranslationService};

/// One translated document with its failure count
#[derive(Debug, Clone)]
pub struct LanguageOutput {
    pub document: OutputDocument,
    /// Cues carrying the failure sentinel
    pub failed_cues: usize,
}

/// Outcome of processing one subtitle file
#[derive(Debug, Clone, Default)]
pub struct FileReport {
    /// The input subtitle file
    pub input: PathBuf,
    /// Number of cues parsed from the input
    pub cue_count: usize,
    /// Files written, one per translated language
    pub outputs: Vec<PathBuf>,
    /// Languages whose output was already up to date
    pub skipped_languages: Vec<String>,
    /// Failed cues summed over all languages
    pub failed_cues: usize,
    /// Problems worth reporting at the end of the run
    pub warnings: Vec<String>,
}

impl FileReport {
    fn new(input: &Path) -> Self {
        Self {
            input: input.to_path_buf(),
            ..Default::default()
        }
    }

    /// Whether every language was skipped and nothing was translated
    pub fn is_skipped(&self) -> bool {
        self.outputs.is_empty() && !self.skipped_languages.is_empty()
    }
}

/// Translates whole subtitle files into every target language
#[derive(Debug, Clone)]
pub struct FilePipeline {
    /// Shared translation client
    service: Arc<TranslationService>,

    /// Target language codes, in output order
    languages: Vec<String>,

    /// Bounds the number of files processed at once
    file_gate: Arc<Semaphore>,

    /// Directory for outputs; next to the input when unset
    output_dir: Option<PathBuf>,

    /// Scanned directory whose layout is mirrored under `output_dir`
    input_root: Option<PathBuf>,

    /// Translate even when an up-to-date output exists
    force_overwrite: bool,
}

impl FilePipeline {
    /// Create a pipeline admitting at most `max_concurrent_files` files at once
    pub fn new(service: Arc<TranslationService>, languages: Vec<String>, max_concurrent_files: usize) -> Self {
        Self {
            service,
            languages,
            file_gate: Arc::new(Semaphore::new(max_concurrent_files.max(1))),
            output_dir: None,
            input_root: None,
            force_overwrite: false,
        }
    }

    /// Write outputs into `output_dir` instead of next to the input
    pub fn with_output_dir(mut self, output_dir: Option<PathBuf>) -> Self {
        self.output_dir = output_dir;
        self
    }

    /// Keep each input's path relative to `input_root` when writing into the output directory
    pub fn with_input_root(mut self, input_root: Option<PathBuf>) -> Self {
        self.input_root = input_root;
        self
    }

    /// Re-translate languages whose output is already up to date
    pub fn with_force_overwrite(mut self, force_overwrite: bool) -> Self {
        self.force_overwrite = force_overwrite;
        self
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Output path for `input` in `language`
    pub fn output_path(&self, input: &Path, language: &str) -> PathBuf {
        match &self.input_root {
            Some(root) => FileManager::generate_mirrored_output_path(input, root, self.output_dir.as_deref(), language),
            None => FileManager::generate_output_path(input, self.output_dir.as_deref(), language),
        }
    }

    /// Translate one subtitle file and write one VTT file per pending language.
    ///
    /// Waits for a slot in the file gate first. Read and write failures are
    /// returned as errors; cue failures are counted in the report instead.
    pub async fn process_file(&self, path: &Path) -> Result<FileReport, AppError> {
        let _permit = self
            .file_gate
            .acquire()
            .await
            .map_err(|e| AppError::Unknown(format!("File gate closed: {}", e)))?;

        let mut report = FileReport::new(path);

        let mut pending = Vec::new();
        for language in &self.languages {
            let output = self.output_path(path, language);
            if !self.force_overwrite && FileManager::output_is_current(path, &output) {
                info!("Skipping {} ({}): output is up to date", path.display(), language);
                report.skipped_languages.push(language.clone());
            } else {
                pending.push(language.clone());
            }
        }
        if pending.is_empty() {
            return Ok(report);
        }

        let content = FileManager::read_to_string(path)
            .await
            .map_err(|e| AppError::File(format!("{:#}", e)))?;
        let document = Document::parse(&content);
        report.cue_count = document.len();

        if document.is_empty() {
            let warning = format!("No cues found in {}", path.display());
            warn!("{}", warning);
            report.warnings.push(warning);
        }

        for output in self.translate_document(&document, &pending).await? {
            let output_path = self.output_path(path, &output.document.language);
            FileManager::write_to_file(&output_path, &output.document.to_vtt())
                .await
                .map_err(|e| AppError::File(format!("{:#}", e)))?;

            if output.failed_cues > 0 {
                let warning = format!(
                    "{}: {} of {} cues failed to translate to {}",
                    path.display(),
                    output.failed_cues,
                    document.len(),
                    output.document.language
                );
                warn!("{}", warning);
                report.warnings.push(warning);
            }

            report.failed_cues += output.failed_cues;
            report.outputs.push(output_path);
        }

        Ok(report)
    }

    /// Translate every cue of `document` into every language in `languages`.
    ///
    /// All cue and language pairs run concurrently; only the rate limiter
    /// throttles them. Outputs are returned in the order of `languages`.
    pub async fn translate_document(
        &self,
        document: &Document,
        languages: &[String],
    ) -> Result<Vec<LanguageOutput>, SubtitleError> {
        let mut grid: Vec<Vec<Option<TranslationResult>>> = vec![vec![None; document.len()]; languages.len()];

        let mut tasks = FuturesUnordered::new();
        for (slot, language) in languages.iter().enumerate() {
            for (position, cue) in document.cues.iter().enumerate() {
                let request = TranslationRequest {
                    cue_index: cue.index,
                    position,
                    target_language: language.clone(),
                    source_text: cue.text(),
                };
                let service = &self.service;
                tasks.push(async move { (slot, service.translate(request).await) });
            }
        }

        while let Some((slot, result)) = tasks.next().await {
            debug!("Cue {} ({}) done", result.cue_index, result.target_language);
            let position = result.position;
            grid[slot][position] = Some(result);
        }

        let mut outputs = Vec::with_capacity(languages.len());
        for (language, results) in languages.iter().zip(grid) {
            let mut failed_cues = 0;
            let mut translations = Vec::with_capacity(document.len());
            for result in results.into_iter().flatten() {
                if !result.is_success() {
                    failed_cues += 1;
                }
                translations.push(result.translated_text);
            }

            outputs.push(LanguageOutput {
                document: OutputDocument::format(document, language, translations)?,
                failed_cues,
            });
        }

        Ok(outputs)
    }
}
