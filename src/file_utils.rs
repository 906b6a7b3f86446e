use anyhow::{Context, Result, anyhow};
use chrono::Local;
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::app_config::BatchConfig;

// @module: File discovery, output paths and audit

/// Extension of generated subtitle files
pub const OUTPUT_EXTENSION: &str = "vtt";

/// Subtitle files below this size are flagged by the audit
pub const SMALL_FILE_THRESHOLD: u64 = 320;

/// Name of the summary log appended to the input directory
pub const ISSUES_LOG_NAME: &str = "subvtt.issues.log";

// @struct: Result of scanning a directory for work
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    // @field: Subtitle files to translate, sorted
    pub subtitle_files: Vec<PathBuf>,

    // @field: Media files without a same-stem subtitle file, sorted
    pub missing_subtitles: Vec<PathBuf>,
}

impl Discovery {
    /// One warning line per media file lacking a subtitle
    pub fn warnings(&self) -> Vec<String> {
        self.missing_subtitles
            .iter()
            .map(|media| format!("Missing subtitle for {}", media.display()))
            .collect()
    }
}

/// Findings of the `audit` command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    /// Media files without a same-stem subtitle file
    pub missing_subtitles: Vec<PathBuf>,
    /// Media files paired with a target language that has no output yet
    pub missing_translations: Vec<(PathBuf, String)>,
    /// Subtitle files under [`SMALL_FILE_THRESHOLD`] bytes, with their size
    pub undersized: Vec<(PathBuf, u64)>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.missing_subtitles.is_empty() && self.missing_translations.is_empty() && self.undersized.is_empty()
    }

    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for media in &self.missing_subtitles {
            warnings.push(format!("Missing subtitle for {}", media.display()));
        }
        for (media, language) in &self.missing_translations {
            warnings.push(format!("Missing {} translation for {}", language, media.display()));
        }
        for (path, size) in &self.undersized {
            warnings.push(format!("Suspiciously small subtitle ({} bytes): {}", size, path.display()));
        }
        warnings
    }
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path).with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @generates: Output path for one translated subtitle, `<stem>_<lang>.vtt`
    // @params: input_file, output_dir (defaults to the input's directory), target_language
    pub fn generate_output_path<P: AsRef<Path>>(
        input_file: P,
        output_dir: Option<&Path>,
        target_language: &str,
    ) -> PathBuf {
        let input_file = input_file.as_ref();
        let stem = input_file.file_stem().unwrap_or_default().to_string_lossy();
        let file_name = format!("{}_{}.{}", stem, target_language, OUTPUT_EXTENSION);

        match output_dir {
            Some(dir) => dir.join(file_name),
            None => input_file.with_file_name(file_name),
        }
    }

    /// Output path that mirrors the input's place under `input_root`.
    ///
    /// With an output directory, `root/s1/ep.srt` maps to `out/s1/ep_<lang>.vtt`
    /// so same-named files from different subdirectories stay apart. Inputs
    /// outside `input_root` fall back to the flat layout.
    pub fn generate_mirrored_output_path<P: AsRef<Path>>(
        input_file: P,
        input_root: &Path,
        output_dir: Option<&Path>,
        target_language: &str,
    ) -> PathBuf {
        let input_file = input_file.as_ref();
        let Some(output_dir) = output_dir else {
            return Self::generate_output_path(input_file, None, target_language);
        };

        let relative_dir = input_file
            .parent()
            .and_then(|parent| parent.strip_prefix(input_root).ok())
            .unwrap_or_else(|| Path::new(""));
        Self::generate_output_path(input_file, Some(&output_dir.join(relative_dir)), target_language)
    }

    /// Whether `output` exists and was modified no earlier than `input`
    pub fn output_is_current<P1: AsRef<Path>, P2: AsRef<Path>>(input: P1, output: P2) -> bool {
        let modified = |path: &Path| fs::metadata(path).and_then(|meta| meta.modified()).ok();

        match (modified(input.as_ref()), modified(output.as_ref())) {
            (Some(input_time), Some(output_time)) => output_time >= input_time,
            _ => false,
        }
    }

    fn has_extension(path: &Path, extension: &str) -> bool {
        let extension = extension.trim_start_matches('.');
        path.extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
            .unwrap_or(false)
    }

    /// Find files with a specific extension, sorted by path
    pub fn find_files<P: AsRef<Path>>(dir: P, extension: &str, recursive: bool) -> Result<Vec<PathBuf>> {
        let mut walker = WalkDir::new(dir.as_ref()).follow_links(true).min_depth(1);
        if !recursive {
            walker = walker.max_depth(1);
        }

        let mut result = Vec::new();
        for entry in walker {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();
            if path.is_file() && Self::has_extension(path, extension) {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    /// Pair media files with subtitle files by directory and stem
    pub fn match_counterparts(subtitle_files: &[PathBuf], media_files: &[PathBuf]) -> Discovery {
        let key = |path: &Path| (path.parent().map(Path::to_path_buf), path.file_stem().map(|s| s.to_os_string()));
        let available: HashSet<_> = subtitle_files.iter().map(|path| key(path.as_path())).collect();

        let mut subtitle_files = subtitle_files.to_vec();
        subtitle_files.sort();

        let mut missing_subtitles: Vec<PathBuf> = media_files
            .iter()
            .filter(|media| !available.contains(&key(media.as_path())))
            .cloned()
            .collect();
        missing_subtitles.sort();

        Discovery {
            subtitle_files,
            missing_subtitles,
        }
    }

    /// Media files of every configured media extension
    fn find_media_files(dir: &Path, config: &BatchConfig) -> Result<Vec<PathBuf>> {
        let mut media = Vec::new();
        for extension in &config.media_extensions {
            media.extend(Self::find_files(dir, extension, config.recursive)?);
        }
        media.sort();
        media.dedup();
        Ok(media)
    }

    /// Find subtitle files to translate and media files lacking one
    pub fn discover<P: AsRef<Path>>(dir: P, config: &BatchConfig) -> Result<Discovery> {
        let dir = dir.as_ref();
        if !Self::dir_exists(dir) {
            return Err(anyhow!("Input directory does not exist: {:?}", dir));
        }

        let subtitles = Self::find_files(dir, &config.subtitle_extension, config.recursive)?;
        let media = Self::find_media_files(dir, config)?;

        Ok(Self::match_counterparts(&subtitles, &media))
    }

    /// Report missing subtitles, missing translations and undersized subtitle files
    pub fn audit<P: AsRef<Path>>(
        dir: P,
        config: &BatchConfig,
        target_languages: &[String],
    ) -> Result<AuditReport> {
        let dir = dir.as_ref();
        let discovery = Self::discover(dir, config)?;
        let media = Self::find_media_files(dir, config)?;

        let mut missing_translations = Vec::new();
        for file in &media {
            for language in target_languages {
                if !Self::file_exists(Self::generate_output_path(file, None, language)) {
                    missing_translations.push((file.clone(), language.clone()));
                }
            }
        }

        let mut undersized = Vec::new();
        let mut candidates = discovery.subtitle_files.clone();
        candidates.extend(Self::find_files(dir, OUTPUT_EXTENSION, config.recursive)?);
        candidates.sort();
        candidates.dedup();
        for path in candidates {
            let size = fs::metadata(&path)
                .with_context(|| format!("Failed to read metadata: {:?}", path))?
                .len();
            if size < SMALL_FILE_THRESHOLD {
                undersized.push((path, size));
            }
        }

        Ok(AuditReport {
            missing_subtitles: discovery.missing_subtitles,
            missing_translations,
            undersized,
        })
    }

    /// Read a subtitle file to a string
    pub async fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file, creating the parent directory
    pub async fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("Failed to create directory: {:?}", parent))?;
            }
        }

        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))
    }

    /// Append content to a log file with timestamp
    pub fn append_to_log_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {:?}", path.as_ref()))?;

        writeln!(file, "[{}] {}", timestamp, content)
            .with_context(|| format!("Failed to write to log file: {:?}", path.as_ref()))?;

        Ok(())
    }
}
