// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use subvtt::app_config::{self, Config};
use subvtt::app_controller::Controller;
use subvtt::file_utils::FileManager;
use subvtt::providers::ollama::Ollama;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate subtitle files to WebVTT (default command)
    Translate(TranslateArgs),

    /// Report missing and broken subtitle files without translating
    Audit(AuditArgs),

    /// Generate shell completions for subvtt
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options shared by every command that reads the configuration
#[derive(Args, Debug, Clone)]
struct CommonOptions {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Target language code, repeatable or comma separated (e.g., 'en,vi')
    #[arg(short, long, value_delimiter = ',')]
    target_language: Vec<String>,

    /// Descend into subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// Options of the translate command
#[derive(Args, Debug, Clone)]
struct TranslateOptions {
    #[command(flatten)]
    common: CommonOptions,

    /// Translate even when an up-to-date output exists
    #[arg(short, long)]
    force_overwrite: bool,

    /// Model name to use for translation
    #[arg(short, long)]
    model: Option<String>,

    /// Ollama endpoint (e.g., 'http://localhost:11434')
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Source language code (e.g., 'zh', 'en')
    #[arg(short, long)]
    source_language: Option<String>,

    /// Maximum requests per second
    #[arg(long)]
    rate_limit: Option<u32>,

    /// Maximum number of files translated at the same time
    #[arg(long)]
    max_concurrent_files: Option<usize>,

    /// Write outputs to this directory instead of next to each input
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct TranslateArgs {
    /// Subtitle file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    #[command(flatten)]
    options: TranslateOptions,
}

#[derive(Args, Debug)]
struct AuditArgs {
    /// Directory to inspect
    #[arg(value_name = "INPUT_DIR")]
    input_dir: PathBuf,

    #[command(flatten)]
    common: CommonOptions,
}

/// subvtt - translate SRT subtitles into WebVTT in several languages
///
/// Every cue is translated into every target language concurrently through a
/// local Ollama server, under one shared request rate limit.
#[derive(Parser, Debug)]
#[command(name = "subvtt")]
#[command(version)]
#[command(about = "Concurrent SRT to multi-language WebVTT translator")]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "subvtt translates SRT subtitle files into one WebVTT file per target language using Ollama.

EXAMPLES:
    subvtt /videos/                              # Translate every .srt in a directory
    subvtt -t en,vi,fr /videos/                  # Choose target languages
    subvtt -f episode01.srt                      # Re-translate even if outputs are current
    subvtt --rate-limit 4 -m llama3 /videos/    # Slower rate, different model
    subvtt audit -r /videos/                     # Report missing or broken subtitles
    subvtt completions bash > subvtt.bash        # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Subtitle file or directory to process
    #[arg(value_name = "INPUT_PATH")]
    input_path: Option<PathBuf>,

    #[command(flatten)]
    options: TranslateOptions,
}

// @struct: Custom logger implementation
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and tag for a log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERROR"),
            Level::Warn => ("\x1B[1;33m", "WARN "),
            Level::Info => ("\x1B[1;32m", "INFO "),
            Level::Debug => ("\x1B[1;36m", "DEBUG"),
            Level::Trace => ("\x1B[1;35m", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, tag) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", color, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // The level is updated after loading the config
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "subvtt", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Translate(args)) => run_translate(args.input_path, args.options).await,
        Some(Commands::Audit(args)) => run_audit(args),
        None => {
            let input_path = cli
                .input_path
                .ok_or_else(|| anyhow!("INPUT_PATH is required when no subcommand is specified"))?;
            run_translate(input_path, cli.options).await
        }
    }
}

/// Load the configuration, writing a default one when the file does not exist
fn load_or_create_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        let file = File::open(config_path).with_context(|| format!("Failed to open config file: {}", config_path))?;
        let reader = BufReader::new(file);
        return serde_json::from_reader(reader).with_context(|| format!("Failed to parse config file: {}", config_path));
    }

    warn!("Config file not found at '{}', creating default config.", config_path);
    let config = Config::default();
    let config_json = serde_json::to_string_pretty(&config).context("Failed to serialize default config to JSON")?;
    std::fs::write(config_path, config_json)
        .with_context(|| format!("Failed to write default config to file: {}", config_path))?;

    Ok(config)
}

/// Load the configuration, apply the shared CLI overrides and set the log level
fn prepare_config(common: &CommonOptions) -> Result<Config> {
    if let Some(level) = common.log_level {
        log::set_max_level(app_config::LogLevel::from(level).into());
    }

    let mut config = load_or_create_config(&common.config_path)?;

    if !common.target_language.is_empty() {
        config.target_languages = common.target_language.clone();
    }
    if common.recursive {
        config.batch.recursive = true;
    }
    if let Some(level) = common.log_level {
        config.log_level = level.into();
    }

    log::set_max_level(config.log_level.into());
    Ok(config)
}

async fn run_translate(input_path: PathBuf, options: TranslateOptions) -> Result<()> {
    let mut config = prepare_config(&options.common)?;

    if let Some(model) = &options.model {
        config.translation.ollama.model = model.clone();
    }
    if let Some(endpoint) = &options.endpoint {
        config.translation.ollama.endpoint = endpoint.clone();
    }
    if let Some(source_language) = &options.source_language {
        config.source_language = source_language.clone();
    }
    if let Some(rate_limit) = options.rate_limit {
        config.translation.common.rate_limit = rate_limit;
    }
    if let Some(max_concurrent_files) = options.max_concurrent_files {
        config.batch.max_concurrent_files = max_concurrent_files;
    }

    config.validate().context("Configuration validation failed")?;

    let ollama = Ollama::new(
        &config.translation.ollama.endpoint,
        config.translation.ollama.model.clone(),
        config.translation.ollama.timeout(),
    )?
    .with_temperature(config.translation.common.temperature);

    let controller = Controller::with_provider(config, Arc::new(ollama))?
        .with_output_dir(options.output_dir)
        .with_force_overwrite(options.force_overwrite);

    if input_path.is_file() {
        controller.check_connection().await;
        controller.run_file(&input_path).await?;
    } else if input_path.is_dir() {
        controller.check_connection().await;
        let report = controller.run(&input_path).await?;
        let warnings = report.warnings();
        if !warnings.is_empty() {
            warn!("{} warnings, see {}", warnings.len(), subvtt::file_utils::ISSUES_LOG_NAME);
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", input_path));
    }

    Ok(())
}

fn run_audit(args: AuditArgs) -> Result<()> {
    let config = prepare_config(&args.common)?;
    config.validate().context("Configuration validation failed")?;

    let report = FileManager::audit(&args.input_dir, &config.batch, &config.target_languages)?;
    for warning in report.warnings() {
        warn!("{}", warning);
    }
    if report.is_clean() {
        info!("No issues found in {}", args.input_dir.display());
    } else {
        info!(
            "{} missing subtitles, {} missing translations, {} undersized files",
            report.missing_subtitles.len(),
            report.missing_translations.len(),
            report.undersized.len()
        );
    }

    Ok(())
}
