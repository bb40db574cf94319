// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use subfetch::app_config::{self, Config};
use subfetch::app_controller::Controller;
use subfetch::errors::RetrievalError;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
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
    /// Fetch the subtitles of a movie (default command)
    #[command(alias = "get")]
    Fetch(FetchArgs),

    /// Generate shell completions for subfetch
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct FetchArgs {
    /// Movie name to look up
    #[arg(value_name = "MOVIE_NAME")]
    movie_name: String,

    /// Directory the subtitle files are written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Subtitle language code (e.g., 'en', 'fr', 'spa')
    #[arg(short = 'L', long)]
    language: Option<String>,

    /// Select entries that are not flagged as hearing impaired
    #[arg(long)]
    no_hearing_impaired: bool,

    /// Leave the scratch directory on disk after the run
    #[arg(short, long)]
    keep_scratch: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// subfetch - subtitle retrieval for a named movie
///
/// Finds the movie's subtitle index page through a web search, picks a
/// listing entry, downloads its archive and extracts the `.srt` files.
#[derive(Parser, Debug)]
#[command(name = "subfetch")]
#[command(version)]
#[command(about = "Fetch subtitle files for a movie")]
#[command(long_about = "subfetch locates a movie's subtitle index page, selects an entry by language and
hearing-impaired flag, downloads its archive and extracts the subtitle files.

EXAMPLES:
    subfetch \"Heat\"                              # Fetch English hearing-impaired subtitles
    subfetch -o ./subs \"Heat\"                    # Write the files into ./subs
    subfetch -L fr --no-hearing-impaired \"Heat\"  # Fetch French subtitles
    subfetch --log-level debug \"Heat\"            # Verbose logging
    subfetch completions bash > subfetch.bash    # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. The search API key and engine id must be set
    before the first fetch.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Movie name to look up
    #[arg(value_name = "MOVIE_NAME")]
    movie_name: Option<String>,

    /// Directory the subtitle files are written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Subtitle language code (e.g., 'en', 'fr', 'spa')
    #[arg(short = 'L', long)]
    language: Option<String>,

    /// Select entries that are not flagged as hearing impaired
    #[arg(long)]
    no_hearing_impaired: bool,

    /// Leave the scratch directory on disk after the run
    #[arg(short, long)]
    keep_scratch: bool,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {:<5} {}\x1B[0m",
                color,
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with the most verbose level; the effective
    // level is narrowed through log::set_max_level after the config is loaded
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "subfetch", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Fetch(args)) => run_fetch(args).await,
        None => {
            // Default behavior - use top-level args
            let movie_name = cli.movie_name.ok_or_else(|| {
                anyhow!("MOVIE_NAME is required when no subcommand is specified")
            })?;

            run_fetch(FetchArgs {
                movie_name,
                output_dir: cli.output_dir,
                language: cli.language,
                no_hearing_impaired: cli.no_hearing_impaired,
                keep_scratch: cli.keep_scratch,
                config_path: cli.config_path,
                log_level: cli.log_level,
            })
            .await
        }
    }
}

async fn run_fetch(options: FetchArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&options.config_path)?;
    apply_overrides(&mut config, &options);

    config.validate().context("Configuration validation failed")?;

    // If log level was not set via command line, update it from config now
    if options.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling retrieval");
            ctrl_c_token.cancel();
        }
    });

    let controller = Controller::with_config(config)?;
    match controller
        .run(&options.movie_name, options.output_dir.clone(), cancel)
        .await
    {
        Ok(files) => {
            if options.output_dir.is_none() {
                for file in &files {
                    info!("{} ({} chars)", file.filename, file.content.chars().count());
                }
            }
            Ok(())
        }
        Err(e) => {
            if let Some(RetrievalError::Cancelled) = e.downcast_ref::<RetrievalError>() {
                warn!("Retrieval cancelled");
                return Ok(());
            }
            Err(e)
        }
    }
}

fn apply_overrides(config: &mut Config, options: &FetchArgs) {
    if let Some(language) = &options.language {
        config.selection.language = language.clone();
    }
    if options.no_hearing_impaired {
        config.selection.hearing_impaired = false;
    }
    if options.keep_scratch {
        config.scratch.keep = true;
    }
    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
}
