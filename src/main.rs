use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use serde_json::Value;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use triage::config::Config;
use triage::error::ConfigError;
use triage::notify::NotifyTarget;
use triage::{ErrorReporter, NormalizedError, RawFailure};

/// Command-line arguments for the triage reporter
#[derive(Parser)]
#[command(
    name = "triage",
    about = "Normalize failures and dispatch them to notification and audit sinks",
    long_about = "Classifies arbitrary failure values (runtime faults, backend error bodies, \
                  network responses, strings, objects) into one normalized error record, \
                  notifies the user and writes an audit entry for each of them."
)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Configuration file path (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(
        short,
        long,
        help = "Enable verbose logging output (sets RUST_LOG=debug)"
    )]
    verbose: bool,

    /// Origin label attached to every reported failure
    #[arg(long, value_name = "LABEL", global = true)]
    context: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report failures read one per line (JSON, otherwise plain text)
    Report {
        /// Input file; reads stdin when omitted
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,
    },

    /// Fetch a URL, reporting transport failures and error statuses
    Fetch {
        #[arg(value_name = "URL")]
        url: String,
    },
}

impl Cli {
    /// Reject a config path that is a directory and a report input that is not a file
    fn validate(&self) -> Result<(), String> {
        if let Some(ref config_path) = self.config {
            // Missing files fall back to defaults in load_config
            if config_path.exists() {
                if !config_path.is_file() {
                    return Err(format!(
                        "Configuration path is not a file: {}",
                        config_path.display()
                    ));
                }

                if config_path.extension().map_or(true, |ext| ext != "toml") {
                    warn!("Config {} is not a .toml file", config_path.display());
                }
            }
        }

        if let Command::Report { input: Some(input) } = &self.command {
            if !input.is_file() {
                return Err(format!("Input is not a readable file: {}", input.display()));
            }
        }

        Ok(())
    }

    /// Config path as UTF-8, `None` when `--config` was not given
    fn config_path_str(&self) -> Result<Option<&str>, String> {
        match &self.config {
            Some(path) => path
                .to_str()
                .map(Some)
                .ok_or_else(|| format!("Config path is not valid UTF-8: {}", path.display())),
            None => Ok(None),
        }
    }
}

/// Read the reporter configuration; a missing or invalid file yields the defaults
fn load_config(config_path: Option<&str>) -> Result<Config, ConfigError> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path);
            match Config::from_file(std::path::Path::new(path)) {
                Ok(config) => Ok(config),
                Err(ConfigError::ReadError(_)) => {
                    warn!(
                        "Configuration file '{}' not found or unreadable, using defaults",
                        path
                    );
                    Ok(Config::default())
                }
                Err(e) => {
                    error!("Configuration error in '{}': {}", path, e);
                    warn!("Using default configuration due to invalid config file");
                    Ok(Config::default())
                }
            }
        }
        None => {
            info!("Using default configuration");
            Ok(Config::default())
        }
    }
}

/// Interpret one input line as a failure value
fn parse_failure(line: &str) -> RawFailure {
    match serde_json::from_str::<Value>(line) {
        Ok(value) => RawFailure::from(value),
        Err(_) => RawFailure::from(line),
    }
}

fn print_record(record: &NormalizedError) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(record)?);
    Ok(())
}

async fn run_report(
    reporter: &ErrorReporter,
    target: &NotifyTarget,
    context: Option<&str>,
    input: Option<PathBuf>,
) -> anyhow::Result<usize> {
    let reader: Box<dyn AsyncBufRead + Unpin> = match input {
        Some(path) => {
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("Failed to open input {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let mut lines = reader.lines();
    let mut reported = 0;
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record = reporter.report(parse_failure(line), target, context).await;
        print_record(&record)?;
        reported += 1;
    }

    Ok(reported)
}

async fn run_fetch(
    reporter: &ErrorReporter,
    target: &NotifyTarget,
    context: Option<&str>,
    url: &str,
) -> anyhow::Result<bool> {
    let client = reqwest::Client::new();
    match reporter.fetch(client.get(url), target, context).await {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(true)
        }
        Err(record) => {
            print_record(&record)?;
            Ok(false)
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    if cli.verbose {
        std::env::set_var("RUST_LOG", "debug");
    }
    env_logger::init();

    if let Err(e) = cli.validate() {
        error!("Invalid arguments: {}", e);
        std::process::exit(1);
    }

    let config_path = match cli.config_path_str() {
        Ok(path) => path,
        Err(e) => {
            error!("Invalid configuration path: {}", e);
            std::process::exit(1);
        }
    };

    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let reporter = match config.build_reporter() {
        Ok(reporter) => reporter,
        Err(e) => {
            error!("Failed to initialize reporter: {}", e);
            std::process::exit(1);
        }
    };
    let target = config.build_target();
    let context = cli.context.as_deref();

    match cli.command {
        Command::Report { input } => match run_report(&reporter, &target, context, input).await {
            Ok(count) => info!("Reported {} failure(s)", count),
            Err(e) => {
                error!("Report failed: {:#}", e);
                std::process::exit(1);
            }
        },
        Command::Fetch { url } => match run_fetch(&reporter, &target, context, &url).await {
            Ok(true) => {}
            Ok(false) => std::process::exit(2),
            Err(e) => {
                error!("Fetch failed: {:#}", e);
                std::process::exit(1);
            }
        },
    }
}
