use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use taskvet_engine::{LookupContext, ValidationError, parse_task_file, validate_task};
use tracing::debug;

/// Statically validate declarative task specifications.
#[derive(Parser, Debug)]
#[command(name = "taskvet", version, about)]
struct Cli {
    /// Log validation progress at debug level
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate one or more task files
    Validate {
        /// Task files in YAML or JSON
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Report format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Print the lookup context a task's placeholders resolve against
    Context {
        /// Task file in YAML or JSON
        file: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Outcome for one file, shaped for `--format json`.
#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorReport>,
}

#[derive(Debug, Serialize)]
struct ErrorReport {
    kind: String,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    paths: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl From<&ValidationError> for ErrorReport {
    fn from(error: &ValidationError) -> Self {
        ErrorReport {
            kind: serde_json::to_value(error.kind())
                .ok()
                .and_then(|kind| kind.as_str().map(str::to_string))
                .unwrap_or_default(),
            message: error.message(),
            paths: error.paths(),
            details: error.details(),
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Validate { files, format } => run_validate(&files, format),
        Command::Context { file } => run_context(&file),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "debug".to_string()
    } else {
        std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into())
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_validate(files: &[PathBuf], format: OutputFormat) -> Result<ExitCode> {
    let reports: Vec<FileReport> = files.iter().map(|file| validate_file(file)).collect();
    let failed = reports.iter().filter(|report| !report.valid).count();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
        OutputFormat::Text => reports.iter().for_each(print_text_report),
    }

    debug!(files = files.len(), failed, "validation finished");
    Ok(if failed == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn validate_file(file: &Path) -> FileReport {
    let name = file.display().to_string();
    let document = match parse_task_file(file) {
        Ok(document) => document,
        Err(error) => {
            return FileReport {
                file: name,
                valid: false,
                error: Some(ErrorReport {
                    kind: "unreadable".to_string(),
                    message: format!("{error:#}"),
                    paths: Vec::new(),
                    details: None,
                }),
            };
        }
    };

    match validate_task(&document) {
        Ok(()) => FileReport {
            file: name,
            valid: true,
            error: None,
        },
        Err(error) => FileReport {
            file: name,
            valid: false,
            error: Some(ErrorReport::from(&error)),
        },
    }
}

fn print_text_report(report: &FileReport) {
    let Some(error) = &report.error else {
        println!("{}: ok", report.file);
        return;
    };
    println!("{}: {}", report.file, error.message);
    if !error.paths.is_empty() {
        println!("  at: {}", error.paths.join(", "));
    }
    if let Some(details) = &error.details {
        println!("  hint: {details}");
    }
}

fn run_context(file: &Path) -> Result<ExitCode> {
    let document = parse_task_file(file)?;
    let context = LookupContext::from_spec(&document.spec).to_value();
    let rendered = serde_json::to_string_pretty(&context).context("Failed to render lookup context")?;
    println!("{rendered}");
    Ok(ExitCode::SUCCESS)
}
