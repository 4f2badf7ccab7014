use std::{fs::OpenOptions, path::PathBuf, sync::Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

pub const API_BASE_ENV: &str = "DOCPATCH_API_BASE_URL";
pub const LOG_ENV: &str = "DOCPATCH_LOG";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "docpatch",
    version,
    about = "Edit the text of a Word document and download a copy with only the changed paragraphs patched"
)]
pub struct Cli {
    /// Word document to open right away
    pub file: Option<PathBuf>,

    /// Base URL of the document service (extract-text / edit-docx)
    #[arg(long, env = API_BASE_ENV)]
    pub api_base: Option<String>,

    /// Directory that receives the edited copies
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Write logs to this file (the terminal is taken by the editor)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error), overridden by DOCPATCH_LOG
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Install a file-backed tracing subscriber. Without a log file nothing is
/// installed and events are discarded.
pub fn init_logging(cli: &Cli) -> Result<()> {
    let Some(path) = &cli.log_file else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .with_context(|| format!("invalid log level {:?}", cli.log_level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install logger: {err}"))?;
    Ok(())
}
