use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILE_NAME: &str = "pipeline.log";

/// Installs console + file logging. The file goes to `<output_dir>/logs/pipeline.log`, or to
/// `$HOME/.logs/predictive_maintenance` if that directory cannot be created.
///
/// `RUST_LOG` takes precedence over `level`. The returned guard must be held until exit so
/// buffered file output is flushed.
pub fn init_logging(output_dir: &Path, level: &str) -> Result<WorkerGuard> {
    let log_dir = resolve_log_dir(output_dir)?;
    let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE_NAME);
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().with_ansi(false).with_writer(non_blocking_writer);
    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level '{level}'"))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("failed to install the tracing subscriber")?;

    tracing::debug!(dir = %log_dir.display(), "logging initialised");
    Ok(guard)
}

fn resolve_log_dir(output_dir: &Path) -> Result<PathBuf> {
    let primary = output_dir.join("logs");
    let primary_err = match fs::create_dir_all(&primary) {
        Ok(()) => return Ok(primary),
        Err(e) => e,
    };

    let Some(home) = std::env::var_os("HOME") else {
        bail!(
            "cannot create log directory {}: {primary_err} (and HOME is not set)",
            primary.display()
        );
    };
    let fallback = PathBuf::from(home).join(".logs").join("predictive_maintenance");
    fs::create_dir_all(&fallback).with_context(|| {
        format!(
            "cannot create log directory {} ({primary_err}) or fallback {}",
            primary.display(),
            fallback.display()
        )
    })?;
    eprintln!(
        "cannot create log directory {} ({primary_err}); logging to {}",
        primary.display(),
        fallback.display()
    );
    Ok(fallback)
}
