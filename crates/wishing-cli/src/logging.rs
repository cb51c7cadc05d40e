// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

pub const LOG_FILE_NAME: &str = "wishing-well.log";

/// Builds the level filter: `RUST_LOG` when set, otherwise `level`, raised
/// to debug for the wishing crates when `debug` is on.
pub fn env_filter(level: &str, debug: bool) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let directives = if debug {
        format!("{level},wishing_app=debug,wishing_well=debug")
    } else {
        level.to_owned()
    };
    EnvFilter::try_new(&directives).with_context(|| format!("invalid log level {directives:?}"))
}

/// Installs stderr logging plus a plain-text log file in `log_dir`.
///
/// Keep the returned guard alive until exit so buffered file output is
/// flushed. When the directory cannot be created, logging falls back to
/// stderr only and no guard is returned.
pub fn init(log_dir: Option<&Path>, level: &str, debug: bool) -> Result<Option<WorkerGuard>> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let file = log_dir.and_then(|dir| match std::fs::create_dir_all(dir) {
        Ok(()) => Some(tracing_appender::rolling::never(dir, LOG_FILE_NAME)),
        Err(error) => {
            eprintln!(
                "cannot create log directory {}: {error}; logging to stderr only",
                dir.display()
            );
            None
        }
    });

    let Some(appender) = file else {
        tracing_subscriber::registry()
            .with(env_filter(level, debug)?)
            .with(stderr_layer)
            .try_init()
            .context("install log subscriber")?;
        return Ok(None);
    };

    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file_layer = fmt::layer().with_writer(writer).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter(level, debug)?)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("install log subscriber")?;
    Ok(Some(guard))
}
