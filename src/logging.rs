// Copyright (c) 2026 rezky_nightky

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

pub const FILTER_ENV: &str = "GLYPHFALL_LOG";

/// Installs a plain-text subscriber writing to `path`. The terminal is the
/// render surface, so without a log file nothing is installed and every
/// event is dropped.
pub fn init(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file =
        File::create(path).with_context(|| format!("create log file: {}", path.display()))?;

    let filter = std::env::var(FILTER_ENV).unwrap_or_else(|_| "info".to_string());
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| anyhow!(e))
        .context("install log subscriber")?;
    Ok(())
}
