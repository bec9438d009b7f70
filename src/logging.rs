//! Tracing subscriber setup for the photoburn binary.
//!
//! The terminal belongs to the swipe UI, so log lines go to a file
//! (`--log-file`, or `photoburn.log` in the platform data directory).
//!
//! Filter priority, highest first:
//!
//! 1. `PHOTOBURN_LOG` env var (e.g. `photoburn=debug,warn`)
//! 2. `RUST_LOG` env var
//! 3. CLI flags (`-v` → debug, `-q` → error)
//! 4. Default level: `info`

use crate::error::{PhotoBurnError, Result};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "PHOTOBURN_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
}

impl Verbosity {
    /// Verbose wins when both flags are given
    pub const fn from_flags(verbose: bool, quiet: bool) -> Self {
        if verbose {
            Self::Verbose
        } else if quiet {
            Self::Quiet
        } else {
            Self::Normal
        }
    }

    pub const fn default_level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
        }
    }
}

/// Where logs go when `--log-file` is not given
pub fn default_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("photoburn")
        .join("photoburn.log")
}

/// Installs the global subscriber. Fails if one is already set.
pub fn init_subscriber(verbosity: Verbosity, log_file: &Path) -> Result<()> {
    if let Some(parent) = log_file.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)?;

    let fmt_layer = fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_level(true);

    tracing_subscriber::registry()
        .with(build_env_filter(verbosity))
        .with(fmt_layer)
        .try_init()
        .map_err(|e| PhotoBurnError::ConfigError(format!("Failed to install logger: {}", e)))
}

fn build_env_filter(verbosity: Verbosity) -> EnvFilter {
    if let Ok(directives) = std::env::var(LOG_ENV_VAR) {
        if let Ok(filter) = EnvFilter::try_new(&directives) {
            return filter;
        }
    }

    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    filter_for(verbosity)
}

fn filter_for(verbosity: Verbosity) -> EnvFilter {
    let level = verbosity.default_level();
    let directive = if verbosity == Verbosity::Verbose {
        format!("warn,photoburn={}", level.as_str().to_lowercase())
    } else {
        level.to_string()
    };

    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}
