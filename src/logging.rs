//! Log output setup and the verbose-gated helpers.
//!
//! Library code logs through `tracing` directly. The binary installs one
//! subscriber with [`init`]; `RUST_LOG` overrides the default filter.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    Stderr,
    /// Append to a file; used while the terminal is owned by the demo.
    File(PathBuf),
    Disabled,
}

pub fn set_verbose(verbose: bool) {
    VERBOSE.store(verbose, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Informational message, only emitted with `--verbose`.
pub fn info(message: impl AsRef<str>) {
    if is_verbose() {
        tracing::info!("{}", message.as_ref());
    }
}

pub fn warn(message: impl AsRef<str>) {
    tracing::warn!("{}", message.as_ref());
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if is_verbose() {
            EnvFilter::new("llm_status=debug")
        } else {
            EnvFilter::new("llm_status=info")
        }
    })
}

/// Install the global subscriber. Call once, after [`set_verbose`].
pub fn init(sink: &LogSink) -> Result<()> {
    match sink {
        LogSink::Disabled => Ok(()),
        LogSink::Stderr => tracing_subscriber::fmt()
            .with_env_filter(default_filter())
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init()
            .map_err(|err| anyhow::anyhow!("Failed to install logger: {err}")),
        LogSink::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(default_filter())
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
                .map_err(|err| anyhow::anyhow!("Failed to install logger: {err}"))
        }
    }
}
