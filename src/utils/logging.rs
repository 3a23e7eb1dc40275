use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

use crate::utils::app_paths::AppPaths;

/// Initialize file logging.
///
/// The TUI owns the terminal, so the subscriber writes to
/// `<data dir>/wqt.log` with ANSI off. `level` is the configured
/// default; `RUST_LOG` overrides it when set.
pub fn init(level: &str) -> Result<()> {
    let path = AppPaths::log_file()?;
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wqt={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("installing tracing subscriber: {e}"))?;

    tracing::debug!(log_file = %path.display(), "logging initialized");
    Ok(())
}
