//! Diagnostic logging.
//!
//! The terminal UI owns stdout and stderr, so tracing output only goes to a
//! file, and only when one was requested with `--log`.

use std::error::Error;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info";

/// Build the filter from `RUST_LOG`, falling back to `info`.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Append tracing events to `path`, creating the file if needed.
pub fn init_file_logging(path: &Path) -> Result<(), Box<dyn Error>> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| format!("Cannot open log file {}: {err}", path.display()))?;

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(file_layer)
        .try_init()?;

    tracing::info!(path = %path.display(), "logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn unopenable_log_path_is_reported() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("missing").join("playground.log");
        let err = init_file_logging(&path).expect_err("directory does not exist");
        assert!(err.to_string().starts_with("Cannot open log file"));
    }
}
