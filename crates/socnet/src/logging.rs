use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "socnet=info,socnet_db=info";

/// Path of today's log file inside `dir`.
pub fn log_file_path(dir: &Path) -> PathBuf {
    dir.join(format!("log_{}.log", Local::now().format("%Y-%m-%d")))
}

/// Sends all tracing output to today's log file so it never mixes with the
/// menu on stdout.
pub fn init(dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("creating log dir {}", dir.display()))?;

    let path = log_file_path(dir);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_file_is_dated() {
        let path = log_file_path(Path::new("logs"));
        let name = path.file_name().unwrap().to_str().unwrap();

        assert!(path.starts_with("logs"));
        assert!(name.starts_with("log_"));
        assert!(name.ends_with(".log"));
        // log_YYYY-MM-DD.log
        assert_eq!(name.len(), "log_2024-01-01.log".len());
    }
}
