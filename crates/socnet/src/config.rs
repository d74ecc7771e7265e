use std::path::PathBuf;

const DEFAULT_DB_PATH: &str = "socialnetwork.db";
const DEFAULT_LOG_DIR: &str = ".";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
}

impl Config {
    /// Reads `SOCNET_DB_PATH` and `SOCNET_LOG_DIR`, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            db_path: PathBuf::from(var("SOCNET_DB_PATH", DEFAULT_DB_PATH)),
            log_dir: PathBuf::from(var("SOCNET_LOG_DIR", DEFAULT_LOG_DIR)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.db_path, PathBuf::from("socialnetwork.db"));
        assert_eq!(config.log_dir, PathBuf::from("."));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(|key| match key {
            "SOCNET_DB_PATH" => Some("/tmp/other.db".into()),
            "SOCNET_LOG_DIR" => Some("  ".into()),
            _ => None,
        });
        assert_eq!(config.db_path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.log_dir, PathBuf::from("."));
    }
}
