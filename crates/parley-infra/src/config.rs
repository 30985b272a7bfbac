//! Configuration and data directory resolution.
//!
//! Reads `config.toml` from the data directory (`~/.parley/` by default)
//! and deserializes it into [`ParleyConfig`]. Falls back to defaults when
//! the file is missing or malformed.

use std::path::{Path, PathBuf};

use parley_types::config::ParleyConfig;

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "PARLEY_DATA_DIR";

/// Database file name inside the data directory.
const DATABASE_FILE: &str = "parley.db";

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`ParleyConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - Otherwise returns the parsed config; omitted fields take their defaults.
pub async fn load_config(data_dir: &Path) -> ParleyConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ParleyConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ParleyConfig::default();
        }
    };

    match toml::from_str::<ParleyConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ParleyConfig::default()
        }
    }
}

/// Resolve the data directory.
///
/// Priority:
/// 1. `PARLEY_DATA_DIR` environment variable
/// 2. `~/.parley`
/// 3. `.parley` in the current directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".parley");
    }

    PathBuf::from(".parley")
}

/// SQLite connection URL for the database inside `data_dir`.
///
/// `mode=rwc` creates the file on first open.
pub fn database_url(data_dir: &Path) -> String {
    format!("sqlite://{}?mode=rwc", data_dir.join(DATABASE_FILE).display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).await;
        assert_eq!(config, ParleyConfig::default());
    }

    #[tokio::test]
    async fn load_config_partial_toml_fills_defaults() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(
            tmp.path().join("config.toml"),
            r#"
model = "deepseek-reasoner"
history_limit = 20
"#,
        )
        .await
        .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config.model, "deepseek-reasoner");
        assert_eq!(config.history_limit, 20);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.base_url, "https://api.deepseek.com/v1");
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::write(tmp.path().join("config.toml"), "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(tmp.path()).await;
        assert_eq!(config, ParleyConfig::default());
    }

    #[test]
    fn database_url_points_into_data_dir() {
        let url = database_url(Path::new("/tmp/parley-data"));
        assert_eq!(url, "sqlite:///tmp/parley-data/parley.db?mode=rwc");
    }
}
