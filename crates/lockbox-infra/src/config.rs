//! Configuration and data directory resolution for Lockbox.
//!
//! Reads `config.toml` from the data directory (`~/.lockbox/` by default) into
//! [`VaultConfig`]. Falls back to defaults when the file is missing or malformed.

use std::path::{Path, PathBuf};

use lockbox_types::config::VaultConfig;
use lockbox_types::generator::{DEFAULT_PASSWORD_LENGTH, MAX_PASSWORD_LENGTH, MIN_STRONG_LENGTH};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "LOCKBOX_DATA_DIR";

/// Load configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`VaultConfig::default()`].
/// - Unreadable or unparsable file: a warning is logged and defaults are used.
/// - A `default_password_length` the generator would reject falls back to the
///   default length with a warning.
pub async fn load_vault_config(data_dir: &Path) -> VaultConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return VaultConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return VaultConfig::default();
        }
    };

    match toml::from_str::<VaultConfig>(&content) {
        Ok(config) => sanitize(config, &config_path),
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            VaultConfig::default()
        }
    }
}

fn sanitize(mut config: VaultConfig, config_path: &Path) -> VaultConfig {
    let length = config.default_password_length;
    if !(MIN_STRONG_LENGTH..=MAX_PASSWORD_LENGTH).contains(&length) {
        tracing::warn!(
            "default_password_length = {length} in {} is outside {MIN_STRONG_LENGTH}..={MAX_PASSWORD_LENGTH}, using {DEFAULT_PASSWORD_LENGTH}",
            config_path.display()
        );
        config.default_password_length = DEFAULT_PASSWORD_LENGTH;
    }
    config
}

/// Resolve the data directory.
///
/// Priority:
/// 1. `LOCKBOX_DATA_DIR` environment variable
/// 2. `~/.lockbox`
/// 3. `.lockbox` in the current directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".lockbox");
    }

    PathBuf::from(".lockbox")
}
