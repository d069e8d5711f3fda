//! otto configuration loading and parsing
//!
//! Every field has a default, and the defaults describe the plain dashboard:
//! listen on 8080, talk to the local engine, no deadlines, embedded assets.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_PATH: &str = "otto.toml";
const CONFIG_ENV: &str = "OTTO_CONFIG";

/// Root configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct OttoConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    /// Serve `/assets/*` from this directory instead of the copy bundled in the binary.
    #[serde(default)]
    pub assets_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            assets_dir: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EngineConfig {
    /// `false` runs the static page only, without ever touching the engine.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Deadline applied to each engine call; 0 waits forever.
    #[serde(default)]
    pub timeout_seconds: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_seconds: 0,
        }
    }
}

impl EngineConfig {
    pub fn deadline(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value functions
fn default_listen() -> SocketAddr { SocketAddr::from(([0, 0, 0, 0], 8080)) }
fn default_true() -> bool { true }
fn default_log_level() -> String { "info".into() }

/// Where the active configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    File(PathBuf),
    /// No file at this path; built-in defaults are in effect.
    Defaults(PathBuf),
}

/// Load configuration from `$OTTO_CONFIG`, falling back to `./otto.toml`.
///
/// Logging is not initialised yet when this runs, so the origin is returned
/// for the caller to report.
pub fn load_config() -> Result<(OttoConfig, ConfigOrigin)> {
    let config_path = std::env::var(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
    load_config_from(&config_path)
}

pub fn load_config_from(config_path: &Path) -> Result<(OttoConfig, ConfigOrigin)> {
    if !config_path.exists() {
        return Ok((OttoConfig::default(), ConfigOrigin::Defaults(config_path.to_path_buf())));
    }

    let content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: OttoConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;
    Ok((config, ConfigOrigin::File(config_path.to_path_buf())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = OttoConfig::default();
        assert_eq!(config.server.listen.port(), 8080);
        assert!(config.server.assets_dir.is_none());
        assert!(config.engine.enabled);
        assert_eq!(config.engine.deadline(), None);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_parse_minimal_config() {
        let toml_str = r#"
[engine]
enabled = false
"#;
        let config: OttoConfig = toml::from_str(toml_str).unwrap();
        assert!(!config.engine.enabled);
        assert_eq!(config.server.listen, default_listen());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[server]
listen = "127.0.0.1:9000"
assets_dir = "/srv/otto/assets"

[engine]
enabled = true
timeout_seconds = 5

[logging]
level = "debug"
json = true
"#;
        let config: OttoConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.server.assets_dir, Some(PathBuf::from("/srv/otto/assets")));
        assert_eq!(config.engine.deadline(), Some(Duration::from_secs(5)));
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let (config, origin) = load_config_from(&path).unwrap();
        assert_eq!(origin, ConfigOrigin::Defaults(path));
        assert!(config.engine.enabled);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nlisten = \"0.0.0.0:8181\"").unwrap();
        let (config, origin) = load_config_from(file.path()).unwrap();
        assert_eq!(origin, ConfigOrigin::File(file.path().to_path_buf()));
        assert_eq!(config.server.listen.port(), 8181);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nlisten = \"not an address\"").unwrap();
        let err = load_config_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }
}
