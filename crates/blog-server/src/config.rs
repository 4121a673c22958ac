//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Seed content settings.
    #[serde(default)]
    pub content: ContentConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Maximum number of pooled connections.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "blog_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Seed content configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentConfig {
    /// Optional TOML fixtures file loaded at startup.
    #[serde(default)]
    pub fixtures: Option<String>,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    8000
}

fn default_db_path() -> String {
    "blog.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    blog_db::DbRuntimeSettings::default().busy_timeout_ms
}

fn default_pool_max_size() -> u32 {
    blog_db::DbRuntimeSettings::default().pool_max_size
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl DatabaseConfig {
    /// The pool settings this configuration describes.
    pub fn runtime_settings(&self) -> blog_db::DbRuntimeSettings {
        blog_db::DbRuntimeSettings {
            busy_timeout_ms: self.busy_timeout_ms,
            pool_max_size: self.pool_max_size,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `BLOG_HOST` overrides `server.host`
/// - `BLOG_PORT` overrides `server.port`
/// - `BLOG_DB_PATH` overrides `database.path`
/// - `BLOG_LOG_LEVEL` overrides `logging.level`
/// - `BLOG_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `BLOG_FIXTURES` overrides `content.fixtures`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = read_config_file(path)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

fn read_config_file(path: Option<&str>) -> Result<Config, ConfigError> {
    match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Ok(Config::default())
            }
            Err(e) => Err(ConfigError::FileRead(e)),
        },
        None => Ok(Config::default()),
    }
}

fn apply_env_overrides(config: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(host) = var("BLOG_HOST") {
        match host.parse() {
            Ok(parsed) => config.server.host = parsed,
            Err(_) => tracing::warn!(value = %host, "ignoring unparseable BLOG_HOST"),
        }
    }
    if let Some(port) = var("BLOG_PORT") {
        match port.parse() {
            Ok(parsed) => config.server.port = parsed,
            Err(_) => tracing::warn!(value = %port, "ignoring unparseable BLOG_PORT"),
        }
    }
    if let Some(db_path) = var("BLOG_DB_PATH") {
        config.database.path = db_path;
    }
    if let Some(level) = var("BLOG_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("BLOG_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(fixtures) = var("BLOG_FIXTURES") {
        config.content.fixtures = Some(fixtures).filter(|p| !p.trim().is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = read_config_file(path.to_str()).expect("missing file is not an error");

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.host, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.database.path, "blog.db");
        assert_eq!(config.database.pool_max_size, 8);
        assert_eq!(config.logging.level, "info");
        assert!(config.content.fixtures.is_none());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9100

[database]
path = "/var/lib/blog/blog.db"

[content]
fixtures = "seed.toml"
"#
        )
        .unwrap();

        let config = read_config_file(file.path().to_str()).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(config.database.path, "/var/lib/blog/blog.db");
        assert_eq!(config.database.busy_timeout_ms, 5_000);
        assert_eq!(config.content.fixtures.as_deref(), Some("seed.toml"));
        assert!(!config.logging.json);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = \"not a number\"").unwrap();

        let err = read_config_file(file.path().to_str()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("BLOG_HOST", "0.0.0.0"),
            ("BLOG_PORT", "8080"),
            ("BLOG_DB_PATH", "other.db"),
            ("BLOG_LOG_JSON", "1"),
            ("BLOG_FIXTURES", "fixtures.toml"),
        ]);
        let mut config = Config::default();
        apply_env_overrides(&mut config, |key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.path, "other.db");
        assert!(config.logging.json);
        assert_eq!(config.content.fixtures.as_deref(), Some("fixtures.toml"));
    }

    #[test]
    fn unparseable_port_override_is_ignored() {
        let mut config = Config::default();
        apply_env_overrides(&mut config, |key| {
            (key == "BLOG_PORT").then(|| "eighty".to_string())
        });
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn runtime_settings_follow_database_config() {
        let db = DatabaseConfig {
            path: "x.db".to_string(),
            busy_timeout_ms: 250,
            pool_max_size: 2,
        };
        let settings = db.runtime_settings();
        assert_eq!(settings.busy_timeout_ms, 250);
        assert_eq!(settings.pool_max_size, 2);
    }
}
