//! Configuration module for Agora.

use serde::Deserialize;
use std::path::Path;

use crate::{AgoraError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
    /// Maximum number of pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/agora.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Forum information shown on rendered pages.
#[derive(Debug, Clone, Deserialize)]
pub struct ForumConfig {
    /// Name of the forum.
    #[serde(default = "default_forum_name")]
    pub name: String,
    /// Short description of the forum.
    #[serde(default = "default_forum_description")]
    pub description: String,
}

fn default_forum_name() -> String {
    "Agora".to_string()
}

fn default_forum_description() -> String {
    "A place to talk things through".to_string()
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            name: default_forum_name(),
            description: default_forum_description(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/agora.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Web API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// JWT secret key (required).
    #[serde(default)]
    pub jwt_secret: String,
    /// Access token expiry in seconds.
    #[serde(default = "default_jwt_expiry")]
    pub jwt_expiry_secs: u64,
    /// Whether to serve static files.
    #[serde(default = "default_serve_static")]
    pub serve_static: bool,
    /// Path to static files directory.
    #[serde(default = "default_static_path")]
    pub static_path: String,
    /// Rate limit for login and registration (requests per minute).
    #[serde(default = "default_login_rate_limit")]
    pub login_rate_limit: u32,
    /// Rate limit for general API endpoints (requests per minute).
    #[serde(default = "default_api_rate_limit")]
    pub api_rate_limit: u32,
    /// Take the client address from `X-Forwarded-For` / `X-Real-IP`.
    ///
    /// Enable only behind a reverse proxy that sets these headers.
    #[serde(default)]
    pub trust_proxy_headers: bool,
}

fn default_jwt_expiry() -> u64 {
    86400
}

fn default_serve_static() -> bool {
    true
}

fn default_static_path() -> String {
    "static".to_string()
}

fn default_login_rate_limit() -> u32 {
    10
}

fn default_api_rate_limit() -> u32 {
    300
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            jwt_secret: String::new(),
            jwt_expiry_secs: default_jwt_expiry(),
            serve_static: default_serve_static(),
            static_path: default_static_path(),
            login_rate_limit: default_login_rate_limit(),
            api_rate_limit: default_api_rate_limit(),
            trust_proxy_headers: false,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Forum information.
    #[serde(default)]
    pub forum: ForumConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Web API configuration.
    #[serde(default)]
    pub web: WebConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(AgoraError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| AgoraError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `AGORA_JWT_SECRET` (or `JWT_SECRET`): JWT signing secret
    /// - `SERVER_PORT`: HTTP port
    /// - `AGORA_DATABASE_PATH` (or `DB_PATH`): SQLite database file
    /// - `AGORA_LOG_LEVEL`: log level
    ///
    /// Empty values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Some(secret) = env_non_empty("AGORA_JWT_SECRET").or_else(|| env_non_empty("JWT_SECRET"))
        {
            self.web.jwt_secret = secret;
        }

        if let Some(port) = env_non_empty("SERVER_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid SERVER_PORT"),
            }
        }

        if let Some(path) =
            env_non_empty("AGORA_DATABASE_PATH").or_else(|| env_non_empty("DB_PATH"))
        {
            self.database.path = path;
        }

        if let Some(level) = env_non_empty("AGORA_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if the JWT secret is not set.
    pub fn validate(&self) -> Result<()> {
        if self.web.jwt_secret.is_empty() {
            return Err(AgoraError::Config(
                "jwt_secret is not set. \
                 Set it in config.toml or via the AGORA_JWT_SECRET environment variable."
                    .to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(AgoraError::Config(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
