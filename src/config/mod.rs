//! Configuration module for the NKO backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Secret used to sign tokens when `NKO_JWT_SECRET` is not set.
pub const DEV_JWT_SECRET: &str = "nko-dev-secret-change-me";

/// Longest accepted access token lifetime (one year).
pub const MAX_TOKEN_TTL_MINUTES: i64 = 60 * 24 * 365;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pre-shared key guarding create/delete endpoints (disabled when unset)
    pub admin_psk: Option<String>,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// HMAC secret for access tokens
    pub jwt_secret: String,
    /// Access token lifetime in minutes
    pub token_ttl_minutes: i64,
    /// Image shown for organizations without a logo
    pub default_logo: String,
    /// URL prefix under which `nko-logo/` files are served
    pub logo_static_base: String,
    /// URL prefix of the storage proxy resolving legacy logo keys
    pub storage_proxy_base: String,
}

/// A configuration value that could not be parsed.
#[derive(Debug)]
pub struct ConfigError {
    pub variable: &'static str,
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: {}", self.variable, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let admin_psk = env::var("NKO_ADMIN_PSK").ok().filter(|s| !s.is_empty());

        let db_path = env::var("NKO_DB_PATH")
            .unwrap_or_else(|_| "./data/nko.sqlite".to_string())
            .into();

        let bind_addr = env::var("NKO_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8000".to_string())
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError {
                variable: "NKO_BIND_ADDR",
                message: e.to_string(),
            })?;

        let log_level = env::var("NKO_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let jwt_secret = env::var("NKO_JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEV_JWT_SECRET.to_string());

        let token_ttl_minutes = match env::var("NKO_TOKEN_TTL_MINUTES") {
            Ok(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|m| (1..=MAX_TOKEN_TTL_MINUTES).contains(m))
                .filter(|m| chrono::Duration::try_minutes(*m).is_some())
                .ok_or_else(|| ConfigError {
                    variable: "NKO_TOKEN_TTL_MINUTES",
                    message: format!(
                        "expected between 1 and {} minutes, got '{}'",
                        MAX_TOKEN_TTL_MINUTES, raw
                    ),
                })?,
            Err(_) => 60 * 24,
        };

        let default_logo = env::var("NKO_DEFAULT_LOGO")
            .unwrap_or_else(|_| "/static/default-logo.png".to_string());

        let logo_static_base =
            env::var("NKO_LOGO_STATIC_BASE").unwrap_or_else(|_| "/nko-logo".to_string());

        let storage_proxy_base =
            env::var("NKO_STORAGE_PROXY_BASE").unwrap_or_else(|_| "/api/storage".to_string());

        Ok(Self {
            admin_psk,
            db_path,
            bind_addr,
            log_level,
            jwt_secret,
            token_ttl_minutes,
            default_logo,
            logo_static_base,
            storage_proxy_base,
        })
    }

    /// Whether tokens are signed with the built-in development secret.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}
