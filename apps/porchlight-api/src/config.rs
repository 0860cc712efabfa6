//! Fail-fast configuration loading with validation.
//!
//! Configuration is read from the environment (with `.env` support for
//! local development). Missing required values or malformed keys abort
//! startup rather than limping along with partial configuration.

use std::env;
use std::fmt;

use thiserror::Error;

/// Default webhook secret encryption key for development.
///
/// All 0x44 bytes. `validate_security_config` refuses to start in
/// production while this value is in use.
pub const INSECURE_WEBHOOK_KEY: &str =
    "4444444444444444444444444444444444444444444444444444444444444444";

/// Deployment environment, controlling how security issues are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Production,
}

impl AppEnvironment {
    fn from_env_str(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" | "" => Self::Development,
            other => {
                tracing::warn!(value = other, "Unrecognized APP_ENV value, defaulting to Development");
                Self::Development
            }
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },

    #[error("Failed to parse port: {0}")]
    InvalidPort(#[from] std::num::ParseIntError),
}

/// Application configuration.
#[derive(Clone)]
pub struct Config {
    pub app_env: AppEnvironment,
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub rust_log: String,
    /// AES-256-GCM key protecting webhook secrets at rest.
    pub webhook_encryption_key: [u8; 32],
    /// Permit plain HTTP and private-network webhook URLs.
    pub allow_insecure_webhook_urls: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `DATABASE_URL` is missing, the port is
    /// not a number, or the webhook encryption key is not 64 hex
    /// characters.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let app_env =
            AppEnvironment::from_env_str(&env::var("APP_ENV").unwrap_or_default());

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;
        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let webhook_encryption_key = parse_hex_encryption_key(
            "WEBHOOK_ENCRYPTION_KEY",
            &env::var("WEBHOOK_ENCRYPTION_KEY")
                .unwrap_or_else(|_| INSECURE_WEBHOOK_KEY.to_string()),
        )?;

        let allow_insecure_webhook_urls = env::var("ALLOW_INSECURE_WEBHOOK_URLS")
            .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1"))
            .unwrap_or(false);

        Ok(Self {
            app_env,
            host,
            port,
            database_url,
            rust_log,
            webhook_encryption_key,
            allow_insecure_webhook_urls,
        })
    }

    /// Address the server binds to, as `host:port`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check for insecure default values.
    ///
    /// Returns `Ok` with a list of warnings in development, or `Err`
    /// with the same list in production, where insecure defaults must
    /// abort startup.
    pub fn validate_security_config(&self) -> Result<Vec<String>, Vec<String>> {
        let mut issues = Vec::new();

        if self.webhook_encryption_key == [0x44u8; 32] {
            issues.push(
                "WEBHOOK_ENCRYPTION_KEY is using the default insecure value (all 0x44)"
                    .to_string(),
            );
        }

        if self.allow_insecure_webhook_urls {
            issues.push(
                "ALLOW_INSECURE_WEBHOOK_URLS is enabled; webhook URLs are not checked for HTTPS or private hosts"
                    .to_string(),
            );
        }

        if issues.is_empty() {
            return Ok(Vec::new());
        }
        if self.app_env.is_production() {
            Err(issues)
        } else {
            Ok(issues)
        }
    }
}

// Redact credentials so the config can be logged safely.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("app_env", &self.app_env)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_url", &"[redacted]")
            .field("rust_log", &self.rust_log)
            .field("webhook_encryption_key", &"[redacted]")
            .field(
                "allow_insecure_webhook_urls",
                &self.allow_insecure_webhook_urls,
            )
            .finish()
    }
}

/// Parse a 64-character hex string into a 32-byte key.
fn parse_hex_encryption_key(var_name: &str, hex_str: &str) -> Result<[u8; 32], ConfigError> {
    let bytes = hex::decode(hex_str).map_err(|_| ConfigError::InvalidValue {
        var: var_name.to_string(),
        message: "Must be 64 hex characters (32 bytes)".to_string(),
    })?;

    if bytes.len() != 32 {
        return Err(ConfigError::InvalidValue {
            var: var_name.to_string(),
            message: format!("Expected 32 bytes, got {}", bytes.len()),
        });
    }

    let mut key = [0u8; 32];
    key.copy_from_slice(&bytes);
    Ok(key)
}
