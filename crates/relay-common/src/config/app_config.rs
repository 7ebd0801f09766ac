//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when present).

use serde::Deserialize;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub gateway: ServerConfig,
    pub database: Option<DatabaseConfig>,
    pub relay: RelayConfig,
}

/// General application settings
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
    #[serde(default)]
    pub worker_id: u16,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => Ok(Self::Development),
            other => Err(ConfigError::InvalidValue("APP_ENV", other.to_string())),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Tuning for the real-time relay itself
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// How long a typing indicator lives without a refresh
    #[serde(default = "default_typing_timeout_ms")]
    pub typing_timeout_ms: u64,
    /// Period of the typing/presence sweep
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
    /// Deadline for each call into the store
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    /// Capacity of each session's outbound queue
    #[serde(default = "default_session_buffer")]
    pub session_buffer: usize,
    /// Maximum message length in characters
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    #[serde(default = "default_heartbeat_timeout_ms")]
    pub heartbeat_timeout_ms: u64,
    /// Offline presence records older than this are evicted; `None` keeps them forever
    #[serde(default)]
    pub presence_retention_secs: Option<u64>,
}

impl RelayConfig {
    #[must_use]
    pub fn typing_timeout(&self) -> Duration {
        Duration::from_millis(self.typing_timeout_ms)
    }

    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    #[must_use]
    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_millis(self.heartbeat_timeout_ms)
    }

    #[must_use]
    pub fn presence_retention(&self) -> Option<Duration> {
        self.presence_retention_secs.map(Duration::from_secs)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            typing_timeout_ms: default_typing_timeout_ms(),
            sweep_interval_ms: default_sweep_interval_ms(),
            store_timeout_ms: default_store_timeout_ms(),
            session_buffer: default_session_buffer(),
            max_content_length: default_max_content_length(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            heartbeat_timeout_ms: default_heartbeat_timeout_ms(),
            presence_retention_secs: None,
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "marketplace-relay".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_typing_timeout_ms() -> u64 {
    5_000
}

fn default_sweep_interval_ms() -> u64 {
    1_000
}

fn default_store_timeout_ms() -> u64 {
    5_000
}

fn default_session_buffer() -> usize {
    100
}

fn default_max_content_length() -> usize {
    2_000
}

fn default_heartbeat_interval_ms() -> u64 {
    25_000
}

fn default_heartbeat_timeout_ms() -> u64 {
    60_000
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_source(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key/value source
    pub fn from_source<F>(source: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let relay = RelayConfig {
            typing_timeout_ms: parse_or(&source, "RELAY_TYPING_TIMEOUT_MS", default_typing_timeout_ms)?,
            sweep_interval_ms: parse_or(&source, "RELAY_SWEEP_INTERVAL_MS", default_sweep_interval_ms)?,
            store_timeout_ms: parse_or(&source, "RELAY_STORE_TIMEOUT_MS", default_store_timeout_ms)?,
            session_buffer: parse_or(&source, "RELAY_SESSION_BUFFER", default_session_buffer)?,
            max_content_length: parse_or(
                &source,
                "RELAY_MAX_CONTENT_LENGTH",
                default_max_content_length,
            )?,
            heartbeat_interval_ms: parse_or(
                &source,
                "RELAY_HEARTBEAT_INTERVAL_MS",
                default_heartbeat_interval_ms,
            )?,
            heartbeat_timeout_ms: parse_or(
                &source,
                "RELAY_HEARTBEAT_TIMEOUT_MS",
                default_heartbeat_timeout_ms,
            )?,
            presence_retention_secs: parse_opt(&source, "RELAY_PRESENCE_RETENTION_SECS")?,
        };

        if relay.session_buffer == 0 {
            return Err(ConfigError::InvalidValue("RELAY_SESSION_BUFFER", "0".to_string()));
        }
        if relay.sweep_interval_ms == 0 {
            return Err(ConfigError::InvalidValue("RELAY_SWEEP_INTERVAL_MS", "0".to_string()));
        }

        let database = match source("DATABASE_URL").filter(|url| !url.trim().is_empty()) {
            Some(url) => Some(DatabaseConfig {
                url,
                max_connections: parse_or(&source, "DATABASE_MAX_CONNECTIONS", default_max_connections)?,
                min_connections: parse_or(&source, "DATABASE_MIN_CONNECTIONS", default_min_connections)?,
            }),
            None => None,
        };

        Ok(Self {
            app: AppSettings {
                name: source("APP_NAME").unwrap_or_else(default_app_name),
                env: source("APP_ENV")
                    .map(|s| s.parse::<Environment>())
                    .transpose()?
                    .unwrap_or_default(),
                worker_id: parse_or(&source, "SNOWFLAKE_WORKER_ID", || 0)?,
            },
            gateway: ServerConfig {
                host: source("GATEWAY_HOST").unwrap_or_else(default_host),
                port: parse_opt(&source, "GATEWAY_PORT")?
                    .ok_or(ConfigError::MissingVar("GATEWAY_PORT"))?,
            },
            database,
            relay,
        })
    }
}

fn parse_opt<F, T>(source: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    source(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key, raw))
        })
        .transpose()
}

fn parse_or<F, T>(source: &F, key: &'static str, default: impl FnOnce() -> T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    Ok(parse_opt(source, key)?.unwrap_or_else(default))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
