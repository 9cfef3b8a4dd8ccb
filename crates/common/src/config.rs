//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Token signing configuration.
    pub auth: AuthConfig,
    /// Media upload configuration.
    #[serde(default)]
    pub media: MediaConfig,
    /// Outbound mail configuration.
    #[serde(default)]
    pub mail: Option<MailConfig>,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance (used in verification mails).
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Token signing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Secret for signing access tokens.
    pub access_token_secret: String,
    /// Secret for signing refresh tokens.
    pub refresh_token_secret: String,
    /// Access token lifetime in minutes.
    #[serde(default = "default_access_ttl_minutes")]
    pub access_token_ttl_minutes: i64,
    /// Refresh token lifetime in days.
    #[serde(default = "default_refresh_ttl_days")]
    pub refresh_token_ttl_days: i64,
}

/// Media upload configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum MediaConfig {
    /// Store uploads on the local filesystem.
    Local {
        /// Directory files are written to.
        #[serde(default = "default_media_path")]
        base_path: String,
        /// URL prefix files are served from.
        #[serde(default = "default_media_url")]
        base_url: String,
    },
    /// Forward uploads to an external media host.
    Remote {
        /// Upload endpoint of the media host.
        upload_url: String,
        /// API key sent with each upload.
        api_key: String,
    },
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self::Local {
            base_path: default_media_path(),
            base_url: default_media_url(),
        }
    }
}

/// Outbound mail configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// SMTP relay host.
    pub smtp_host: String,
    /// SMTP relay port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    pub smtp_user: String,
    /// SMTP password.
    pub smtp_password: String,
    /// From address for outbound mail.
    pub from_address: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_access_ttl_minutes() -> i64 {
    15
}

const fn default_refresh_ttl_days() -> i64 {
    10
}

fn default_media_path() -> String {
    "./public/media".to_string()
}

fn default_media_url() -> String {
    "/media".to_string()
}

const fn default_smtp_port() -> u16 {
    587
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `PLAYTUBE_ENV`)
    /// 3. Environment variables with `PLAYTUBE_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("PLAYTUBE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("PLAYTUBE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("PLAYTUBE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
