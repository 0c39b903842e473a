use std::env;
use std::time::Duration;

use reqwest::Url;

#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,

    // Server
    pub host: String,
    pub port: u16,

    // Logging
    pub log_level: String,
    pub log_format: LogFormat,

    // Enrichment lookups
    pub age_api_url: Url,
    pub nationality_api_url: Url,
    pub sex_api_url: Url,
    pub enrichment_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if exists

        Ok(Self {
            // Database
            database_url: env::var("DATABASE_URL")
                .map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 20)?,
            db_min_connections: parse_or("DB_MIN_CONNECTIONS", 2)?,

            // Server
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_or("PORT", 3000)?,

            // Logging
            log_level: parse_log_level(
                &env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            )?,
            log_format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .as_str()
            {
                "pretty" => LogFormat::Pretty,
                "json" => LogFormat::Json,
                _ => return Err(ConfigError::Invalid("LOG_FORMAT")),
            },

            // Enrichment lookups
            age_api_url: url_or("AGE_API_URL", "https://api.agify.io/")?,
            nationality_api_url: url_or("NATIONALITY_API_URL", "https://api.nationalize.io/")?,
            sex_api_url: url_or("SEX_API_URL", "https://api.genderize.io/")?,
            enrichment_timeout: Duration::from_secs(parse_or("ENRICHMENT_TIMEOUT_SECS", 5)?),
        })
    }

    /// Get server address as "host:port"
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid(key)),
        Err(_) => Ok(default),
    }
}

fn url_or(key: &'static str, default: &str) -> Result<Url, ConfigError> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|_| ConfigError::Invalid(key))
}

fn parse_log_level(raw: &str) -> Result<String, ConfigError> {
    match raw {
        "debug" | "info" | "warn" | "error" => Ok(raw.to_string()),
        _ => Err(ConfigError::Invalid("LOG_LEVEL")),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid environment variable: {0}")]
    Invalid(&'static str),
}
