use std::path::PathBuf;

use crate::error::ConfigError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // Reddit script-app credentials
    pub reddit_client_id: String,
    pub reddit_client_secret: String,
    pub reddit_username: String,
    pub reddit_password: String,
    pub reddit_user_agent: String,

    // LLM provider
    pub openai_api_key: String,
    pub openai_model: String,

    // Classification dispatch
    pub classify_concurrency: usize,

    // Database
    pub database_path: PathBuf,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            reddit_client_id: required_env("REDDIT_CLIENT_ID")?,
            reddit_client_secret: required_env("REDDIT_CLIENT_SECRET")?,
            reddit_username: required_env("REDDIT_USERNAME")?,
            reddit_password: required_env("REDDIT_PASSWORD")?,
            reddit_user_agent: env_or_default("REDDIT_USER_AGENT", "subscope/0.1 by subscope"),

            openai_api_key: required_env("OPENAI_API_KEY")?,
            openai_model: env_or_default("OPENAI_MODEL", "gpt-4o-2024-08-06"),

            classify_concurrency: parse_env_usize("CLASSIFY_CONCURRENCY", 8)?,

            database_path: PathBuf::from(env_or_default("DATABASE_PATH", "./data/subscope.db")),

            web_host: env_or_default("WEB_HOST", "0.0.0.0"),
            web_port: parse_env_u16("WEB_PORT", 8080)?,
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.classify_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "CLASSIFY_CONCURRENCY".to_string(),
                value: "0 (must be at least 1)".to_string(),
            });
        }
        if self.reddit_user_agent.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "REDDIT_USER_AGENT".to_string(),
                value: "(empty)".to_string(),
            });
        }
        Ok(())
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvironmentVariable {
        var_name: name.to_string(),
    })
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_env_usize(name: &str, default: usize) -> Result<usize, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
            field: name.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_u16(name: &str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
            field: name.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}
