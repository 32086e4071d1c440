use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Reddit API error: {0}")]
    RedditApi(#[from] RedditApiError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl CoreError {
    /// Stable short code for log correlation.
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::RedditApi(_) => "REDDIT_API",
            CoreError::Llm(_) => "LLM",
            CoreError::Database(_) => "DATABASE",
            CoreError::Config(_) => "CONFIG",
            CoreError::Network(_) => "NETWORK",
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum RedditApiError {
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Forbidden access to resource: {resource}")]
    Forbidden { resource: String },

    #[error("Subreddit not found: {subreddit}")]
    SubredditNotFound { subreddit: String },

    #[error("Invalid OAuth token")]
    InvalidToken,

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },
}

#[derive(Error, Debug, Clone)]
pub enum LlmError {
    #[error("Provider authentication failed")]
    AuthenticationFailed,

    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Invalid completion response: {details}")]
    InvalidResponse { details: String },

    #[error("Provider server error: {status_code}")]
    ServerError { status_code: u16 },
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Subreddit already exists: {name}")]
    AlreadyExists { name: String },

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable not set: {var_name}")]
    MissingEnvironmentVariable { var_name: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes() {
        let reddit_error = CoreError::RedditApi(RedditApiError::InvalidToken);
        assert_eq!(reddit_error.error_code(), "REDDIT_API");

        let llm_error = CoreError::Llm(LlmError::AuthenticationFailed);
        assert_eq!(llm_error.error_code(), "LLM");

        let config_error = CoreError::Config(ConfigError::MissingEnvironmentVariable {
            var_name: "OPENAI_API_KEY".to_string(),
        });
        assert_eq!(config_error.error_code(), "CONFIG");
    }

    #[test]
    fn subreddit_not_found_message() {
        let err = RedditApiError::SubredditNotFound {
            subreddit: "doesnotexist".to_string(),
        };
        assert_eq!(err.to_string(), "Subreddit not found: doesnotexist");
    }
}
