use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Authentication failed: {0}")]
    #[diagnostic(code(calendar_digest::authentication))]
    Authentication(String),

    #[error("Failed to fetch calendar events: {0}")]
    #[diagnostic(code(calendar_digest::fetch))]
    Fetch(String),

    #[error("Summarization failed: {0}")]
    #[diagnostic(code(calendar_digest::summarization))]
    Summarization(String),

    #[error("Email delivery failed: {0}")]
    #[diagnostic(code(calendar_digest::delivery))]
    Delivery(String),

    #[error("Environment error: {0}")]
    #[diagnostic(
        code(calendar_digest::environment),
        help("Set the variable in the environment or in a .env file")
    )]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(calendar_digest::config))]
    Config(String),

    #[error("Template error: {0}")]
    #[diagnostic(code(calendar_digest::template))]
    Template(#[from] askama::Error),

    #[error("HTTP error: {0}")]
    #[diagnostic(code(calendar_digest::http))]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    #[diagnostic(code(calendar_digest::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(calendar_digest::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(calendar_digest::other))]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type DigestResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create token refresh errors
pub fn auth_error(message: &str) -> Error {
    Error::Authentication(message.to_string())
}

/// Helper to create calendar fetch errors
pub fn fetch_error(message: &str) -> Error {
    Error::Fetch(message.to_string())
}

/// Helper to create summarization errors
pub fn summarization_error(message: &str) -> Error {
    Error::Summarization(message.to_string())
}

/// Helper to create email delivery errors
pub fn delivery_error(message: &str) -> Error {
    Error::Delivery(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
