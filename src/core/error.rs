use thiserror::Error;

/// Unified error type for the relay bot
#[derive(Error, Debug)]
pub enum RelayError {
    /// Inference API errors (bad status, unexpected body)
    #[error("API error: {0}")]
    Api(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Telegram Bot API errors (ok=false responses, delivery failures)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RelayError::Network(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            RelayError::Network(format!("Connection failed: {}", err))
        } else if err.is_status() {
            RelayError::Api(format!("API returned error status: {}", err))
        } else {
            RelayError::Network(format!("Request failed: {}", err))
        }
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::Serialization(format!("JSON error: {}", err))
    }
}

impl From<serde_yml::Error> for RelayError {
    fn from(err: serde_yml::Error) -> Self {
        RelayError::Serialization(format!("YAML error: {}", err))
    }
}
