use thiserror::Error;

use crate::config::ConfigError;

/// Errors returned by gateway operations.
#[derive(Debug, Error)]
pub enum UnionPayError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The gateway rejected the request or replied with unusable data.
    #[error("gateway error: {0}")]
    GatewayError(String),

    /// A required input or notification field is missing or malformed.
    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("signature error: {0}")]
    SignatureError(String),

    /// Transport-level failure: connect, timeout, body read.
    #[error("http error: {0}")]
    HttpError(String),

    #[error("serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    /// The notification callback itself failed.
    #[error("notification callback failed: {0}")]
    Callback(Box<dyn std::error::Error + Send + Sync>),
}

impl UnionPayError {
    /// The bare message without the variant prefix, as the gateway or the
    /// validator reported it.
    pub fn message(&self) -> String {
        match self {
            UnionPayError::GatewayError(msg)
            | UnionPayError::ValidationError(msg)
            | UnionPayError::SignatureError(msg)
            | UnionPayError::HttpError(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}
