use std::io;

/// Custom error type for patchy operations
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Webhook validation failed: {0}")]
    WebhookValidationFailed(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParseError(#[from] toml::de::Error),
}

/// Reasons a notification could not be delivered to the chat channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    #[error("channel connection is not established yet")]
    NotReady,

    #[error("missing permission to post in the channel: {0}")]
    PermissionDenied(String),

    #[error("Discord API rejected the request (HTTP {status}): {message}")]
    Http { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),
}

impl DispatchError {
    /// Whether posting a diagnostic about this failure to the same channel
    /// has a chance of succeeding.
    pub fn is_reportable(&self) -> bool {
        matches!(self, Self::Http { .. } | Self::Transport(_))
    }
}

/// Helper type for Results that use RelayError
pub type Result<T> = std::result::Result<T, RelayError>;
