//! Error types for the finance assistant

use thiserror::Error;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, AssistantError>;

/// Message shown for every failed login, whatever the cause.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid account number or password.";

#[derive(Error, Debug)]
pub enum AssistantError {

    // =============================
    // Session & Input Errors
    // =============================

    /// Unknown account and wrong password collapse into this one variant.
    #[error("Invalid account number or password.")]
    InvalidCredentials,

    #[error("Session not found")]
    SessionNotFound,

    #[error("{0}")]
    InputError(String),

    // =============================
    // Upstream & Collaborator Errors
    // =============================

    #[error("Upstream error: {0}")]
    UpstreamError(String),

    #[error("Malformed upstream response: {0}")]
    MalformedResponse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("UUID parse error: {0}")]
    UuidError(#[from] uuid::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AssistantError {
    /// True for failures of the completion call or its transport.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AssistantError::UpstreamError(_)
                | AssistantError::MalformedResponse(_)
                | AssistantError::HttpError(_)
                | AssistantError::SerializationError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_credentials_message_is_generic() {
        assert_eq!(
            AssistantError::InvalidCredentials.to_string(),
            INVALID_CREDENTIALS_MESSAGE
        );
    }

    #[test]
    fn test_input_error_displays_message_verbatim() {
        let err = AssistantError::InputError("Enter a valid numeric balance.".into());
        assert_eq!(err.to_string(), "Enter a valid numeric balance.");
        assert!(!err.is_upstream());
    }

    #[test]
    fn test_upstream_classification() {
        assert!(AssistantError::UpstreamError("timeout".into()).is_upstream());
        assert!(AssistantError::MalformedResponse("{}".into()).is_upstream());
        assert!(!AssistantError::InvalidCredentials.is_upstream());
    }
}
