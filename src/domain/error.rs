//! Domain-level error types for redtime.
//!
//! All errors are typed with `thiserror`. Transport and unclassified API
//! failures carry the text shown to the operator in place of search results.

use thiserror::Error;

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    /// No credentials are stored, so no API handle can be derived.
    #[error("Redmine not configured")]
    NotConfigured,

    /// Configuration file or environment error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Request-level failure (connection, timeout, HTTP status).
    #[error("{message}")]
    Transport { message: String },

    /// Any other failure reported by an API operation.
    #[error("Unexpected API failure: {message}")]
    Unclassified { message: String },

    /// Operator input rejected before reaching the API.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {message}")]
    JsonParse {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// IO operation failed.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl AppError {
    /// Create a transport error from any displayable failure.
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }

    /// Create an unclassified API error.
    pub fn unclassified(err: impl std::fmt::Display) -> Self {
        Self::Unclassified {
            message: err.to_string(),
        }
    }

    /// Create a JSON parse error.
    pub fn json_parse(err: serde_json::Error) -> Self {
        Self::JsonParse {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create an IO error with context.
    pub fn io(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(err),
        }
    }

    /// Text placed in the error arm of a search outcome.
    ///
    /// Transport failures contribute their bare message; everything else
    /// its full display string.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::Transport { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_message_is_bare() {
        let err = AppError::transport("connection refused");
        assert_eq!(err.display_message(), "connection refused");
    }

    #[test]
    fn test_other_errors_are_stringified() {
        let err = AppError::unclassified("missing field `issues`");
        assert_eq!(
            err.display_message(),
            "Unexpected API failure: missing field `issues`"
        );
        assert_eq!(
            AppError::NotConfigured.display_message(),
            "Redmine not configured"
        );
    }
}
