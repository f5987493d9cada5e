use thiserror::Error;

/// Application-wide error types for Pricelens.
#[derive(Error, Debug)]
pub enum AppError {
    /// Raw image bytes could not be read or encoded.
    #[error("Encoding error: {0}")]
    EncodingError(String),

    /// The inference service call failed, returned an empty body, or
    /// returned text that does not parse as a structured document.
    #[error("Inference error (HTTP {status_code}): {message}")]
    InferenceError {
        message: String,
        status_code: u16,
        retryable: bool,
    },

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Writing to the local store failed. Reads never produce this:
    /// corrupt stored data is logged and replaced with the key's default.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    /// Returns true if this error is transient and worth a manual retry.
    ///
    /// The core never retries on its own; the caller decides what to do
    /// with this.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::NetworkError(_) | AppError::Timeout(_) => true,
            AppError::InferenceError { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(AppError::NetworkError("reset".into()).is_retryable());
        assert!(AppError::Timeout(30).is_retryable());
        assert!(
            AppError::InferenceError {
                message: "server error".into(),
                status_code: 500,
                retryable: true,
            }
            .is_retryable()
        );
        assert!(
            !AppError::InferenceError {
                message: "bad request".into(),
                status_code: 400,
                retryable: false,
            }
            .is_retryable()
        );
        assert!(!AppError::EncodingError("unreadable file".into()).is_retryable());
        assert!(!AppError::StorageError("disk full".into()).is_retryable());
    }
}
