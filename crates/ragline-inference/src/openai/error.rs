//! OpenAI-specific error handling.

use ragline_core::Error;

/// OpenAI-specific error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAIErrorCode {
    /// Invalid authentication credentials.
    AuthenticationError,
    /// Rate limit exceeded.
    RateLimitExceeded,
    /// Model not found or not available.
    ModelNotFound,
    /// Request too large.
    ContextLengthExceeded,
    /// Server error.
    ServerError,
    /// Unknown error.
    Unknown,
}

impl OpenAIErrorCode {
    /// Determine error code from HTTP status and error type.
    pub fn from_response(status: u16, error_type: &str) -> Self {
        match (status, error_type) {
            (401, _) | (403, _) => Self::AuthenticationError,
            (429, _) => Self::RateLimitExceeded,
            (404, _) | (_, "model_not_found") => Self::ModelNotFound,
            (400, _) if error_type.contains("context_length") => Self::ContextLengthExceeded,
            (500..=599, _) => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimitExceeded | Self::ServerError)
    }
}

/// Which service call produced the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Embedding,
    Generation,
}

/// Convert an OpenAI error response into a ragline Error.
///
/// Retryable embedding failures become `Error::Request` so the retry layer
/// picks them up. Generation is never retried, so all of its failures are
/// reported as `Error::Generation`.
pub fn to_ragline_error(code: OpenAIErrorCode, kind: CallKind, message: &str) -> Error {
    match (code, kind) {
        (OpenAIErrorCode::AuthenticationError, _) => {
            Error::Config(format!("Authentication failed: {}", message))
        }
        (OpenAIErrorCode::ModelNotFound, _) => Error::Config(format!("Model not found: {}", message)),
        (c, CallKind::Embedding) if c.is_retryable() => {
            Error::Request(format!("Embedding service unavailable: {}", message))
        }
        (OpenAIErrorCode::ContextLengthExceeded, CallKind::Embedding) => {
            Error::Embedding(format!("Input too long: {}", message))
        }
        (_, CallKind::Embedding) => Error::Embedding(message.to_string()),
        (OpenAIErrorCode::RateLimitExceeded, CallKind::Generation) => {
            Error::Generation(format!("Rate limit exceeded: {}", message))
        }
        (OpenAIErrorCode::ContextLengthExceeded, CallKind::Generation) => {
            Error::Generation(format!("Context too long: {}", message))
        }
        (OpenAIErrorCode::ServerError, CallKind::Generation) => {
            Error::Generation(format!("Server error: {}", message))
        }
        (OpenAIErrorCode::Unknown, CallKind::Generation) => Error::Generation(message.to_string()),
    }
}
