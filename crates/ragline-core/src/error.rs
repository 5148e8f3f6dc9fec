//! Error types for ragline.

use thiserror::Error;

/// Result type alias using ragline's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ragline operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad or unknown model, or a missing required option
    #[error("Configuration error: {0}")]
    Config(String),

    /// Embedding service call failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Intent resolution output was not usable as a search query
    #[error("Intent parse error: {0}")]
    IntentParse(String),

    /// Search backend query or index operation failed
    #[error("Search error: {0}")]
    Search(String),

    /// Chat completion call failed
    #[error("Generation error: {0}")]
    Generation(String),

    /// Resource not found (e.g. no index with that name)
    #[error("Not found: {0}")]
    NotFound(String),

    /// A single content record failed during ingestion
    #[error("Ingestion failed at record '{record_id}': {source}")]
    Ingestion {
        record_id: String,
        #[source]
        source: Box<Error>,
    },

    /// A remote call exceeded its time budget
    #[error("Timed out after {seconds}s: {operation}")]
    Timeout { operation: String, seconds: u64 },

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "configuration_error",
            Error::Embedding(_) => "embedding_error",
            Error::IntentParse(_) => "intent_parse_error",
            Error::Search(_) => "search_error",
            Error::Generation(_) => "generation_error",
            Error::NotFound(_) => "not_found",
            Error::Ingestion { .. } => "ingestion_error",
            Error::Timeout { .. } => "timeout",
            Error::Request(_) => "request_error",
            Error::Serialization(_) => "serialization_error",
            Error::InvalidInput(_) => "invalid_input",
            Error::Io(_) => "io_error",
        }
    }

    /// Whether retrying the same call may succeed.
    ///
    /// Only transport-level failures and timeouts qualify. Backend clients
    /// mark throttling and 5xx responses by producing `Request` errors.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Timeout { .. } | Error::Request(_))
    }

    /// Re-label transport failures with the kind of the failing stage.
    ///
    /// Transient `Request` errors are kept distinct so the retry layer can
    /// see them; once retries are exhausted the caller reports them as the
    /// stage's own kind, e.g. `err.reclassify(Error::Embedding)`.
    pub fn reclassify(self, wrap: fn(String) -> Error) -> Error {
        match self {
            Error::Request(msg) | Error::Serialization(msg) => wrap(msg),
            other => other,
        }
    }

    /// Wrap an error with the id of the record being ingested.
    pub fn for_record(self, record_id: impl Into<String>) -> Self {
        Error::Ingestion {
            record_id: record_id.into(),
            source: Box::new(self),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("unknown embedding model 'foo'".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: unknown embedding model 'foo'"
        );
    }

    #[test]
    fn test_error_display_intent_parse() {
        let err = Error::IntentParse("missing search_query".to_string());
        assert_eq!(err.to_string(), "Intent parse error: missing search_query");
    }

    #[test]
    fn test_error_display_ingestion_names_record() {
        let err = Error::Embedding("service unavailable".to_string()).for_record("42");
        let msg = err.to_string();
        assert!(msg.contains("'42'"));
        assert!(msg.contains("Embedding error: service unavailable"));
        assert_eq!(err.kind(), "ingestion_error");
    }

    #[test]
    fn test_error_display_timeout() {
        let err = Error::Timeout {
            operation: "embed".to_string(),
            seconds: 30,
        };
        assert_eq!(err.to_string(), "Timed out after 30s: embed");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(Error::Request("connection reset".to_string()).is_retryable());
        assert!(Error::Timeout {
            operation: "search".to_string(),
            seconds: 1
        }
        .is_retryable());
        assert!(!Error::Search("bad request".to_string()).is_retryable());
        assert!(!Error::Generation("boom".to_string()).is_retryable());
        assert!(!Error::IntentParse("nope".to_string()).is_retryable());
    }

    #[test]
    fn test_reclassify_transport_errors() {
        let err = Error::Request("connection refused".to_string()).reclassify(Error::Embedding);
        assert!(matches!(err, Error::Embedding(ref m) if m == "connection refused"));

        let timeout = Error::Timeout {
            operation: "search".to_string(),
            seconds: 2,
        }
        .reclassify(Error::Search);
        assert!(matches!(timeout, Error::Timeout { .. }));

        let config = Error::Config("x".to_string()).reclassify(Error::Search);
        assert!(matches!(config, Error::Config(_)));
    }

    #[test]
    fn test_kinds_are_distinct_for_query_failures() {
        let kinds = [
            Error::IntentParse(String::new()).kind(),
            Error::Generation(String::new()).kind(),
            Error::Search(String::new()).kind(),
            Error::Embedding(String::new()).kind(),
        ];
        for (i, a) in kinds.iter().enumerate() {
            for b in kinds.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("I/O error:"));
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
