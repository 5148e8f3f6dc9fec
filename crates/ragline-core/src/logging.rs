//! Structured logging schema and field name constants for ragline.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation can query the same names across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, retry or fallback applied |
//! | INFO  | Lifecycle events (startup, index rebuilds), query completions |
//! | DEBUG | Decision points, resolved intents, config choices |
//! | TRACE | Per-item iteration (retrieved documents, embedded records) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID for one chat request. Format: UUIDv7.
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "search", "inference", "chat"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "intent_resolver", "retrieval", "index_manager", "openai"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "embed", "search", "complete", "create_index"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Search index name.
pub const INDEX_NAME: &str = "index_name";

/// Content record id during ingestion.
pub const RECORD_ID: &str = "record_id";

/// Resolved search query text.
pub const QUERY: &str = "query";

/// Pipeline stage name reported to observers.
pub const STAGE: &str = "stage";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of documents returned by a search.
pub const RESULT_COUNT: &str = "result_count";

/// Number of documents uploaded or ingested.
pub const DOCUMENT_COUNT: &str = "document_count";

/// Number of messages sent to a chat completion.
pub const MESSAGE_COUNT: &str = "message_count";

/// Requested number of documents.
pub const TOP: &str = "top";

/// Retry attempt number (1-based).
pub const ATTEMPT: &str = "attempt";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for inference.
pub const MODEL: &str = "model";

/// Vector dimensionality.
pub const DIMENSIONS: &str = "dimensions";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
