//! Centralized default constants for ragline.
//!
//! Single source of truth for shared default values. Crates reference these
//! constants instead of defining their own magic numbers.

// =============================================================================
// RETRIEVAL
// =============================================================================

/// Number of documents retrieved per query when no override is given.
pub const TOP: usize = 3;

/// Fields projected out of the index for every retrieved document.
pub const SELECT_FIELDS: &[&str] = &["id", "content", "filepath", "title", "url"];

/// Title of the diagnostic thought recorded for each resolved search query.
pub const SEARCH_QUERY_THOUGHT: &str = "Generated search query";

// =============================================================================
// INDEX SCHEMA
// =============================================================================

/// Name of the vector field holding content embeddings.
pub const VECTOR_FIELD: &str = "contentVector";

/// Name of the semantic ranking configuration.
pub const SEMANTIC_CONFIG: &str = "default";

/// HNSW algorithm configuration name.
pub const HNSW_ALGORITHM: &str = "myHnsw";

/// Exhaustive KNN algorithm configuration name.
pub const EXHAUSTIVE_ALGORITHM: &str = "myExhaustiveKnn";

/// Vector search profile bound to the HNSW algorithm.
pub const HNSW_PROFILE: &str = "myHnswProfile";

/// Vector search profile bound to the exhaustive KNN algorithm.
pub const EXHAUSTIVE_PROFILE: &str = "myExhaustiveKnnProfile";

/// HNSW graph degree.
pub const HNSW_M: u32 = 4;

/// HNSW candidate list size at build time.
pub const HNSW_EF_CONSTRUCTION: u32 = 1000;

/// HNSW candidate list size at query time.
pub const HNSW_EF_SEARCH: u32 = 1000;

/// Prefix of the derived document URL.
pub const URL_PREFIX: &str = "/data/";

// =============================================================================
// MODELS
// =============================================================================

/// Default embedding model.
pub const EMBED_MODEL: &str = "text-embedding-ada-002";

/// Default generation model for both intent mapping and grounded chat.
pub const GEN_MODEL: &str = "gpt-4o-mini";

// =============================================================================
// REMOTE CALLS
// =============================================================================

/// Per-call timeout for every remote operation.
pub const TIMEOUT_SECS: u64 = 60;

/// Retries on top of the first attempt for embedding and search calls.
pub const MAX_RETRIES: u32 = 2;

/// Base delay for exponential retry backoff.
pub const RETRY_BASE_DELAY_MS: u64 = 250;

// =============================================================================
// INGESTION
// =============================================================================

/// Concurrent embedding calls during bulk ingestion.
pub const INGEST_CONCURRENCY: usize = 4;

/// Source column embedded and stored as document content.
pub const CONTENT_COLUMN: &str = "content";

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server host.
pub const SERVER_HOST: &str = "localhost";

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 5000;

// =============================================================================
// SEARCH BACKEND
// =============================================================================

/// REST API version spoken by the Azure-compatible search backend.
pub const SEARCH_API_VERSION: &str = "2024-07-01";

/// Reciprocal rank fusion constant used by the in-memory hybrid backend.
pub const RRF_K: f32 = 60.0;
