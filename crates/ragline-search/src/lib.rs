//! # ragline-search
//!
//! Ingestion-time half of the ragline pipeline and the search backends.
//!
//! This crate provides:
//! - Index schema builder (fields, semantic ranking, HNSW and exhaustive KNN profiles)
//! - Content loader for CSV, JSON Lines and JSON sources
//! - Document ingestor with bounded-concurrency embedding
//! - Index manager performing full destructive rebuilds
//! - Azure AI Search REST backend
//! - In-memory hybrid backend with Reciprocal Rank Fusion (RRF)
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ragline_search::{DocumentIngestor, IndexManager, InMemorySearchBackend};
//!
//! let ingestor = DocumentIngestor::new(embedder, EmbeddingModel::Ada002);
//! let manager = IndexManager::new(Arc::new(InMemorySearchBackend::new()), ingestor);
//! let report = manager.create_index("data/products.csv", "contoso-products").await?;
//! println!("indexed {} documents", report.document_count);
//! ```

pub mod azure;
pub mod index_manager;
pub mod ingest;
pub mod loader;
pub mod memory;
pub mod rrf;
pub mod schema;

// Re-export core types
pub use ragline_core::*;

pub use azure::{AzureSearchBackend, AzureSearchConfig};
pub use index_manager::{IndexManager, IndexReport};
pub use ingest::DocumentIngestor;
pub use loader::{load_records, SourceFormat};
pub use memory::InMemorySearchBackend;
pub use rrf::{rrf_fuse, rrf_fuse_with_k};
pub use schema::{build_index_definition, index_definition_for, HnswSettings};
