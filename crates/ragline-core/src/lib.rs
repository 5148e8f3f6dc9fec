//! # ragline-core
//!
//! Core types, traits, and abstractions for the ragline retrieval pipeline.
//!
//! This crate provides the data model shared by ingestion and query time,
//! the error type, the traits implemented by embedding, generation and
//! search backends, and the observer and call-policy plumbing used by every
//! component.

pub mod defaults;
pub mod embedding_models;
pub mod error;
pub mod index;
pub mod logging;
pub mod models;
pub mod observer;
pub mod retry;
pub mod traits;

// Re-export commonly used types at crate root
pub use embedding_models::{check_dimensions, EmbeddingModel};
pub use error::{Error, Result};
pub use index::*;
pub use models::*;
pub use observer::{
    observe, NoopObserver, PipelineObserver, RecordingObserver, Stage, StageEvent, StageOutcome,
    TracingObserver,
};
pub use retry::CallPolicy;
pub use traits::*;
