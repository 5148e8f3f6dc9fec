//! # ragline-chat
//!
//! Query-time orchestration for ragline.
//!
//! This crate provides:
//! - Prompty-style prompt templates with file overrides
//! - Intent resolution (conversation to standalone search query)
//! - Retrieval orchestration over a hybrid search backend
//! - Grounded answer generation
//! - Layered configuration and backend bootstrap
//!
//! ## Example
//!
//! ```ignore
//! use ragline_chat::{Backends, ChatPipeline, ChatMessage, Overrides, RagConfig};
//!
//! let config = RagConfig::load(None)?;
//! let backends = Backends::from_config(&config)?;
//! let pipeline = ChatPipeline::from_config(&config, &backends, None)?;
//!
//! let response = pipeline
//!     .send_chat(&[ChatMessage::user("What is a hotfix?")], Overrides::with_top(1))
//!     .await?;
//! println!("{}", response.message.content);
//! ```

pub mod bootstrap;
pub mod config;
pub mod intent;
pub mod pipeline;
pub mod prompts;
pub mod responder;
pub mod retrieval;

// Re-export core types
pub use ragline_core::*;

pub use bootstrap::{index_configured_source, index_manager, Backends};
pub use config::{
    AuthStyle, IngestionSettings, InferenceSettings, RagConfig, RetrievalSettings,
    SearchBackendKind, SearchSettings, ServerSettings,
};
pub use intent::{Intent, IntentResolver};
pub use pipeline::ChatPipeline;
pub use prompts::{PromptStore, PromptTemplate, GROUNDED_CHAT, INTENT_MAPPING};
pub use responder::GroundedResponder;
pub use retrieval::RetrievalOrchestrator;
