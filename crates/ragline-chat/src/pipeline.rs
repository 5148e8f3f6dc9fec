//! The exposed chat operation: retrieve, then answer.

use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use ragline_core::{
    ChatMessage, ChatResponse, Error, Overrides, PipelineObserver, Result, RetrievalContext,
};

use crate::bootstrap::Backends;
use crate::config::RagConfig;
use crate::intent::IntentResolver;
use crate::prompts::{PromptStore, GROUNDED_CHAT, INTENT_MAPPING};
use crate::responder::GroundedResponder;
use crate::retrieval::RetrievalOrchestrator;

/// Retrieval followed by grounded generation.
///
/// Holds no per-query state. Each call to [`ChatPipeline::send_chat`]
/// owns its own [`RetrievalContext`], so one pipeline serves concurrent
/// queries.
pub struct ChatPipeline {
    retrieval: RetrievalOrchestrator,
    responder: GroundedResponder,
    default_top: Option<usize>,
}

impl ChatPipeline {
    pub fn new(retrieval: RetrievalOrchestrator, responder: GroundedResponder) -> Self {
        Self {
            retrieval,
            responder,
            default_top: None,
        }
    }

    /// Document count used when the caller gives no `top` override.
    pub fn with_default_top(mut self, top: usize) -> Self {
        self.default_top = Some(top);
        self
    }

    /// Wire a pipeline from configuration and already-built backends.
    pub fn from_config(
        config: &RagConfig,
        backends: &Backends,
        observer: Option<Arc<dyn PipelineObserver>>,
    ) -> Result<Self> {
        let store = PromptStore::new(config.retrieval.prompt_dir.clone());
        let policy = config.call_policy();

        let mut resolver =
            IntentResolver::new(backends.intent_generator.clone(), store.load(INTENT_MAPPING)?)
                .with_policy(policy);
        let mut responder =
            GroundedResponder::new(backends.chat_generator.clone(), store.load(GROUNDED_CHAT)?)
                .with_policy(policy);
        if let Some(observer) = &observer {
            resolver = resolver.with_observer(observer.clone());
            responder = responder.with_observer(observer.clone());
        }

        let mut retrieval = RetrievalOrchestrator::new(
            resolver,
            backends.embedder.clone(),
            backends.search.clone(),
            &config.search.index_name,
        )
        .with_policy(policy);
        if let Some(observer) = observer {
            retrieval = retrieval.with_observer(observer);
        }

        Ok(Self::new(retrieval, responder).with_default_top(config.retrieval.top))
    }

    pub fn index_name(&self) -> &str {
        self.retrieval.index_name()
    }

    /// Answer the last turn of `messages` from retrieved documents.
    pub async fn send_chat(
        &self,
        messages: &[ChatMessage],
        overrides: Overrides,
    ) -> Result<ChatResponse> {
        if messages.is_empty() {
            return Err(Error::InvalidInput(
                "conversation must contain at least one message".to_string(),
            ));
        }

        let start = Instant::now();
        let overrides = Overrides {
            top: overrides.top.or(self.default_top),
        };
        let mut context = RetrievalContext::new(overrides);

        let documents = self.retrieval.get_documents(messages, &mut context).await?;
        let response = self.responder.respond(messages, &documents, context).await?;

        info!(
            subsystem = "chat",
            component = "pipeline",
            op = "send_chat",
            index_name = %self.index_name(),
            message_count = messages.len(),
            result_count = documents.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Chat completed"
        );
        Ok(response)
    }
}
