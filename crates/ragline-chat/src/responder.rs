//! Grounded responder: answers from retrieved documents.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use ragline_core::{
    observe, CallPolicy, ChatMessage, ChatResponse, Error, GenerationBackend, PipelineObserver,
    Result, RetrievalContext, RetrievedDocument, Stage,
};

use crate::prompts::PromptTemplate;

/// Produces the final answer with a single chat completion.
pub struct GroundedResponder {
    generator: Arc<dyn GenerationBackend>,
    template: PromptTemplate,
    policy: CallPolicy,
    observer: Option<Arc<dyn PipelineObserver>>,
}

impl GroundedResponder {
    pub fn new(generator: Arc<dyn GenerationBackend>, template: PromptTemplate) -> Self {
        Self {
            generator,
            template,
            policy: CallPolicy::default(),
            observer: None,
        }
    }

    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Messages sent to the model: rendered grounding messages, then the
    /// conversation as given.
    pub fn build_messages(
        &self,
        messages: &[ChatMessage],
        documents: &[RetrievedDocument],
        context: &RetrievalContext,
    ) -> Result<Vec<ChatMessage>> {
        let mut prompt = self.template.render(&json!({
            "documents": documents,
            "context": context,
        }))?;
        prompt.extend_from_slice(messages);
        Ok(prompt)
    }

    /// Generate the answer. Failures surface as [`Error::Generation`] (or
    /// [`Error::Timeout`]) and are never retried here.
    pub async fn respond(
        &self,
        messages: &[ChatMessage],
        documents: &[RetrievedDocument],
        context: RetrievalContext,
    ) -> Result<ChatResponse> {
        let prompt = self.build_messages(messages, documents, &context)?;

        let content = observe(self.observer.as_ref(), Stage::Generate, async {
            self.policy
                .once(
                    "generate",
                    self.generator.complete(&prompt, &self.template.params),
                )
                .await
                .map_err(|e| e.reclassify(Error::Generation))
        })
        .await?;

        debug!(
            subsystem = "chat",
            component = "responder",
            model = self.generator.model_name(),
            message_count = prompt.len(),
            grounding_documents = documents.len(),
            response_len = content.len(),
            "Generated grounded answer"
        );

        Ok(ChatResponse {
            message: ChatMessage::assistant(content),
            context,
        })
    }
}
