//! Intent resolver: conversation in, standalone search query out.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use ragline_core::{
    observe, CallPolicy, ChatMessage, Error, GenerationBackend, PipelineObserver, Result, Stage,
};

use crate::prompts::PromptTemplate;

/// Structured output of intent resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    /// Free-text classification of what the user wants.
    #[serde(default)]
    pub intent: String,
    /// Standalone query used verbatim for lexical and vector search.
    pub search_query: String,
}

impl Intent {
    /// Parse the model's reply.
    ///
    /// The reply must be a JSON object with a non-blank string
    /// `search_query`. There is no fallback to the raw conversation.
    pub fn parse(raw: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(raw.trim()).map_err(|e| {
            Error::IntentParse(format!("intent mapping output is not valid JSON: {}", e))
        })?;

        match value.get("search_query") {
            Some(serde_json::Value::String(q)) if !q.trim().is_empty() => {}
            Some(serde_json::Value::String(_)) => {
                return Err(Error::IntentParse("search_query is empty".to_string()))
            }
            Some(_) => {
                return Err(Error::IntentParse(
                    "search_query is not a string".to_string(),
                ))
            }
            None => {
                return Err(Error::IntentParse(
                    "intent mapping output has no search_query".to_string(),
                ))
            }
        }

        serde_json::from_value(value)
            .map_err(|e| Error::IntentParse(format!("unexpected intent shape: {}", e)))
    }
}

/// Maps a conversation to an [`Intent`] with one chat completion.
pub struct IntentResolver {
    generator: Arc<dyn GenerationBackend>,
    template: PromptTemplate,
    policy: CallPolicy,
    observer: Option<Arc<dyn PipelineObserver>>,
}

impl IntentResolver {
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

    pub async fn resolve(&self, messages: &[ChatMessage]) -> Result<Intent> {
        observe(self.observer.as_ref(), Stage::ResolveIntent, self.resolve_inner(messages)).await
    }

    async fn resolve_inner(&self, messages: &[ChatMessage]) -> Result<Intent> {
        let prompt = self.template.render(&json!({ "conversation": messages }))?;

        // Generation is never retried.
        let raw = self
            .policy
            .once(
                "resolve_intent",
                self.generator.complete(&prompt, &self.template.params),
            )
            .await
            .map_err(|e| e.reclassify(Error::Generation))?;

        let intent = Intent::parse(&raw)?;
        debug!(
            subsystem = "chat",
            component = "intent_resolver",
            model = self.generator.model_name(),
            intent = %intent.intent,
            query = %intent.search_query,
            "Resolved intent"
        );
        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::{PromptStore, INTENT_MAPPING};
    use ragline_core::Role;
    use ragline_inference::mock::MockGenerationBackend;

    fn resolver(backend: MockGenerationBackend) -> IntentResolver {
        let template = PromptStore::builtin().load(INTENT_MAPPING).unwrap();
        IntentResolver::new(Arc::new(backend), template)
    }

    #[test]
    fn test_parse_valid() {
        let intent =
            Intent::parse(r#"{"intent": "define hotfix", "search_query": "hotfix definition"}"#)
                .unwrap();
        assert_eq!(intent.intent, "define hotfix");
        assert_eq!(intent.search_query, "hotfix definition");
    }

    #[test]
    fn test_parse_tolerates_surrounding_whitespace_and_extra_keys() {
        let intent =
            Intent::parse("\n  {\"search_query\": \"tents\", \"confidence\": 0.9}  \n").unwrap();
        assert_eq!(intent.search_query, "tents");
        assert_eq!(intent.intent, "");
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        let err = Intent::parse("Sure! The user wants tents.").unwrap_err();
        assert!(matches!(err, Error::IntentParse(_)));
    }

    #[test]
    fn test_parse_rejects_missing_or_blank_query() {
        for raw in [
            r#"{"intent": "greeting"}"#,
            r#"{"intent": "x", "search_query": "   "}"#,
            r#"{"intent": "x", "search_query": 42}"#,
            r#"["search_query"]"#,
        ] {
            let err = Intent::parse(raw).unwrap_err();
            assert!(matches!(err, Error::IntentParse(_)), "accepted {}", raw);
        }
    }

    #[tokio::test]
    async fn test_resolve_sends_rendered_prompt_in_json_mode() {
        let backend = MockGenerationBackend::new("intent-model")
            .with_fixed_response(r#"{"intent": "buy tent", "search_query": "tent sleeps four"}"#);
        let intent = resolver(backend.clone())
            .resolve(&[ChatMessage::user("I need a tent for four people")])
            .await
            .unwrap();
        assert_eq!(intent.search_query, "tent sleeps four");

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].params.json_response);
        assert_eq!(calls[0].messages[0].role, Role::System);
        assert!(calls[0].messages[1]
            .content
            .contains("user: I need a tent for four people"));
    }

    #[tokio::test]
    async fn test_generation_failure_is_not_retried() {
        let backend = MockGenerationBackend::new("intent-model").failing("overloaded");
        let err = resolver(backend.clone())
            .resolve(&[ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Generation(_)));
        assert_eq!(backend.call_count(), 1);
    }
}
