//! Data model shared by ingestion and query time.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};

// =============================================================================
// CONTENT & DOCUMENTS
// =============================================================================

/// One row of source content as produced by the content loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    /// Natural key, unique within a source.
    pub id: String,
    /// Title of the record (the `name` column).
    pub name: String,
    /// Every other column, addressable by the content column selector.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl ContentRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style helper to attach a column value.
    pub fn with_field(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(column.into(), value.into());
        self
    }

    /// Value of the given column; `id` and `name` resolve to the key fields.
    pub fn field(&self, column: &str) -> Result<&str> {
        match column {
            "id" => Ok(&self.id),
            "name" => Ok(&self.name),
            _ => self.fields.get(column).map(String::as_str).ok_or_else(|| {
                Error::Config(format!(
                    "content column '{}' not present on record '{}'",
                    column, self.id
                ))
            }),
        }
    }

    /// Deterministic slug of the title. Colliding titles produce colliding slugs.
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }

    pub fn filepath(&self) -> String {
        self.slug()
    }

    pub fn url(&self) -> String {
        format!("{}{}", defaults::URL_PREFIX, self.slug())
    }
}

/// Lower-case the title and replace spaces with hyphens.
pub fn slugify(title: &str) -> String {
    title.to_lowercase().replace(' ', "-")
}

/// Persisted unit in the search backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub id: String,
    pub content: String,
    pub filepath: String,
    pub title: String,
    pub url: String,
    #[serde(rename = "contentVector")]
    pub content_vector: Vec<f32>,
}

impl IndexedDocument {
    /// Build the index-ready document for a record and its embedding.
    pub fn from_record(record: &ContentRecord, content: &str, vector: Vec<f32>) -> Self {
        Self {
            id: record.id.clone(),
            content: content.to_string(),
            filepath: record.filepath(),
            title: record.name.clone(),
            url: record.url(),
            content_vector: vector,
        }
    }

    /// Caller-facing projection. The vector stays index-internal.
    pub fn to_retrieved(&self) -> RetrievedDocument {
        RetrievedDocument {
            id: self.id.clone(),
            content: self.content.clone(),
            filepath: self.filepath.clone(),
            title: self.title.clone(),
            url: self.url.clone(),
        }
    }
}

/// Document returned to callers of the retrieval pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub id: String,
    pub content: String,
    pub filepath: String,
    pub title: String,
    pub url: String,
}

/// Ranked hit as returned by a search backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub document: RetrievedDocument,
    /// Backend relevance score, informational only.
    #[serde(default)]
    pub score: Option<f64>,
}

// =============================================================================
// SEARCH QUERIES
// =============================================================================

/// K-nearest-neighbour leg of a hybrid query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorQuery {
    pub vector: Vec<f32>,
    /// Number of nearest neighbours to retrieve.
    pub k: usize,
    /// Vector field to search.
    pub field: String,
}

/// Lexical text plus optional vector query, executed as one ranked search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HybridQuery {
    pub search_text: String,
    pub vector: Option<VectorQuery>,
    /// Maximum number of hits to return.
    pub top: usize,
    /// Fields to project; never includes the vector field.
    pub select: Vec<String>,
}

impl HybridQuery {
    /// Hybrid query over the default vector field with `k = top`.
    pub fn new(search_text: impl Into<String>, vector: Vec<f32>, top: usize) -> Self {
        Self {
            search_text: search_text.into(),
            vector: Some(VectorQuery {
                vector,
                k: top,
                field: defaults::VECTOR_FIELD.to_string(),
            }),
            top,
            select: defaults::SELECT_FIELDS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Text-only query.
    pub fn text(search_text: impl Into<String>, top: usize) -> Self {
        Self {
            search_text: search_text.into(),
            vector: None,
            top,
            select: defaults::SELECT_FIELDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

// =============================================================================
// CONVERSATION
// =============================================================================

/// Chat message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(Error::InvalidInput(format!("unknown message role '{}'", other))),
        }
    }
}

/// A single role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Model invocation parameters carried by a prompt template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Ask the model for a JSON object response.
    #[serde(default)]
    pub json_response: bool,
}

// =============================================================================
// RETRIEVAL CONTEXT
// =============================================================================

/// Caller-supplied retrieval options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<usize>,
}

impl Overrides {
    pub fn with_top(top: usize) -> Self {
        Self { top: Some(top) }
    }

    /// Effective number of documents to retrieve.
    pub fn top(&self) -> usize {
        self.top.unwrap_or(defaults::TOP)
    }
}

/// Diagnostic record describing one retrieval decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thought {
    pub title: String,
    pub description: String,
}

/// Accumulator threaded through a single query.
///
/// Owned by exactly one in-flight query. `thoughts` and `grounding_data`
/// are append-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalContext {
    #[serde(default)]
    pub overrides: Overrides,
    #[serde(default)]
    thoughts: Vec<Thought>,
    #[serde(default)]
    grounding_data: Vec<Vec<RetrievedDocument>>,
}

impl RetrievalContext {
    pub fn new(overrides: Overrides) -> Self {
        Self {
            overrides,
            ..Default::default()
        }
    }

    pub fn thoughts(&self) -> &[Thought] {
        &self.thoughts
    }

    pub fn grounding_data(&self) -> &[Vec<RetrievedDocument>] {
        &self.grounding_data
    }

    pub fn add_thought(&mut self, title: impl Into<String>, description: impl Into<String>) {
        self.thoughts.push(Thought {
            title: title.into(),
            description: description.into(),
        });
    }

    pub fn add_grounding(&mut self, documents: Vec<RetrievedDocument>) {
        self.grounding_data.push(documents);
    }
}

/// Result of the exposed chat operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: ChatMessage,
    pub context: RetrievalContext,
}
