//! Search index definition: fields, semantic ranking and vector search.
//!
//! The types serialise to the index JSON accepted by Azure AI Search
//! compatible services, so a definition can be sent to a backend as-is.

use serde::{Deserialize, Serialize};

/// Data type of an index field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    #[serde(rename = "Edm.String")]
    String,
    #[serde(rename = "Collection(Edm.Single)")]
    SingleCollection,
}

/// A single field of the index schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub key: bool,
    #[serde(default)]
    pub searchable: bool,
    #[serde(default)]
    pub filterable: bool,
    #[serde(default = "default_true")]
    pub retrievable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_search_profile: Option<String>,
}

fn default_true() -> bool {
    true
}

impl SearchField {
    /// Non-searchable string field; `key` marks the natural key.
    pub fn simple(name: impl Into<String>, key: bool) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::String,
            key,
            searchable: false,
            filterable: key,
            retrievable: true,
            dimensions: None,
            vector_search_profile: None,
        }
    }

    /// Full-text searchable string field.
    pub fn searchable(name: impl Into<String>) -> Self {
        Self {
            searchable: true,
            filterable: false,
            ..Self::simple(name, false)
        }
    }

    /// Vector field bound to a vector search profile.
    pub fn vector(name: impl Into<String>, dimensions: usize, profile: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::SingleCollection,
            key: false,
            searchable: true,
            filterable: false,
            retrievable: true,
            dimensions: Some(dimensions),
            vector_search_profile: Some(profile.into()),
        }
    }

    pub fn is_vector(&self) -> bool {
        self.field_type == FieldType::SingleCollection
    }
}

/// Reference to a field inside a semantic configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticField {
    pub field_name: String,
}

/// Which fields semantic ranking treats as title, content and keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizedFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_field: Option<SemanticField>,
    #[serde(default)]
    pub prioritized_content_fields: Vec<SemanticField>,
    #[serde(default)]
    pub prioritized_keywords_fields: Vec<SemanticField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticConfiguration {
    pub name: String,
    pub prioritized_fields: PrioritizedFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticSearch {
    pub configurations: Vec<SemanticConfiguration>,
}

/// Similarity metric for vector comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VectorMetric {
    Cosine,
    Euclidean,
    DotProduct,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HnswParameters {
    pub m: u32,
    pub ef_construction: u32,
    pub ef_search: u32,
    pub metric: VectorMetric,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExhaustiveKnnParameters {
    pub metric: VectorMetric,
}

/// A named vector search algorithm configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum VectorSearchAlgorithm {
    /// Graph-based approximate nearest neighbour search.
    #[serde(rename = "hnsw")]
    Hnsw {
        name: String,
        #[serde(rename = "hnswParameters")]
        parameters: HnswParameters,
    },
    /// Brute-force exact nearest neighbour search.
    #[serde(rename = "exhaustiveKnn")]
    ExhaustiveKnn {
        name: String,
        #[serde(rename = "exhaustiveKnnParameters")]
        parameters: ExhaustiveKnnParameters,
    },
}

impl VectorSearchAlgorithm {
    pub fn name(&self) -> &str {
        match self {
            Self::Hnsw { name, .. } | Self::ExhaustiveKnn { name, .. } => name,
        }
    }

    pub fn metric(&self) -> VectorMetric {
        match self {
            Self::Hnsw { parameters, .. } => parameters.metric,
            Self::ExhaustiveKnn { parameters, .. } => parameters.metric,
        }
    }
}

/// Named binding of an algorithm that fields refer to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorSearchProfile {
    pub name: String,
    pub algorithm: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorSearch {
    pub algorithms: Vec<VectorSearchAlgorithm>,
    pub profiles: Vec<VectorSearchProfile>,
}

impl VectorSearch {
    pub fn profile(&self, name: &str) -> Option<&VectorSearchProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    pub fn algorithm(&self, name: &str) -> Option<&VectorSearchAlgorithm> {
        self.algorithms.iter().find(|a| a.name() == name)
    }
}

/// Complete index schema plus search configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDefinition {
    pub name: String,
    pub fields: Vec<SearchField>,
    #[serde(rename = "semantic")]
    pub semantic_search: SemanticSearch,
    pub vector_search: VectorSearch,
}

impl IndexDefinition {
    pub fn field(&self, name: &str) -> Option<&SearchField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The single field marked as key.
    pub fn key_field(&self) -> Option<&SearchField> {
        self.fields.iter().find(|f| f.key)
    }

    pub fn vector_fields(&self) -> impl Iterator<Item = &SearchField> {
        self.fields.iter().filter(|f| f.is_vector())
    }

    /// Dimensionality of the named vector field.
    pub fn vector_dimensions(&self, field: &str) -> Option<usize> {
        self.field(field).and_then(|f| f.dimensions)
    }

    /// Algorithm serving the named vector field via its profile.
    pub fn algorithm_for(&self, field: &str) -> Option<&VectorSearchAlgorithm> {
        let profile = self.field(field)?.vector_search_profile.as_deref()?;
        let profile = self.vector_search.profile(profile)?;
        self.vector_search.algorithm(&profile.algorithm)
    }
}
