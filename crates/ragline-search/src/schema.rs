//! Index schema builder.
//!
//! Produces the full index definition for a given index name and embedding
//! model: document fields, semantic ranking configuration, and two vector
//! search profiles (HNSW and exhaustive KNN) bound to the content vector.

use tracing::debug;

use ragline_core::{
    defaults, EmbeddingModel, Error, ExhaustiveKnnParameters, HnswParameters, IndexDefinition,
    PrioritizedFields, Result, SearchField, SemanticConfiguration, SemanticField, SemanticSearch,
    VectorMetric, VectorSearch, VectorSearchAlgorithm, VectorSearchProfile,
};

/// HNSW parameters used for the approximate profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HnswSettings {
    pub m: u32,
    pub ef_construction: u32,
    pub ef_search: u32,
}

impl Default for HnswSettings {
    fn default() -> Self {
        Self {
            m: defaults::HNSW_M,
            ef_construction: defaults::HNSW_EF_CONSTRUCTION,
            ef_search: defaults::HNSW_EF_SEARCH,
        }
    }
}

/// Build the index definition from a model identifier.
///
/// Unknown models fail with [`Error::Config`]; there is no fallback
/// dimensionality.
pub fn build_index_definition(index_name: &str, model: &str) -> Result<IndexDefinition> {
    let model: EmbeddingModel = model.parse()?;
    index_definition_for(index_name, model, HnswSettings::default())
}

/// Build the index definition for an already-resolved model.
pub fn index_definition_for(
    index_name: &str,
    model: EmbeddingModel,
    hnsw: HnswSettings,
) -> Result<IndexDefinition> {
    let index_name = index_name.trim();
    if index_name.is_empty() {
        return Err(Error::Config("index name must not be empty".to_string()));
    }

    let dimensions = model.dimensions();
    debug!(
        index_name,
        model = model.as_str(),
        dimensions,
        "Building index definition"
    );

    let fields = vec![
        SearchField::simple("id", true),
        SearchField::searchable("content"),
        SearchField::simple("filepath", false),
        SearchField::searchable("title"),
        SearchField::simple("url", false),
        SearchField::vector(defaults::VECTOR_FIELD, dimensions, defaults::HNSW_PROFILE),
    ];

    let semantic_search = SemanticSearch {
        configurations: vec![SemanticConfiguration {
            name: defaults::SEMANTIC_CONFIG.to_string(),
            prioritized_fields: PrioritizedFields {
                title_field: Some(SemanticField {
                    field_name: "title".to_string(),
                }),
                prioritized_content_fields: vec![SemanticField {
                    field_name: "content".to_string(),
                }],
                prioritized_keywords_fields: Vec::new(),
            },
        }],
    };

    let vector_search = VectorSearch {
        algorithms: vec![
            VectorSearchAlgorithm::Hnsw {
                name: defaults::HNSW_ALGORITHM.to_string(),
                parameters: HnswParameters {
                    m: hnsw.m,
                    ef_construction: hnsw.ef_construction,
                    ef_search: hnsw.ef_search,
                    metric: VectorMetric::Cosine,
                },
            },
            VectorSearchAlgorithm::ExhaustiveKnn {
                name: defaults::EXHAUSTIVE_ALGORITHM.to_string(),
                parameters: ExhaustiveKnnParameters {
                    metric: VectorMetric::Cosine,
                },
            },
        ],
        profiles: vec![
            VectorSearchProfile {
                name: defaults::HNSW_PROFILE.to_string(),
                algorithm: defaults::HNSW_ALGORITHM.to_string(),
            },
            VectorSearchProfile {
                name: defaults::EXHAUSTIVE_PROFILE.to_string(),
                algorithm: defaults::EXHAUSTIVE_ALGORITHM.to_string(),
            },
        ],
    };

    Ok(IndexDefinition {
        name: index_name.to_string(),
        fields,
        semantic_search,
        vector_search,
    })
}
