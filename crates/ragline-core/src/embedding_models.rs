//! Known embedding models and their output dimensionality.
//!
//! Index schemas take their vector dimensionality from this table. Unknown
//! model identifiers are rejected instead of falling back to a default
//! dimension, since a mismatched schema makes every similarity score
//! meaningless.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Embedding model identifiers the pipeline can build indexes for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmbeddingModel {
    #[serde(rename = "text-embedding-ada-002")]
    Ada002,
    #[serde(rename = "text-embedding-3-small")]
    TextEmbedding3Small,
    #[serde(rename = "text-embedding-3-large")]
    TextEmbedding3Large,
}

impl EmbeddingModel {
    /// Every known model, in table order.
    pub const ALL: [EmbeddingModel; 3] = [
        EmbeddingModel::Ada002,
        EmbeddingModel::TextEmbedding3Small,
        EmbeddingModel::TextEmbedding3Large,
    ];

    /// Model identifier as sent to the embedding service.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ada002 => "text-embedding-ada-002",
            Self::TextEmbedding3Small => "text-embedding-3-small",
            Self::TextEmbedding3Large => "text-embedding-3-large",
        }
    }

    /// Output vector length.
    pub fn dimensions(&self) -> usize {
        match self {
            Self::Ada002 | Self::TextEmbedding3Small => 1536,
            Self::TextEmbedding3Large => 3072,
        }
    }
}

impl fmt::Display for EmbeddingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmbeddingModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| {
                Error::Config(format!(
                    "unknown embedding model '{}' (known: {})",
                    wanted,
                    Self::ALL
                        .iter()
                        .map(|m| m.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

/// Check that a produced vector matches the model's dimensionality.
pub fn check_dimensions(model: EmbeddingModel, vector: &[f32]) -> Result<()> {
    if vector.len() != model.dimensions() {
        return Err(Error::Embedding(format!(
            "model {} returned {} dimensions, expected {}",
            model,
            vector.len(),
            model.dimensions()
        )));
    }
    Ok(())
}
