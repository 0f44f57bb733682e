//! Embedding value type.

use serde::{Deserialize, Serialize};

/// A fixed-length embedding vector, unit-normalized on construction so the
/// dot product of two embeddings is their cosine similarity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    values: Vec<f32>,
}

impl Embedding {
    /// Create an embedding, normalizing to unit length. A zero vector is
    /// kept as-is (its similarity to anything is 0).
    pub fn new(values: Vec<f32>) -> Self {
        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            Self {
                values: values.into_iter().map(|v| v / norm).collect(),
            }
        } else {
            Self { values }
        }
    }

    /// Wrap a vector that is already unit-normalized.
    pub fn from_normalized(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Number of vector components.
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// The raw components.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Cosine similarity in [-1, 1]. Mismatched dimensions score 0.
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        if self.values.len() != other.values.len() {
            return 0.0;
        }
        self.values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| a * b)
            .sum()
    }
}
