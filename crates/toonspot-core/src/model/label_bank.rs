//! Pre-computed label embeddings.
//!
//! The label list is static for the process lifetime, so its text embeddings
//! are computed once at startup and reused for every image.

use super::text::TextEncoder;
use crate::error::ClassifyError;

/// Text embeddings for a fixed, ordered label list.
///
/// Stores a single flat matrix (N × dim, row-major).
pub struct LabelBank {
    labels: Vec<String>,
    matrix: Vec<f32>,
    embedding_dim: usize,
}

impl LabelBank {
    /// Encode every label in one text encoder call.
    pub fn encode(labels: &[&str], encoder: &TextEncoder) -> Result<Self, ClassifyError> {
        let embeddings = encoder.encode_batch(labels)?;
        let embedding_dim = embeddings.first().map(Vec::len).unwrap_or(0);
        let matrix: Vec<f32> = embeddings.into_iter().flatten().collect();

        tracing::info!(
            "Label bank ready: {} labels x {} dims",
            labels.len(),
            embedding_dim
        );

        Ok(Self {
            labels: labels.iter().map(|l| l.to_string()).collect(),
            matrix,
            embedding_dim,
        })
    }

    /// Create a label bank from a pre-computed matrix (for testing).
    #[cfg(test)]
    pub fn from_raw(labels: &[&str], matrix: Vec<f32>, embedding_dim: usize) -> Self {
        assert_eq!(matrix.len(), labels.len() * embedding_dim);
        Self {
            labels: labels.iter().map(|l| l.to_string()).collect(),
            matrix,
            embedding_dim,
        }
    }

    /// Whether this bank was built for exactly these labels, in this order.
    pub fn covers(&self, labels: &[&str]) -> bool {
        self.labels.len() == labels.len() && self.labels.iter().zip(labels).all(|(a, b)| a == b)
    }

    /// Number of labels in the bank.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the bank holds no labels.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterate over the label embeddings in label order.
    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.matrix.chunks(self.embedding_dim.max(1))
    }
}
