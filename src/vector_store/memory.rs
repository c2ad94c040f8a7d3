//! Exact nearest-neighbour index held in memory.

use super::DistanceMetric;
use crate::chunking::Chunk;
use crate::error::{Result, TubeqaError};

/// A chunk together with its embedding.
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// A search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub chunk: Chunk,
    /// Distance to the query under the index metric. Smaller is closer.
    pub distance: f32,
}

/// Flat vector index over the chunks of one transcript.
///
/// All vectors share one dimension and were produced by the embedding model
/// recorded in `model_id`.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    entries: Vec<IndexedChunk>,
    model_id: String,
    metric: DistanceMetric,
    dimension: usize,
}

impl VectorIndex {
    /// Build an index from chunks and their embeddings, paired by position.
    pub fn new(
        chunks: Vec<Chunk>,
        embeddings: Vec<Vec<f32>>,
        model_id: impl Into<String>,
        metric: DistanceMetric,
    ) -> Result<Self> {
        if chunks.is_empty() {
            return Err(TubeqaError::EmptyIndex);
        }

        if chunks.len() != embeddings.len() {
            return Err(TubeqaError::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let dimension = embeddings.first().map(Vec::len).unwrap_or(0);
        if dimension == 0 {
            return Err(TubeqaError::Embedding(
                "Embedding service returned empty vectors".to_string(),
            ));
        }

        if let Some(position) = embeddings.iter().position(|e| e.len() != dimension) {
            return Err(TubeqaError::Embedding(format!(
                "Embedding {} has dimension {}, expected {}",
                position,
                embeddings[position].len(),
                dimension
            )));
        }

        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexedChunk { chunk, embedding })
            .collect();

        Ok(Self {
            entries,
            model_id: model_id.into(),
            metric,
            dimension,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Embedding model the vectors came from.
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn entries(&self) -> &[IndexedChunk] {
        &self.entries
    }

    /// Return the `k` nearest chunks, nearest first.
    ///
    /// `k` is clamped to the index size. Equal distances keep chunk order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimension {
            return Err(TubeqaError::Embedding(format!(
                "Query has dimension {}, index has {}",
                query.len(),
                self.dimension
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, self.metric.distance(query, &entry.embedding)))
            .collect();

        // Stable sort; entries are stored in chunk order
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k.min(self.entries.len()));

        Ok(scored
            .into_iter()
            .map(|(i, distance)| Neighbor {
                chunk: self.entries[i].chunk.clone(),
                distance,
            })
            .collect())
    }
}
