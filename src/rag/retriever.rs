//! Query-time retrieval against a vector index.

use crate::embedding::Embedder;
use crate::error::{Result, TubeqaError};
use crate::vector_store::{Neighbor, VectorIndex};
use serde::Serialize;
use tracing::{debug, instrument};

/// Nearest chunks for a query, nearest first.
#[derive(Debug, Clone, Default)]
pub struct RetrievalResult {
    pub neighbors: Vec<Neighbor>,
}

impl RetrievalResult {
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Chunk texts in rank order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.neighbors.iter().map(|n| n.chunk.text.as_str())
    }

    pub fn sources(&self) -> Vec<Source> {
        self.neighbors.iter().map(Source::from).collect()
    }
}

/// A retrieved chunk as shown to users.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Source {
    pub order: usize,
    pub text: String,
    pub distance: f32,
}

impl From<&Neighbor> for Source {
    fn from(neighbor: &Neighbor) -> Self {
        Self {
            order: neighbor.chunk.order,
            text: neighbor.chunk.text.clone(),
            distance: neighbor.distance,
        }
    }
}

/// Embed `query` and return the `k` nearest chunks in `index`.
///
/// The embedder must be the model the index was built with.
#[instrument(skip(query, index, embedder), fields(index_size = index.len()))]
pub async fn retrieve(
    query: &str,
    index: &VectorIndex,
    embedder: &dyn Embedder,
    k: usize,
) -> Result<RetrievalResult> {
    if index.is_empty() {
        return Err(TubeqaError::EmptyIndex);
    }

    if embedder.model_id() != index.model_id() {
        return Err(TubeqaError::Embedding(format!(
            "Index was built with '{}' but the query embedder is '{}'",
            index.model_id(),
            embedder.model_id()
        )));
    }

    if k == 0 {
        return Ok(RetrievalResult::default());
    }

    let query_embedding = embedder.embed(query).await?;
    let neighbors = index.search(&query_embedding, k)?;
    debug!("Retrieved {} chunks", neighbors.len());

    Ok(RetrievalResult { neighbors })
}
