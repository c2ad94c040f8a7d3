//! Embedding indexer: chunks in, vector index out.

use crate::chunking::Chunk;
use crate::embedding::Embedder;
use crate::error::{Result, TubeqaError};
use crate::vector_store::{DistanceMetric, VectorIndex};
use tracing::{debug, info, instrument};

/// Embed every chunk and build an index over them.
///
/// Either every chunk is indexed or an error is returned.
#[instrument(skip(chunks, embedder), fields(chunks = chunks.len(), model = embedder.model_id()))]
pub async fn build_index(
    chunks: Vec<Chunk>,
    embedder: &dyn Embedder,
    metric: DistanceMetric,
) -> Result<VectorIndex> {
    if chunks.is_empty() {
        return Err(TubeqaError::EmptyIndex);
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let embeddings = embedder.embed_batch(&texts).await?;
    debug!("Received {} embeddings", embeddings.len());

    let index = VectorIndex::new(chunks, embeddings, embedder.model_id(), metric)?;
    info!(
        "Indexed {} chunks ({} dimensions, {})",
        index.len(),
        index.dimension(),
        index.metric()
    );

    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{chunks_of, CountingEmbedder, FailingEmbedder};
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_build_index() {
        let embedder = CountingEmbedder::new();
        let chunks = chunks_of(&["alpha beta", "gamma delta", "epsilon"]);

        let index = assert_ok!(build_index(chunks, &embedder, DistanceMetric::L2).await);
        assert_eq!(index.len(), 3);
        assert_eq!(index.model_id(), embedder.model_id());
        assert_eq!(embedder.batch_calls(), 1);
        assert_eq!(embedder.texts_embedded(), 3);
    }

    #[tokio::test]
    async fn test_empty_chunks() {
        let embedder = CountingEmbedder::new();
        let err = build_index(Vec::new(), &embedder, DistanceMetric::L2)
            .await
            .unwrap_err();
        assert!(matches!(err, TubeqaError::EmptyIndex));
        assert_eq!(embedder.batch_calls(), 0);
    }

    #[tokio::test]
    async fn test_short_embedding_response() {
        let embedder = CountingEmbedder::new().dropping_last();
        let chunks = chunks_of(&["one", "two"]);
        let err = build_index(chunks, &embedder, DistanceMetric::L2)
            .await
            .unwrap_err();
        assert!(matches!(err, TubeqaError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_embedder_failure() {
        let err = build_index(chunks_of(&["one"]), &FailingEmbedder, DistanceMetric::Cosine)
            .await
            .unwrap_err();
        assert!(matches!(err, TubeqaError::Embedding(_)));
    }
}
