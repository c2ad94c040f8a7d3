//! OpenAI-compatible embeddings implementation.

use super::Embedder;
use crate::config::{EmbeddingSettings, ServiceCredentials};
use crate::error::{Result, TubeqaError};
use crate::openai::{create_client_with_timeout, OpenAIClient, DEFAULT_TIMEOUT};
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::time::Duration;
use tracing::{debug, instrument};

/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAIEmbedder {
    client: OpenAIClient,
    model: String,
    dimensions: Option<u32>,
    batch_size: usize,
    max_concurrent: usize,
}

impl OpenAIEmbedder {
    /// Create an embedder for the given model with default batching.
    pub fn new(credentials: &ServiceCredentials, model: &str) -> Result<Self> {
        Self::with_settings(
            credentials,
            &EmbeddingSettings {
                model: model.to_string(),
                ..EmbeddingSettings::default()
            },
            DEFAULT_TIMEOUT,
        )
    }

    /// Create an embedder from settings.
    pub fn with_settings(
        credentials: &ServiceCredentials,
        settings: &EmbeddingSettings,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(credentials, timeout)?,
            model: settings.model.clone(),
            dimensions: settings.dimensions,
            batch_size: settings.batch_size.max(1),
            max_concurrent: settings.max_concurrent.max(1),
        })
    }

    /// Embed one provider-sized batch.
    async fn embed_request(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let expected = texts.len();

        let mut builder = CreateEmbeddingRequestArgs::default();
        builder
            .model(&self.model)
            .input(EmbeddingInput::StringArray(texts));
        if let Some(dimensions) = self.dimensions {
            builder.dimensions(dimensions);
        }
        let request = builder
            .build()
            .map_err(|e| TubeqaError::Embedding(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| TubeqaError::Embedding(format!("Embedding API error: {}", e)))?;

        // Sort by index to ensure correct order
        let mut data = response.data;
        data.sort_by_key(|e| e.index);

        if data.len() != expected {
            return Err(TubeqaError::Embedding(format!(
                "Expected {} embeddings, got {}",
                expected,
                data.len()
            )));
        }

        Ok(data.into_iter().map(|e| e.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| TubeqaError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            "Generating embeddings for {} texts in batches of {}",
            texts.len(),
            self.batch_size
        );

        let batches: Vec<Vec<String>> = texts
            .chunks(self.batch_size)
            .map(<[String]>::to_vec)
            .collect();

        // Batches run concurrently; `buffered` keeps them in input order
        let results: Vec<Vec<Vec<f32>>> = stream::iter(batches)
            .map(|batch| self.embed_request(batch))
            .buffered(self.max_concurrent)
            .try_collect()
            .await?;

        let embeddings: Vec<Vec<f32>> = results.into_iter().flatten().collect();
        debug!("Generated {} embeddings", embeddings.len());
        Ok(embeddings)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
