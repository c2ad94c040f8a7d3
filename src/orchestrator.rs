//! Session orchestrator for tubeqa.
//!
//! Coordinates transcript loading, summarization, and question answering
//! for a [`Session`]: load → (summarize | chunk → embed → retrieve → generate).

use crate::chunking::{Chunker, ChunkingConfig, RecursiveChunker};
use crate::config::{Prompts, ServiceCredentials, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{Result, TubeqaError};
use crate::generation::{GenerationParams, Generator, OpenAIGenerator};
use crate::rag::{build_index, format_context_for_prompt, retrieve, Answer};
use crate::session::{LoadedVideo, Session};
use crate::transcript::{normalize, NormalizeMode, TranscriptSource, YoutubeTranscriptSource};
use crate::vector_store::{DistanceMetric, VectorIndex};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Pipeline parameters that are not capabilities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    pub chunking: ChunkingConfig,
    pub mode: NormalizeMode,
    /// Number of chunks retrieved per question.
    pub k: usize,
    pub metric: DistanceMetric,
    pub generation: GenerationParams,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            mode: NormalizeMode::default(),
            k: 7,
            metric: DistanceMetric::default(),
            generation: GenerationParams::default(),
        }
    }
}

impl From<&Settings> for PipelineConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            chunking: ChunkingConfig::from(&settings.chunking),
            mode: settings.transcript.mode,
            k: settings.retrieval.k,
            metric: settings.retrieval.metric,
            generation: settings.generation.params(),
        }
    }
}

/// The main orchestrator for the tubeqa pipeline.
pub struct Orchestrator {
    transcript_source: Arc<dyn TranscriptSource>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    prompts: Prompts,
    chunker: RecursiveChunker,
    config: PipelineConfig,
}

impl Orchestrator {
    /// Create an orchestrator backed by YouTube captions and the configured model service.
    pub fn from_settings(settings: &Settings, credentials: &ServiceCredentials) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let transcript_source = Arc::new(YoutubeTranscriptSource::new(
            settings.transcript.languages.clone(),
            settings.temp_dir(),
        ));

        let embedder = Arc::new(OpenAIEmbedder::with_settings(
            credentials,
            &settings.embedding,
            Duration::from_secs(settings.service.request_timeout_seconds),
        )?);

        let generator = Arc::new(OpenAIGenerator::new(credentials, &settings.generation)?);

        info!(
            "Using embedding model {} and generation model {}",
            settings.embedding.model, settings.generation.model
        );

        Self::with_components(
            transcript_source,
            embedder,
            generator,
            prompts,
            PipelineConfig::from(settings),
        )
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        transcript_source: Arc<dyn TranscriptSource>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        prompts: Prompts,
        config: PipelineConfig,
    ) -> Result<Self> {
        config.generation.validate()?;
        let chunker = RecursiveChunker::new(config.chunking)?;

        Ok(Self {
            transcript_source,
            embedder,
            generator,
            prompts,
            chunker,
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn prompts(&self) -> &Prompts {
        &self.prompts
    }

    /// Fetch and normalize the transcript of `url`, replacing the session's video.
    ///
    /// On failure the session is left as it was.
    #[instrument(skip(self, session))]
    pub async fn load_video(&self, session: &mut Session, url: &str) -> Result<()> {
        let url = url.trim();
        if url.is_empty() {
            return Err(TubeqaError::InvalidUrl("URL is empty".to_string()));
        }

        let video_id = self.transcript_source.video_id(url).ok_or_else(|| {
            TubeqaError::InvalidUrl(format!("Could not find a video id in '{}'", url))
        })?;

        info!("Loading transcript for {}", video_id);
        let segments = self.transcript_source.fetch_transcript(&video_id).await?;
        let transcript = normalize(&video_id, &segments, self.config.mode)?;
        debug!(
            "Normalized {} segments into {} chars",
            transcript.segment_count,
            transcript.char_len()
        );

        session.replace(LoadedVideo {
            url: url.to_string(),
            video_id,
            transcript,
            index: None,
        });

        Ok(())
    }

    /// Summarize the loaded transcript in one paragraph.
    #[instrument(skip(self, session))]
    pub async fn summarize(&self, session: &Session) -> Result<String> {
        let video = session.video().ok_or(TubeqaError::NoTranscript)?;

        let prompt = self.prompts.render_summary(video.transcript.as_str())?;
        debug!("Summary prompt is {} chars", prompt.len());

        let summary = self
            .generator
            .generate(&prompt, &self.config.generation)
            .await?;
        info!("Generated summary for {}", video.video_id);

        Ok(summary)
    }

    /// Answer a question about the loaded video using the configured `k`.
    pub async fn ask_question(&self, session: &mut Session, question: &str) -> Result<Answer> {
        self.ask_question_top_k(session, question, self.config.k).await
    }

    /// Answer a question from the `k` most relevant transcript chunks.
    ///
    /// Builds the session's index on first use and reuses it afterwards.
    #[instrument(skip(self, session), fields(question = %question))]
    pub async fn ask_question_top_k(
        &self,
        session: &mut Session,
        question: &str,
        k: usize,
    ) -> Result<Answer> {
        let video = session.video_mut().ok_or(TubeqaError::NoTranscript)?;

        let question = question.trim();
        if question.is_empty() {
            return Err(TubeqaError::EmptyQuestion);
        }

        let index = match video.index.take() {
            Some(index) => index,
            None => self.index_transcript(video.transcript.as_str()).await?,
        };
        let index = &*video.index.insert(index);

        let retrieved = retrieve(question, index, self.embedder.as_ref(), k).await?;
        let context = format_context_for_prompt(&retrieved);
        let prompt = self.prompts.render_qa(&context, question)?;

        let answer = self
            .generator
            .generate(&prompt, &self.config.generation)
            .await?;
        info!("Answered from {} chunks", retrieved.len());

        Ok(Answer {
            answer,
            sources: retrieved.sources(),
        })
    }

    async fn index_transcript(&self, text: &str) -> Result<VectorIndex> {
        let chunks = self.chunker.chunk(text)?;
        info!("Indexing {} chunks", chunks.len());
        build_index(chunks, self.embedder.as_ref(), self.config.metric).await
    }
}
