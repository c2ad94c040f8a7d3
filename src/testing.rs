//! Stub capabilities for unit tests, plus loopback stand-ins for the model service.

use crate::chunking::Chunk;
use crate::config::ServiceCredentials;
use crate::embedding::Embedder;
use crate::error::{Result, TubeqaError};
use crate::generation::{GenerationParams, Generator};
use crate::transcript::{TranscriptSegment, TranscriptSource};
use async_trait::async_trait;
use axum::{http::StatusCode, Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

const STUB_DIMENSIONS: usize = 512;

/// Chunks with contiguous byte ranges, in the given order.
pub fn chunks_of(texts: &[&str]) -> Vec<Chunk> {
    let mut offset = 0;
    texts
        .iter()
        .enumerate()
        .map(|(order, text)| {
            let chunk = Chunk {
                order,
                text: text.to_string(),
                start: offset,
                end: offset + text.len(),
            };
            offset = chunk.end;
            chunk
        })
        .collect()
}

/// Deterministic bag-of-words embedding: hashed word counts, unit length.
pub fn bag_of_words(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; STUB_DIMENSIONS];
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        // FNV-1a
        let mut hash: u64 = 0xcbf29ce484222325;
        for byte in word.to_lowercase().bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x100000001b3);
        }
        vector[(hash % STUB_DIMENSIONS as u64) as usize] += 1.0;
    }

    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
    vector
}

/// Embedder that counts its calls.
pub struct CountingEmbedder {
    model: String,
    batch_calls: AtomicUsize,
    single_calls: AtomicUsize,
    texts: AtomicUsize,
    drop_last: bool,
}

impl CountingEmbedder {
    pub fn new() -> Self {
        Self::with_model("stub-embedder")
    }

    pub fn with_model(model: &str) -> Self {
        Self {
            model: model.to_string(),
            batch_calls: AtomicUsize::new(0),
            single_calls: AtomicUsize::new(0),
            texts: AtomicUsize::new(0),
            drop_last: false,
        }
    }

    /// Return one embedding fewer than requested from `embed_batch`.
    pub fn dropping_last(mut self) -> Self {
        self.drop_last = true;
        self
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn single_calls(&self) -> usize {
        self.single_calls.load(Ordering::SeqCst)
    }

    pub fn texts_embedded(&self) -> usize {
        self.texts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for CountingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.single_calls.fetch_add(1, Ordering::SeqCst);
        Ok(bag_of_words(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.texts.fetch_add(texts.len(), Ordering::SeqCst);

        let mut embeddings: Vec<Vec<f32>> = texts.iter().map(|t| bag_of_words(t)).collect();
        if self.drop_last {
            embeddings.pop();
        }
        Ok(embeddings)
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

/// Embedder whose service is always down.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(TubeqaError::Embedding("service unavailable".to_string()))
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(TubeqaError::Embedding("service unavailable".to_string()))
    }

    fn model_id(&self) -> &str {
        "failing-embedder"
    }
}

/// Generator that records prompts and replies with canned text.
pub struct RecordingGenerator {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A generator whose every call fails.
    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        params.validate()?;
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply
            .clone()
            .ok_or_else(|| TubeqaError::Generation("quota exceeded".to_string()))
    }
}

/// Transcript source serving fixed segments per video id.
#[derive(Default)]
pub struct CannedTranscriptSource {
    videos: HashMap<String, Vec<TranscriptSegment>>,
    calls: AtomicUsize,
}

impl CannedTranscriptSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_video(mut self, video_id: &str, segments: Vec<TranscriptSegment>) -> Self {
        self.videos.insert(video_id.to_string(), segments);
        self
    }

    /// Serve `text` as a single segment.
    pub fn with_text(self, video_id: &str, text: &str) -> Self {
        self.with_video(video_id, vec![TranscriptSegment::new(text, 0.0)])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptSource for CannedTranscriptSource {
    async fn fetch_transcript(&self, video_id: &str) -> Result<Vec<TranscriptSegment>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.videos.get(video_id).cloned().ok_or_else(|| {
            TubeqaError::TranscriptUnavailable(format!("No captions for video {}", video_id))
        })
    }
}

/// Serve `router` on a loopback port; the credentials point at its `/v1` root.
pub async fn serve_stub(router: Router) -> ServiceCredentials {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    ServiceCredentials {
        url: format!("http://{}/v1", addr),
        api_key: "test-key".to_string(),
        project_id: "test-project".to_string(),
    }
}

/// A 429 reply in the OpenAI error format.
pub fn rate_limited() -> (StatusCode, Json<Value>) {
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({
            "error": {
                "message": "Rate limit reached",
                "type": "rate_limit_exceeded",
                "param": null,
                "code": null
            }
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::cosine_similarity;

    #[test]
    fn test_bag_of_words() {
        let a = bag_of_words("Rust ownership");
        let b = bag_of_words("rust, OWNERSHIP!");
        assert_eq!(a, b);
        assert!((cosine_similarity(&a, &bag_of_words("rust ownership rules")) - 0.816).abs() < 0.01);
        assert!(bag_of_words("").iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_chunks_of() {
        let chunks = chunks_of(&["ab", "cde"]);
        assert_eq!(chunks[1].order, 1);
        assert_eq!((chunks[1].start, chunks[1].end), (2, 5));
    }
}
