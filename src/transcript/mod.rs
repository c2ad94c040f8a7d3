//! Transcript sources and normalization.
//!
//! A [`TranscriptSource`] produces timestamped segments for a video; the
//! normalizer flattens them into the single text blob the rest of the
//! pipeline works on.

mod youtube;

pub use youtube::{extract_video_id, YoutubeTranscriptSource};

use crate::error::{Result, TubeqaError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single caption segment in playback order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Spoken text.
    pub text: String,
    /// Start time in seconds.
    pub start_seconds: f64,
    /// Duration in seconds, when the caption track reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>, start_seconds: f64) -> Self {
        Self {
            text: text.into(),
            start_seconds,
            duration_seconds: None,
        }
    }

    pub fn with_duration(mut self, duration_seconds: f64) -> Self {
        self.duration_seconds = Some(duration_seconds);
        self
    }
}

/// How segments are flattened into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizeMode {
    /// Segment texts joined by single spaces; timestamps dropped.
    #[default]
    Plain,
    /// One `Text: ... Start: ...` line per segment.
    Timestamped,
}

impl std::str::FromStr for NormalizeMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" => Ok(NormalizeMode::Plain),
            "timestamped" | "timestamps" => Ok(NormalizeMode::Timestamped),
            _ => Err(format!("Unknown transcript mode: {}", s)),
        }
    }
}

/// The flattened transcript of one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTranscript {
    /// Video this transcript belongs to.
    pub video_id: String,
    /// Normalized text.
    pub text: String,
    /// Number of segments that contributed text.
    pub segment_count: usize,
    /// Start time of the last segment, in seconds.
    pub last_start_seconds: f64,
}

impl NormalizedTranscript {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Collapse runs of whitespace (captions carry embedded newlines).
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Flatten segments into a [`NormalizedTranscript`].
pub fn normalize(
    video_id: &str,
    segments: &[TranscriptSegment],
    mode: NormalizeMode,
) -> Result<NormalizedTranscript> {
    let cleaned: Vec<(String, f64)> = segments
        .iter()
        .map(|s| (collapse_whitespace(&s.text), s.start_seconds))
        .filter(|(text, _)| !text.is_empty())
        .collect();

    if cleaned.is_empty() {
        return Err(TubeqaError::EmptyTranscript);
    }

    let text = match mode {
        NormalizeMode::Plain => cleaned
            .iter()
            .map(|(text, _)| text.as_str())
            .collect::<Vec<_>>()
            .join(" "),
        NormalizeMode::Timestamped => cleaned
            .iter()
            .map(|(text, start)| format!("Text: {} Start: {}", text, start))
            .collect::<Vec<_>>()
            .join("\n"),
    };

    Ok(NormalizedTranscript {
        video_id: video_id.to_string(),
        text,
        segment_count: cleaned.len(),
        last_start_seconds: cleaned.last().map(|(_, start)| *start).unwrap_or(0.0),
    })
}

/// Trait for transcript providers.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Extract a video id from a URL or bare id.
    fn video_id(&self, input: &str) -> Option<String> {
        extract_video_id(input)
    }

    /// Fetch the caption segments of a video, in playback order.
    async fn fetch_transcript(&self, video_id: &str) -> Result<Vec<TranscriptSegment>>;
}

/// Format seconds as MM:SS or HH:MM:SS.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}
