//! Per-conversation state: the loaded video and its lazily built index.

use crate::transcript::NormalizedTranscript;
use crate::vector_store::VectorIndex;
use serde::Serialize;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    NoTranscript,
    TranscriptLoaded,
    Indexed,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPhase::NoTranscript => write!(f, "no transcript"),
            SessionPhase::TranscriptLoaded => write!(f, "transcript loaded"),
            SessionPhase::Indexed => write!(f, "indexed"),
        }
    }
}

/// The video currently loaded into a session.
#[derive(Debug, Clone)]
pub struct LoadedVideo {
    /// URL as given by the user.
    pub url: String,
    pub video_id: String,
    pub transcript: NormalizedTranscript,
    /// Built on the first question, dropped when another video is loaded.
    pub index: Option<VectorIndex>,
}

/// State of one user conversation.
///
/// Replaced wholesale on every successful load; never merged across videos.
#[derive(Debug, Clone, Default)]
pub struct Session {
    video: Option<LoadedVideo>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SessionPhase {
        match &self.video {
            None => SessionPhase::NoTranscript,
            Some(video) if video.index.is_some() => SessionPhase::Indexed,
            Some(_) => SessionPhase::TranscriptLoaded,
        }
    }

    pub fn video(&self) -> Option<&LoadedVideo> {
        self.video.as_ref()
    }

    pub(crate) fn video_mut(&mut self) -> Option<&mut LoadedVideo> {
        self.video.as_mut()
    }

    /// Install a freshly loaded video, discarding any previous transcript and index.
    pub(crate) fn replace(&mut self, video: LoadedVideo) {
        self.video = Some(video);
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            phase: self.phase(),
            url: self.video.as_ref().map(|v| v.url.clone()),
            video_id: self.video.as_ref().map(|v| v.video_id.clone()),
            transcript_chars: self.video.as_ref().map(|v| v.transcript.char_len()),
            indexed_chunks: self
                .video
                .as_ref()
                .and_then(|v| v.index.as_ref())
                .map(VectorIndex::len),
        }
    }
}

/// Serializable view of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub phase: SessionPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_chars: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexed_chunks: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::chunks_of;
    use crate::vector_store::DistanceMetric;

    fn video() -> LoadedVideo {
        LoadedVideo {
            url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
            video_id: "dQw4w9WgXcQ".to_string(),
            transcript: NormalizedTranscript {
                video_id: "dQw4w9WgXcQ".to_string(),
                text: "never gonna give you up".to_string(),
                segment_count: 1,
                last_start_seconds: 0.0,
            },
            index: None,
        }
    }

    #[test]
    fn test_phases() {
        let mut session = Session::new();
        assert_eq!(session.phase(), SessionPhase::NoTranscript);
        assert!(session.video().is_none());

        session.replace(video());
        assert_eq!(session.phase(), SessionPhase::TranscriptLoaded);

        let index = VectorIndex::new(
            chunks_of(&["never gonna give you up"]),
            vec![vec![1.0, 0.0]],
            "m",
            DistanceMetric::L2,
        )
        .unwrap();
        session.video_mut().unwrap().index = Some(index);
        assert_eq!(session.phase(), SessionPhase::Indexed);

        session.replace(video());
        assert_eq!(session.phase(), SessionPhase::TranscriptLoaded);
    }

    #[test]
    fn test_summary_json() {
        let json = serde_json::to_value(Session::new().summary()).unwrap();
        assert_eq!(json, serde_json::json!({"phase": "no_transcript"}));

        let mut session = Session::new();
        session.replace(video());
        let json = serde_json::to_value(session.summary()).unwrap();
        assert_eq!(json["phase"], "transcript_loaded");
        assert_eq!(json["video_id"], "dQw4w9WgXcQ");
        assert_eq!(json["transcript_chars"], 23);
    }
}
