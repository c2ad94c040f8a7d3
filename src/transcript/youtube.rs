//! YouTube transcript source backed by yt-dlp caption downloads.

use super::{TranscriptSegment, TranscriptSource};
use crate::error::{Result, TubeqaError};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, instrument, warn};

fn video_id_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Matches various YouTube URL formats and bare video IDs
        Regex::new(
            r"(?x)
            (?:
                # Full YouTube URLs
                (?:https?://)?
                (?:www\.|m\.)?
                (?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/|youtube\.com/shorts/|youtube\.com/live/)
                ([a-zA-Z0-9_-]{11})
                # The id ends the URL or is followed by a query, path or fragment
                (?:$|[?&/\#])
            )
            |
            # Bare video ID (11 characters)
            ^([a-zA-Z0-9_-]{11})$
        ",
        )
        .expect("video id regex is valid")
    })
}

/// Extract a video ID from a YouTube URL or bare ID.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    // watch URLs may carry the id anywhere in the query string
    if let Ok(parsed) = url::Url::parse(input) {
        let is_youtube = parsed
            .host_str()
            .is_some_and(|h| h == "youtube.com" || h.ends_with(".youtube.com"));
        if is_youtube && parsed.path() == "/watch" {
            return parsed
                .query_pairs()
                .find(|(key, _)| key == "v")
                .map(|(_, value)| value.into_owned())
                .filter(|id| video_id_regex().is_match(id));
        }
    }

    let caps = video_id_regex().captures(input)?;

    // Try group 1 (URL format) then group 2 (bare ID)
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
}

/// Caption track in yt-dlp's `json3` format.
#[derive(Debug, Deserialize)]
struct Json3Track {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs", default)]
    start_ms: f64,
    #[serde(rename = "dDurationMs")]
    duration_ms: Option<f64>,
    #[serde(default)]
    segs: Vec<Json3Seg>,
}

#[derive(Debug, Deserialize)]
struct Json3Seg {
    #[serde(default)]
    utf8: String,
}

/// Parse a json3 caption track into segments.
fn parse_json3(content: &str) -> Result<Vec<TranscriptSegment>> {
    let track: Json3Track = serde_json::from_str(content)?;

    let segments = track
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            if text.trim().is_empty() {
                return None;
            }
            let mut segment = TranscriptSegment::new(text.trim(), event.start_ms / 1000.0);
            if let Some(duration) = event.duration_ms {
                segment = segment.with_duration(duration / 1000.0);
            }
            Some(segment)
        })
        .collect();

    Ok(segments)
}

/// YouTube transcript source.
pub struct YoutubeTranscriptSource {
    languages: Vec<String>,
    temp_dir: PathBuf,
}

impl YoutubeTranscriptSource {
    pub fn new(languages: Vec<String>, temp_dir: PathBuf) -> Self {
        Self {
            languages,
            temp_dir,
        }
    }

    /// Pick the caption file for the most preferred language.
    fn select_caption_file(&self, dir: &Path) -> Result<Option<PathBuf>> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json3"))
            .collect();
        files.sort();

        for lang in &self.languages {
            let suffix = format!(".{}.json3", lang);
            if let Some(file) = files.iter().find(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(&suffix))
            }) {
                return Ok(Some(file.clone()));
            }
        }

        Ok(files.into_iter().next())
    }
}

impl Default for YoutubeTranscriptSource {
    fn default() -> Self {
        Self::new(vec!["en".to_string()], std::env::temp_dir())
    }
}

#[async_trait]
impl TranscriptSource for YoutubeTranscriptSource {
    #[instrument(skip(self))]
    async fn fetch_transcript(&self, video_id: &str) -> Result<Vec<TranscriptSegment>> {
        let url = format!("https://www.youtube.com/watch?v={}", video_id);

        std::fs::create_dir_all(&self.temp_dir)?;
        let work_dir = tempfile::Builder::new()
            .prefix("captions-")
            .tempdir_in(&self.temp_dir)?;

        let output_template = work_dir.path().join("%(id)s.%(ext)s");
        let languages = self.languages.join(",");

        info!("Fetching captions for {}", video_id);
        let output = tokio::process::Command::new("yt-dlp")
            .arg("--skip-download")
            .arg("--write-subs")
            .arg("--write-auto-subs")
            .args(["--sub-langs", &languages])
            .args(["--sub-format", "json3"])
            .arg("--no-warnings")
            .arg("--output")
            .arg(&output_template)
            .arg(&url)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TubeqaError::ToolNotFound("yt-dlp".to_string())
                } else {
                    TubeqaError::TranscriptUnavailable(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TubeqaError::TranscriptUnavailable(format!(
                "Video {} not found or unavailable: {}",
                video_id,
                stderr.trim()
            )));
        }

        let caption_file = self.select_caption_file(work_dir.path())?.ok_or_else(|| {
            TubeqaError::TranscriptUnavailable(format!(
                "No captions in [{}] for video {} (captions may be disabled)",
                languages, video_id
            ))
        })?;
        debug!("Using caption file {}", caption_file.display());

        let content = tokio::fs::read_to_string(&caption_file).await?;
        let segments = parse_json3(&content).map_err(|e| {
            TubeqaError::TranscriptUnavailable(format!("Unreadable caption track: {}", e))
        })?;

        if segments.is_empty() {
            warn!("Caption track for {} has no text", video_id);
        }
        info!("Fetched {} caption segments", segments.len());

        Ok(segments)
    }
}
