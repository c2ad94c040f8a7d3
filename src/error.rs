//! Error types for tubeqa.

use serde::Serialize;
use thiserror::Error;

/// Library-level error type for tubeqa operations.
#[derive(Error, Debug)]
pub enum TubeqaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid video URL: {0}")]
    InvalidUrl(String),

    #[error("Transcript unavailable: {0}")]
    TranscriptUnavailable(String),

    #[error("Transcript is empty")]
    EmptyTranscript,

    #[error("Invalid chunk parameters: chunk_size={chunk_size}, chunk_overlap={chunk_overlap} (overlap must be smaller than size)")]
    InvalidChunkParams {
        chunk_size: usize,
        chunk_overlap: usize,
    },

    #[error("Embedding service error: {0}")]
    Embedding(String),

    #[error("Vector index is empty")]
    EmptyIndex,

    #[error("Prompt template is missing a value for placeholder '{{{0}}}'")]
    MissingPlaceholder(String),

    #[error("Generation service error: {0}")]
    Generation(String),

    #[error("Generation timed out after {0} seconds")]
    GenerationTimeout(u64),

    #[error("No transcript loaded. Load a video first.")]
    NoTranscript,

    #[error("Question is empty")]
    EmptyQuestion,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Coarse error taxonomy used by the presentation layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Missing or invalid configuration. Fatal at startup.
    Configuration,
    /// Bad user input (URL, question, parameters).
    Input,
    /// A transcript, embedding, or generation service failed.
    Upstream,
    /// Operation invoked in the wrong session state.
    State,
    /// Local plumbing failures.
    Internal,
}

impl TubeqaError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TubeqaError::Config(_) | TubeqaError::TomlParse(_) => ErrorKind::Configuration,
            TubeqaError::InvalidUrl(_)
            | TubeqaError::EmptyQuestion
            | TubeqaError::InvalidChunkParams { .. }
            | TubeqaError::InvalidInput(_) => ErrorKind::Input,
            TubeqaError::TranscriptUnavailable(_)
            | TubeqaError::EmptyTranscript
            | TubeqaError::Embedding(_)
            | TubeqaError::Generation(_)
            | TubeqaError::GenerationTimeout(_)
            | TubeqaError::ToolNotFound(_)
            | TubeqaError::Http(_) => ErrorKind::Upstream,
            TubeqaError::NoTranscript | TubeqaError::EmptyIndex => ErrorKind::State,
            TubeqaError::MissingPlaceholder(_) | TubeqaError::Io(_) | TubeqaError::Json(_) => {
                ErrorKind::Internal
            }
        }
    }
}

/// Result type alias for tubeqa operations.
pub type Result<T> = std::result::Result<T, TubeqaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(TubeqaError::Config("x".into()).kind(), ErrorKind::Configuration);
        assert_eq!(TubeqaError::EmptyQuestion.kind(), ErrorKind::Input);
        assert_eq!(TubeqaError::NoTranscript.kind(), ErrorKind::State);
        assert_eq!(TubeqaError::GenerationTimeout(5).kind(), ErrorKind::Upstream);
    }

    #[test]
    fn test_missing_placeholder_message() {
        let err = TubeqaError::MissingPlaceholder("context".to_string());
        assert_eq!(
            err.to_string(),
            "Prompt template is missing a value for placeholder '{context}'"
        );
    }
}
