//! Configuration module for tubeqa.
//!
//! Handles loading application settings, service credentials, and prompt templates.

mod prompts;
mod settings;

pub use prompts::{PromptTemplate, Prompts, QaPrompts, SummaryPrompts};
pub use settings::{
    mask_secret, ChunkingSettings, EmbeddingSettings, GeneralSettings, GenerationSettings,
    PromptSettings, RetrievalSettings, ServerSettings, ServiceCredentials, ServiceSettings,
    Settings, TranscriptSettings, ENV_API_KEY, ENV_PROJECT_ID, ENV_SERVICE_URL,
};
