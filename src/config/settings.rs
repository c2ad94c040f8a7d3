//! Configuration settings for tubeqa.

use crate::error::{Result, TubeqaError};
use crate::generation::{DecodingMethod, GenerationParams};
use crate::transcript::NormalizeMode;
use crate::vector_store::DistanceMetric;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable holding the service endpoint URL.
pub const ENV_SERVICE_URL: &str = "TUBEQA_SERVICE_URL";
/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "TUBEQA_API_KEY";
/// Environment variable holding the project identifier.
pub const ENV_PROJECT_ID: &str = "TUBEQA_PROJECT_ID";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub service: ServiceSettings,
    pub transcript: TranscriptSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub generation: GenerationSettings,
    pub prompts: PromptSettings,
    pub server: ServerSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for temporary files (caption downloads).
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            temp_dir: "/tmp/tubeqa".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Model service endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Endpoint URL. The `TUBEQA_SERVICE_URL` environment variable takes precedence.
    pub url: Option<String>,
    /// HTTP request timeout in seconds.
    pub request_timeout_seconds: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            url: None,
            request_timeout_seconds: 300,
        }
    }
}

/// Transcript fetching and normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    /// Caption languages to request, in order of preference.
    pub languages: Vec<String>,
    /// How segments are flattened into text.
    pub mode: NormalizeMode,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string()],
            mode: NormalizeMode::Plain,
        }
    }
}

/// Text chunking settings. Sizes are in characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 200,
            chunk_overlap: 20,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Requested embedding dimensions (model default when unset).
    pub dimensions: Option<u32>,
    /// Texts per embedding request.
    pub batch_size: usize,
    /// Maximum concurrent embedding requests.
    pub max_concurrent: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "ibm/slate-30m-english-rtrvr".to_string(),
            dimensions: None,
            batch_size: 100,
            max_concurrent: 4,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of chunks retrieved per question.
    pub k: usize,
    /// Distance metric for nearest-neighbour search.
    pub metric: DistanceMetric,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            k: 7,
            metric: DistanceMetric::L2,
        }
    }
}

/// Text generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// LLM model for summaries and answers.
    pub model: String,
    pub decoding_method: DecodingMethod,
    pub max_new_tokens: u32,
    /// Sampling temperature (ignored for greedy decoding).
    pub temperature: f32,
    /// Deadline for a single generation call, in seconds.
    pub timeout_seconds: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "meta-llama/llama-3-2-3b-instruct".to_string(),
            decoding_method: DecodingMethod::Greedy,
            max_new_tokens: 900,
            temperature: 0.7,
            timeout_seconds: 120,
        }
    }
}

impl GenerationSettings {
    /// Generation parameters derived from these settings.
    pub fn params(&self) -> GenerationParams {
        GenerationParams {
            decoding_method: self.decoding_method,
            max_new_tokens: self.max_new_tokens,
            temperature: self.temperature,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {variable_name}.
    pub variables: std::collections::HashMap<String, String>,
}

/// HTTP API session limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Sessions untouched for this long are dropped when a new one is opened.
    pub session_idle_minutes: u64,
    /// Maximum number of open sessions.
    pub max_sessions: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            session_idle_minutes: 60,
            max_sessions: 100,
        }
    }
}

/// Credentials for the model service, resolved at startup.
#[derive(Clone)]
pub struct ServiceCredentials {
    pub url: String,
    pub api_key: String,
    pub project_id: String,
}

impl std::fmt::Debug for ServiceCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceCredentials")
            .field("url", &self.url)
            .field("api_key", &mask_secret(&self.api_key))
            .field("project_id", &self.project_id)
            .finish()
    }
}

impl ServiceCredentials {
    /// Resolve credentials from the process environment, falling back to
    /// the configured URL.
    pub fn from_env(settings: &Settings) -> Result<Self> {
        Self::resolve(|name| std::env::var(name).ok(), settings)
    }

    /// Resolve credentials with a custom variable lookup.
    pub fn resolve<F>(lookup: F, settings: &Settings) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let url = non_blank(lookup(ENV_SERVICE_URL))
            .or_else(|| non_blank(settings.service.url.clone()))
            .ok_or_else(|| {
                TubeqaError::Config(format!(
                    "{} is not set and no service.url is configured",
                    ENV_SERVICE_URL
                ))
            })?;

        let api_key = non_blank(lookup(ENV_API_KEY))
            .ok_or_else(|| TubeqaError::Config(format!("{} is not set", ENV_API_KEY)))?;

        let project_id = non_blank(lookup(ENV_PROJECT_ID)).ok_or_else(|| {
            TubeqaError::Config(format!(
                "{} is not set. A project id is required by the model service.",
                ENV_PROJECT_ID
            ))
        })?;

        Ok(Self {
            url: url.trim().trim_end_matches('/').to_string(),
            api_key: api_key.trim().to_string(),
            project_id: project_id.trim().to_string(),
        })
    }
}

/// Mask a secret for display, keeping only its edges.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| TubeqaError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tubeqa")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_match_pipeline_constants() {
        let settings = Settings::default();
        assert_eq!(settings.chunking.chunk_size, 200);
        assert_eq!(settings.chunking.chunk_overlap, 20);
        assert_eq!(settings.retrieval.k, 7);
        assert_eq!(settings.generation.max_new_tokens, 900);
        assert_eq!(settings.generation.decoding_method, DecodingMethod::Greedy);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [chunking]
            chunk_size = 500

            [retrieval]
            metric = "cosine"

            [server]
            max_sessions = 8
            "#,
        )
        .unwrap();

        assert_eq!(settings.chunking.chunk_size, 500);
        assert_eq!(settings.chunking.chunk_overlap, 20);
        assert_eq!(settings.retrieval.metric, DistanceMetric::Cosine);
        assert_eq!(settings.retrieval.k, 7);
        assert_eq!(settings.server.max_sessions, 8);
        assert_eq!(settings.server.session_idle_minutes, 60);
    }

    #[test]
    fn test_save_and_load_roundtrip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.generation.model = "custom-model".to_string();
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.generation.model, "custom-model");
    }

    #[test]
    fn test_credentials_resolve() {
        let settings = Settings::default();
        let creds = ServiceCredentials::resolve(
            lookup(&[
                (ENV_SERVICE_URL, "https://models.example.com/v1/"),
                (ENV_API_KEY, "key-1234567890"),
                (ENV_PROJECT_ID, "proj-1"),
            ]),
            &settings,
        )
        .unwrap();

        assert_eq!(creds.url, "https://models.example.com/v1");
        assert_eq!(creds.project_id, "proj-1");
    }

    #[test]
    fn test_credentials_url_falls_back_to_settings() {
        let mut settings = Settings::default();
        settings.service.url = Some("https://configured.example.com".to_string());

        let creds = ServiceCredentials::resolve(
            lookup(&[(ENV_API_KEY, "key"), (ENV_PROJECT_ID, "proj")]),
            &settings,
        )
        .unwrap();
        assert_eq!(creds.url, "https://configured.example.com");
    }

    #[test]
    fn test_missing_credentials_are_config_errors() {
        let settings = Settings::default();

        let err = ServiceCredentials::resolve(
            lookup(&[(ENV_SERVICE_URL, "https://x"), (ENV_PROJECT_ID, "proj")]),
            &settings,
        )
        .unwrap_err();
        assert!(matches!(err, TubeqaError::Config(ref m) if m.contains(ENV_API_KEY)));

        let err = ServiceCredentials::resolve(
            lookup(&[(ENV_SERVICE_URL, "https://x"), (ENV_API_KEY, "key"), (ENV_PROJECT_ID, "  ")]),
            &settings,
        )
        .unwrap_err();
        assert!(matches!(err, TubeqaError::Config(ref m) if m.contains(ENV_PROJECT_ID)));

        let err = ServiceCredentials::resolve(lookup(&[]), &settings).unwrap_err();
        assert!(matches!(err, TubeqaError::Config(ref m) if m.contains(ENV_SERVICE_URL)));
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("short"), "****");
        assert_eq!(mask_secret("abcd1234567890wxyz"), "abcd...wxyz");
    }
}
