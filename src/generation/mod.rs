//! Text generation from rendered prompts.

mod openai;

pub use openai::OpenAIGenerator;

use crate::error::{Result, TubeqaError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// How the next token is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodingMethod {
    /// Always the most likely token. Deterministic.
    #[default]
    Greedy,
    /// Sample with the configured temperature.
    Sampling,
}

impl std::str::FromStr for DecodingMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "greedy" => Ok(DecodingMethod::Greedy),
            "sampling" | "sample" => Ok(DecodingMethod::Sampling),
            _ => Err(format!("Unknown decoding method: {}", s)),
        }
    }
}

impl std::fmt::Display for DecodingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodingMethod::Greedy => write!(f, "greedy"),
            DecodingMethod::Sampling => write!(f, "sampling"),
        }
    }
}

/// Per-request generation parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub decoding_method: DecodingMethod,
    pub max_new_tokens: u32,
    /// Only used with [`DecodingMethod::Sampling`].
    pub temperature: f32,
}

impl GenerationParams {
    pub fn validate(&self) -> Result<()> {
        if self.max_new_tokens == 0 {
            return Err(TubeqaError::InvalidInput(
                "max_new_tokens must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Temperature actually sent to the model.
    pub fn effective_temperature(&self) -> f32 {
        match self.decoding_method {
            DecodingMethod::Greedy => 0.0,
            DecodingMethod::Sampling => self.temperature,
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            decoding_method: DecodingMethod::Greedy,
            max_new_tokens: 900,
            temperature: 0.7,
        }
    }
}

/// Trait for language model backends.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Complete `prompt` and return the raw completion text.
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = GenerationParams::default();
        assert_eq!(params.decoding_method, DecodingMethod::Greedy);
        assert_eq!(params.max_new_tokens, 900);
        assert_eq!(params.effective_temperature(), 0.0);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_sampling_uses_temperature() {
        let params = GenerationParams {
            decoding_method: DecodingMethod::Sampling,
            temperature: 0.4,
            ..GenerationParams::default()
        };
        assert_eq!(params.effective_temperature(), 0.4);
    }

    #[test]
    fn test_zero_tokens_rejected() {
        let params = GenerationParams {
            max_new_tokens: 0,
            ..GenerationParams::default()
        };
        assert!(matches!(params.validate(), Err(TubeqaError::InvalidInput(_))));
    }

    #[test]
    fn test_decoding_method_parse() {
        assert_eq!("Greedy".parse::<DecodingMethod>().unwrap(), DecodingMethod::Greedy);
        assert_eq!("sampling".parse::<DecodingMethod>().unwrap(), DecodingMethod::Sampling);
        assert!("beam".parse::<DecodingMethod>().is_err());
    }
}
