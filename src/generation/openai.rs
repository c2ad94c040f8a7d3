//! Generation through an OpenAI-compatible chat completions endpoint.

use super::{GenerationParams, Generator};
use crate::config::{GenerationSettings, ServiceCredentials};
use crate::error::{Result, TubeqaError};
use crate::openai::{create_client_with_timeout, OpenAIClient};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// Generator that sends the prompt as a single user message.
pub struct OpenAIGenerator {
    client: OpenAIClient,
    model: String,
    timeout: Duration,
}

impl OpenAIGenerator {
    pub fn new(credentials: &ServiceCredentials, settings: &GenerationSettings) -> Result<Self> {
        let timeout = Duration::from_secs(settings.timeout_seconds.max(1));
        Ok(Self {
            // HTTP timeout is a backstop; the generation deadline is enforced below
            client: create_client_with_timeout(credentials, timeout + Duration::from_secs(5))?,
            model: settings.model.clone(),
            timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| TubeqaError::Generation(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(params.effective_temperature())
            .max_completion_tokens(params.max_new_tokens)
            .build()
            .map_err(|e| TubeqaError::Generation(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| TubeqaError::Generation(format!("Failed to generate response: {}", e)))?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| TubeqaError::Generation("Empty response from LLM".to_string()))?;

        Ok(text)
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    #[instrument(skip(self, prompt, params), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String> {
        params.validate()?;

        let text = tokio::time::timeout(self.timeout, self.complete(prompt, params))
            .await
            .map_err(|_| TubeqaError::GenerationTimeout(self.timeout.as_secs()))??;

        debug!("Generated {} chars", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{rate_limited, serve_stub};
    use axum::{routing::post, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio_test::assert_err;

    fn credentials() -> ServiceCredentials {
        ServiceCredentials {
            url: "http://localhost:9/v1".to_string(),
            api_key: "test-key".to_string(),
            project_id: "test-project".to_string(),
        }
    }

    #[test]
    fn test_generator_creation() {
        let generator = OpenAIGenerator::new(&credentials(), &GenerationSettings::default()).unwrap();
        assert_eq!(generator.model(), "meta-llama/llama-3-2-3b-instruct");
        assert_eq!(generator.timeout, Duration::from_secs(120));
    }

    #[tokio::test]
    async fn test_invalid_params_fail_before_request() {
        let generator = OpenAIGenerator::new(&credentials(), &GenerationSettings::default()).unwrap();
        let params = GenerationParams {
            max_new_tokens: 0,
            ..GenerationParams::default()
        };
        let err = generator.generate("hi", &params).await.unwrap_err();
        assert!(matches!(err, TubeqaError::InvalidInput(_)));
    }

    fn settings(timeout_seconds: u64) -> GenerationSettings {
        GenerationSettings {
            model: "stub-model".to_string(),
            timeout_seconds,
            ..GenerationSettings::default()
        }
    }

    #[tokio::test]
    async fn test_rate_limit_fails_without_retry() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let credentials = serve_stub(Router::new().route(
            "/v1/chat/completions",
            post(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { rate_limited() }
            }),
        ))
        .await;
        let generator = OpenAIGenerator::new(&credentials, &settings(3)).unwrap();

        let err = assert_err!(
            generator
                .generate("Summarize this.", &GenerationParams::default())
                .await
        );
        assert!(matches!(err, TubeqaError::Generation(_)), "got {:?}", err);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slow_service_hits_deadline() {
        let credentials = serve_stub(Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                rate_limited()
            }),
        ))
        .await;
        let generator = OpenAIGenerator::new(&credentials, &settings(1)).unwrap();

        let err = assert_err!(
            generator
                .generate("Summarize this.", &GenerationParams::default())
                .await
        );
        assert!(matches!(err, TubeqaError::GenerationTimeout(1)), "got {:?}", err);
    }
}
