//! OpenAI-compatible client configuration.
//!
//! Both the embedding and generation capabilities talk to the endpoint named
//! by the service credentials; the project id is sent with every request.

use crate::config::ServiceCredentials;
use crate::error::Result;
use async_openai::{config::OpenAIConfig, Client};
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::time::Duration;

/// Default timeout for API requests (5 minutes).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Shorthand for the configured client type.
pub type OpenAIClient = Client<OpenAIConfig>;

/// Build the client configuration for the given credentials.
pub fn client_config(credentials: &ServiceCredentials) -> OpenAIConfig {
    OpenAIConfig::new()
        .with_api_base(&credentials.url)
        .with_api_key(&credentials.api_key)
        .with_project_id(&credentials.project_id)
}

/// Backoff policy that gives up on the first failure.
///
/// Rate limits and server errors surface to the caller unchanged.
fn no_retry() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

/// Create a client with a custom HTTP timeout.
pub fn create_client_with_timeout(
    credentials: &ServiceCredentials,
    timeout: Duration,
) -> Result<OpenAIClient> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;

    Ok(Client::with_config(client_config(credentials))
        .with_http_client(http_client)
        .with_backoff(no_retry()))
}
