//! OpenAI-compatible client configuration with sensible defaults.

use crate::config::LlmSettings;
use crate::error::{CompassError, Result};
use async_openai::{config::OpenAIConfig, Client};
use std::time::Duration;

/// Default timeout for API requests (5 minutes).
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Environment variable holding the OpenAI key used for transcription.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Create an OpenAI client (used for Whisper transcription).
///
/// Reads `OPENAI_API_KEY` from the environment like the upstream SDK does.
pub fn create_client() -> Result<Client<OpenAIConfig>> {
    build_client(OpenAIConfig::default(), Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

/// Create a chat client for the configured LLM provider.
///
/// DeepSeek exposes an OpenAI-compatible API, so only the base URL and key differ.
pub fn create_chat_client(settings: &LlmSettings) -> Result<Client<OpenAIConfig>> {
    let key_env = settings.resolved_api_key_env();
    let api_key = std::env::var(&key_env).map_err(|_| {
        CompassError::Config(format!("{} not set. Set it with: export {}='...'", key_env, key_env))
    })?;

    let config = OpenAIConfig::new()
        .with_api_key(api_key)
        .with_api_base(settings.resolved_api_base());

    build_client(config, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
}

fn build_client(config: OpenAIConfig, timeout: Duration) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Client::with_config(config).with_http_client(http_client))
}
