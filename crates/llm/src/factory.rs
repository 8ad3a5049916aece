//! LLM provider factory.
//!
//! This module provides a factory for creating LLM clients based on
//! application configuration.

use crate::client::LlmClient;
use crate::providers::ollama::DEFAULT_TIMEOUT_SECS;
use crate::providers::OllamaClient;
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - Optional API key (unused by local providers)
/// * `timeout_secs` - Optional request timeout, defaults to 120 seconds
///
/// # Returns
/// A shared trait object implementing `LlmClient`
///
/// # Errors
/// Returns error if the provider is unknown.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout_secs: Option<u64>,
) -> Result<Arc<dyn LlmClient>, String> {
    match provider.to_lowercase().as_str() {
        "ollama" => {
            if api_key.is_some() {
                tracing::debug!("Ignoring API key for local Ollama provider");
            }
            let base_url = endpoint.unwrap_or("http://localhost:11434");
            let timeout = Duration::from_secs(timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
            let client = OllamaClient::with_timeout(base_url, timeout);
            Ok(Arc::new(client))
        }
        _ => Err(format!("Unknown provider: {}", provider)),
    }
}
