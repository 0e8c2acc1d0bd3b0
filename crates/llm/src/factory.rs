//! LLM provider factory.
//!
//! This module creates LLM clients from provider names or from the
//! application configuration, including the fallback chain.

use crate::client::LlmClient;
use crate::fallback::{ChainedClient, FallbackClient};
use crate::providers::{OllamaClient, OpenAiClient};
use crate::types::ProviderType;
use docforge_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("openai", "ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - Optional API key (for providers that require it)
/// * `timeout` - Optional bound on each HTTP request
///
/// # Errors
/// Returns error if:
/// - Provider is unknown
/// - Required secrets are missing
/// - Client initialization fails
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Option<Duration>,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;
    let base_url = endpoint.unwrap_or(provider_type.default_endpoint());

    match provider_type {
        ProviderType::Ollama => {
            let client = match timeout {
                Some(timeout) => OllamaClient::with_timeout(base_url, timeout)?,
                None => OllamaClient::with_base_url(base_url),
            };
            Ok(Arc::new(client))
        }
        ProviderType::OpenAI => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("OpenAI provider requires API key".to_string())
            })?;
            let mut client = OpenAiClient::with_base_url(api_key, base_url);
            if let Some(timeout) = timeout {
                client = client.with_timeout(timeout)?;
            }
            Ok(Arc::new(client))
        }
    }
}

/// Build the client described by the configuration.
///
/// The active provider comes first; configured fallback providers follow in
/// order, each pinned to its own model. A single provider is returned as-is.
pub fn client_from_config(config: &AppConfig) -> AppResult<Arc<dyn LlmClient>> {
    let timeout = Duration::from_secs(config.engine.llm_timeout_secs);
    let mut chain = Vec::new();

    for provider in std::iter::once(config.provider.clone()).chain(config.fallback_providers()) {
        let provider_config = config.get_provider_config(&provider);
        let endpoint = provider_config.and_then(|p| p.endpoint());
        let api_key = config.resolve_api_key(&provider);

        let client = create_client(&provider, endpoint, api_key.as_deref(), Some(timeout))?;
        let mut entry = ChainedClient::new(client);
        if provider != config.provider {
            if let Some(p) = provider_config {
                entry = entry.with_model(p.model());
            }
        }
        chain.push(entry);
    }

    tracing::debug!(providers = chain.len(), "Built LLM client chain");

    if chain.len() == 1 {
        return Ok(chain.remove(0).client);
    }

    Ok(Arc::new(FallbackClient::new(chain)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", None, None, None).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_create_ollama_with_custom_endpoint() {
        let client = create_client(
            "ollama",
            Some("http://localhost:8080"),
            None,
            Some(Duration::from_secs(5)),
        );
        assert!(client.is_ok());
    }

    #[test]
    fn test_openai_requires_api_key() {
        match create_client("openai", None, None, None) {
            Err(err) => assert!(err.to_string().contains("OpenAI provider requires API key")),
            Ok(_) => panic!("Expected error for OpenAI without API key"),
        }
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", None, None, None) {
            Err(err) => assert!(err.to_string().contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }

    #[test]
    fn test_client_from_default_config() {
        let config = AppConfig::default();
        let client = client_from_config(&config).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }
}
