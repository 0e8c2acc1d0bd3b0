//! Fallback provider chain.
//!
//! Tries a list of providers in order and returns the first non-empty
//! completion. A provider error or an empty answer moves on to the next
//! provider; only when every provider has been exhausted does the chain
//! report the last failure.

use crate::client::{LlmClient, LlmRequest, LlmResponse};
use docforge_core::{AppError, AppResult};
use std::sync::Arc;

/// A provider in the chain, optionally pinned to its own model.
#[derive(Clone)]
pub struct ChainedClient {
    pub client: Arc<dyn LlmClient>,
    /// Replaces `LlmRequest::model` when set
    pub model: Option<String>,
}

impl ChainedClient {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Ordered list of providers behind a single `LlmClient`.
pub struct FallbackClient {
    chain: Vec<ChainedClient>,
}

impl FallbackClient {
    pub fn new(chain: Vec<ChainedClient>) -> AppResult<Self> {
        if chain.is_empty() {
            return Err(AppError::Config(
                "Fallback chain needs at least one provider".to_string(),
            ));
        }
        Ok(Self { chain })
    }

    /// Number of providers in the chain.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }
}

#[async_trait::async_trait]
impl LlmClient for FallbackClient {
    fn provider_name(&self) -> &str {
        "fallback"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let mut last_error = None;
        let mut last_empty = None;

        for (attempt, entry) in self.chain.iter().enumerate() {
            let provider = entry.client.provider_name();
            let routed;
            let request = match &entry.model {
                Some(model) => {
                    routed = LlmRequest {
                        model: model.clone(),
                        ..request.clone()
                    };
                    &routed
                }
                None => request,
            };

            match entry.client.complete(request).await {
                Ok(response) if !response.is_empty() => {
                    if attempt > 0 {
                        tracing::info!(provider, attempt, "Fallback provider answered");
                    }
                    return Ok(response);
                }
                Ok(response) => {
                    tracing::warn!(provider, "Provider returned empty content, trying next");
                    last_empty = Some(response);
                }
                Err(e) => {
                    tracing::warn!(provider, error = %e, "Provider failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        // An empty answer is still an answer; callers decide what it means.
        if let Some(response) = last_empty {
            return Ok(response);
        }

        Err(last_error
            .unwrap_or_else(|| AppError::Llm("No provider produced a response".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::LlmUsage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedClient {
        name: &'static str,
        answer: Option<&'static str>,
        calls: AtomicUsize,
        last_model: std::sync::Mutex<String>,
    }

    impl FixedClient {
        fn new(name: &'static str, answer: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                name,
                answer,
                calls: AtomicUsize::new(0),
                last_model: std::sync::Mutex::new(String::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for FixedClient {
        fn provider_name(&self) -> &str {
            self.name
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_model.lock().unwrap() = request.model.clone();
            match self.answer {
                Some(text) => Ok(LlmResponse {
                    content: text.to_string(),
                    model: request.model.clone(),
                    usage: LlmUsage::default(),
                    done: true,
                }),
                None => Err(AppError::Llm(format!("{} unavailable", self.name))),
            }
        }
    }

    #[test]
    fn test_empty_chain_rejected() {
        assert!(FallbackClient::new(Vec::new()).is_err());
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let primary = FixedClient::new("primary", Some("answer"));
        let secondary = FixedClient::new("secondary", Some("other"));
        let chain = FallbackClient::new(vec![
            ChainedClient::new(primary.clone()),
            ChainedClient::new(secondary.clone()),
        ])
        .unwrap();

        let response = chain.complete(&LlmRequest::new("p", "m")).await.unwrap();
        assert_eq!(response.content, "answer");
        assert_eq!(secondary.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_falls_through_errors_and_empty() {
        let failing = FixedClient::new("failing", None);
        let empty = FixedClient::new("empty", Some(""));
        let good = FixedClient::new("good", Some("finally"));
        let chain = FallbackClient::new(vec![
            ChainedClient::new(failing.clone()),
            ChainedClient::new(empty.clone()),
            ChainedClient::new(good.clone()).with_model("pinned-model"),
        ])
        .unwrap();

        let response = chain.complete(&LlmRequest::new("p", "m")).await.unwrap();
        assert_eq!(response.content, "finally");
        assert_eq!(*good.last_model.lock().unwrap(), "pinned-model");
        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
        assert_eq!(empty.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_all_failing_returns_error() {
        let chain = FallbackClient::new(vec![
            ChainedClient::new(FixedClient::new("a", None)),
            ChainedClient::new(FixedClient::new("b", None)),
        ])
        .unwrap();

        let result = chain.complete(&LlmRequest::new("p", "m")).await;
        assert!(matches!(result, Err(AppError::Llm(msg)) if msg.contains("b unavailable")));
    }
}
