//! Pipeline tests with a scripted LLM.

mod pipeline;

use crate::generate::prompts::{SOURCE_END, SOURCE_START};
use docforge_core::{AppError, AppResult};
use docforge_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How the mock answers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum MockMode {
    /// Return the embedded source wrapped in an article body
    Echo,
    /// Echo the source and add an endpoint the source never mentions
    InventPath,
    /// Answer with whitespace only
    Empty,
    /// Fail every call
    Fail,
    /// Never answer within any reasonable timeout
    Stall,
}

/// Scripted LLM that records every request.
pub(crate) struct MockLlm {
    mode: MockMode,
    calls: Mutex<Vec<LlmRequest>>,
}

impl MockLlm {
    pub(crate) fn new(mode: MockMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn calls(&self) -> Vec<LlmRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

/// The source block of a rendered user prompt, or the whole prompt.
fn embedded_source(prompt: &str) -> &str {
    let Some(start) = prompt.find(SOURCE_START) else {
        return prompt;
    };
    let body = &prompt[start + SOURCE_START.len()..];
    match body.find(SOURCE_END) {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

#[async_trait::async_trait]
impl LlmClient for MockLlm {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.calls.lock().unwrap().push(request.clone());

        if self.mode == MockMode::Stall {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }

        let source = embedded_source(&request.prompt);
        let content = match self.mode {
            MockMode::Echo => format!("<div class=\"article-body\">\n{}\n</div>", source),
            MockMode::InventPath => format!(
                "<div class=\"article-body\">\n<p>{}</p>\n\
                 <p>Administrators can also call POST /admin/secret-reset to wipe accounts.</p>\n</div>",
                source
            ),
            MockMode::Empty | MockMode::Stall => "   ".to_string(),
            MockMode::Fail => return Err(AppError::Llm("connection refused".to_string())),
        };

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::new(10, 10),
            done: true,
        })
    }
}

pub(crate) fn metadata(filename: &str) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("original_filename".into(), Value::String(filename.to_string()));
    metadata
}

/// About 315 words of prose that matches no content-type pattern.
pub(crate) fn plain_prose() -> String {
    let paragraph = "The river valley held quiet farms and old stone walls. \
                     Morning light moved slowly across the wheat fields. \
                     Children walked along the dusty road toward the small village school. \
                     Birds gathered on the fences near the orchard. \
                     Evening brought cool air from the distant hills.";
    vec![paragraph; 7].join("\n\n")
}

/// About 6000 words of API reference under twelve `##` headings.
pub(crate) fn api_reference() -> String {
    let resources = [
        "users", "orders", "invoices", "products", "carts", "payments", "shipments", "reviews",
        "coupons", "addresses", "sessions", "webhooks",
    ];

    let mut doc = String::new();
    for resource in resources {
        doc.push_str(&format!("## The {} endpoint\n\n", resource));
        for _ in 0..12 {
            doc.push_str(&format!(
                "Send POST /{r} with a JSON request body and a Bearer token in the authorization header. \
                 The endpoint returns a JSON response with the stored {r} record and its identifier. \
                 Query parameters filter the {r} collection when you call GET /{r} over HTTPS.\n\n",
                r = resource
            ));
        }
    }
    doc
}

/// A short API page, well under the split threshold.
pub(crate) fn short_api_page() -> String {
    "## Users\n\n\
     POST /users creates a user account from a JSON request body. \
     Send a Bearer token in the authorization header.\n\n\
     GET /users/{id} returns the JSON response for one account. \
     The endpoint answers with the stored record and its identifier.\n"
        .to_string()
}
