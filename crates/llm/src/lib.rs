//! LLM integration crate for DocForge.
//!
//! This crate provides a provider-agnostic abstraction for interacting with
//! Large Language Models (LLMs). The knowledge engine only ever asks for one
//! thing: a completion for a system prompt plus a user prompt.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **OpenAI**: Any Chat Completions compatible server
//! - **Fallback**: An ordered chain of the above
//!
//! # Example
//! ```no_run
//! use docforge_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3.2")
//!     .with_system("Answer briefly");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod fallback;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::{client_from_config, create_client};
pub use fallback::{ChainedClient, FallbackClient};
pub use providers::{OllamaClient, OpenAiClient};
pub use types::ProviderType;
