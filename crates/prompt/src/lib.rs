//! Prompt system for DocForge.
//!
//! This crate provides structured prompt management with:
//! - Built-in and YAML-based prompt definitions
//! - Handlebars template rendering
//! - Workspace overrides under `.docforge/prompts/`

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{build_prompt, render_template};
pub use loader::{list_prompts, load_prompt, load_prompt_or_builtin};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition, PromptOutputSpec};
