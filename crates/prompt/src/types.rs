//! Prompt types for DocForge.
//!
//! This module defines the domain entities for the prompt system.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A prompt definition, either built in or loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Creator identifier
    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    /// Optional system message template (Handlebars)
    #[serde(rename = "systemTemplate", default, skip_serializing_if = "Option::is_none")]
    pub system_template: Option<String>,

    /// User message template (Handlebars)
    pub template: String,

    /// Output specification
    #[serde(default)]
    pub output: PromptOutputSpec,
}

impl PromptDefinition {
    /// Create a built-in definition with a user template only.
    pub fn builtin(id: impl Into<String>, title: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            api_version: "1.0".to_string(),
            created_by: "docforge".to_string(),
            system_template: None,
            template: template.into(),
            output: PromptOutputSpec::default(),
        }
    }
}

/// Output specification for the prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptOutputSpec {
    /// Output format (e.g., "html", "markdown", "text")
    pub format: String,
}

impl Default for PromptOutputSpec {
    fn default() -> Self {
        Self {
            format: "html".to_string(),
        }
    }
}

/// A fully built prompt ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message (required)
    pub user: String,

    /// Metadata about the built prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    /// Source prompt ID
    #[serde(rename = "sourcePromptId")]
    pub source_prompt_id: String,

    /// Template variables that were resolved
    #[serde(rename = "resolvedVariables")]
    pub resolved_variables: HashMap<String, String>,
}

impl BuiltPrompt {
    /// Create a new built prompt.
    pub fn new(
        system: Option<String>,
        user: String,
        source_prompt_id: String,
        resolved_variables: HashMap<String, String>,
    ) -> Self {
        Self {
            system,
            user,
            metadata: BuiltPromptMetadata {
                source_prompt_id,
                resolved_variables,
            },
        }
    }
}
