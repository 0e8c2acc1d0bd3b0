//! Document and article type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Unstructured input handed to the engine by the host application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDocument {
    /// Extracted text or HTML
    pub content: String,

    /// Caller-supplied metadata (at least `original_filename`)
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl RawDocument {
    pub fn new(content: impl Into<String>, metadata: Map<String, Value>) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// Create a document with only an `original_filename`.
    pub fn with_filename(content: impl Into<String>, filename: &str) -> Self {
        let mut metadata = Map::new();
        metadata.insert(
            "original_filename".to_string(),
            Value::String(filename.to_string()),
        );
        Self::new(content, metadata)
    }

    pub fn original_filename(&self) -> &str {
        self.metadata
            .get("original_filename")
            .and_then(Value::as_str)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or("document")
    }
}

/// Publication state of a generated article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Published,
    Draft,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatus::Published => "published",
            ArticleStatus::Draft => "draft",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "published" => Some(ArticleStatus::Published),
            "draft" => Some(ArticleStatus::Draft),
            _ => None,
        }
    }
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A generated knowledge-base article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,

    pub title: String,

    /// HTML body, wrapped in `<div class="article-body">`
    pub content: String,

    pub status: ArticleStatus,

    /// Content-type label of the source document
    pub article_type: String,

    /// Original filename of the source document
    pub source_document: String,

    pub tags: Vec<String>,

    pub created_at: DateTime<Utc>,

    /// Free-form processing metadata
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Article {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        article_type: impl Into<String>,
        source_document: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content: content.into(),
            status: ArticleStatus::Published,
            article_type: article_type.into(),
            source_document: source_document.into(),
            tags: Vec::new(),
            created_at: Utc::now(),
            metadata: Map::new(),
        }
    }

    /// Generation path recorded by the generator, when present.
    pub fn is_fallback(&self) -> bool {
        self.tags.iter().any(|t| t == "fallback-generated")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_original_filename_default() {
        let doc = RawDocument::new("text", Map::new());
        assert_eq!(doc.original_filename(), "document");

        let doc = RawDocument::with_filename("text", "guide.pdf");
        assert_eq!(doc.original_filename(), "guide.pdf");
    }

    #[test]
    fn test_article_serializes_status_lowercase() {
        let article = Article::new("Title", "<div class=\"article-body\"></div>", "tutorial", "a.md");
        let json = serde_json::to_value(&article).unwrap();
        assert_eq!(json["status"], "published");
        assert_eq!(json["article_type"], "tutorial");
        assert!(!article.is_fallback());
    }
}
