//! Post-processing of generated articles into enhanced HTML.
//!
//! Transforms run in a fixed order and are independently fail-safe: a
//! transform that returns `Err` leaves the article as it was before that
//! transform and the pipeline moves on.

pub mod callouts;
pub mod code;
pub mod formatter;
pub mod related;
pub mod tables;
pub mod toc;

pub use formatter::{BaseFormatter, StandardFormatter};

use crate::analysis::{ContentAnalysis, ContentFeatures};
use crate::strategy::{ContentType, EnhancementRule};
use crate::types::Article;
use chrono::Utc;
use docforge_core::AppResult;
use serde_json::json;
use std::sync::Arc;

/// What a transform knows about the article being enhanced.
#[derive(Debug, Clone, Copy)]
pub struct EnhanceContext<'a> {
    pub content_type: ContentType,
    pub features: &'a ContentFeatures,
    pub source: &'a str,
}

impl<'a> EnhanceContext<'a> {
    pub fn new(content_type: ContentType, features: &'a ContentFeatures, source: &'a str) -> Self {
        Self {
            content_type,
            features,
            source,
        }
    }
}

pub type TransformFn = fn(&str, &EnhanceContext<'_>) -> AppResult<String>;

struct Transform {
    name: &'static str,
    applies: fn(&EnhanceContext<'_>) -> bool,
    apply: TransformFn,
}

fn has_tables(ctx: &EnhanceContext<'_>) -> bool {
    ctx.features.has_tables
}

fn has_code(ctx: &EnhanceContext<'_>) -> bool {
    ctx.features.has_code_examples
}

fn has_type_rule(ctx: &EnhanceContext<'_>) -> bool {
    ctx.content_type.strategy().enhancement != EnhancementRule::None
}

fn always(_ctx: &EnhanceContext<'_>) -> bool {
    true
}

const TRANSFORMS: &[Transform] = &[
    Transform {
        name: "tables",
        applies: has_tables,
        apply: tables::enhance_tables,
    },
    Transform {
        name: "code_blocks",
        applies: has_code,
        apply: code::enhance_code_blocks,
    },
    Transform {
        name: "type_specific",
        applies: has_type_rule,
        apply: callouts::enhance_for_type,
    },
    Transform {
        name: "table_of_contents",
        applies: always,
        apply: toc::add_table_of_contents,
    },
];

/// Runs the formatter and the ordered transforms over generated articles.
pub struct ContentEnhancer {
    formatter: Arc<dyn BaseFormatter>,
}

impl Default for ContentEnhancer {
    fn default() -> Self {
        Self::new(Arc::new(StandardFormatter))
    }
}

impl ContentEnhancer {
    pub fn new(formatter: Arc<dyn BaseFormatter>) -> Self {
        Self { formatter }
    }

    pub fn formatter_name(&self) -> &str {
        self.formatter.name()
    }

    /// Enhance every article in place and cross-link them.
    pub fn enhance(&self, articles: &mut [Article], source: &str, analysis: &ContentAnalysis) {
        let ctx = EnhanceContext::new(
            analysis.classification.primary_type,
            &analysis.classification.content_features,
            source,
        );

        let mut applied_per_article = Vec::with_capacity(articles.len());
        for article in articles.iter_mut() {
            let applied = self.enhance_article(article, &ctx);
            applied_per_article.push(applied);
        }

        let related_count = related::add_related_articles(articles);
        if related_count > 0 {
            tracing::debug!("Cross-linked {} articles", articles.len());
        }

        let enhanced_at = Utc::now().to_rfc3339();
        for (article, mut applied) in articles.iter_mut().zip(applied_per_article) {
            if related_count > 0 {
                applied.push("related_articles".to_string());
            }
            article.metadata.insert(
                "post_processing".into(),
                json!({
                    "enhanced_at": enhanced_at,
                    "transforms": applied,
                    "cross_references_added": related_count > 0,
                    "related_count": related_count,
                }),
            );
        }
    }

    /// Apply the formatter and transforms to one article, returning the
    /// names of the steps that changed it.
    fn enhance_article(&self, article: &mut Article, ctx: &EnhanceContext<'_>) -> Vec<String> {
        let mut applied = Vec::new();

        match self.formatter.enhance(&article.content, ctx.source) {
            Ok(html) => {
                if html != article.content {
                    applied.push(format!("formatter:{}", self.formatter.name()));
                    article.content = html;
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Formatter '{}' failed on '{}', keeping content: {}",
                    self.formatter.name(),
                    article.title,
                    e
                );
            }
        }

        for transform in TRANSFORMS {
            if !(transform.applies)(ctx) {
                continue;
            }
            match (transform.apply)(&article.content, ctx) {
                Ok(html) => {
                    if html != article.content {
                        applied.push(transform.name.to_string());
                        article.content = html;
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        "Enhancement '{}' failed on '{}', keeping content: {}",
                        transform.name,
                        article.title,
                        e
                    );
                }
            }
        }

        applied
    }
}
