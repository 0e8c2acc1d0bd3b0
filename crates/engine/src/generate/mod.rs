//! Article generation from analyzed documents.
//!
//! One LLM call per planned article, a fidelity check with at most one strict
//! retry, and deterministic fallback content when the LLM produces nothing
//! usable. Every planned article is always produced.

pub mod cleaning;
pub mod fallback;
pub mod fidelity;
pub mod prompts;
pub mod sections;

use crate::analysis::{ContentAnalysis, ProcessingApproach};
use crate::text::{clean_filename, content_hash, truncate_chars};
use crate::types::{Article, RawDocument};
use cleaning::clean_generated_html;
use docforge_core::EngineSettings;
use docforge_llm::{LlmClient, LlmRequest};
use docforge_prompt::PromptDefinition;
use fallback::fallback_article_html;
use fidelity::validate_fidelity;
use prompts::{build_system_prompt, build_user_prompt, strict_system_prompt, PromptInputs};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;

/// Cleaned output shorter than this is replaced by fallback content.
pub const MIN_ARTICLE_CHARS: usize = 100;

/// Generation parameters derived from configuration.
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub llm_timeout: Duration,
    pub max_source_chars: usize,
    pub engine_version: String,
}

impl GenerationSettings {
    pub fn from_engine_settings(model: impl Into<String>, settings: &EngineSettings) -> Self {
        Self {
            model: model.into(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            llm_timeout: Duration::from_secs(settings.llm_timeout_secs),
            max_source_chars: settings.max_source_chars,
            engine_version: settings.engine_version.clone(),
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self::from_engine_settings("llama3.2", &EngineSettings::default())
    }
}

/// How an article body was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodySource {
    /// First answer passed the fidelity check
    Verified,
    /// Second answer after a failed check, accepted as is
    Retried,
    Fallback,
}

impl BodySource {
    fn fidelity_confidence(&self) -> f64 {
        match self {
            BodySource::Verified => 0.95,
            BodySource::Retried => 0.75,
            BodySource::Fallback => 0.5,
        }
    }
}

struct ArticleBody {
    html: String,
    source: BodySource,
    llm_calls: usize,
}

/// One planned article: the slice of source it covers and its position.
struct ArticlePlan<'a> {
    source: &'a str,
    section_title: Option<&'a str>,
    index: usize,
    count: usize,
    unified: bool,
}

impl ArticlePlan<'_> {
    /// The approach this article was actually produced under.
    fn approach(&self, analysis: &ContentAnalysis) -> ProcessingApproach {
        if self.unified {
            ProcessingApproach::Unified
        } else {
            analysis.granularity.recommended_approach
        }
    }
}

/// Turns an analyzed document into articles.
pub struct ArticleGenerator {
    llm: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    settings: GenerationSettings,
}

impl ArticleGenerator {
    pub fn new(llm: Arc<dyn LlmClient>, prompt: PromptDefinition, settings: GenerationSettings) -> Self {
        Self {
            llm,
            prompt,
            settings,
        }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Generate the planned articles for a document.
    ///
    /// Never returns an empty list for non-empty content: a failed split falls
    /// back to a single unified article, and every article falls back to
    /// deterministic content when the LLM fails.
    pub async fn generate(&self, document: &RawDocument, analysis: &ContentAnalysis) -> Vec<Article> {
        let approach = analysis.granularity.recommended_approach;

        if approach.is_split() {
            match sections::split_sections(
                &document.content,
                analysis.granularity.article_estimate,
            ) {
                Ok(sections) if sections.len() > 1 => {
                    let count = sections.len();
                    let mut articles = Vec::with_capacity(count);
                    for (index, section) in sections.iter().enumerate() {
                        let plan = ArticlePlan {
                            source: &section.body,
                            section_title: section.title.as_deref(),
                            index,
                            count,
                            unified: false,
                        };
                        articles.push(self.generate_article(document, analysis, &plan).await);
                    }
                    return articles;
                }
                Ok(_) => {
                    tracing::debug!("Content has a single section, generating a unified article");
                }
                Err(e) => {
                    tracing::warn!("Section splitting failed, generating a unified article: {}", e);
                }
            }
        }

        let plan = ArticlePlan {
            source: &document.content,
            section_title: None,
            index: 0,
            count: 1,
            unified: true,
        };
        vec![self.generate_article(document, analysis, &plan).await]
    }

    async fn generate_article(
        &self,
        document: &RawDocument,
        analysis: &ContentAnalysis,
        plan: &ArticlePlan<'_>,
    ) -> Article {
        let content_type = analysis.classification.primary_type;
        let document_title = clean_filename(document.original_filename());

        let title = if plan.unified {
            format!("{} - Complete Guide", document_title)
        } else {
            match plan.section_title {
                Some(section) => format!("{} - {}", document_title, section),
                None => format!("{} - Part {}", document_title, plan.index + 1),
            }
        };

        let body = self.generate_body(analysis, &document_title, plan).await;

        tracing::info!(
            "Generated article {}/{} '{}' ({:?})",
            plan.index + 1,
            plan.count,
            title,
            body.source
        );

        let mut article = Article::new(
            title,
            body.html,
            content_type.as_str(),
            document.original_filename(),
        );

        article.tags = vec![
            content_type.as_str().to_string(),
            plan.approach(analysis).as_str().to_string(),
            "docforge-engine".to_string(),
            format!("v{}", self.settings.engine_version),
            if body.source == BodySource::Fallback {
                "fallback-generated".to_string()
            } else {
                "llm-generated".to_string()
            },
        ];

        article.metadata = self.article_metadata(
            document,
            analysis,
            plan,
            &article.content,
            body.source,
            body.llm_calls,
        );
        article
    }

    /// LLM path with one strict retry, falling back to deterministic content.
    async fn generate_body(
        &self,
        analysis: &ContentAnalysis,
        document_title: &str,
        plan: &ArticlePlan<'_>,
    ) -> ArticleBody {
        let content_type = analysis.classification.primary_type;
        let fallback = |llm_calls: usize| ArticleBody {
            html: fallback_article_html(plan.source, content_type, document_title),
            source: BodySource::Fallback,
            llm_calls,
        };

        let inputs = PromptInputs {
            document_title,
            section_title: plan.section_title,
            article_position: plan.index + 1,
            article_count: plan.count,
            source_content: truncate_chars(plan.source, self.settings.max_source_chars),
        };

        let built = match build_user_prompt(&self.prompt, analysis, &inputs) {
            Ok(built) => built,
            Err(e) => {
                tracing::warn!("Failed to build article prompt: {}", e);
                return fallback(0);
            }
        };
        let system = built
            .system
            .clone()
            .unwrap_or_else(|| build_system_prompt(analysis));

        let Some(first) = self.complete(&system, &built.user).await else {
            return fallback(1);
        };

        let report = validate_fidelity(plan.source, &first, content_type);
        let (raw, source, llm_calls) = if report.passed() {
            (first, BodySource::Verified, 1)
        } else {
            tracing::warn!(
                "Fidelity check failed for article {}: {}",
                plan.index + 1,
                report.violations.join("; ")
            );
            let Some(second) = self
                .complete(&strict_system_prompt(&system), &built.user)
                .await
            else {
                return fallback(2);
            };
            (second, BodySource::Retried, 2)
        };

        let html = clean_generated_html(&raw, content_type.strategy().cleaning);
        if html.chars().count() < MIN_ARTICLE_CHARS {
            tracing::warn!(
                "Cleaned article {} is too short ({} chars), using fallback content",
                plan.index + 1,
                html.chars().count()
            );
            return fallback(llm_calls);
        }

        ArticleBody {
            html,
            source,
            llm_calls,
        }
    }

    /// One bounded LLM call; errors, timeouts and empty answers become `None`.
    async fn complete(&self, system: &str, user: &str) -> Option<String> {
        let request = LlmRequest::new(user, self.settings.model.as_str())
            .with_system(system)
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);

        match tokio::time::timeout(self.settings.llm_timeout, self.llm.complete(&request)).await {
            Ok(Ok(response)) if !response.is_empty() => Some(response.content),
            Ok(Ok(_)) => {
                tracing::warn!("LLM ({}) returned empty content", self.llm.provider_name());
                None
            }
            Ok(Err(e)) => {
                tracing::warn!("LLM ({}) call failed: {}", self.llm.provider_name(), e);
                None
            }
            Err(_) => {
                tracing::warn!(
                    "LLM ({}) call timed out after {:?}",
                    self.llm.provider_name(),
                    self.settings.llm_timeout
                );
                None
            }
        }
    }

    fn article_metadata(
        &self,
        document: &RawDocument,
        analysis: &ContentAnalysis,
        plan: &ArticlePlan<'_>,
        html: &str,
        source: BodySource,
        llm_calls: usize,
    ) -> Map<String, Value> {
        let original_length = plan.source.chars().count();
        let generated_length = html.chars().count();
        let ratio = if original_length == 0 {
            0.0
        } else {
            generated_length as f64 / original_length as f64
        };

        let mut metadata = Map::new();
        metadata.insert("engine_version".into(), json!(self.settings.engine_version));
        metadata.insert(
            "processing_approach".into(),
            json!(plan.approach(analysis).as_str()),
        );
        metadata.insert(
            "content_type".into(),
            json!(analysis.classification.primary_type.as_str()),
        );
        metadata.insert(
            "classification_confidence".into(),
            json!(analysis.classification.confidence_score),
        );
        metadata.insert(
            "fidelity_confidence".into(),
            json!(source.fidelity_confidence()),
        );
        metadata.insert(
            "fidelity_retry".into(),
            json!(source == BodySource::Retried),
        );
        metadata.insert(
            "structural_complexity".into(),
            json!(analysis.structure.structural_complexity),
        );
        metadata.insert("original_length".into(), json!(original_length));
        metadata.insert("generated_length".into(), json!(generated_length));
        metadata.insert(
            "enhancement_ratio".into(),
            json!((ratio * 100.0).round() / 100.0),
        );
        metadata.insert("article_index".into(), json!(plan.index + 1));
        metadata.insert("article_count".into(), json!(plan.count));
        if let Some(section) = plan.section_title {
            metadata.insert("section_title".into(), json!(section));
        }
        metadata.insert("source_hash".into(), json!(content_hash(&document.content)));
        metadata.insert("llm_calls".into(), json!(llm_calls));
        metadata
    }
}
