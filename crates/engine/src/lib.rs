//! Knowledge engine.
//!
//! Turns extracted document content into enhanced, cross-linked HTML
//! knowledge-base articles: heuristic analysis, granularity planning,
//! LLM generation under fidelity checks, post-processing and persistence.

pub mod analysis;
pub mod enhance;
pub mod generate;
pub mod metrics;
pub mod persist;
pub mod store;
pub mod strategy;
pub mod text;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use analysis::{
    ClassificationResult, ContentAnalysis, ContentAnalyzer, ContentClassifier, ContentScorer,
    GranularityDecision, GranularityPlanner, OverridePolicy, ProcessingApproach,
    StructuralProfile,
};
pub use enhance::{BaseFormatter, ContentEnhancer, StandardFormatter};
pub use generate::{ArticleGenerator, GenerationSettings};
pub use metrics::{MetricsLog, MetricsSink, MetricsSummary, ProcessingMetrics};
pub use persist::PersistenceAdapter;
pub use store::{open_configured, DocumentStore, MemoryStore, SqliteStore};
pub use strategy::ContentType;
pub use types::{Article, ArticleStatus, RawDocument};

use docforge_core::{AppConfig, AppResult, EngineSettings};
use docforge_llm::{client_from_config, LlmClient};
use docforge_prompt::{load_prompt_or_builtin, PromptDefinition};
use generate::prompts::builtin_article_prompt;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::Instrument;

/// The document-to-articles pipeline.
///
/// Runs are independent and take `&self`; the metrics sink is the only state
/// shared between concurrent runs.
pub struct KnowledgeEngine {
    analyzer: ContentAnalyzer,
    generator: ArticleGenerator,
    enhancer: ContentEnhancer,
    persistence: PersistenceAdapter,
    metrics: Arc<dyn MetricsSink>,
}

impl KnowledgeEngine {
    pub fn builder(llm: Arc<dyn LlmClient>, store: Arc<dyn DocumentStore>) -> KnowledgeEngineBuilder {
        KnowledgeEngineBuilder::new(llm, store)
    }

    /// Build an engine from workspace configuration.
    ///
    /// The LLM client chain comes from the `llm` block, and the article
    /// prompt may be overridden by `.docforge/prompts/article.generate.yml`.
    pub fn from_config(config: &AppConfig, store: Arc<dyn DocumentStore>) -> AppResult<Self> {
        let llm = client_from_config(config)?;
        let prompt = load_prompt_or_builtin(&config.workspace, builtin_article_prompt());

        Ok(Self::builder(llm, store)
            .settings(config.engine.clone())
            .model(config.model.clone())
            .prompt(prompt)
            .build())
    }

    pub fn metrics(&self) -> &Arc<dyn MetricsSink> {
        &self.metrics
    }

    pub fn generation_settings(&self) -> &GenerationSettings {
        self.generator.settings()
    }

    /// Analyze content without generating anything.
    pub fn analyze(&self, content: &str, metadata: &Map<String, Value>) -> ContentAnalysis {
        self.analyzer.analyze(content, metadata)
    }

    /// Analyze, generate and enhance, without persisting.
    pub async fn generate_articles(&self, content: &str, metadata: Map<String, Value>) -> Vec<Article> {
        let document = RawDocument::new(content, metadata);
        if document.content.trim().is_empty() {
            tracing::error!("Cannot generate articles from empty content");
            return Vec::new();
        }

        let (articles, _) = self.build_articles(&document).await;
        articles
    }

    /// Run the full pipeline and return the persisted articles.
    ///
    /// Never fails: empty content yields no articles, and every stage falls
    /// back to a safe default on error.
    pub async fn process_content(&self, content: &str, metadata: Map<String, Value>) -> Vec<Article> {
        let document = RawDocument::new(content, metadata);
        self.process_document(&document).await
    }

    pub async fn process_document(&self, document: &RawDocument) -> Vec<Article> {
        let span = tracing::info_span!("process_content", source = document.original_filename());
        self.run(document).instrument(span).await
    }

    async fn run(&self, document: &RawDocument) -> Vec<Article> {
        if document.content.trim().is_empty() {
            tracing::error!("Cannot process empty content");
            return Vec::new();
        }

        let mut metrics = ProcessingMetrics::start(
            document.original_filename(),
            document.content.chars().count(),
            self.generator.settings().engine_version.as_str(),
        );
        tracing::info!(
            "Processing '{}' ({} chars)",
            document.original_filename(),
            metrics.content_length
        );

        let (articles, analysis) = self.build_articles(document).await;
        metrics.processing_approach =
            Some(analysis.granularity.recommended_approach.as_str().to_string());

        let persisted = self
            .persistence
            .persist(articles, &document.content, metrics)
            .await;

        tracing::info!(
            "Finished '{}': {} articles ({} approach)",
            document.original_filename(),
            persisted.len(),
            analysis.granularity.recommended_approach
        );
        persisted
    }

    async fn build_articles(&self, document: &RawDocument) -> (Vec<Article>, ContentAnalysis) {
        let analysis = self.analyzer.analyze(&document.content, &document.metadata);
        tracing::debug!(
            "Analysis: type={} confidence={:.2} approach={} estimate={}",
            analysis.classification.primary_type,
            analysis.classification.confidence_score,
            analysis.granularity.recommended_approach,
            analysis.granularity.article_estimate
        );

        let mut articles = self.generator.generate(document, &analysis).await;
        self.enhancer
            .enhance(&mut articles, &document.content, &analysis);
        (articles, analysis)
    }
}

/// Assembles a [`KnowledgeEngine`].
pub struct KnowledgeEngineBuilder {
    llm: Arc<dyn LlmClient>,
    store: Arc<dyn DocumentStore>,
    formatter: Option<Arc<dyn BaseFormatter>>,
    metrics: Option<Arc<dyn MetricsSink>>,
    scorer: Option<Box<dyn ContentScorer>>,
    prompt: Option<PromptDefinition>,
    settings: EngineSettings,
    model: String,
}

impl KnowledgeEngineBuilder {
    fn new(llm: Arc<dyn LlmClient>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            llm,
            store,
            formatter: None,
            metrics: None,
            scorer: None,
            prompt: None,
            settings: EngineSettings::default(),
            model: GenerationSettings::default().model,
        }
    }

    pub fn formatter(mut self, formatter: Arc<dyn BaseFormatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    pub fn metrics_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.metrics = Some(sink);
        self
    }

    /// Replace the default pattern scorer used for classification.
    pub fn scorer(mut self, scorer: Box<dyn ContentScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    pub fn prompt(mut self, prompt: PromptDefinition) -> Self {
        self.prompt = Some(prompt);
        self
    }

    pub fn settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn build(self) -> KnowledgeEngine {
        let classifier = match self.scorer {
            Some(scorer) => ContentClassifier::new(scorer),
            None => ContentClassifier::default(),
        };
        let planner = GranularityPlanner::new(OverridePolicy::from_settings(&self.settings));

        let capacity = self.settings.metrics_capacity;
        let metrics: Arc<dyn MetricsSink> = match self.metrics {
            Some(sink) => sink,
            None => Arc::new(MetricsLog::new(capacity)),
        };
        let enhancer = match self.formatter {
            Some(formatter) => ContentEnhancer::new(formatter),
            None => ContentEnhancer::default(),
        };

        KnowledgeEngine {
            analyzer: ContentAnalyzer::new(classifier, planner),
            generator: ArticleGenerator::new(
                self.llm,
                self.prompt.unwrap_or_else(builtin_article_prompt),
                GenerationSettings::from_engine_settings(self.model, &self.settings),
            ),
            enhancer,
            persistence: PersistenceAdapter::new(self.store, Arc::clone(&metrics)),
            metrics,
        }
    }
}
