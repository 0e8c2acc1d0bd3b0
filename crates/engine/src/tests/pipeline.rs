//! End-to-end pipeline behavior.

use super::{api_reference, metadata, plain_prose, short_api_page, MockLlm, MockMode};
use crate::analysis::ContentAnalyzer;
use crate::generate::prompts::builtin_article_prompt;
use crate::metrics::MetricsLog;
use crate::store::{MemoryStore, SqliteStore};
use crate::{ArticleGenerator, ContentType, GenerationSettings, KnowledgeEngine, ProcessingApproach, RawDocument};
use docforge_core::{AppConfig, EngineSettings};
use docforge_prompt::PromptDefinition;
use serde_json::json;
use std::sync::Arc;

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(llm: Arc<MockLlm>, store: Arc<MemoryStore>, log: Arc<MetricsLog>) -> KnowledgeEngine {
        KnowledgeEngine::builder(llm, store).metrics_sink(log).build()
    }

    #[tokio::test]
    async fn test_plain_document_becomes_one_article() {
        let llm = MockLlm::new(MockMode::Echo);
        let store = Arc::new(MemoryStore::new());
        let log = Arc::new(MetricsLog::new(10));
        let engine = engine(llm.clone(), store.clone(), log.clone());

        let content = plain_prose();
        let analysis = engine.analyze(&content, &metadata("valley.txt"));
        assert_eq!(analysis.classification.primary_type, ContentType::GeneralDocumentation);
        assert_eq!(analysis.granularity.recommended_approach, ProcessingApproach::Unified);

        let articles = engine
            .process_content(&content, metadata("valley.txt"))
            .await;

        assert_eq!(articles.len(), 1);
        assert_eq!(llm.call_count(), 1);

        let article = &articles[0];
        assert_eq!(article.title, "valley - Complete Guide");
        assert_eq!(article.article_type, "general_documentation");
        assert_eq!(article.source_document, "valley.txt");
        assert!(article.content.starts_with("<div class=\"article-body\">"));
        assert!(article.content.contains("Morning light moved slowly"));
        assert!(!article.is_fallback());
        assert!(article.tags.contains(&"llm-generated".to_string()));
        assert!(article.tags.contains(&"unified".to_string()));
        assert_eq!(article.metadata["fidelity_retry"], json!(false));
        assert_eq!(article.metadata["advanced_engine"], json!(true));
        assert_eq!(
            article.metadata["post_processing"]["cross_references_added"],
            json!(false)
        );

        assert_eq!(store.len(), 1);
        let recorded = log.snapshot();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].articles_persisted, 1);
        assert_eq!(recorded[0].processing_approach.as_deref(), Some("unified"));
    }

    #[tokio::test]
    async fn test_api_reference_splits_into_estimated_articles() {
        let llm = MockLlm::new(MockMode::Echo);
        let store = Arc::new(MemoryStore::new());
        let log = Arc::new(MetricsLog::new(10));
        let engine = engine(llm.clone(), store.clone(), log);

        let content = api_reference();
        let analysis = engine.analyze(&content, &metadata("store-api.md"));
        assert_eq!(analysis.classification.primary_type, ContentType::ApiDocumentation);
        assert_eq!(analysis.structure.heading_count(), 12);
        assert!(analysis.word_count > 5500);
        assert!(analysis.granularity.recommended_approach.is_split());

        let estimate = analysis.granularity.article_estimate;
        let articles = engine
            .process_content(&content, metadata("store-api.md"))
            .await;

        assert_eq!(articles.len(), estimate);
        assert_eq!(llm.call_count(), estimate);
        assert_eq!(store.len(), estimate);

        for (index, article) in articles.iter().enumerate() {
            assert!(article.title.starts_with("store api - "));
            assert!(!article.is_fallback());
            assert_eq!(article.metadata["article_index"], json!(index + 1));
            assert_eq!(article.metadata["article_count"], json!(estimate));
            assert!(article.content.contains("method-post"));
            assert!(article.content.contains("Related Articles"));
            assert_eq!(
                article.metadata["post_processing"]["related_count"],
                json!(estimate - 1)
            );
        }

        // Every other article is linked from the first one
        for other in &articles[1..] {
            assert!(articles[0]
                .content
                .contains(&format!("/articles/{}", other.id)));
        }
    }

    #[tokio::test]
    async fn test_invented_path_triggers_exactly_one_retry() {
        let llm = MockLlm::new(MockMode::InventPath);
        let store = Arc::new(MemoryStore::new());
        let log = Arc::new(MetricsLog::new(10));
        let engine = engine(llm.clone(), store, log);

        let articles = engine
            .process_content(&short_api_page(), metadata("users.md"))
            .await;

        assert_eq!(articles.len(), 1);
        assert_eq!(llm.call_count(), 2);

        let calls = llm.calls();
        let first_system = calls[0].system.clone().unwrap_or_default();
        let second_system = calls[1].system.clone().unwrap_or_default();
        assert!(!first_system.contains("ABSOLUTE SOURCE FIDELITY REQUIRED"));
        assert!(second_system.contains("ABSOLUTE SOURCE FIDELITY REQUIRED"));
        assert_eq!(calls[0].prompt, calls[1].prompt);

        let article = &articles[0];
        assert_eq!(article.article_type, "api_documentation");
        assert_eq!(article.metadata["fidelity_retry"], json!(true));
        assert_eq!(article.metadata["llm_calls"], json!(2));
        assert_eq!(article.metadata["fidelity_confidence"], json!(0.75));
        assert!(!article.is_fallback());
    }

    #[tokio::test]
    async fn test_empty_llm_answers_fall_back() {
        let llm = MockLlm::new(MockMode::Empty);
        let store = Arc::new(MemoryStore::new());
        let log = Arc::new(MetricsLog::new(10));
        let engine = engine(llm.clone(), store.clone(), log);

        let content = api_reference();
        let estimate = engine
            .analyze(&content, &metadata("store-api.md"))
            .granularity
            .article_estimate;
        let articles = engine
            .process_content(&content, metadata("store-api.md"))
            .await;

        assert_eq!(articles.len(), estimate);
        assert_eq!(llm.call_count(), estimate);
        for article in &articles {
            assert!(article.content.contains("<div class=\"article-body\">"));
            assert!(article.is_fallback());
            assert_eq!(article.metadata["fidelity_confidence"], json!(0.5));
            assert_eq!(article.metadata["llm_calls"], json!(1));
        }
    }

    #[tokio::test]
    async fn test_failing_llm_still_produces_articles() {
        let llm = MockLlm::new(MockMode::Fail);
        let store = Arc::new(MemoryStore::new());
        let log = Arc::new(MetricsLog::new(10));
        let engine = engine(llm, store.clone(), log);

        let articles = engine
            .process_content(&plain_prose(), metadata("valley.txt"))
            .await;

        assert_eq!(articles.len(), 1);
        assert!(articles[0].is_fallback());
        assert!(articles[0].content.contains("intro-section"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_timed_out_llm_call_falls_back() {
        let llm = MockLlm::new(MockMode::Stall);
        let store = Arc::new(MemoryStore::new());
        let settings = EngineSettings {
            llm_timeout_secs: 1,
            ..EngineSettings::default()
        };
        let engine = KnowledgeEngine::builder(llm.clone(), store.clone())
            .settings(settings)
            .build();

        let articles = engine
            .process_content(&plain_prose(), metadata("valley.txt"))
            .await;

        assert_eq!(articles.len(), 1);
        assert_eq!(llm.call_count(), 1);
        assert!(articles[0].is_fallback());
        assert!(articles[0].content.contains("intro-section"));
        assert_eq!(articles[0].metadata["llm_calls"], json!(1));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_single_section_split_plan_is_unified() {
        let llm = MockLlm::new(MockMode::Echo);
        let content = plain_prose().replace("\n\n", " ");
        let document = RawDocument::new(content.as_str(), metadata("valley.txt"));

        let mut analysis = ContentAnalyzer::default().analyze(&document.content, &document.metadata);
        analysis.granularity.recommended_approach = ProcessingApproach::ModerateSplit;
        analysis.granularity.article_estimate = 3;

        let generator = ArticleGenerator::new(
            llm.clone(),
            builtin_article_prompt(),
            GenerationSettings::default(),
        );
        let articles = generator.generate(&document, &analysis).await;

        assert_eq!(articles.len(), 1);
        assert_eq!(llm.call_count(), 1);
        assert_eq!(articles[0].title, "valley - Complete Guide");
        assert!(articles[0].tags.contains(&"unified".to_string()));
        assert!(!articles[0].tags.contains(&"moderate_split".to_string()));
        assert_eq!(articles[0].metadata["processing_approach"], json!("unified"));
    }

    #[tokio::test]
    async fn test_empty_content_yields_nothing() {
        let llm = MockLlm::new(MockMode::Echo);
        let store = Arc::new(MemoryStore::new());
        let log = Arc::new(MetricsLog::new(10));
        let engine = engine(llm.clone(), store.clone(), log.clone());

        assert!(engine.process_content("  \n ", metadata("blank.txt")).await.is_empty());
        assert!(engine.generate_articles("", metadata("blank.txt")).await.is_empty());
        assert_eq!(llm.call_count(), 0);
        assert!(store.is_empty());
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_generate_articles_does_not_persist() {
        let llm = MockLlm::new(MockMode::Echo);
        let store = Arc::new(MemoryStore::new());
        let log = Arc::new(MetricsLog::new(10));
        let engine = engine(llm, store.clone(), log.clone());

        let articles = engine
            .generate_articles(&plain_prose(), metadata("valley.txt"))
            .await;

        assert_eq!(articles.len(), 1);
        assert!(articles[0].metadata.contains_key("post_processing"));
        assert!(!articles[0].metadata.contains_key("advanced_engine"));
        assert!(store.is_empty());
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_custom_prompt_definition_is_used() {
        let llm = MockLlm::new(MockMode::Echo);
        let mut prompt = PromptDefinition::builtin(
            "article.generate",
            "Custom",
            "CUSTOM PROMPT for {{document_title}}\n\
             === SOURCE CONTENT START ===\n{{source_content}}\n=== SOURCE CONTENT END ===",
        );
        prompt.system_template = Some("You write terse articles.".to_string());

        let engine = KnowledgeEngine::builder(llm.clone(), Arc::new(MemoryStore::new()))
            .prompt(prompt)
            .model("test-model")
            .build();

        let articles = engine
            .process_content(&plain_prose(), metadata("valley.txt"))
            .await;
        assert_eq!(articles.len(), 1);

        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].prompt.starts_with("CUSTOM PROMPT for valley"));
        assert_eq!(calls[0].system.as_deref(), Some("You write terse articles."));
        assert_eq!(calls[0].model, "test-model");
    }

    #[tokio::test]
    async fn test_articles_land_in_sqlite_library() {
        let llm = MockLlm::new(MockMode::Echo);
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let engine = KnowledgeEngine::builder(llm, store.clone()).build();

        let articles = engine
            .process_content(&api_reference(), metadata("store-api.md"))
            .await;

        let stored = store.list_by_source("store-api.md").unwrap();
        assert_eq!(stored.len(), articles.len());
        assert_eq!(stored[0].id, articles[0].id);
        assert_eq!(stored[0].content, articles[0].content);
        assert_eq!(
            stored[0].metadata["content_metrics"],
            articles[0].metadata["content_metrics"]
        );
    }

    #[test]
    fn test_from_config_applies_engine_settings() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = AppConfig {
            workspace: dir.path().to_path_buf(),
            model: "qwen2.5".to_string(),
            ..AppConfig::default()
        };
        config.engine.temperature = 0.3;
        config.engine.engine_version = "3.1".to_string();

        let engine = KnowledgeEngine::from_config(&config, Arc::new(MemoryStore::new())).unwrap();
        let settings = engine.generation_settings();
        assert_eq!(settings.model, "qwen2.5");
        assert_eq!(settings.temperature, 0.3);
        assert_eq!(settings.engine_version, "3.1");
    }
}
