//! Final enrichment and persistence of generated articles.

use crate::metrics::{MetricsSink, ProcessingMetrics};
use crate::store::DocumentStore;
use crate::types::Article;
use serde_json::json;
use std::sync::Arc;

/// Writes articles to a [`DocumentStore`] and closes the run's metrics.
pub struct PersistenceAdapter {
    store: Arc<dyn DocumentStore>,
    sink: Arc<dyn MetricsSink>,
}

impl PersistenceAdapter {
    pub fn new(store: Arc<dyn DocumentStore>, sink: Arc<dyn MetricsSink>) -> Self {
        Self { store, sink }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Persist each article, skipping the ones the store rejects.
    ///
    /// The metrics record is finalized and handed to the sink whatever the
    /// outcome. Returns the articles that were stored, in input order.
    pub async fn persist(
        &self,
        articles: Vec<Article>,
        source: &str,
        mut metrics: ProcessingMetrics,
    ) -> Vec<Article> {
        let original_length = source.chars().count();
        let processing_time = metrics.processing_time();
        metrics.articles_generated = articles.len();

        let mut persisted = Vec::with_capacity(articles.len());
        for mut article in articles {
            enrich(&mut article, &metrics.engine_version, processing_time, original_length);

            match self.store.insert(&article).await {
                Ok(()) => {
                    tracing::debug!("Persisted article {} '{}'", article.id, article.title);
                    persisted.push(article);
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to persist article '{}' to {} store: {}",
                        article.title,
                        self.store.name(),
                        e
                    );
                }
            }
        }

        metrics.articles_persisted = persisted.len();
        metrics.finish();
        tracing::info!(
            "Persisted {}/{} articles in {:.2}s",
            metrics.articles_persisted,
            metrics.articles_generated,
            metrics.processing_time()
        );
        self.sink.record(metrics);

        persisted
    }
}

fn enrich(article: &mut Article, engine_version: &str, processing_time: f64, original_length: usize) {
    let processed_length = article.content.chars().count();
    let ratio = if original_length == 0 {
        0.0
    } else {
        processed_length as f64 / original_length as f64
    };

    let metadata = &mut article.metadata;
    metadata.insert("advanced_engine".into(), json!(true));
    metadata.insert("engine_version".into(), json!(engine_version));
    metadata.insert("processing_time".into(), json!(processing_time));
    metadata.insert(
        "content_metrics".into(),
        json!({
            "original_length": original_length,
            "processed_length": processed_length,
            "enhancement_ratio": (ratio * 100.0).round() / 100.0,
        }),
    );
}
