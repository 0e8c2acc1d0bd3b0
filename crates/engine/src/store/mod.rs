//! Document store abstraction for generated articles.
//!
//! The engine only needs `insert`; hosts plug in their own document library
//! or use one of the two bundled backends.

pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::types::Article;
use async_trait::async_trait;
use docforge_core::{AppConfig, AppError, AppResult};
use std::sync::{Arc, Mutex, MutexGuard};

/// Trait for article persistence backends.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn name(&self) -> &str;

    /// Persist one article.
    async fn insert(&self, article: &Article) -> AppResult<()>;
}

/// In-process store, mostly for tests and embedding hosts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    articles: Mutex<Vec<Article>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Article>> {
        self.articles.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Copy of every stored article, in insertion order.
    pub fn articles(&self) -> Vec<Article> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn insert(&self, article: &Article) -> AppResult<()> {
        let mut articles = self.lock();
        if articles.iter().any(|a| a.id == article.id) {
            return Err(AppError::Persistence(format!(
                "Article {} already exists",
                article.id
            )));
        }
        articles.push(article.clone());
        Ok(())
    }
}

/// Open the store named by configuration: SQLite when `engine.database` is
/// set, in-memory otherwise.
pub fn open_configured(config: &AppConfig) -> AppResult<Arc<dyn DocumentStore>> {
    match config.database_path() {
        Some(path) => {
            tracing::info!("Using SQLite document library at {:?}", path);
            Ok(Arc::new(SqliteStore::open(&path)?))
        }
        None => {
            tracing::debug!("No document library configured, using in-memory store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
