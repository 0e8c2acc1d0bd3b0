//! SQLite-backed document library.

use super::DocumentStore;
use crate::types::{Article, ArticleStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docforge_core::{AppError, AppResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS articles (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    status TEXT NOT NULL,
    article_type TEXT NOT NULL,
    source_document TEXT NOT NULL,
    tags TEXT NOT NULL,
    created_at TEXT NOT NULL,
    metadata TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_articles_source ON articles(source_document);
"#;

const SELECT_COLUMNS: &str =
    "SELECT id, title, content, status, article_type, source_document, tags, created_at, metadata FROM articles";

/// Article library stored in a single SQLite file.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

/// Raw column values, converted outside the rusqlite row callback.
struct ArticleRow {
    id: String,
    title: String,
    content: String,
    status: String,
    article_type: String,
    source_document: String,
    tags: String,
    created_at: String,
    metadata: String,
}

impl ArticleRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            status: row.get(3)?,
            article_type: row.get(4)?,
            source_document: row.get(5)?,
            tags: row.get(6)?,
            created_at: row.get(7)?,
            metadata: row.get(8)?,
        })
    }

    fn into_article(self) -> AppResult<Article> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| AppError::Persistence(format!("Invalid article id '{}': {}", self.id, e)))?;
        let status = ArticleStatus::parse(&self.status).ok_or_else(|| {
            AppError::Persistence(format!("Invalid article status '{}'", self.status))
        })?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| AppError::Persistence(format!("Invalid timestamp: {}", e)))?
            .with_timezone(&Utc);

        Ok(Article {
            id,
            title: self.title,
            content: self.content,
            status,
            article_type: self.article_type,
            source_document: self.source_document,
            tags: serde_json::from_str(&self.tags)?,
            created_at,
            metadata: serde_json::from_str(&self.metadata)?,
        })
    }
}

impl SqliteStore {
    /// Open (or create) the library at `path`.
    pub fn open(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Persistence(format!("Failed to create library directory: {}", e))
            })?;
        }

        let conn = Connection::open(path)
            .map_err(|e| AppError::Persistence(format!("Failed to open SQLite library: {}", e)))?;
        let store = Self::init(conn)?;

        tracing::debug!("Opened SQLite document library at {:?}", path);
        Ok(store)
    }

    pub fn in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| AppError::Persistence(format!("Failed to open SQLite library: {}", e)))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> AppResult<Self> {
        conn.execute_batch(SCHEMA)
            .map_err(|e| AppError::Persistence(format!("Failed to create tables: {}", e)))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn insert_sync(&self, article: &Article) -> AppResult<()> {
        let tags = serde_json::to_string(&article.tags)?;
        let metadata = serde_json::to_string(&article.metadata)?;

        self.conn()
            .execute(
                "INSERT INTO articles (id, title, content, status, article_type, source_document, tags, created_at, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    article.id.to_string(),
                    article.title,
                    article.content,
                    article.status.as_str(),
                    article.article_type,
                    article.source_document,
                    tags,
                    article.created_at.to_rfc3339(),
                    metadata,
                ],
            )
            .map_err(|e| AppError::Persistence(format!("Failed to insert article: {}", e)))?;

        Ok(())
    }

    /// Fetch one article by id.
    pub fn get(&self, id: Uuid) -> AppResult<Option<Article>> {
        let row = self
            .conn()
            .query_row(
                &format!("{} WHERE id = ?1", SELECT_COLUMNS),
                params![id.to_string()],
                ArticleRow::from_row,
            )
            .optional()
            .map_err(|e| AppError::Persistence(format!("Failed to query article: {}", e)))?;

        row.map(ArticleRow::into_article).transpose()
    }

    pub fn count(&self) -> AppResult<usize> {
        self.conn()
            .query_row("SELECT COUNT(*) FROM articles", [], |row| {
                row.get::<_, i64>(0).map(|v| v as usize)
            })
            .map_err(|e| AppError::Persistence(format!("Failed to count articles: {}", e)))
    }

    /// Articles generated from one source document, in insertion order.
    pub fn list_by_source(&self, source_document: &str) -> AppResult<Vec<Article>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(&format!(
                "{} WHERE source_document = ?1 ORDER BY rowid",
                SELECT_COLUMNS
            ))
            .map_err(|e| AppError::Persistence(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![source_document], ArticleRow::from_row)
            .map_err(|e| AppError::Persistence(format!("Failed to query articles: {}", e)))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| AppError::Persistence(format!("Failed to read articles: {}", e)))?;

        rows.into_iter().map(ArticleRow::into_article).collect()
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn insert(&self, article: &Article) -> AppResult<()> {
        self.insert_sync(article)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn article(title: &str, source: &str) -> Article {
        let mut article = Article::new(
            title,
            "<div class=\"article-body\"><p>Body</p></div>",
            "user_manual",
            source,
        );
        article.tags = vec!["user_manual".to_string(), "unified".to_string()];
        article
            .metadata
            .insert("content_metrics".into(), json!({"original_length": 42}));
        article
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = SqliteStore::in_memory().unwrap();
        let original = article("Guide", "guide.pdf");

        store.insert(&original).await.unwrap();

        let loaded = store.get(original.id).unwrap().unwrap();
        assert_eq!(loaded.title, "Guide");
        assert_eq!(loaded.status, ArticleStatus::Published);
        assert_eq!(loaded.tags, original.tags);
        assert_eq!(loaded.metadata["content_metrics"]["original_length"], json!(42));
        assert_eq!(loaded.created_at.timestamp(), original.created_at.timestamp());

        assert!(store.get(Uuid::new_v4()).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_fails() {
        let store = SqliteStore::in_memory().unwrap();
        let original = article("Guide", "guide.pdf");

        store.insert(&original).await.unwrap();
        assert!(matches!(
            store.insert(&original).await,
            Err(AppError::Persistence(_))
        ));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_by_source_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("library.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert(&article("Part 1", "manual.pdf")).await.unwrap();
            store.insert(&article("Part 2", "manual.pdf")).await.unwrap();
            store.insert(&article("Other", "other.pdf")).await.unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.count().unwrap(), 3);

        let titles: Vec<String> = store
            .list_by_source("manual.pdf")
            .unwrap()
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, vec!["Part 1", "Part 2"]);
    }
}
