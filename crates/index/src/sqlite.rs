//! Local persistent store backed by a single SQLite file.
//!
//! Each collection is one table:
//! - `iid` - integer rowid alias, preserves insertion order
//! - `id` - unique chunk identifier (upserts conflict on it)
//! - `document`, `metadata` (JSON object of strings), `embedding` (LE f32 blob)
//!
//! Search is exact: every row is scored by cosine similarity.

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use avocado_core::corpus::{Chunk, IndexRecord, RetrievalResult};
use avocado_core::error::IndexError;
use avocado_core::index::VectorIndex;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use crate::vector;

/// A SQLite-backed vector index.
pub struct SqliteIndex {
    pool: SqlitePool,
    table: String,
}

impl SqliteIndex {
    /// Open (or create) the store at `path`, using `collection` as table name.
    pub async fn open(path: &Path, collection: &str) -> Result<Self, IndexError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| IndexError::Storage(format!("Failed to create {}: {e}", parent.display())))?;
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| IndexError::Storage(format!("Failed to open SQLite: {e}")))?;

        let index = Self::from_pool(pool, collection).await?;
        info!("SQLite index initialized at {}", path.display());
        Ok(index)
    }

    /// An ephemeral in-process database (useful for tests).
    pub async fn in_memory(collection: &str) -> Result<Self, IndexError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| IndexError::Storage(format!("Invalid SQLite path: {e}")))?;

        // Every connection to :memory: is a separate database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| IndexError::Storage(format!("Failed to open SQLite: {e}")))?;

        Self::from_pool(pool, collection).await
    }

    /// Create from an existing pool.
    pub async fn from_pool(pool: SqlitePool, collection: &str) -> Result<Self, IndexError> {
        let index = Self {
            pool,
            table: Self::table_name(collection)?,
        };
        index.run_migrations().await?;
        Ok(index)
    }

    /// Collection names become table identifiers, so only `[A-Za-z0-9_]` is allowed.
    fn table_name(collection: &str) -> Result<String, IndexError> {
        let valid = !collection.is_empty()
            && collection.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if valid {
            Ok(collection.to_string())
        } else {
            Err(IndexError::Storage(format!(
                "Invalid collection name '{collection}': use letters, digits and underscores"
            )))
        }
    }

    async fn run_migrations(&self) -> Result<(), IndexError> {
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                iid        INTEGER PRIMARY KEY AUTOINCREMENT,
                id         TEXT UNIQUE NOT NULL,
                document   TEXT NOT NULL,
                metadata   TEXT NOT NULL DEFAULT '{{}}',
                embedding  BLOB NOT NULL
            )
            "#,
            self.table
        );

        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(|e| IndexError::Storage(format!("{} table: {e}", self.table)))?;

        debug!(table = %self.table, "SQLite migrations complete");
        Ok(())
    }

    /// Parse a chunk and its embedding from a row.
    fn row_to_chunk(row: &sqlx::sqlite::SqliteRow) -> Result<(Chunk, Vec<f32>), IndexError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| IndexError::QueryFailed(format!("id column: {e}")))?;
        let document: String = row
            .try_get("document")
            .map_err(|e| IndexError::QueryFailed(format!("document column: {e}")))?;
        let metadata_json: String = row
            .try_get("metadata")
            .map_err(|e| IndexError::QueryFailed(format!("metadata column: {e}")))?;
        let blob: Vec<u8> = row
            .try_get("embedding")
            .map_err(|e| IndexError::QueryFailed(format!("embedding column: {e}")))?;

        let metadata: BTreeMap<String, String> = serde_json::from_str(&metadata_json)
            .map_err(|e| IndexError::QueryFailed(format!("metadata of {id}: {e}")))?;

        let chunk = Chunk {
            id,
            text: document,
            metadata,
        };
        Ok((chunk, vector::blob_to_embedding(&blob)))
    }
}

#[async_trait]
impl VectorIndex for SqliteIndex {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn search(&self, query: &[f32], k: usize) -> Result<RetrievalResult, IndexError> {
        let sql = format!("SELECT id, document, metadata, embedding FROM {} ORDER BY iid", self.table);
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| IndexError::QueryFailed(format!("scan failed: {e}")))?;

        let decoded = rows
            .iter()
            .map(Self::row_to_chunk)
            .collect::<Result<Vec<_>, _>>()?;

        let hits = vector::rank_by_similarity(
            decoded.iter().map(|(chunk, embedding)| (chunk, embedding.as_slice())),
            query,
            k,
        )?;
        debug!(scanned = decoded.len(), returned = hits.len(), "SQLite search complete");
        Ok(hits)
    }

    async fn upsert(&self, records: Vec<IndexRecord>) -> Result<usize, IndexError> {
        let sql = format!(
            r#"
            INSERT INTO {} (id, document, metadata, embedding)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                document = excluded.document,
                metadata = excluded.metadata,
                embedding = excluded.embedding
            "#,
            self.table
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| IndexError::Storage(format!("begin transaction: {e}")))?;

        let written = records.len();
        for record in records {
            if record.embedding.is_empty() {
                return Err(IndexError::InvalidRecord {
                    id: record.id,
                    reason: "embedding is empty".into(),
                });
            }

            let metadata = serde_json::to_string(&record.metadata)
                .map_err(|e| IndexError::Storage(format!("metadata serialization: {e}")))?;

            sqlx::query(&sql)
                .bind(&record.id)
                .bind(&record.document)
                .bind(metadata)
                .bind(vector::embedding_to_blob(&record.embedding))
                .execute(&mut *tx)
                .await
                .map_err(|e| IndexError::Storage(format!("upsert {}: {e}", record.id)))?;
        }

        tx.commit()
            .await
            .map_err(|e| IndexError::Storage(format!("commit: {e}")))?;

        debug!(count = written, table = %self.table, "Upserted records");
        Ok(written)
    }

    async fn count(&self) -> Result<usize, IndexError> {
        let sql = format!("SELECT COUNT(*) AS n FROM {}", self.table);
        let row = sqlx::query(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| IndexError::QueryFailed(format!("count: {e}")))?;
        let n: i64 = row
            .try_get("n")
            .map_err(|e| IndexError::QueryFailed(format!("count column: {e}")))?;
        Ok(n as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, text: &str, embedding: Vec<f32>) -> IndexRecord {
        IndexRecord {
            id: id.into(),
            embedding,
            document: text.into(),
            metadata: BTreeMap::from([
                ("case_title".to_string(), format!("Case {id}")),
                ("bench".to_string(), "Y.V. Chandrachud".to_string()),
            ]),
        }
    }

    #[tokio::test]
    async fn fresh_store_is_empty() {
        let index = SqliteIndex::in_memory("legal_judgments").await.unwrap();
        assert_eq!(index.count().await.unwrap(), 0);
        assert!(index.search(&[1.0, 0.0], 15).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upsert_then_search() {
        let index = SqliteIndex::in_memory("legal_judgments").await.unwrap();
        index
            .upsert(vec![
                record("c1", "Section 302 IPC murder", vec![0.0, 1.0]),
                record("c2", "Article 21 personal liberty", vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let hits = index.search(&[0.9, 0.1], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.id, "c2");
        assert_eq!(hits[0].chunk.meta("bench"), Some("Y.V. Chandrachud"));
    }

    #[tokio::test]
    async fn upsert_same_id_does_not_duplicate() {
        let index = SqliteIndex::in_memory("legal_judgments").await.unwrap();
        index.upsert(vec![record("c1", "first", vec![1.0])]).await.unwrap();
        index.upsert(vec![record("c1", "second", vec![1.0])]).await.unwrap();

        assert_eq!(index.count().await.unwrap(), 1);
        let hits = index.search(&[1.0], 5).await.unwrap();
        assert_eq!(hits[0].chunk.text, "second");
    }

    #[tokio::test]
    async fn empty_embedding_rejected() {
        let index = SqliteIndex::in_memory("legal_judgments").await.unwrap();
        let err = index.upsert(vec![record("bad", "x", vec![])]).await.unwrap_err();
        assert!(matches!(err, IndexError::InvalidRecord { .. }));
        assert_eq!(index.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn query_of_wrong_dimension_is_rejected() {
        let index = SqliteIndex::in_memory("legal_judgments").await.unwrap();
        index.upsert(vec![record("c1", "text", vec![1.0, 0.0, 0.0])]).await.unwrap();

        let err = index.search(&[1.0, 0.0], 5).await.unwrap_err();
        assert!(matches!(err, IndexError::QueryFailed(_)));
        assert!(err.to_string().contains("query has 2 dims, index has 3"));
    }

    #[tokio::test]
    async fn corrupt_metadata_fails_search() {
        let index = SqliteIndex::in_memory("legal_judgments").await.unwrap();
        let sql = format!(
            "INSERT INTO {} (id, document, metadata, embedding) VALUES (?1, ?2, ?3, ?4)",
            index.table
        );
        sqlx::query(&sql)
            .bind("c1")
            .bind("text")
            .bind("{not json")
            .bind(vector::embedding_to_blob(&[1.0, 0.0]))
            .execute(&index.pool)
            .await
            .unwrap();

        let err = index.search(&[1.0, 0.0], 5).await.unwrap_err();
        assert!(matches!(err, IndexError::QueryFailed(_)));
        assert!(err.to_string().contains("metadata of c1"));
    }

    #[tokio::test]
    async fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store").join("chunks.sqlite");

        {
            let index = SqliteIndex::open(&path, "legal_judgments").await.unwrap();
            index.upsert(vec![record("c1", "text", vec![1.0, 0.0])]).await.unwrap();
        }

        let reopened = SqliteIndex::open(&path, "legal_judgments").await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
    }

    #[test]
    fn collection_names_are_sanitized() {
        assert!(SqliteIndex::table_name("legal_judgments").is_ok());
        assert!(SqliteIndex::table_name("drop table; --").is_err());
        assert!(SqliteIndex::table_name("").is_err());
    }
}
