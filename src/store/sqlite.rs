//! SQLite-backed [`ChunkStore`] implementation.
//!
//! Documents, chunks, and vectors live in three tables (see
//! [`migrate`](crate::migrate)). Writes that touch more than one table run
//! in a single transaction so a chunk never exists without its vector.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow,
};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::time::Duration;

use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use crate::migrate;
use crate::models::{Chunk, Document, RetrievedChunk, StoreCounts};

use super::{check_pairing, rank, ChunkStore};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path` and apply the schema.
    pub async fn open(path: &Path) -> Result<Self> {
        let pool = connect(path)
            .await
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        migrate::migrate_pool(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Pool over the database file at `path`, creating the file and its parent
/// directory when missing.
async fn connect(path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;
    Ok(pool)
}

fn row_to_document(row: &SqliteRow) -> Result<Document> {
    let kind: String = row.get("kind");
    Ok(Document {
        id: row.get("id"),
        file_name: row.get("file_name"),
        kind: kind.parse()?,
        content_hash: row.get("content_hash"),
        char_count: row.get("char_count"),
        ingested_at: row.get("ingested_at"),
    })
}

#[async_trait]
impl ChunkStore for SqliteStore {
    async fn insert_document(
        &self,
        doc: &Document,
        chunks: &[Chunk],
        vectors: &[Vec<f32>],
        model: &str,
    ) -> Result<()> {
        check_pairing(chunks, vectors)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM chunk_vectors WHERE chunk_id IN (
                SELECT c.id FROM chunks c JOIN documents d ON d.id = c.document_id
                WHERE d.file_name = ?
            )
            "#,
        )
        .bind(&doc.file_name)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "DELETE FROM chunks WHERE document_id IN (SELECT id FROM documents WHERE file_name = ?)",
        )
        .bind(&doc.file_name)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM documents WHERE file_name = ?")
            .bind(&doc.file_name)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO documents (id, file_name, kind, content_hash, char_count, ingested_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&doc.id)
        .bind(&doc.file_name)
        .bind(doc.kind.as_str())
        .bind(&doc.content_hash)
        .bind(doc.char_count)
        .bind(doc.ingested_at)
        .execute(&mut *tx)
        .await?;

        for (chunk, vector) in chunks.iter().zip(vectors.iter()) {
            sqlx::query(
                "INSERT INTO chunks (id, document_id, chunk_index, start_offset, text, hash) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&chunk.id)
            .bind(&chunk.document_id)
            .bind(chunk.chunk_index)
            .bind(chunk.start_offset)
            .bind(&chunk.text)
            .bind(&chunk.hash)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "INSERT INTO chunk_vectors (chunk_id, model, dims, embedding) VALUES (?, ?, ?, ?)",
            )
            .bind(&chunk.id)
            .bind(model)
            .bind(vector.len() as i64)
            .bind(vec_to_blob(vector))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_document(&self, file_name: &str) -> Result<Option<Document>> {
        let row = sqlx::query(
            "SELECT id, file_name, kind, content_hash, char_count, ingested_at FROM documents WHERE file_name = ?",
        )
        .bind(file_name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_document).transpose()
    }

    async fn list_documents(&self) -> Result<Vec<Document>> {
        let rows = sqlx::query(
            "SELECT id, file_name, kind, content_hash, char_count, ingested_at FROM documents ORDER BY file_name ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_document).collect()
    }

    async fn vector_search(&self, query_vec: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        // Vectors are compared in Rust; the index is small enough to scan
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.document_id, d.file_name, c.chunk_index, c.start_offset,
                   c.text, c.hash, cv.embedding
            FROM chunk_vectors cv
            JOIN chunks c ON c.id = cv.chunk_id
            JOIN documents d ON d.id = c.document_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let results = rows
            .iter()
            .map(|row| {
                let blob: Vec<u8> = row.get("embedding");
                let score = cosine_similarity(query_vec, &blob_to_vec(&blob));
                RetrievedChunk {
                    chunk: Chunk {
                        id: row.get("id"),
                        document_id: row.get("document_id"),
                        source_file: row.get("file_name"),
                        chunk_index: row.get("chunk_index"),
                        start_offset: row.get("start_offset"),
                        text: row.get("text"),
                        hash: row.get("hash"),
                    },
                    score,
                }
            })
            .collect();

        Ok(rank(results, k))
    }

    async fn stored_model(&self) -> Result<Option<String>> {
        let model: Option<String> = sqlx::query_scalar("SELECT model FROM chunk_vectors LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(model)
    }

    async fn stored_dims(&self) -> Result<Option<usize>> {
        let dims: Option<i64> = sqlx::query_scalar("SELECT dims FROM chunk_vectors LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(dims.map(|d| d as usize))
    }

    async fn counts(&self) -> Result<StoreCounts> {
        let documents: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;
        let chunks: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunks")
            .fetch_one(&self.pool)
            .await?;
        let vectors: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chunk_vectors")
            .fetch_one(&self.pool)
            .await?;

        Ok(StoreCounts {
            documents,
            chunks,
            vectors,
        })
    }

    async fn clear(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM chunk_vectors")
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM chunks").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM documents")
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::FileKind;
    use tempfile::TempDir;

    fn doc(file_name: &str, hash: &str) -> Document {
        Document {
            id: uuid::Uuid::new_v4().to_string(),
            file_name: file_name.to_string(),
            kind: FileKind::Text,
            content_hash: hash.to_string(),
            char_count: 10,
            ingested_at: 0,
        }
    }

    fn chunk(doc: &Document, index: i64, text: &str) -> Chunk {
        Chunk {
            id: uuid::Uuid::new_v4().to_string(),
            document_id: doc.id.clone(),
            source_file: doc.file_name.clone(),
            chunk_index: index,
            start_offset: 0,
            text: text.to_string(),
            hash: crate::chunk::hash_text(text),
        }
    }

    #[tokio::test]
    async fn test_insert_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data").join("jobjob.sqlite");

        {
            let store = SqliteStore::open(&path).await.unwrap();
            let d = doc("resume.txt", "h1");
            let c = vec![chunk(&d, 0, "rust"), chunk(&d, 1, "python")];
            store
                .insert_document(&d, &c, &[vec![1.0, 0.0], vec![0.0, 1.0]], "hash")
                .await
                .unwrap();
            store.close().await;
        }

        let store = SqliteStore::open(&path).await.unwrap();
        let counts = store.counts().await.unwrap();
        assert_eq!(
            counts,
            StoreCounts {
                documents: 1,
                chunks: 2,
                vectors: 2
            }
        );
        assert_eq!(store.stored_model().await.unwrap().as_deref(), Some("hash"));
        assert_eq!(store.stored_dims().await.unwrap(), Some(2));

        let hits = store.vector_search(&[0.0, 1.0], 1).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.text, "python");
        assert_eq!(hits[0].chunk.source_file, "resume.txt");
    }

    #[tokio::test]
    async fn test_same_file_name_replaces_document() {
        let tmp = TempDir::new().unwrap();
        let store = SqliteStore::open(&tmp.path().join("db.sqlite"))
            .await
            .unwrap();

        let d1 = doc("resume.txt", "h1");
        let c1 = vec![chunk(&d1, 0, "a"), chunk(&d1, 1, "b")];
        store
            .insert_document(&d1, &c1, &[vec![1.0], vec![1.0]], "hash")
            .await
            .unwrap();

        let d2 = doc("resume.txt", "h2");
        let c2 = vec![chunk(&d2, 0, "c")];
        store
            .insert_document(&d2, &c2, &[vec![1.0]], "hash")
            .await
            .unwrap();

        let counts = store.counts().await.unwrap();
        assert_eq!(counts.documents, 1);
        assert_eq!(counts.chunks, 1);
        assert_eq!(counts.vectors, 1);
        let found = store.find_document("resume.txt").await.unwrap().unwrap();
        assert_eq!(found.content_hash, "h2");
    }

    #[tokio::test]
    async fn test_mismatched_vectors_write_nothing() {
        let tmp = TempDir::new().unwrap();
        let store = SqliteStore::open(&tmp.path().join("db.sqlite"))
            .await
            .unwrap();

        let d = doc("resume.txt", "h1");
        let c = vec![chunk(&d, 0, "a"), chunk(&d, 1, "b")];
        assert!(store
            .insert_document(&d, &c, &[vec![1.0]], "hash")
            .await
            .is_err());
        assert_eq!(store.counts().await.unwrap(), StoreCounts::default());
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let tmp = TempDir::new().unwrap();
        let store = SqliteStore::open(&tmp.path().join("db.sqlite"))
            .await
            .unwrap();

        let d = doc("notes.md", "h1");
        let c = vec![chunk(&d, 0, "a")];
        store
            .insert_document(&d, &c, &[vec![1.0, 2.0]], "hash")
            .await
            .unwrap();
        store.clear().await.unwrap();

        assert_eq!(store.counts().await.unwrap(), StoreCounts::default());
        assert!(store.stored_model().await.unwrap().is_none());
        assert!(store.stored_dims().await.unwrap().is_none());
        assert!(store
            .vector_search(&[1.0, 2.0], 5)
            .await
            .unwrap()
            .is_empty());
        assert!(store.list_documents().await.unwrap().is_empty());
    }
}
