//! Storage abstraction for chunks and their embedding vectors.
//!
//! The [`ChunkStore`] trait is the persistence half of the index: it holds
//! documents, chunks, and one vector per chunk, and answers brute-force
//! cosine-similarity queries. Embedding happens one level up, in
//! [`DocumentIndex`](crate::index::DocumentIndex), so backends never talk to
//! an embedding API.
//!
//! | Backend | Use |
//! |---------|-----|
//! | [`SqliteStore`] | Durable on-disk index used by the CLI |
//! | [`InMemoryStore`] | Tests |

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;
use std::cmp::Ordering;

use crate::models::{Chunk, Document, RetrievedChunk, StoreCounts};

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

/// Abstract storage backend for the document index.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`insert_document`](ChunkStore::insert_document) | Atomically store a document with its chunks and vectors |
/// | [`find_document`](ChunkStore::find_document) | Look up a stored document by file name |
/// | [`list_documents`](ChunkStore::list_documents) | All stored documents, by file name |
/// | [`vector_search`](ChunkStore::vector_search) | Top-k chunks by cosine similarity |
/// | [`stored_model`](ChunkStore::stored_model) | Embedding model of the stored vectors |
/// | [`stored_dims`](ChunkStore::stored_dims) | Length of the stored vectors |
/// | [`counts`](ChunkStore::counts) | Document, chunk, and vector counts |
/// | [`clear`](ChunkStore::clear) | Delete everything, vectors and chunks together |
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Store a document with one vector per chunk.
    ///
    /// Any document already stored under the same file name is replaced.
    /// Either everything is written or nothing is.
    async fn insert_document(
        &self,
        doc: &Document,
        chunks: &[Chunk],
        vectors: &[Vec<f32>],
        model: &str,
    ) -> Result<()>;

    async fn find_document(&self, file_name: &str) -> Result<Option<Document>>;

    async fn list_documents(&self) -> Result<Vec<Document>>;

    /// Return up to `k` chunks ordered by descending similarity to `query_vec`.
    async fn vector_search(&self, query_vec: &[f32], k: usize) -> Result<Vec<RetrievedChunk>>;

    /// `None` when the store holds no vectors.
    async fn stored_model(&self) -> Result<Option<String>>;

    /// `None` when the store holds no vectors.
    async fn stored_dims(&self) -> Result<Option<usize>>;

    async fn counts(&self) -> Result<StoreCounts>;

    async fn clear(&self) -> Result<()>;
}

/// Check the chunk/vector pairing before anything is written.
pub(crate) fn check_pairing(chunks: &[Chunk], vectors: &[Vec<f32>]) -> Result<()> {
    if chunks.len() != vectors.len() {
        anyhow::bail!(
            "{} chunks but {} vectors; every chunk needs exactly one vector",
            chunks.len(),
            vectors.len()
        );
    }
    Ok(())
}

/// Sort by score descending, then file name and chunk index, and keep `k`.
pub(crate) fn rank(mut results: Vec<RetrievedChunk>, k: usize) -> Vec<RetrievedChunk> {
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.chunk.source_file.cmp(&b.chunk.source_file))
            .then_with(|| a.chunk.chunk_index.cmp(&b.chunk.chunk_index))
    });
    results.truncate(k);
    results
}
