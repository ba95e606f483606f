//! In-memory [`ChunkStore`] implementation for tests.
//!
//! All state sits behind one `RwLock`, so inserts and clears are atomic with
//! respect to readers. Vector search is brute-force cosine similarity.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::embedding::cosine_similarity;
use crate::models::{Chunk, Document, RetrievedChunk, StoreCounts};

use super::{check_pairing, rank, ChunkStore};

struct StoredChunk {
    chunk: Chunk,
    vector: Vec<f32>,
}

#[derive(Default)]
struct Inner {
    docs: Vec<Document>,
    chunks: Vec<StoredChunk>,
    model: Option<String>,
    dims: Option<usize>,
}

#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }
}

#[async_trait]
impl ChunkStore for InMemoryStore {
    async fn insert_document(
        &self,
        doc: &Document,
        chunks: &[Chunk],
        vectors: &[Vec<f32>],
        model: &str,
    ) -> Result<()> {
        check_pairing(chunks, vectors)?;

        let mut inner = self.write()?;
        let replaced: Vec<String> = inner
            .docs
            .iter()
            .filter(|d| d.file_name == doc.file_name)
            .map(|d| d.id.clone())
            .collect();
        inner.docs.retain(|d| d.file_name != doc.file_name);
        inner
            .chunks
            .retain(|sc| !replaced.contains(&sc.chunk.document_id));

        inner.docs.push(doc.clone());
        for (chunk, vector) in chunks.iter().zip(vectors.iter()) {
            inner.chunks.push(StoredChunk {
                chunk: chunk.clone(),
                vector: vector.clone(),
            });
        }
        if inner.chunks.is_empty() {
            inner.model = None;
            inner.dims = None;
        } else {
            inner.model = Some(model.to_string());
            inner.dims = inner.chunks.first().map(|sc| sc.vector.len());
        }
        Ok(())
    }

    async fn find_document(&self, file_name: &str) -> Result<Option<Document>> {
        let inner = self.read()?;
        Ok(inner.docs.iter().find(|d| d.file_name == file_name).cloned())
    }

    async fn list_documents(&self) -> Result<Vec<Document>> {
        let inner = self.read()?;
        let mut docs = inner.docs.clone();
        docs.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(docs)
    }

    async fn vector_search(&self, query_vec: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
        let inner = self.read()?;
        let results = inner
            .chunks
            .iter()
            .map(|sc| RetrievedChunk {
                chunk: sc.chunk.clone(),
                score: cosine_similarity(query_vec, &sc.vector),
            })
            .collect();
        Ok(rank(results, k))
    }

    async fn stored_model(&self) -> Result<Option<String>> {
        Ok(self.read()?.model.clone())
    }

    async fn stored_dims(&self) -> Result<Option<usize>> {
        Ok(self.read()?.dims)
    }

    async fn counts(&self) -> Result<StoreCounts> {
        let inner = self.read()?;
        Ok(StoreCounts {
            documents: inner.docs.len() as i64,
            chunks: inner.chunks.len() as i64,
            vectors: inner.chunks.len() as i64,
        })
    }

    async fn clear(&self) -> Result<()> {
        *self.write()? = Inner::default();
        Ok(())
    }
}
