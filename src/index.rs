//! The document index: an [`Embedder`] in front of a [`ChunkStore`].
//!
//! `add` embeds every chunk before anything is written, so an embedding
//! failure leaves the store untouched. `search` embeds the query and asks the
//! store for the nearest chunks. `clear` drops vectors and chunks together.

use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::Config;
use crate::embedding::{create_embedder, embed_query, Embedder};
use crate::models::{Chunk, Document, RetrievedChunk, StoreCounts};
use crate::store::{ChunkStore, SqliteStore};

/// Open the on-disk index described by `config`.
///
/// The SQLite store is returned alongside the index so the caller can close
/// its pool when the command finishes.
pub async fn open_index(config: &Config) -> Result<(DocumentIndex, Arc<SqliteStore>)> {
    let store = Arc::new(SqliteStore::open(&config.db.path).await?);
    let embedder = create_embedder(&config.embedding)?;
    Ok((DocumentIndex::new(embedder, store.clone()), store))
}

pub struct DocumentIndex {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn ChunkStore>,
}

impl DocumentIndex {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn ChunkStore>) -> Self {
        Self { embedder, store }
    }

    /// Embed and store a document's chunks.
    ///
    /// Fails without writing when the embedder's model or vector length
    /// differs from the stored vectors, or when any embedding call fails.
    pub async fn add(&self, doc: &Document, chunks: &[Chunk]) -> Result<()> {
        self.check_compatible().await?;

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = if texts.is_empty() {
            Vec::new()
        } else {
            self.embedder.embed(&texts).await?
        };
        debug!(
            file = %doc.file_name,
            chunks = chunks.len(),
            "embedded document chunks"
        );

        self.store
            .insert_document(doc, chunks, &vectors, self.embedder.model_name())
            .await?;
        info!(file = %doc.file_name, chunks = chunks.len(), "document indexed");
        Ok(())
    }

    /// Embed every document in the batch, then write them all.
    ///
    /// An embedding failure for any document aborts the batch before the
    /// first write.
    pub async fn add_batch(&self, batch: &[(Document, Vec<Chunk>)]) -> Result<()> {
        self.check_compatible().await?;

        let texts: Vec<String> = batch
            .iter()
            .flat_map(|(_, chunks)| chunks.iter().map(|c| c.text.clone()))
            .collect();
        let mut vectors = if texts.is_empty() {
            Vec::new()
        } else {
            self.embedder.embed(&texts).await?
        };
        if vectors.len() != texts.len() {
            bail!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                texts.len()
            );
        }

        let model = self.embedder.model_name();
        for (doc, chunks) in batch {
            let rest = vectors.split_off(chunks.len());
            self.store
                .insert_document(doc, chunks, &vectors, model)
                .await?;
            vectors = rest;
            info!(file = %doc.file_name, chunks = chunks.len(), "document indexed");
        }
        Ok(())
    }

    /// Up to `k` chunks by descending similarity to `query`.
    ///
    /// An empty index, a blank query, or `k == 0` yields an empty result
    /// without calling the embedder. An index built with a different model or
    /// vector length is an error.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        if k == 0 || query.trim().is_empty() {
            return Ok(Vec::new());
        }
        if self.store.counts().await?.vectors == 0 {
            debug!("search on empty index");
            return Ok(Vec::new());
        }
        self.check_compatible().await?;

        let query_vec = embed_query(self.embedder.as_ref(), query).await?;
        self.store.vector_search(&query_vec, k).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await?;
        info!("index cleared");
        Ok(())
    }

    pub async fn counts(&self) -> Result<StoreCounts> {
        self.store.counts().await
    }

    /// Stored vectors must come from the configured model at its vector length.
    async fn check_compatible(&self) -> Result<()> {
        if let Some(stored) = self.store.stored_model().await? {
            if stored != self.embedder.model_name() {
                bail!(
                    "The index was built with embedding model '{}' but '{}' is configured. \
                     Run `jobjob clear` and ingest your documents again.",
                    stored,
                    self.embedder.model_name()
                );
            }
        }
        if let Some(dims) = self.store.stored_dims().await? {
            if dims != self.embedder.dims() {
                bail!(
                    "The index holds {}-dimensional vectors but the embedder produces {}. \
                     Run `jobjob clear` and ingest your documents again.",
                    dims,
                    self.embedder.dims()
                );
            }
        }
        Ok(())
    }
}
