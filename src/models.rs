//! Core data models used throughout jobjob.
//!
//! These types represent the ingested documents, their chunks, and the
//! retrieval results that flow from the index into the generator.

use serde::Serialize;

use crate::extract::FileKind;

/// One ingested file.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: String,
    pub file_name: String,
    pub kind: FileKind,
    /// SHA-256 of the raw file bytes.
    pub content_hash: String,
    pub char_count: i64,
    pub ingested_at: i64,
}

/// A bounded span of a document's extracted text.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub source_file: String,
    pub chunk_index: i64,
    /// Character offset of the chunk's first character in the extracted text.
    pub start_offset: i64,
    pub text: String,
    pub hash: String,
}

/// A chunk returned by the retriever with its cosine similarity to the query.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Row counts reported by a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    pub documents: i64,
    pub chunks: i64,
    pub vectors: i64,
}
