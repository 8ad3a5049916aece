//! Knowledge system type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::embeddings::EmbeddingConfig;

/// Title used when a passage carries no source name.
pub const NO_TITLE: &str = "No Title";

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Default overlap between consecutive chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 80;

/// A source document recorded in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeSource {
    /// Unique source identifier
    pub id: String,

    /// Path of the document as it was read
    pub path: PathBuf,

    /// Detected content type ("markdown", "html", "text", "unknown")
    pub content_type: String,

    /// When this source was indexed
    pub learned_at: DateTime<Utc>,

    /// Extracted text size in bytes
    pub size_bytes: u64,
}

/// A text chunk with embedding, as stored in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    /// Unique chunk identifier
    pub id: String,

    /// Source document ID
    pub source_id: String,

    /// Position within source
    pub position: u32,

    /// Text content
    pub text: String,

    /// Embedding vector
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,

    /// Chunk metadata
    pub metadata: ChunkMetadata,
}

/// Metadata persisted alongside each chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// File name of the originating document
    #[serde(default)]
    pub source: Option<String>,

    /// Full path of the originating document
    #[serde(default)]
    pub source_path: Option<String>,

    /// Byte offset of the chunk in the extracted text
    #[serde(default)]
    pub start: usize,

    /// Byte offset one past the end of the chunk
    #[serde(default)]
    pub end: usize,
}

/// Internal chunk candidate before embedding.
#[derive(Debug, Clone)]
pub struct ChunkCandidate {
    pub source_id: String,
    pub position: u32,
    pub text: String,
    pub metadata: ChunkMetadata,
}

/// A passage returned by retrieval, carrying the metadata used for citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Chunk text
    pub text: String,

    pub metadata: PassageMetadata,
}

/// Citation-relevant metadata of a retrieved passage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassageMetadata {
    /// File name of the originating document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Full path of the originating document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,

    /// Chunk position within its document
    #[serde(default)]
    pub position: u32,

    /// Display title, set by the retrieval tool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Cosine distance to the query rounded to 3 decimals, set by the retrieval tool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
}

impl Passage {
    pub fn new(text: impl Into<String>, metadata: PassageMetadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }
}

/// Options for building an index.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Index name under `.catalog/index/`
    pub index_name: String,

    /// Directory (or single file) of source documents
    pub docs_path: PathBuf,

    /// Embedding provider settings persisted with the index
    pub embedding: EmbeddingConfig,

    /// Chunk size in characters
    pub chunk_size: usize,

    /// Overlap between chunks in characters
    pub chunk_overlap: usize,
}

impl BuildOptions {
    /// Options with the default chunking parameters.
    pub fn new(
        index_name: impl Into<String>,
        docs_path: impl Into<PathBuf>,
        embedding: EmbeddingConfig,
    ) -> Self {
        Self {
            index_name: index_name.into(),
            docs_path: docs_path.into(),
            embedding,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Statistics from an index build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildStats {
    /// Number of sources processed
    pub sources_count: u32,

    /// Number of chunks created
    pub chunks_count: u32,

    /// Total bytes processed
    pub bytes_processed: u64,

    /// Duration in seconds
    pub duration_secs: f64,
}

/// Statistics for a persisted index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Index name
    pub index_name: String,

    /// Number of sources
    pub sources_count: u32,

    /// Number of chunks
    pub chunks_count: u32,

    /// Database size in bytes
    pub db_size_bytes: u64,

    /// Embedding provider and model the index was built with
    pub embedding_provider: String,
    pub embedding_model: String,

    /// Most recent source timestamp
    pub built_at: Option<DateTime<Utc>>,
}
