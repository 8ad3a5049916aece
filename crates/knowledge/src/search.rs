//! Semantic index accessor.
//!
//! Wraps a persisted index and answers top-k similarity queries with
//! [`Passage`]s ready for the retrieval tool.

use std::path::Path;
use std::sync::{Arc, Mutex};

use catalog_core::{AppError, AppResult};
use rusqlite::Connection;

use crate::config;
use crate::embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
use crate::index;
use crate::types::{KnowledgeChunk, Passage, PassageMetadata};

/// Similarity search over stored passages.
///
/// Results are ordered by ascending cosine distance.
#[async_trait::async_trait]
pub trait PassageSearch: Send + Sync {
    async fn search(&self, query: &str, k: usize) -> AppResult<Vec<(Passage, f32)>>;
}

/// Read-only handle to a persisted index.
pub struct SemanticIndex {
    name: String,
    conn: Arc<Mutex<Connection>>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl std::fmt::Debug for SemanticIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticIndex")
            .field("name", &self.name)
            .field("embedder", &self.embedder)
            .finish()
    }
}

impl SemanticIndex {
    /// Open `.catalog/index/<index_name>/` with the embedder it was built with.
    ///
    /// # Errors
    /// `AppError::IndexUnavailable` when the directory is absent or empty,
    /// or the database or embedding settings cannot be read.
    pub async fn open(
        workspace: &Path,
        index_name: &str,
        api_key: Option<&str>,
    ) -> AppResult<Self> {
        config::ensure_index_present(workspace, index_name)?;

        let embedding_config =
            EmbeddingConfig::load(&config::get_embedding_config_path(workspace, index_name))?;
        let db_path = config::get_index_path(workspace, index_name);
        let conn = index::open_index_readonly(&db_path)?;

        let embedder = create_provider(&embedding_config, api_key).await?;

        tracing::info!(
            index = index_name,
            provider = embedder.provider_name(),
            model = embedder.model_name(),
            "Opened semantic index"
        );

        Ok(Self::from_parts(index_name, conn, embedder))
    }

    /// Assemble an index from an open connection and embedder.
    pub fn from_parts(
        name: impl Into<String>,
        conn: Connection,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            name: name.into(),
            conn: Arc::new(Mutex::new(conn)),
            embedder,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait::async_trait]
impl PassageSearch for SemanticIndex {
    async fn search(&self, query: &str, k: usize) -> AppResult<Vec<(Passage, f32)>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;

        let conn = Arc::clone(&self.conn);
        let results = tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| AppError::Knowledge("Index connection lock poisoned".to_string()))?;
            index::query_chunks(&conn, &query_embedding, k)
        })
        .await
        .map_err(|e| AppError::Knowledge(format!("Index search task failed: {}", e)))??;

        tracing::debug!(
            index = %self.name,
            results = results.len(),
            "Semantic search completed"
        );

        Ok(results
            .into_iter()
            .map(|(chunk, distance)| (chunk_to_passage(chunk), distance))
            .collect())
    }
}

fn chunk_to_passage(chunk: KnowledgeChunk) -> Passage {
    Passage::new(
        chunk.text,
        PassageMetadata {
            source: chunk.metadata.source,
            source_path: chunk.metadata.source_path,
            position: chunk.position,
            title: None,
            similarity: None,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::TrigramProvider;
    use crate::types::{ChunkMetadata, KnowledgeSource};
    use chrono::Utc;
    use std::path::PathBuf;
    use tempfile::TempDir;

    async fn seeded_index(temp: &TempDir) -> SemanticIndex {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(TrigramProvider::new(64));
        let db_path = temp.path().join("index.sqlite");
        let conn = index::init_index(&db_path).unwrap();

        index::insert_source(
            &conn,
            &KnowledgeSource {
                id: "s1".to_string(),
                path: PathBuf::from("docs/webcam.txt"),
                content_type: "text".to_string(),
                learned_at: Utc::now(),
                size_bytes: 10,
            },
        )
        .unwrap();

        let texts = [
            "LensPro webcam in black and silver",
            "Oak standing desk",
            "Wireless keyboard with backlight",
        ];
        for (i, text) in texts.iter().enumerate() {
            let embedding = embedder.embed(text).await.unwrap();
            index::insert_chunk(
                &conn,
                &KnowledgeChunk {
                    id: format!("c{}", i),
                    source_id: "s1".to_string(),
                    position: i as u32,
                    text: text.to_string(),
                    embedding: Some(embedding),
                    metadata: ChunkMetadata {
                        source: Some("webcam.txt".to_string()),
                        source_path: Some("docs/webcam.txt".to_string()),
                        start: 0,
                        end: text.len(),
                    },
                },
            )
            .unwrap();
        }

        SemanticIndex::from_parts("test", conn, embedder)
    }

    #[tokio::test]
    async fn test_search_returns_sorted_passages() {
        let temp = TempDir::new().unwrap();
        let index = seeded_index(&temp).await;

        let results = index.search("silver webcam", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0.text, "LensPro webcam in black and silver");
        assert_eq!(results[0].0.metadata.source.as_deref(), Some("webcam.txt"));
        assert!(results[0].1 <= results[1].1);
        assert!(results[0].0.metadata.similarity.is_none());
    }

    #[tokio::test]
    async fn test_search_zero_k() {
        let temp = TempDir::new().unwrap();
        let index = seeded_index(&temp).await;
        assert!(index.search("webcam", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_missing_index() {
        let temp = TempDir::new().unwrap();
        let result = SemanticIndex::open(temp.path(), "catalog", None).await;
        assert!(matches!(result, Err(AppError::IndexUnavailable(_))));
    }
}
