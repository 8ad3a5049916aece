//! Catalog knowledge: index construction, semantic search and the RAG pipeline.
//!
//! Provides local-first retrieval using SQLite and embeddings, and the
//! conversation machinery that turns retrieved passages into cited answers.

pub mod chunker;
pub mod config;
pub mod embeddings;
pub mod index;
pub mod parser;
pub mod rag;
pub mod search;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use search::{PassageSearch, SemanticIndex};
pub use types::{
    BuildOptions, BuildStats, ChunkMetadata, IndexStats, KnowledgeChunk, KnowledgeSource,
    Passage, PassageMetadata,
};

use catalog_core::{AppError, AppResult};
use chrono::Utc;
use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

/// Build an index from a directory of documents.
///
/// The target index directory is removed first, so every build is a full
/// rebuild. Files that cannot be parsed (binary, unreadable) are skipped
/// with a warning.
pub async fn build_index(
    workspace: &Path,
    options: BuildOptions,
    api_key: Option<&str>,
) -> AppResult<BuildStats> {
    let start = Instant::now();

    tracing::info!(
        "Building index '{}' from {:?}",
        options.index_name,
        options.docs_path
    );

    if !options.docs_path.exists() {
        return Err(AppError::Knowledge(format!(
            "Documents path does not exist: {:?}",
            options.docs_path
        )));
    }

    // Fail on a bad embedder before touching the existing index
    let embedder = create_provider(&options.embedding, api_key).await?;

    config::remove_index_dir(workspace, &options.index_name)?;

    let index_path = config::get_index_path(workspace, &options.index_name);
    let conn = index::init_index(&index_path)?;

    let mut sources_count = 0u32;
    let mut chunks_count = 0u32;
    let mut bytes_processed = 0u64;

    for path in collect_documents(&options.docs_path) {
        let text = match parser::parse_file(&path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Skipping {:?}: {}", path, e);
                continue;
            }
        };

        let (chunks, bytes) =
            process_file(&conn, embedder.as_ref(), &path, &text, &options).await?;
        sources_count += 1;
        chunks_count += chunks;
        bytes_processed += bytes;
    }

    let persisted = EmbeddingConfig {
        provider: embedder.provider_name().to_string(),
        model: embedder.model_name().to_string(),
        dimensions: embedder.dimensions(),
        ..options.embedding.clone()
    };
    persisted.save(&config::get_embedding_config_path(
        workspace,
        &options.index_name,
    ))?;

    let duration = start.elapsed();

    tracing::info!(
        "Index build completed: {} sources, {} chunks, {} bytes in {:.2}s",
        sources_count,
        chunks_count,
        bytes_processed,
        duration.as_secs_f64()
    );

    Ok(BuildStats {
        sources_count,
        chunks_count,
        bytes_processed,
        duration_secs: duration.as_secs_f64(),
    })
}

/// List document files under a path in a stable order, skipping hidden entries.
fn collect_documents(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect();

    files.sort();
    files
}

/// Chunk, embed and store the parsed text of a single file.
async fn process_file(
    conn: &Connection,
    embedder: &dyn EmbeddingProvider,
    path: &Path,
    text: &str,
    options: &BuildOptions,
) -> AppResult<(u32, u64)> {
    tracing::debug!("Processing file: {:?}", path);

    let size_bytes = text.len() as u64;

    let source_id = uuid::Uuid::new_v4().to_string();
    let source = KnowledgeSource {
        id: source_id.clone(),
        path: path.to_path_buf(),
        content_type: parser::ContentType::from_path(path).as_str().to_string(),
        learned_at: Utc::now(),
        size_bytes,
    };

    index::insert_source(conn, &source)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string());
    let source_path = path.to_string_lossy().to_string();

    let candidates =
        chunker::chunk_text(&source_id, text, options.chunk_size, options.chunk_overlap)?;

    let mut chunks_count = 0u32;

    for batch in candidates.chunks(options.embedding.batch_size.max(1)) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;

        if embeddings.len() != batch.len() {
            return Err(AppError::Llm(format!(
                "Embedder returned {} vectors for {} chunks",
                embeddings.len(),
                batch.len()
            )));
        }

        for (candidate, embedding) in batch.iter().zip(embeddings) {
            let chunk = KnowledgeChunk {
                id: uuid::Uuid::new_v4().to_string(),
                source_id: candidate.source_id.clone(),
                position: candidate.position,
                text: candidate.text.clone(),
                embedding: Some(embedding),
                metadata: ChunkMetadata {
                    source: file_name.clone(),
                    source_path: Some(source_path.clone()),
                    ..candidate.metadata.clone()
                },
            };

            index::insert_chunk(conn, &chunk)?;
            chunks_count += 1;
        }
    }

    tracing::debug!(
        "Processed {:?}: {} chunks, {} bytes",
        path,
        chunks_count,
        size_bytes
    );

    Ok((chunks_count, size_bytes))
}

/// Get statistics for a persisted index.
pub fn index_stats(workspace: &Path, index_name: &str) -> AppResult<IndexStats> {
    tracing::info!("Getting stats for index '{}'", index_name);

    config::ensure_index_present(workspace, index_name)?;

    let index_path = config::get_index_path(workspace, index_name);
    let conn = index::open_index_readonly(&index_path)?;
    let (sources_count, chunks_count, built_at) = index::get_stats(&conn)?;

    let embedding =
        EmbeddingConfig::load(&config::get_embedding_config_path(workspace, index_name))?;

    let db_size_bytes = std::fs::metadata(&index_path).map(|m| m.len()).unwrap_or(0);

    Ok(IndexStats {
        index_name: index_name.to_string(),
        sources_count,
        chunks_count,
        db_size_bytes,
        embedding_provider: embedding.provider,
        embedding_model: embedding.model,
        built_at,
    })
}
