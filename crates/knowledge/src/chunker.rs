//! Text chunking with configurable size and overlap.

use crate::types::{ChunkCandidate, ChunkMetadata};
use catalog_core::{AppError, AppResult};
use text_splitter::{ChunkConfig, TextSplitter};

/// Chunk text into overlapping segments.
///
/// Uses `text-splitter`, which prefers the largest semantic unit that fits:
/// paragraphs, then sentences, then words. Sizes are measured in characters.
pub fn chunk_text(
    source_id: &str,
    text: &str,
    chunk_size: usize,
    overlap: usize,
) -> AppResult<Vec<ChunkCandidate>> {
    if text.trim().is_empty() {
        return Ok(vec![]);
    }

    let config = ChunkConfig::new(chunk_size)
        .with_overlap(overlap)
        .map_err(|e| {
            AppError::Knowledge(format!(
                "Invalid chunking parameters (size {}, overlap {}): {}",
                chunk_size, overlap, e
            ))
        })?;
    let splitter = TextSplitter::new(config);

    let chunks: Vec<ChunkCandidate> = splitter
        .chunk_indices(text)
        .filter(|(_, chunk)| !chunk.trim().is_empty())
        .enumerate()
        .map(|(position, (offset, chunk))| ChunkCandidate {
            source_id: source_id.to_string(),
            position: position as u32,
            text: chunk.to_string(),
            metadata: ChunkMetadata {
                start: offset,
                end: offset + chunk.len(),
                ..Default::default()
            },
        })
        .collect();

    tracing::debug!(
        "Chunked text into {} chunks (size: {}, overlap: {})",
        chunks.len(),
        chunk_size,
        overlap
    );

    Ok(chunks)
}
