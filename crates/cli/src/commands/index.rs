//! Index command handler.
//!
//! Builds the catalog index from documents and reports its statistics.

use catalog_core::{config::AppConfig, AppResult};
use catalog_knowledge::embeddings::EmbeddingConfig;
use catalog_knowledge::BuildOptions;
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Build or inspect the catalog index
#[derive(Args, Debug)]
pub struct IndexCommand {
    #[command(subcommand)]
    pub action: IndexAction,
}

#[derive(Subcommand, Debug)]
pub enum IndexAction {
    /// Rebuild the index from a documents directory
    Build(IndexBuildCommand),
    /// Show index statistics
    Stats(IndexStatsCommand),
}

impl IndexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        match &self.action {
            IndexAction::Build(cmd) => cmd.execute(config).await,
            IndexAction::Stats(cmd) => cmd.execute(config),
        }
    }
}

/// Rebuild the index from documents
#[derive(Args, Debug)]
pub struct IndexBuildCommand {
    /// Documents directory (default from config: docs)
    #[arg(long)]
    pub docs: Option<PathBuf>,

    /// Embedding provider (ollama, trigram)
    #[arg(long)]
    pub embedding_provider: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexBuildCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let docs = self.docs.clone().unwrap_or_else(|| config.docs_dir());
        let embedding = embedding_config(config, self.embedding_provider.as_deref());

        tracing::info!(
            "Executing index build for '{}' from {:?} with {} embeddings",
            config.retrieval.index_name,
            docs,
            embedding.provider
        );

        let options = BuildOptions::new(&config.retrieval.index_name, docs, embedding);
        let api_key = config.resolve_api_key();

        let stats =
            catalog_knowledge::build_index(&config.workspace, options, api_key.as_deref()).await?;

        if self.json {
            let output = serde_json::json!({
                "index": config.retrieval.index_name,
                "sourcesCount": stats.sources_count,
                "chunksCount": stats.chunks_count,
                "bytesProcessed": stats.bytes_processed,
                "durationSecs": stats.duration_secs,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Indexed {} sources ({} chunks, {} bytes) in {:.2}s",
                stats.sources_count, stats.chunks_count, stats.bytes_processed, stats.duration_secs
            );
        }

        Ok(())
    }
}

/// Embedding settings for a build.
///
/// Configured endpoint, model and dimensions apply only when the chosen
/// provider is the configured one.
fn embedding_config(config: &AppConfig, provider_override: Option<&str>) -> EmbeddingConfig {
    let configured = config.embedding_provider();
    let provider = provider_override.unwrap_or(&configured);

    if provider == configured {
        let (endpoint, model, dimensions) = config.embedding_settings();
        EmbeddingConfig::for_provider(provider, Some(endpoint), model, dimensions)
    } else {
        EmbeddingConfig::for_provider(provider, None, None, None)
    }
}

/// Show index statistics
#[derive(Args, Debug)]
pub struct IndexStatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IndexStatsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!(
            "Executing index stats for '{}'",
            config.retrieval.index_name
        );

        let stats = catalog_knowledge::index_stats(&config.workspace, &config.retrieval.index_name)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&stats)?);
        } else {
            println!("Index: {}", stats.index_name);
            println!("Sources: {}", stats.sources_count);
            println!("Chunks: {}", stats.chunks_count);
            println!("Database size: {} bytes", stats.db_size_bytes);
            println!(
                "Embeddings: {} ({})",
                stats.embedding_provider, stats.embedding_model
            );
            if let Some(built_at) = stats.built_at {
                println!("Built at: {}", built_at.to_rfc3339());
            }
        }

        Ok(())
    }
}
