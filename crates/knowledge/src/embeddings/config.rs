//! Embedding configuration types and management.
//!
//! The settings an index was built with are persisted as `embedding.yaml`
//! next to its database, so queries embed with the same provider and model.

use catalog_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Embedding configuration for an index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "ollama" or "trigram"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Maximum batch size for embedding requests
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Provider endpoint (Ollama base URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

fn default_batch_size() -> usize {
    100
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            batch_size: default_batch_size(),
            endpoint: None,
        }
    }
}

impl EmbeddingConfig {
    /// Offline, deterministic trigram embeddings.
    pub fn trigram() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            batch_size: default_batch_size(),
            endpoint: None,
        }
    }

    /// Settings for a named provider with optional overrides.
    ///
    /// Unset model and dimensions fall back to the provider's defaults.
    pub fn for_provider(
        provider: &str,
        endpoint: Option<String>,
        model: Option<String>,
        dimensions: Option<usize>,
    ) -> Self {
        let base = match provider {
            "trigram" => Self::trigram(),
            _ => Self {
                provider: provider.to_string(),
                endpoint,
                ..Self::default()
            },
        };

        Self {
            model: model.unwrap_or(base.model.clone()),
            dimensions: dimensions.unwrap_or(base.dimensions),
            ..base
        }
    }

    /// Load embedding config from an index's `embedding.yaml`.
    pub fn load(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AppError::IndexUnavailable(format!(
                "Failed to read embedding settings at {:?}: {}",
                path, e
            ))
        })?;

        serde_yaml::from_str(&content).map_err(|e| {
            AppError::IndexUnavailable(format!(
                "Failed to parse embedding settings at {:?}: {}",
                path, e
            ))
        })
    }

    /// Save embedding config as YAML.
    pub fn save(&self, path: &Path) -> AppResult<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::Knowledge(format!("Failed to create index directory: {}", e))
            })?;
        }

        let yaml = serde_yaml::to_string(self)
            .map_err(|e| AppError::Knowledge(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, yaml).map_err(|e| {
            AppError::Knowledge(format!("Failed to write config to {:?}: {}", path, e))
        })?;

        tracing::debug!("Saved embedding config to {:?}", path);
        Ok(())
    }
}
