//! Wiring of the answer pipeline from configuration.

use std::sync::Arc;

use catalog_core::{config::AppConfig, AppError, AppResult};
use catalog_knowledge::rag::{
    ConversationGraph, QaService, RetrievalTool, SessionStore, WebhookNotifier,
};
use catalog_knowledge::SemanticIndex;
use catalog_llm::create_client;
use catalog_prompt::GeneratePrompt;

/// Open the index and assemble the query service.
///
/// # Errors
/// `AppError::IndexUnavailable` when the configured index has not been built.
pub async fn build_service(config: &AppConfig) -> AppResult<QaService> {
    let api_key = config.resolve_api_key();

    let index = SemanticIndex::open(
        &config.workspace,
        &config.retrieval.index_name,
        api_key.as_deref(),
    )
    .await?;

    let endpoint = config.endpoint();
    let client = create_client(
        &config.provider,
        Some(endpoint.as_str()),
        api_key.as_deref(),
        config.timeout_secs(),
    )
    .map_err(AppError::Config)?;

    let prompt = GeneratePrompt::load(&config.workspace)?;
    tracing::debug!("Using generate prompt: {}", prompt.id());

    let graph = ConversationGraph::new(
        client,
        &config.model,
        RetrievalTool::new(Arc::new(index), config.retrieval.top_k),
        prompt,
        SessionStore::from_settings(&config.sessions),
    );

    let mut service = QaService::new(Arc::new(graph));

    if let Some(url) = &config.callback_url {
        tracing::info!("Delivering answers to {}", url);
        service = service.with_notifier(WebhookNotifier::new(url.as_str())?);
    }

    Ok(service)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_index_hint_appears_once() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = AppConfig {
            workspace: temp.path().to_path_buf(),
            ..AppConfig::default()
        };

        match build_service(&config).await {
            Err(AppError::IndexUnavailable(msg)) => {
                assert_eq!(msg.matches("Run 'catalog index build' first.").count(), 1);
            }
            Err(other) => panic!("Expected IndexUnavailable, got {}", other),
            Ok(_) => panic!("Expected IndexUnavailable, got a service"),
        }
    }
}
