//! Retrieval tool exposed to the chat model.
//!
//! The model sees a compact digest of the retrieved passages; the passages
//! themselves travel alongside as an artifact so citations can be built
//! without another search.

use std::sync::Arc;

use catalog_core::{AppError, AppResult};
use catalog_llm::{ToolCall, ToolDefinition};
use serde_json::json;

use crate::search::PassageSearch;
use crate::types::{Passage, NO_TITLE};

/// Name the model uses to call the tool.
pub const RETRIEVE_TOOL_NAME: &str = "retrieve";

const RETRIEVE_TOOL_DESCRIPTION: &str =
    "Retrieve product catalog passages with similarity scores for citation.";

/// Characters of passage text shown per digest line.
const DIGEST_PREVIEW_CHARS: usize = 100;

/// What a tool execution hands back to the conversation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalOutput {
    /// One line per passage, sent to the model
    pub digest: String,

    /// Passages with title and similarity filled in
    pub artifact: Vec<Passage>,
}

impl RetrievalOutput {
    pub fn is_empty(&self) -> bool {
        self.artifact.is_empty()
    }
}

/// Similarity search over the catalog index, callable by the model.
#[derive(Clone)]
pub struct RetrievalTool {
    index: Arc<dyn PassageSearch>,
    top_k: usize,
}

impl std::fmt::Debug for RetrievalTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalTool")
            .field("top_k", &self.top_k)
            .finish()
    }
}

impl RetrievalTool {
    pub fn new(index: Arc<dyn PassageSearch>, top_k: usize) -> Self {
        Self { index, top_k }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Tool schema advertised to the model.
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: RETRIEVE_TOOL_NAME.to_string(),
            description: RETRIEVE_TOOL_DESCRIPTION.to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query describing the products or facts to look up"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    /// Search the index and format the results.
    ///
    /// # Errors
    /// `AppError::RetrievalFailed` when the index search fails.
    pub async fn retrieve(&self, query: &str) -> AppResult<RetrievalOutput> {
        let results = self
            .index
            .search(query, self.top_k)
            .await
            .map_err(|e| AppError::RetrievalFailed(e.to_string()))?;

        let mut lines = Vec::with_capacity(results.len());
        let mut artifact = Vec::with_capacity(results.len());

        for (mut passage, score) in results {
            if passage.text.trim().is_empty() {
                continue;
            }

            let similarity = round3(score);
            passage.metadata.similarity = Some(similarity);
            passage.metadata.title = Some(
                passage
                    .metadata
                    .source
                    .clone()
                    .unwrap_or_else(|| NO_TITLE.to_string()),
            );

            let preview: String = normalize_whitespace(&passage.text)
                .chars()
                .take(DIGEST_PREVIEW_CHARS)
                .collect();
            lines.push(format!("(Similarity: {:.3}) {}...", similarity, preview));
            artifact.push(passage);
        }

        tracing::debug!(query, passages = artifact.len(), "Retrieval completed");

        Ok(RetrievalOutput {
            digest: lines.join("\n"),
            artifact,
        })
    }

    /// Run a model-issued tool call.
    ///
    /// Never fails: a missing query or a failed search yields an empty output.
    pub async fn execute(&self, call: &ToolCall) -> RetrievalOutput {
        let Some(query) = query_argument(call) else {
            tracing::warn!(tool_call_id = %call.id, "Retrieve call without a query argument");
            return RetrievalOutput::default();
        };

        match self.retrieve(&query).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(tool_call_id = %call.id, "Retrieval degraded to empty context: {}", e);
                RetrievalOutput::default()
            }
        }
    }
}

/// Extract `query` from object arguments or from a JSON-encoded string.
fn query_argument(call: &ToolCall) -> Option<String> {
    if let Some(query) = call.str_arg("query") {
        return Some(query.to_string());
    }

    let raw = call.arguments.as_str()?;
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(value) => value
            .get("query")
            .and_then(|q| q.as_str())
            .map(str::to_string),
        Err(_) if !raw.trim().is_empty() => Some(raw.to_string()),
        Err(_) => None,
    }
}

/// Collapse every whitespace run (newlines included) into one space.
pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn round3(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PassageMetadata;

    struct FixedSearch(Vec<(Passage, f32)>);

    #[async_trait::async_trait]
    impl PassageSearch for FixedSearch {
        async fn search(&self, _query: &str, k: usize) -> AppResult<Vec<(Passage, f32)>> {
            Ok(self.0.iter().take(k).cloned().collect())
        }
    }

    struct BrokenSearch;

    #[async_trait::async_trait]
    impl PassageSearch for BrokenSearch {
        async fn search(&self, _query: &str, _k: usize) -> AppResult<Vec<(Passage, f32)>> {
            Err(AppError::Knowledge("database is locked".to_string()))
        }
    }

    fn passage(text: &str, source: Option<&str>) -> Passage {
        Passage::new(
            text,
            PassageMetadata {
                source: source.map(str::to_string),
                ..Default::default()
            },
        )
    }

    fn tool_with(results: Vec<(Passage, f32)>, top_k: usize) -> RetrievalTool {
        RetrievalTool::new(Arc::new(FixedSearch(results)), top_k)
    }

    #[tokio::test]
    async fn test_retrieve_formats_digest_and_artifact() {
        let long_text = format!("LensPro 4K Webcam\ncomes in {}", "black ".repeat(40));
        let tool = tool_with(
            vec![
                (passage(&long_text, Some("webcam.txt")), 0.12345),
                (passage("Oak desk", None), 0.5),
            ],
            3,
        );

        let output = tool.retrieve("webcam colors").await.unwrap();
        let lines: Vec<&str> = output.digest.lines().collect();

        assert_eq!(lines.len(), output.artifact.len());
        assert!(lines[0].starts_with("(Similarity: 0.123) LensPro 4K Webcam comes in black"));
        assert!(lines[0].ends_with("..."));
        assert_eq!(
            lines[0].len(),
            "(Similarity: 0.123) ".len() + DIGEST_PREVIEW_CHARS + 3
        );
        assert_eq!(lines[1], "(Similarity: 0.500) Oak desk...");

        assert_eq!(output.artifact[0].metadata.similarity, Some(0.123));
        assert_eq!(output.artifact[0].metadata.title.as_deref(), Some("webcam.txt"));
        assert_eq!(output.artifact[1].metadata.title.as_deref(), Some(NO_TITLE));
    }

    #[tokio::test]
    async fn test_retrieve_respects_k_and_drops_blank_passages() {
        let tool = tool_with(
            vec![
                (passage("   ", Some("blank.txt")), 0.1),
                (passage("Keyboard", Some("keyboard.txt")), 0.2),
                (passage("Mouse", Some("mouse.txt")), 0.3),
            ],
            2,
        );

        let output = tool.retrieve("input devices").await.unwrap();
        assert!(output.artifact.len() <= 2);
        assert!(output.artifact.iter().all(|p| !p.text.trim().is_empty()));
        assert_eq!(output.digest.lines().count(), output.artifact.len());
    }

    #[tokio::test]
    async fn test_retrieve_maps_search_failure() {
        let tool = RetrievalTool::new(Arc::new(BrokenSearch), 3);
        let result = tool.retrieve("anything").await;
        assert!(matches!(result, Err(AppError::RetrievalFailed(_))));
    }

    #[tokio::test]
    async fn test_execute_degrades_to_empty_output() {
        let tool = RetrievalTool::new(Arc::new(BrokenSearch), 3);
        let call = ToolCall {
            id: "call_1".to_string(),
            name: RETRIEVE_TOOL_NAME.to_string(),
            arguments: json!({"query": "webcam"}),
        };

        let output = tool.execute(&call).await;
        assert!(output.is_empty());
        assert!(output.digest.is_empty());
    }

    #[tokio::test]
    async fn test_execute_accepts_encoded_arguments() {
        let tool = tool_with(vec![(passage("Keyboard", Some("keyboard.txt")), 0.2)], 3);
        let call = ToolCall {
            id: "call_1".to_string(),
            name: RETRIEVE_TOOL_NAME.to_string(),
            arguments: json!("{\"query\": \"keyboard\"}"),
        };

        let output = tool.execute(&call).await;
        assert_eq!(output.artifact.len(), 1);
    }

    #[tokio::test]
    async fn test_execute_without_query() {
        let tool = tool_with(vec![(passage("Keyboard", Some("keyboard.txt")), 0.2)], 3);
        let call = ToolCall {
            id: "call_1".to_string(),
            name: RETRIEVE_TOOL_NAME.to_string(),
            arguments: json!({}),
        };

        assert!(tool.execute(&call).await.is_empty());
    }

    #[test]
    fn test_definition_schema() {
        let tool = tool_with(Vec::new(), 3);
        let definition = tool.definition();
        assert_eq!(definition.name, "retrieve");
        assert_eq!(definition.parameters["required"], json!(["query"]));
    }
}
