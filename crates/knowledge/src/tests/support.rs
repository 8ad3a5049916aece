//! Scripted fakes shared by the pipeline tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use catalog_core::{AppError, AppResult};
use catalog_llm::{ChatMessage, ChatRequest, ChatResponse, LlmClient, LlmUsage, ToolCall};
use catalog_prompt::GeneratePrompt;
use serde_json::json;

use crate::rag::{ConversationGraph, QaService, RetrievalTool, SessionStore, RETRIEVE_TOOL_NAME};
use crate::search::PassageSearch;
use crate::types::{Passage, PassageMetadata};

/// LLM that replays a fixed list of replies and records requests.
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<AppResult<ChatMessage>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedLlm {
    pub fn new(responses: Vec<ChatMessage>) -> Arc<Self> {
        Self::with_replies(responses.into_iter().map(Ok).collect())
    }

    /// Script that can fail at chosen steps.
    pub fn with_replies(replies: Vec<AppResult<ChatMessage>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let message = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::Llm("script exhausted".to_string())))?;

        Ok(ChatResponse {
            message,
            model: request.model.clone(),
            usage: LlmUsage::new(10, 5),
            done: true,
        })
    }
}

/// Search that returns fixed passages.
pub struct FixedSearch(pub Vec<(Passage, f32)>);

#[async_trait::async_trait]
impl PassageSearch for FixedSearch {
    async fn search(&self, _query: &str, k: usize) -> AppResult<Vec<(Passage, f32)>> {
        Ok(self.0.iter().take(k).cloned().collect())
    }
}

/// Search whose backing index is gone.
pub struct FailingSearch;

#[async_trait::async_trait]
impl PassageSearch for FailingSearch {
    async fn search(&self, _query: &str, _k: usize) -> AppResult<Vec<(Passage, f32)>> {
        Err(AppError::Knowledge("no such table: chunks".to_string()))
    }
}

pub fn passage(text: &str, source: &str) -> Passage {
    Passage::new(
        text,
        PassageMetadata {
            source: Some(source.to_string()),
            source_path: Some(format!("docs/{}", source)),
            ..Default::default()
        },
    )
}

/// Assistant message calling the retrieval tool.
pub fn retrieve_call(id: &str, query: &str) -> ChatMessage {
    ChatMessage::assistant_with_tool_calls(
        "",
        vec![ToolCall {
            id: id.to_string(),
            name: RETRIEVE_TOOL_NAME.to_string(),
            arguments: json!({ "query": query }),
        }],
    )
}

pub fn service_with(
    llm: Arc<ScriptedLlm>,
    search: Arc<dyn PassageSearch>,
    top_k: usize,
) -> QaService {
    let graph = ConversationGraph::new(
        llm,
        "llama3.2",
        RetrievalTool::new(search, top_k),
        GeneratePrompt::builtin().unwrap(),
        SessionStore::new(100, Duration::from_secs(600)),
    );
    QaService::new(Arc::new(graph))
}

/// Citation lines under the sources header of an answer.
pub fn source_lines(answer: &str) -> Vec<String> {
    let (_, sources) = answer
        .split_once("**Sources:**\n")
        .expect("answer has a sources block");
    sources
        .lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
