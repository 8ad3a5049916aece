//! Query entry point shared by the CLI and the HTTP server.

use std::sync::Arc;

use catalog_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::rag::citations::Citation;
use crate::rag::delivery::{AnswerNotification, WebhookNotifier};
use crate::rag::graph::ConversationGraph;

/// Answer returned for an inbound query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub session_id: String,

    /// Answer including the sources block
    pub answer: String,

    /// Model answer without the sources block
    pub raw_answer: String,

    pub citations: Vec<Citation>,
}

/// Validates queries, runs the conversation and delivers answers.
#[derive(Clone)]
pub struct QaService {
    graph: Arc<ConversationGraph>,
    notifier: Option<WebhookNotifier>,
}

impl QaService {
    pub fn new(graph: Arc<ConversationGraph>) -> Self {
        Self {
            graph,
            notifier: None,
        }
    }

    /// Also POST each answer to `notifier`'s callback URL.
    pub fn with_notifier(mut self, notifier: WebhookNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn graph(&self) -> &ConversationGraph {
        &self.graph
    }

    /// Answer `query` within `session_id`'s conversation.
    ///
    /// # Errors
    /// * `AppError::InvalidInput` - blank session id
    /// * `AppError::EmptyQuery` - blank query; the model is not called
    /// * `AppError::Llm` - a model call failed
    pub async fn handle_query(&self, session_id: &str, query: &str) -> AppResult<QueryAnswer> {
        let session_id = session_id.trim();
        if session_id.is_empty() {
            return Err(AppError::InvalidInput("session id must not be empty".to_string()));
        }

        let query = query.trim();
        if query.is_empty() {
            tracing::info!(session_id, "Rejected empty query");
            return Err(AppError::EmptyQuery);
        }

        tracing::info!(session_id, query, "Handling query");

        let outcome = self.graph.run_turn(session_id, query).await?;

        let answer = QueryAnswer {
            session_id: session_id.to_string(),
            answer: outcome.answer().to_string(),
            raw_answer: outcome.raw_answer,
            citations: outcome.citations,
        };

        if let Some(notifier) = &self.notifier {
            let notification = AnswerNotification {
                session_id: answer.session_id.clone(),
                answer: answer.answer.clone(),
            };
            if let Err(e) = notifier.deliver(&notification).await {
                tracing::error!(session_id, "Answer delivery failed: {}", e);
            }
        }

        Ok(answer)
    }
}
