//! Conversation state machine: route, optional retrieve, generate.
//!
//! One turn runs while holding only its own session's lock, so turns of the
//! same session are serialised and different sessions proceed independently.

use std::sync::Arc;

use catalog_core::AppResult;
use catalog_llm::{ChatMessage, ChatRequest, LlmClient, ToolCall};
use catalog_prompt::GeneratePrompt;

use crate::rag::citations::{collect_citations, format_with_sources, Citation};
use crate::rag::message::Message;
use crate::rag::session::SessionStore;
use crate::rag::tool::{RetrievalTool, RETRIEVE_TOOL_NAME};

/// Sampling temperature for both model calls.
const TEMPERATURE: f32 = 0.0;

/// Outcome of the route step.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteDecision {
    /// The model answered directly; the turn is over.
    Respond(Message),
    /// The model asked for retrieval with these calls.
    Retrieve(Vec<ToolCall>),
}

/// Result of one conversation turn.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// Final AI message as appended to the history
    pub message: Message,

    /// Model answer without the sources block
    pub raw_answer: String,

    /// Citations of the current round; empty for direct responses
    pub citations: Vec<Citation>,
}

impl TurnOutcome {
    pub fn answer(&self) -> &str {
        self.message.content()
    }
}

/// Retrieval-augmented conversation over per-session memory.
pub struct ConversationGraph {
    llm: Arc<dyn LlmClient>,
    model: String,
    tool: RetrievalTool,
    prompt: GeneratePrompt,
    sessions: SessionStore,
}

impl ConversationGraph {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
        tool: RetrievalTool,
        prompt: GeneratePrompt,
        sessions: SessionStore,
    ) -> Self {
        Self {
            llm,
            model: model.into(),
            tool,
            prompt,
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Run one turn for `session_id` with an already validated query.
    ///
    /// History is append-only: messages appended before a model error stay
    /// in place, and the next turn routes around them.
    pub async fn run_turn(&self, session_id: &str, query: &str) -> AppResult<TurnOutcome> {
        let handle = self.sessions.get_or_create(session_id);
        let mut history = handle.lock().await;

        history.push(Message::human(query));

        self.advance(session_id, &mut history).await
    }

    async fn advance(&self, session_id: &str, history: &mut Vec<Message>) -> AppResult<TurnOutcome> {
        match self.route(session_id, history).await? {
            RouteDecision::Respond(message) => {
                tracing::info!(session_id, "Answered without retrieval");
                Ok(TurnOutcome {
                    raw_answer: message.content().trim().to_string(),
                    message,
                    citations: Vec::new(),
                })
            }
            RouteDecision::Retrieve(calls) => {
                self.retrieve(session_id, history, &calls).await;
                self.generate(session_id, history).await
            }
        }
    }

    /// Ask the tool-bound model whether to answer or retrieve.
    ///
    /// The AI message is appended in both cases.
    pub async fn route(
        &self,
        session_id: &str,
        history: &mut Vec<Message>,
    ) -> AppResult<RouteDecision> {
        let request = ChatRequest::new(&self.model, route_messages(history))
            .with_tools(vec![self.tool.definition()])
            .with_temperature(TEMPERATURE);

        let response = self.llm.chat(&request).await?;

        let calls: Vec<ToolCall> = response
            .message
            .tool_calls
            .iter()
            .filter(|call| call.name == RETRIEVE_TOOL_NAME)
            .cloned()
            .collect();

        let message = Message::Ai {
            content: response.message.content,
            tool_calls: response.message.tool_calls,
        };
        history.push(message.clone());

        tracing::debug!(session_id, tool_calls = calls.len(), "Route step completed");

        if calls.is_empty() {
            Ok(RouteDecision::Respond(message))
        } else {
            Ok(RouteDecision::Retrieve(calls))
        }
    }

    /// Execute each retrieve call in order and append its result.
    pub async fn retrieve(&self, session_id: &str, history: &mut Vec<Message>, calls: &[ToolCall]) {
        for call in calls {
            let output = self.tool.execute(call).await;

            tracing::info!(
                session_id,
                tool_call_id = %call.id,
                passages = output.artifact.len(),
                "Retrieved passages"
            );

            history.push(Message::Tool {
                tool_call_id: call.id.clone(),
                name: call.name.clone(),
                content: output.digest,
                artifact: output.artifact,
            });
        }
    }

    /// Answer from the retrieved digests and attach citations.
    pub async fn generate(
        &self,
        session_id: &str,
        history: &mut Vec<Message>,
    ) -> AppResult<TurnOutcome> {
        let context = retrieved_context(history);
        let instruction = self.prompt.render(&context)?;

        let mut messages = vec![ChatMessage::system(instruction)];
        messages.extend(
            history
                .iter()
                .filter(|message| is_conversational(message))
                .map(Message::to_chat_message),
        );

        let request = ChatRequest::new(&self.model, messages).with_temperature(TEMPERATURE);
        let response = self.llm.chat(&request).await?;

        let raw_answer = response.message.content.trim().to_string();
        let citations = collect_citations(history);
        let message = Message::ai(format_with_sources(&raw_answer, &citations));

        history.push(message.clone());

        tracing::info!(
            session_id,
            citations = citations.len(),
            "Generated answer"
        );

        Ok(TurnOutcome {
            message,
            raw_answer,
            citations,
        })
    }
}

/// Digests of the trailing run of Tool messages, oldest first.
fn retrieved_context(history: &[Message]) -> String {
    let mut digests: Vec<&str> = history
        .iter()
        .rev()
        .map_while(|message| match message {
            Message::Tool { content, .. } => Some(content.as_str()),
            _ => None,
        })
        .collect();

    digests.reverse();
    digests.join("\n\n")
}

/// History as shown to the routing model.
///
/// An AI tool-call message with no Tool reply after it is left over from an
/// interrupted turn and is skipped.
fn route_messages(history: &[Message]) -> Vec<ChatMessage> {
    history
        .iter()
        .enumerate()
        .filter(|(i, message)| {
            message.tool_calls().is_empty()
                || matches!(history.get(i + 1), Some(Message::Tool { .. }))
        })
        .map(|(_, message)| message.to_chat_message())
        .collect()
}

/// Messages the generate step shows the model: no tool-call scaffolding.
fn is_conversational(message: &Message) -> bool {
    match message {
        Message::Human { .. } | Message::System { .. } => true,
        Message::Ai { tool_calls, .. } => tool_calls.is_empty(),
        Message::Tool { .. } => false,
    }
}
