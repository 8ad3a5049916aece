//! Conversation messages stored in session history.

use catalog_llm::{ChatMessage, ToolCall};
use serde::{Deserialize, Serialize};

use crate::types::Passage;

/// A single entry of a session's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    Human {
        content: String,
    },
    System {
        content: String,
    },
    Ai {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },
    /// Result of a tool call. `artifact` keeps the full passages for citation
    /// and is never sent to the model.
    Tool {
        tool_call_id: String,
        name: String,
        content: String,
        #[serde(default)]
        artifact: Vec<Passage>,
    },
}

impl Message {
    pub fn human(content: impl Into<String>) -> Self {
        Message::Human {
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: content.into(),
        }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Message::Ai {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Message::Human { content }
            | Message::System { content }
            | Message::Ai { content, .. }
            | Message::Tool { content, .. } => content,
        }
    }

    /// Tool calls requested by an AI message; empty for every other kind.
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Message::Ai { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    /// Convert to the model wire format, dropping any artifact.
    pub fn to_chat_message(&self) -> ChatMessage {
        match self {
            Message::Human { content } => ChatMessage::user(content.as_str()),
            Message::System { content } => ChatMessage::system(content.as_str()),
            Message::Ai {
                content,
                tool_calls,
            } if tool_calls.is_empty() => ChatMessage::assistant(content.as_str()),
            Message::Ai {
                content,
                tool_calls,
            } => ChatMessage::assistant_with_tool_calls(content.as_str(), tool_calls.clone()),
            Message::Tool {
                tool_call_id,
                name,
                content,
                ..
            } => ChatMessage::tool(tool_call_id.as_str(), name.as_str(), content.as_str()),
        }
    }
}

impl From<ChatMessage> for Message {
    fn from(message: ChatMessage) -> Self {
        use catalog_llm::ChatRole;

        match message.role {
            ChatRole::System => Message::System {
                content: message.content,
            },
            ChatRole::User => Message::Human {
                content: message.content,
            },
            ChatRole::Assistant => Message::Ai {
                content: message.content,
                tool_calls: message.tool_calls,
            },
            ChatRole::Tool => Message::Tool {
                tool_call_id: message.tool_call_id.unwrap_or_default(),
                name: message.tool_name.unwrap_or_default(),
                content: message.content,
                artifact: Vec::new(),
            },
        }
    }
}
