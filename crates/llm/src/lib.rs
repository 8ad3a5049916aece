//! LLM integration crate for the catalog Q&A service.
//!
//! This crate provides a provider-agnostic abstraction for chat completion
//! with tool calling.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//!
//! # Example
//! ```no_run
//! use catalog_llm::{ChatMessage, ChatRequest, LlmClient, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = ChatRequest::new("llama3.2", vec![ChatMessage::user("Hello, world!")]);
//! let response = client.chat(&request).await?;
//! println!("{}", response.message.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{
    ChatMessage, ChatRequest, ChatResponse, ChatRole, LlmClient, LlmUsage, ToolCall,
    ToolDefinition,
};
pub use factory::create_client;
pub use providers::OllamaClient;
