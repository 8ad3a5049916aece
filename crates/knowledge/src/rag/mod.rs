//! Retrieval-augmented answering.
//!
//! A query runs through a per-session conversation: the model either answers
//! directly or calls the retrieval tool, and retrieved passages feed a second
//! model call whose answer is annotated with citations.

pub mod citations;
pub mod delivery;
pub mod graph;
pub mod message;
pub mod service;
pub mod session;
pub mod tool;

pub use citations::Citation;
pub use delivery::{AnswerNotification, WebhookNotifier};
pub use graph::{ConversationGraph, RouteDecision, TurnOutcome};
pub use message::Message;
pub use service::{QaService, QueryAnswer};
pub use session::{SessionHandle, SessionStore};
pub use tool::{RetrievalOutput, RetrievalTool, RETRIEVE_TOOL_NAME};
