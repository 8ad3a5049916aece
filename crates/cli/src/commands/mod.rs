//! Command handlers for the catalog CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod chat;
pub mod index;
pub mod runtime;
pub mod serve;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use index::IndexCommand;
pub use serve::ServeCommand;
