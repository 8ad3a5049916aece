//! Prompt system for the catalog Q&A service.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions
//! - Built-in definitions with per-workspace overrides
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{build_prompt, GeneratePrompt, GENERATE_PROMPT_ID};
pub use loader::{builtin_prompt, load_prompt, resolve_prompt};
pub use types::{
    BuiltPrompt, BuiltPromptMetadata, PromptBehavior, PromptDefinition, PromptInputSpec,
    PromptOutputSpec, PromptRole,
};
