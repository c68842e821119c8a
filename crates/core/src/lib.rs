//! # SkillLoop Core
//!
//! Domain types, traits, and error definitions for the SkillLoop agent.
//! This crate has **no framework dependencies** — it defines the domain model
//! that the provider, tool, and agent crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (the language model, tool functions, skill
//! storage) is a trait here. Implementations live in their own crates, so the
//! turn loop can be driven by scripted doubles in tests.

pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod session;
pub mod skill;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use event::{DomainEvent, EventBus};
pub use message::{
    AssistantMessage, ConversationEntry, ConversationLog, ToolCallRequest, ToolResultEntry,
};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use session::{SessionPatch, SessionState};
pub use skill::{SkillAction, SkillMutation, SkillPatch, SkillPool, SkillStore};
pub use tool::{Tool, ToolOutput, ToolRegistry};
