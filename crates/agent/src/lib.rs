//! The turn orchestration loop — the heart of SkillLoop.
//!
//! One turn alternates between the model and the tools:
//!
//! 1. **Assemble** a fresh system prompt from the base instructions and the
//!    active skills, followed by the non-system history
//! 2. **Call the model** and append its answer to the log
//! 3. **If tool calls**: dispatch them concurrently, append one correlated
//!    result per call, reconcile skill activations, go back to step 1
//! 4. **If text only**: the turn is over
//!
//! The session's [`SessionState`](skillloop_core::SessionState) is owned by
//! the caller and passed in by `&mut`; components return patches that the
//! controller merges.

pub mod assembler;
pub mod controller;
pub mod dispatcher;
pub mod reconciler;

#[cfg(test)]
mod test_helpers;

pub use assembler::{AssembledPrompt, PromptAssembler};
pub use controller::{StepOutcome, TurnController};
pub use dispatcher::{DEFAULT_TOOL_TIMEOUT, ToolDispatcher};
pub use reconciler::OutputReconciler;
