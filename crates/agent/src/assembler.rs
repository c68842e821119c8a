//! Prompt assembly — one fresh system prompt per model call.
//!
//! The system prompt is rebuilt from the base instructions and the current
//! skill pool every time. System entries already in the log are dropped
//! from the history, so the model always sees exactly one.

use std::path::Path;

use skillloop_core::message::ConversationEntry;
use skillloop_core::session::SessionState;
use skillloop_core::skill::SkillPool;

const SKILLS_HEADER: &str = "\n\n=== Active Skills ===";
const SKILLS_FOOTER: &str = "\n=====================";

/// The model input for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledPrompt {
    pub system_prompt: String,
    /// Non-system log entries, in log order.
    pub history: Vec<ConversationEntry>,
}

impl AssembledPrompt {
    /// The synthetic system entry followed by the history.
    pub fn entries(&self) -> Vec<ConversationEntry> {
        let mut entries = Vec::with_capacity(self.history.len() + 1);
        entries.push(ConversationEntry::system(&self.system_prompt));
        entries.extend(self.history.iter().cloned());
        entries
    }
}

#[derive(Debug, Clone)]
pub struct PromptAssembler {
    base_instructions: String,
}

impl PromptAssembler {
    /// Default instructions, naming `working_dir` as the current directory.
    pub fn new(working_dir: &Path) -> Self {
        Self {
            base_instructions: format!(
                "You are a capable CLI agent that can run shell commands.\n\
                 For any non-trivial request, first check whether a relevant skill exists \
                 and activate it before starting.\n\
                 Current working directory: {}",
                working_dir.display()
            ),
        }
    }

    /// Replace the base instructions entirely.
    pub fn with_instructions(instructions: impl Into<String>) -> Self {
        Self {
            base_instructions: instructions.into(),
        }
    }

    pub fn base_instructions(&self) -> &str {
        &self.base_instructions
    }

    /// Build the prompt for `state`. Pure: the state is only read.
    pub fn assemble(&self, state: &SessionState) -> AssembledPrompt {
        AssembledPrompt {
            system_prompt: self.system_prompt(&state.skills),
            history: state
                .log
                .iter()
                .filter(|entry| !entry.is_system())
                .cloned()
                .collect(),
        }
    }

    fn system_prompt(&self, skills: &SkillPool) -> String {
        let mut prompt = self.base_instructions.clone();
        if skills.is_empty() {
            return prompt;
        }

        prompt.push_str(SKILLS_HEADER);
        for (name, content) in skills.iter() {
            prompt.push_str(&format!("\n\n[Skill: {name}]\n{content}"));
        }
        prompt.push_str(SKILLS_FOOTER);
        prompt
    }
}
