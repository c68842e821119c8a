//! Session state and the patches components return against it.

use serde::{Deserialize, Serialize};

use crate::message::{ConversationEntry, ConversationLog};
use crate::skill::{SkillPatch, SkillPool};

/// Everything one session carries between turns.
///
/// Owned by a single turn controller at a time; components read it by
/// reference and hand back a [`SessionPatch`] instead of mutating it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub log: ConversationLog,
    pub skills: SkillPool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a patch: append its entries, then apply its skill mutations.
    pub fn apply(&mut self, patch: SessionPatch) {
        self.log.extend(patch.entries);
        self.skills.merge(&patch.skills);
    }
}

/// The fields a component changed: new log entries and skill mutations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionPatch {
    pub entries: Vec<ConversationEntry>,
    pub skills: SkillPatch,
}

impl SessionPatch {
    pub fn entries(entries: Vec<ConversationEntry>) -> Self {
        Self {
            entries,
            skills: SkillPatch::default(),
        }
    }

    pub fn skills(skills: SkillPatch) -> Self {
        Self {
            entries: Vec::new(),
            skills,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.skills.is_empty()
    }
}
