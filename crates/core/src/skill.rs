//! Skills — named instruction protocols injected into every prompt while active.
//!
//! The [`SkillPool`] holds the active set for one session. It is only ever
//! changed through a [`SkillPatch`], which the output reconciler derives from
//! skill-management tool results carrying the markers defined here.

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::SkillError;

/// Prefix of a successful activation result; the remainder is the protocol text.
pub const ACTIVATION_MARKER: &str = "SYSTEM_INJECTION: ";

/// Prefix of a successful deactivation result; followed by the skill name.
pub const DEACTIVATION_MARKER: &str = "SKILL_DEACTIVATION: ";

/// Render the deactivation result for `name`.
pub fn deactivation_marker(name: &str) -> String {
    format!("{DEACTIVATION_MARKER}{name}")
}

/// What a skill-management call asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillAction {
    Activate,
    Deactivate,
}

impl SkillAction {
    /// Parse the `action` argument of a management call.
    ///
    /// Absent or `null` means activate; anything other than the strings
    /// `"activate"` and `"deactivate"` is unsupported.
    pub fn from_arg(action: Option<&serde_json::Value>) -> Option<Self> {
        match action {
            None | Some(serde_json::Value::Null) => Some(Self::Activate),
            Some(value) => match value.as_str().map(str::trim) {
                Some("activate") => Some(Self::Activate),
                Some("deactivate") => Some(Self::Deactivate),
                _ => None,
            },
        }
    }
}

/// Active skills keyed by name, iterated in activation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillPool {
    skills: IndexMap<String, String>,
}

impl SkillPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `content` under `name`. Re-activation overwrites in place.
    pub fn activate(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.skills.insert(name.into(), content.into());
    }

    /// Remove `name`. Returns the removed content; absent names are a no-op.
    pub fn deactivate(&mut self, name: &str) -> Option<String> {
        self.skills.shift_remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.skills.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.skills.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// All `(name, content)` pairs in activation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.skills.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.skills.keys().map(String::as_str).collect()
    }

    /// Apply every mutation of `patch`, in order.
    pub fn merge(&mut self, patch: &SkillPatch) {
        for mutation in patch.iter() {
            match mutation {
                SkillMutation::Activate { name, content } => {
                    self.activate(name.clone(), content.clone())
                }
                SkillMutation::Deactivate { name } => {
                    self.deactivate(name);
                }
            }
        }
    }
}

/// One change to the skill pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SkillMutation {
    Activate { name: String, content: String },
    Deactivate { name: String },
}

impl SkillMutation {
    pub fn name(&self) -> &str {
        match self {
            Self::Activate { name, .. } | Self::Deactivate { name } => name,
        }
    }
}

/// An ordered list of skill-pool mutations. Empty means "leave the pool alone".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillPatch {
    mutations: Vec<SkillMutation>,
}

impl SkillPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activate(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.mutations.push(SkillMutation::Activate {
            name: name.into(),
            content: content.into(),
        });
    }

    pub fn deactivate(&mut self, name: impl Into<String>) {
        self.mutations.push(SkillMutation::Deactivate { name: name.into() });
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SkillMutation> {
        self.mutations.iter()
    }
}

impl From<Vec<SkillMutation>> for SkillPatch {
    fn from(mutations: Vec<SkillMutation>) -> Self {
        Self { mutations }
    }
}

/// Lookup of skill protocol text by name.
///
/// Backed by a directory of `SKILL.md` files in production; any source that
/// can return text or signal absence will do.
#[async_trait]
pub trait SkillStore: Send + Sync {
    /// Load the raw protocol text for `name`. `Ok(None)` means "not registered".
    async fn load(&self, name: &str) -> Result<Option<String>, SkillError>;

    /// Names of all skills this store can activate, sorted.
    async fn list(&self) -> Result<Vec<String>, SkillError>;
}
