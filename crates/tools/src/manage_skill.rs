//! Skill management tool — activate or deactivate a skill protocol.
//!
//! The tool itself never touches the session's skill pool. It only returns
//! marker-prefixed text; the agent's output reconciler turns those results
//! into pool mutations.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use skillloop_core::error::{SkillError, ToolError};
use skillloop_core::skill::{ACTIVATION_MARKER, SkillAction, SkillStore, deactivation_marker};
use skillloop_core::tool::{Tool, ToolOutput};
use tracing::{debug, warn};

pub struct ManageSkillTool {
    name: String,
    store: Arc<dyn SkillStore>,
    /// Skill names shown in the description; refreshed on every call.
    catalog: RwLock<Vec<String>>,
}

impl ManageSkillTool {
    pub fn new(store: Arc<dyn SkillStore>) -> Self {
        Self {
            name: "manage_skill".into(),
            store,
            catalog: RwLock::new(Vec::new()),
        }
    }

    /// Register under a different tool name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Seed the list of skills advertised in the description.
    pub fn with_catalog(self, names: Vec<String>) -> Self {
        if let Ok(mut catalog) = self.catalog.write() {
            *catalog = names;
        }
        self
    }

    async fn refresh_catalog(&self) {
        match self.store.list().await {
            Ok(names) => {
                if let Ok(mut catalog) = self.catalog.write() {
                    *catalog = names;
                }
            }
            Err(e) => warn!(error = %e, "Could not list skills"),
        }
    }

    async fn activate(&self, skill_name: &str) -> ToolOutput {
        match self.store.load(skill_name).await {
            Ok(Some(protocol)) => {
                debug!(skill = %skill_name, bytes = protocol.len(), "Skill protocol loaded");
                ToolOutput::ok(format!("{ACTIVATION_MARKER}{protocol}"))
            }
            Ok(None) | Err(SkillError::InvalidName(_)) => ToolOutput::failed(format!(
                "Error: Skill '{skill_name}' is not registered locally."
            )),
            Err(e) => ToolOutput::failed(format!("Error: {e}")),
        }
    }
}

#[async_trait]
impl Tool for ManageSkillTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> String {
        let available = self
            .catalog
            .read()
            .map(|c| c.join(", "))
            .unwrap_or_default();
        let available = if available.is_empty() {
            "none installed".to_string()
        } else {
            available
        };
        format!(
            "Activate or deactivate a skill. Before starting a task, check whether a skill \
             fits it and activate that skill: its protocol is then added to your instructions \
             for the rest of the session. Deactivate skills you no longer need. \
             Available skills: {available}."
        )
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "skill_name": {
                    "type": "string",
                    "description": "Name of the skill"
                },
                "action": {
                    "type": "string",
                    "enum": ["activate", "deactivate"],
                    "description": "Defaults to 'activate'"
                }
            },
            "required": ["skill_name"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let skill_name = arguments["skill_name"]
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'skill_name' argument".into()))?;
        let action = arguments.get("action");

        let output = match SkillAction::from_arg(action) {
            Some(SkillAction::Activate) => self.activate(skill_name).await,
            Some(SkillAction::Deactivate) => ToolOutput::ok(deactivation_marker(skill_name)),
            None => {
                let shown = match action {
                    Some(serde_json::Value::String(text)) => text.trim().to_string(),
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                ToolOutput::failed(format!(
                    "Error: Unsupported action '{shown}'. Use 'activate' or 'deactivate'."
                ))
            }
        };

        self.refresh_catalog().await;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skill_store::FsSkillStore;

    fn tool_with(skills: &[(&str, &str)]) -> (tempfile::TempDir, ManageSkillTool) {
        let root = tempfile::tempdir().unwrap();
        for (name, body) in skills {
            std::fs::create_dir_all(root.path().join(name)).unwrap();
            std::fs::write(root.path().join(name).join("SKILL.md"), body).unwrap();
        }
        let store = Arc::new(FsSkillStore::new(root.path()));
        (root, ManageSkillTool::new(store))
    }

    #[tokio::test]
    async fn activate_returns_injection_marker() {
        let (_root, tool) = tool_with(&[("web_scraper", "Use requests+BeautifulSoup...")]);
        let out = tool
            .execute(serde_json::json!({"skill_name": "web_scraper"}))
            .await
            .unwrap();
        assert!(out.success);
        assert_eq!(out.output, "SYSTEM_INJECTION: Use requests+BeautifulSoup...");
    }

    #[tokio::test]
    async fn unknown_skill_is_reported() {
        let (_root, tool) = tool_with(&[]);
        let out = tool
            .execute(serde_json::json!({"skill_name": "ghost", "action": "activate"}))
            .await
            .unwrap();
        assert!(!out.success);
        assert_eq!(out.output, "Error: Skill 'ghost' is not registered locally.");
    }

    #[tokio::test]
    async fn deactivate_returns_marker() {
        let (_root, tool) = tool_with(&[]);
        let out = tool
            .execute(serde_json::json!({"skill_name": "x", "action": "deactivate"}))
            .await
            .unwrap();
        assert_eq!(out.output, "SKILL_DEACTIVATION: x");
    }

    #[tokio::test]
    async fn unsupported_action() {
        let (_root, tool) = tool_with(&[]);
        let out = tool
            .execute(serde_json::json!({"skill_name": "x", "action": "pause"}))
            .await
            .unwrap();
        assert!(!out.success);
        assert!(out.output.contains("Unsupported action 'pause'"));
    }

    #[tokio::test]
    async fn non_string_action_does_not_activate() {
        let (_root, tool) = tool_with(&[("x", "proto-X")]);
        for action in [serde_json::json!(true), serde_json::json!(1)] {
            let out = tool
                .execute(serde_json::json!({"skill_name": "x", "action": action}))
                .await
                .unwrap();
            assert!(!out.success);
            assert!(!out.output.starts_with(ACTIVATION_MARKER));
            assert!(out.output.contains(&format!("Unsupported action '{action}'")));
        }
    }

    #[tokio::test]
    async fn null_action_means_activate() {
        let (_root, tool) = tool_with(&[("x", "proto-X")]);
        let out = tool
            .execute(serde_json::json!({"skill_name": "x", "action": null}))
            .await
            .unwrap();
        assert_eq!(out.output, "SYSTEM_INJECTION: proto-X");
    }

    #[tokio::test]
    async fn missing_skill_name() {
        let (_root, tool) = tool_with(&[]);
        assert!(tool.execute(serde_json::json!({})).await.is_err());
    }

    #[tokio::test]
    async fn description_lists_catalog() {
        let (_root, tool) = tool_with(&[("excel_master", "b")]);
        assert!(tool.description().contains("none installed"));

        tool.execute(serde_json::json!({"skill_name": "excel_master", "action": "deactivate"}))
            .await
            .unwrap();
        assert!(tool.description().contains("excel_master"));
    }

    #[test]
    fn custom_name() {
        let store = Arc::new(FsSkillStore::new("/nonexistent"));
        let tool = ManageSkillTool::new(store).with_name("activate_skill");
        assert_eq!(tool.name(), "activate_skill");
    }
}
