//! Long-term memory tool — a markdown fact file the agent curates.
//!
//! Each fact is one line: `- [YYYY-MM-DD HH:MM] fact`. Other lines in the
//! file (headings, notes written by hand) are preserved untouched.

use std::path::PathBuf;

use async_trait::async_trait;
use skillloop_core::error::ToolError;
use skillloop_core::tool::{Tool, ToolOutput};
use tokio::sync::Mutex;
use tracing::debug;

const HEADER: &str = "# Long-term Memory\n\n";

pub struct ManageMemoryTool {
    path: PathBuf,
    /// Serializes read-modify-write cycles within one batch.
    lock: Mutex<()>,
}

impl ManageMemoryTool {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// The fact text of a memory line, if it is one.
    fn fact_of(line: &str) -> Option<&str> {
        let rest = line.trim_start().strip_prefix("- [")?;
        let (_, fact) = rest.split_once("] ")?;
        Some(fact)
    }

    fn normalize(text: &str) -> String {
        text.split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    async fn read_existing(&self) -> Result<String, ToolError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(ToolError::ExecutionFailed {
                tool_name: "manage_memory".into(),
                reason: format!("Failed to read {}: {e}", self.path.display()),
            }),
        }
    }

    async fn write_all(&self, text: &str) -> Result<(), ToolError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ToolError::ExecutionFailed {
                    tool_name: "manage_memory".into(),
                    reason: e.to_string(),
                })?;
        }
        tokio::fs::write(&self.path, text)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "manage_memory".into(),
                reason: format!("Failed to write {}: {e}", self.path.display()),
            })
    }

    async fn add(&self, fact: &str) -> Result<ToolOutput, ToolError> {
        let existing = self.read_existing().await?;
        let wanted = Self::normalize(fact);

        let duplicate = existing
            .lines()
            .filter_map(Self::fact_of)
            .any(|f| Self::normalize(f) == wanted);
        if duplicate {
            return Ok(ToolOutput::ok(format!(
                "Memory already contains this fact; skipped duplicate: {fact}"
            )));
        }

        let mut text = if existing.trim().is_empty() {
            HEADER.to_string()
        } else {
            existing
        };
        if !text.ends_with('\n') {
            text.push('\n');
        }
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M");
        text.push_str(&format!("- [{stamp}] {fact}\n"));

        self.write_all(&text).await?;
        debug!(path = %self.path.display(), "Memory fact added");
        Ok(ToolOutput::ok(format!("Saved to long-term memory: {fact}")))
    }

    async fn delete(&self, needle: &str) -> Result<ToolOutput, ToolError> {
        let existing = self.read_existing().await?;
        let needle_lower = needle.to_lowercase();

        let mut removed = 0usize;
        let kept: Vec<&str> = existing
            .lines()
            .filter(|line| {
                let hit = Self::fact_of(line)
                    .is_some_and(|f| f.to_lowercase().contains(&needle_lower));
                if hit {
                    removed += 1;
                }
                !hit
            })
            .collect();

        if removed == 0 {
            return Ok(ToolOutput::failed(format!(
                "No memory entry matched '{needle}'."
            )));
        }

        let mut text = kept.join("\n");
        text.push('\n');
        self.write_all(&text).await?;
        debug!(path = %self.path.display(), removed, "Memory facts deleted");
        Ok(ToolOutput::ok(format!(
            "Deleted {removed} memory entr{} matching '{needle}'.",
            if removed == 1 { "y" } else { "ies" }
        )))
    }
}

#[async_trait]
impl Tool for ManageMemoryTool {
    fn name(&self) -> &str {
        "manage_memory"
    }

    fn description(&self) -> String {
        "Curate long-term memory. action='add' saves a durable fact about the user or project \
         (duplicates are skipped); action='delete' removes every fact containing the given text."
            .into()
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "The fact to add, or text identifying facts to delete"
                },
                "action": {
                    "type": "string",
                    "enum": ["add", "delete"]
                }
            },
            "required": ["content", "action"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let content = arguments["content"]
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'content' argument".into()))?;
        let action = arguments["action"].as_str().unwrap_or("add").trim();

        let _guard = self.lock.lock().await;
        match action {
            "add" => self.add(content).await,
            "delete" => self.delete(content).await,
            other => Ok(ToolOutput::failed(format!(
                "Error: Unsupported action '{other}'. Use 'add' or 'delete'."
            ))),
        }
    }
}
