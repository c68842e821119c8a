//! Replace-in-file tool — exact, single-occurrence string edits.

use std::path::PathBuf;

use async_trait::async_trait;
use skillloop_core::error::ToolError;
use skillloop_core::tool::{Tool, ToolOutput};
use tracing::debug;

use crate::sandbox::resolve_path;

pub struct ReplaceInFileTool {
    base_dir: PathBuf,
    forbidden_paths: Vec<String>,
}

impl ReplaceInFileTool {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            forbidden_paths: Vec::new(),
        }
    }

    pub fn with_forbidden_paths(mut self, forbidden_paths: Vec<String>) -> Self {
        self.forbidden_paths = forbidden_paths;
        self
    }
}

#[async_trait]
impl Tool for ReplaceInFileTool {
    fn name(&self) -> &str {
        "replace_in_file"
    }

    fn description(&self) -> String {
        "Replace one exact occurrence of old_string with new_string in a file. old_string must \
         match exactly once; include surrounding lines to make it unique."
            .into()
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": { "type": "string", "description": "The file to edit" },
                "old_string": { "type": "string", "description": "Exact text to replace" },
                "new_string": { "type": "string", "description": "Replacement text" }
            },
            "required": ["file_path", "old_string", "new_string"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let path = arguments["file_path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'file_path' argument".into()))?;
        let old = arguments["old_string"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'old_string' argument".into()))?;
        let new = arguments["new_string"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'new_string' argument".into()))?;

        if old.is_empty() {
            return Err(ToolError::InvalidArguments("'old_string' must not be empty".into()));
        }

        let target = resolve_path(path, &self.base_dir, &self.forbidden_paths).map_err(|e| {
            ToolError::PermissionDenied {
                tool_name: "replace_in_file".into(),
                reason: e.to_string(),
            }
        })?;

        let content = match tokio::fs::read_to_string(&target).await {
            Ok(content) => content,
            Err(e) => return Ok(ToolOutput::failed(format!("Failed to read file: {e}"))),
        };

        match content.matches(old).count() {
            0 => Ok(ToolOutput::failed(format!(
                "Error: old_string not found in {path}. Read the file and copy the text exactly."
            ))),
            1 => {
                let updated = content.replacen(old, new, 1);
                if let Err(e) = tokio::fs::write(&target, updated).await {
                    return Ok(ToolOutput::failed(format!("Failed to write file: {e}")));
                }
                debug!(path = %target.display(), "Replaced text in file");
                Ok(ToolOutput::ok(format!("Replaced 1 occurrence in {path}")))
            }
            n => Ok(ToolOutput::failed(format!(
                "Error: old_string occurs {n} times in {path}; include more surrounding context \
                 so it matches exactly once."
            ))),
        }
    }
}
