//! File write tool — write or create files with partition isolation.
//!
//! A bare file name (no directory component) is never dropped into the
//! workspace root: scripts go to the scratch partition, everything else to
//! the data partition.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use skillloop_core::error::ToolError;
use skillloop_core::tool::{Tool, ToolOutput};
use tracing::debug;

use crate::sandbox::resolve_path;

/// Extensions routed to the scratch partition.
const SCRIPT_EXTENSIONS: &[&str] = &["py", "sh", "bash", "js", "ts", "rb", "pl", "ps1", "bat"];

pub struct FileWriteTool {
    base_dir: PathBuf,
    /// Forbidden path prefixes.
    forbidden_paths: Vec<String>,
    data_dir: String,
    scratch_dir: String,
}

impl FileWriteTool {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            forbidden_paths: Vec::new(),
            data_dir: "output".into(),
            scratch_dir: "tmp".into(),
        }
    }

    pub fn with_forbidden_paths(mut self, forbidden_paths: Vec<String>) -> Self {
        self.forbidden_paths = forbidden_paths;
        self
    }

    pub fn with_partitions(mut self, data_dir: impl Into<String>, scratch_dir: impl Into<String>) -> Self {
        self.data_dir = data_dir.into();
        self.scratch_dir = scratch_dir.into();
        self
    }

    /// The partition a bare file name belongs in, or `None` when the path
    /// already names a directory.
    fn partition_for(&self, path: &str) -> Option<&str> {
        let p = Path::new(path);
        let is_bare = p
            .parent()
            .is_none_or(|parent| parent.as_os_str().is_empty());
        if !is_bare {
            return None;
        }

        let is_script = p
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));

        Some(if is_script {
            &self.scratch_dir
        } else {
            &self.data_dir
        })
    }
}

#[async_trait]
impl Tool for FileWriteTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> String {
        format!(
            "Write content to a file, creating parent directories. Overwrites existing files. \
             A bare file name is placed in '{}/' for scripts or '{}/' for data.",
            self.scratch_dir, self.data_dir
        )
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "The file path to write to"
                },
                "content": {
                    "type": "string",
                    "description": "The content to write"
                }
            },
            "required": ["file_path", "content"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let path = arguments["file_path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'file_path' argument".into()))?;

        let content = arguments["content"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'content' argument".into()))?;

        let partition = self.partition_for(path.trim());
        let requested = match partition {
            Some(dir) => format!("{dir}/{}", path.trim()),
            None => path.to_string(),
        };

        let target = resolve_path(&requested, &self.base_dir, &self.forbidden_paths).map_err(|e| {
            ToolError::PermissionDenied {
                tool_name: "write_file".into(),
                reason: e.to_string(),
            }
        })?;

        if let Some(parent) = target.parent()
            && let Err(e) = tokio::fs::create_dir_all(parent).await
        {
            return Ok(ToolOutput::failed(format!("Failed to create directory: {e}")));
        }

        debug!(path = %target.display(), bytes = content.len(), redirected = partition.is_some(), "Writing file");

        match tokio::fs::write(&target, content).await {
            Ok(()) => {
                let mut msg = format!(
                    "Successfully wrote {} bytes to {}",
                    content.len(),
                    target.display()
                );
                if let Some(dir) = partition {
                    msg.push_str(&format!(
                        " (partition redirect applied: bare file names are stored under {dir}/)"
                    ));
                }
                Ok(ToolOutput::ok(msg))
            }
            Err(e) => Ok(ToolOutput::failed(format!("Failed to write file: {e}"))),
        }
    }
}
