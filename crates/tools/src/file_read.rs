//! File read tool — paged reads with path validation.
//!
//! Large files are returned one window of lines at a time; the header line
//! tells the model where it is and how to fetch the next window.

use std::path::PathBuf;

use async_trait::async_trait;
use skillloop_core::error::ToolError;
use skillloop_core::tool::{Tool, ToolOutput};
use tracing::debug;

use crate::sandbox::resolve_path;

pub struct FileReadTool {
    base_dir: PathBuf,
    /// Forbidden path prefixes.
    forbidden_paths: Vec<String>,
    /// Lines returned when no explicit window is requested.
    window: usize,
}

impl FileReadTool {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            forbidden_paths: Vec::new(),
            window: 500,
        }
    }

    pub fn with_forbidden_paths(mut self, forbidden_paths: Vec<String>) -> Self {
        self.forbidden_paths = forbidden_paths;
        self
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window.max(1);
        self
    }
}

fn line_arg(arguments: &serde_json::Value, key: &str) -> Result<Option<usize>, ToolError> {
    match &arguments[key] {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(n) => n
            .as_u64()
            .map(|v| Some(v as usize))
            .ok_or_else(|| ToolError::InvalidArguments(format!("'{key}' must be a positive integer"))),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|_| ToolError::InvalidArguments(format!("'{key}' must be a positive integer"))),
        _ => Err(ToolError::InvalidArguments(format!(
            "'{key}' must be a positive integer"
        ))),
    }
}

#[async_trait]
impl Tool for FileReadTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> String {
        format!(
            "Read a text file. Returns at most {} lines per call; use start_line/end_line \
             (1-based, inclusive) to page through longer files.",
            self.window
        )
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "The file path to read"
                },
                "start_line": {
                    "type": "integer",
                    "description": "First line to return (1-based)"
                },
                "end_line": {
                    "type": "integer",
                    "description": "Last line to return (inclusive)"
                }
            },
            "required": ["file_path"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let path = arguments["file_path"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'file_path' argument".into()))?;
        let start_line = line_arg(&arguments, "start_line")?;
        let end_line = line_arg(&arguments, "end_line")?;

        let resolved = resolve_path(path, &self.base_dir, &self.forbidden_paths).map_err(|e| {
            ToolError::PermissionDenied {
                tool_name: "read_file".into(),
                reason: e.to_string(),
            }
        })?;

        let content = match tokio::fs::read_to_string(&resolved).await {
            Ok(content) => content,
            Err(e) => return Ok(ToolOutput::failed(format!("Failed to read file: {e}"))),
        };

        let lines: Vec<&str> = content.lines().collect();
        let total = lines.len();

        if total == 0 {
            return Ok(ToolOutput::ok(format!("[System note] {path}: file is empty")));
        }

        let start = start_line.unwrap_or(1).max(1);
        if start > total {
            return Ok(ToolOutput::failed(format!(
                "Error: start_line {start} is beyond the end of {path} ({total} lines)"
            )));
        }

        let end = end_line
            .unwrap_or(start + self.window - 1)
            .min(total);
        if end < start {
            return Ok(ToolOutput::failed(format!(
                "Error: end_line {end} is before start_line {start}"
            )));
        }

        debug!(path = %resolved.display(), start, end, total, "Reading file window");

        let mut output = format!("[System note] {path}: lines {start}-{end} of {total}\n");
        output.push_str(&lines[start - 1..end].join("\n"));

        if end < total {
            output.push_str(&format!(
                "\n[System note] File too long: {} more lines. Call read_file again with \
                 start_line={} (and optionally end_line) to continue.",
                total - end,
                end + 1
            ));
        }

        Ok(ToolOutput::ok(output))
    }
}
