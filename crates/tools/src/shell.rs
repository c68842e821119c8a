//! Shell tool — execute system commands.
//!
//! Supports command allowlisting, a hard timeout and output truncation.

use std::time::Duration;

use async_trait::async_trait;
use skillloop_core::error::ToolError;
use skillloop_core::tool::{Tool, ToolOutput};
use tokio::process::Command;
use tracing::{debug, warn};

const TRUNCATION_SUFFIX: &str = "...(truncated)";

/// Execute shell commands with safety constraints.
pub struct ShellTool {
    /// If non-empty, only these commands are allowed.
    allowed_commands: Vec<String>,
    timeout: Duration,
    /// Output is cut to this many characters.
    output_limit: usize,
}

impl ShellTool {
    pub fn new(allowed_commands: Vec<String>) -> Self {
        Self {
            allowed_commands,
            timeout: Duration::from_secs(60),
            output_limit: 2000,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_output_limit(mut self, limit: usize) -> Self {
        self.output_limit = limit;
        self
    }

    fn is_command_allowed(&self, command: &str) -> bool {
        if self.allowed_commands.is_empty() {
            return true; // No allowlist = all commands allowed
        }

        let base_cmd = command.split_whitespace().next().unwrap_or("").trim();

        self.allowed_commands.iter().any(|a| a == base_cmd)
    }

    fn truncate(&self, text: String) -> String {
        if text.chars().count() <= self.output_limit {
            return text;
        }
        let mut cut: String = text.chars().take(self.output_limit).collect();
        cut.push_str(TRUNCATION_SUFFIX);
        cut
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        "run_shell"
    }

    fn description(&self) -> String {
        "Execute a shell command and return its stdout (and stderr, if any). Use this to run \
         programs, inspect files, run skill scripts, git operations, etc."
            .into()
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to execute"
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolOutput, ToolError> {
        let command = arguments["command"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'command' argument".into()))?;

        if !self.is_command_allowed(command) {
            return Err(ToolError::PermissionDenied {
                tool_name: "run_shell".into(),
                reason: format!(
                    "Command '{}' not in allowlist",
                    command.split_whitespace().next().unwrap_or("")
                ),
            });
        }

        debug!(command = %command, "Executing shell command");

        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        };
        // Dropping the future on timeout must take the child with it.
        cmd.kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(output) => output,
            Err(_) => {
                warn!(command = %command, timeout_secs = self.timeout.as_secs(), "Command timed out");
                return Err(ToolError::Timeout {
                    tool_name: "run_shell".into(),
                    timeout_secs: self.timeout.as_secs(),
                });
            }
        };

        match output {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout).to_string();
                let stderr = String::from_utf8_lossy(&output.stderr).to_string();
                let success = output.status.success();

                let mut text = stdout;
                if !stderr.is_empty() {
                    text.push_str("\nSTDERR: ");
                    text.push_str(&stderr);
                }

                if !success {
                    let code = output.status.code().unwrap_or(-1);
                    warn!(command = %command, exit_code = code, "Command failed");
                    text = format!("[exit code: {code}]\n{text}");
                }

                let text = self.truncate(text.trim_end().to_string());
                Ok(ToolOutput { success, output: text })
            }
            Err(e) => Err(ToolError::ExecutionFailed {
                tool_name: "run_shell".into(),
                reason: e.to_string(),
            }),
        }
    }
}
