//! Shell command execution with a timeout and a destructive-pattern denylist
//!
//! The denylist is a plain substring check run before anything is spawned.
//! It catches obvious accidents; it is not a sandbox.

use super::error::ToolError;
use super::names;
use super::result::ToolResult;
use super::traits::{Tool, parse_args};
use super::resolve_path;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Substrings that make a command refuse to run.
pub const BLOCKED_PATTERNS: &[&str] = &["rm -rf /", "rm -rf *", "format", "del /f /s /q"];

/// Returns the first denylisted pattern contained in `command`.
pub fn blocked_pattern(command: &str) -> Option<&'static str> {
    BLOCKED_PATTERNS
        .iter()
        .copied()
        .find(|pattern| command.contains(pattern))
}

fn default_cwd() -> String {
    ".".to_string()
}

#[derive(Debug, Deserialize)]
struct BashInput {
    command: String,
    #[serde(default = "default_cwd")]
    cwd: String,
    #[serde(default)]
    timeout: Option<u64>,
}

/// Runs one command string through the platform shell.
#[derive(Clone)]
pub struct BashTool {
    workspace_root: PathBuf,
    default_timeout_secs: u64,
}

impl BashTool {
    pub fn new(workspace_root: PathBuf, default_timeout_secs: u64) -> Self {
        Self {
            workspace_root,
            default_timeout_secs,
        }
    }

    fn shell_command(command: &str) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        }
    }
}

#[async_trait]
impl Tool for BashTool {
    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let input: BashInput = parse_args(args)?;
        let timeout_secs = input.timeout.unwrap_or(self.default_timeout_secs);

        if let Some(pattern) = blocked_pattern(&input.command) {
            tracing::warn!(command = %input.command, pattern, "blocked dangerous command");
            return Ok(ToolResult::failure(ToolError::Blocked(pattern))
                .with_metadata("command", input.command));
        }

        let cwd = resolve_path(&self.workspace_root, &input.cwd);
        if !cwd.is_dir() {
            return Ok(ToolResult::failure(ToolError::Precondition(format!(
                "Working directory not found: {}",
                input.cwd
            ))));
        }

        let child = Self::shell_command(&input.command)
            .current_dir(&cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to spawn command: {}", input.command))?;

        let output = match tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            child.wait_with_output(),
        )
        .await
        {
            Ok(output) => output.context("Failed to collect command output")?,
            Err(_) => {
                tracing::warn!(command = %input.command, timeout_secs, "command timed out");
                return Ok(ToolResult::failure(ToolError::Timeout(timeout_secs))
                    .with_metadata("command", input.command)
                    .with_metadata("cwd", input.cwd)
                    .with_metadata("timeout", timeout_secs));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let returncode = output.status.code().unwrap_or(-1);

        let mut content = Map::new();
        content.insert("stdout".to_string(), json!(stdout));
        content.insert("stderr".to_string(), json!(stderr));
        content.insert("returncode".to_string(), json!(returncode));

        let result = if output.status.success() {
            ToolResult::success(content)
        } else {
            let message = if stderr.trim().is_empty() {
                format!("Command exited with status {returncode}")
            } else {
                stderr.trim().to_string()
            };
            ToolResult::failure(ToolError::ProcessFailed(message)).with_content(content)
        };

        Ok(result
            .with_metadata("command", input.command)
            .with_metadata("cwd", input.cwd)
            .with_metadata("timeout", timeout_secs))
    }

    fn name(&self) -> &'static str {
        names::BASH
    }

    fn description(&self) -> &'static str {
        "Run a shell command and capture stdout, stderr and exit code"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {"type": "string", "description": "Command line to execute"},
                "cwd": {"type": "string", "default": ".", "description": "Working directory"},
                "timeout": {"type": "integer", "default": self.default_timeout_secs, "description": "Seconds before the command is killed"}
            },
            "required": ["command"]
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::tools::ToolErrorKind;
    use std::time::Instant;
    use tempfile::TempDir;

    fn tool(temp: &TempDir) -> BashTool {
        BashTool::new(temp.path().to_path_buf(), 30)
    }

    #[tokio::test]
    async fn captures_output_and_exit_code() -> Result<()> {
        let temp = TempDir::new()?;
        let result = tool(&temp)
            .execute(json!({"command": "echo out; echo err 1>&2"}))
            .await?;

        assert!(result.is_success());
        let content = result.content().and_then(|c| c.as_mapping()).cloned().unwrap_or_default();
        assert_eq!(content["stdout"], "out\n");
        assert_eq!(content["stderr"], "err\n");
        assert_eq!(content["returncode"], 0);
        Ok(())
    }

    #[tokio::test]
    async fn nonzero_exit_is_a_process_failure() -> Result<()> {
        let temp = TempDir::new()?;
        let result = tool(&temp).execute(json!({"command": "exit 3"})).await?;

        assert!(!result.is_success());
        assert_eq!(result.error_kind(), Some(ToolErrorKind::ProcessFailed));
        let content = result.content().and_then(|c| c.as_mapping()).cloned().unwrap_or_default();
        assert_eq!(content["returncode"], 3);
        Ok(())
    }

    #[tokio::test]
    async fn slow_command_times_out_quickly() -> Result<()> {
        let temp = TempDir::new()?;
        let started = Instant::now();
        let result = tool(&temp)
            .execute(json!({"command": "sleep 5", "timeout": 1}))
            .await?;

        assert!(started.elapsed() < Duration::from_secs(3));
        assert!(!result.is_success());
        assert_eq!(result.error_kind(), Some(ToolErrorKind::Timeout));
        assert!(result.error().is_some_and(|e| e.contains("timeout of 1 seconds")));
        Ok(())
    }

    #[tokio::test]
    async fn denylisted_command_never_spawns() -> Result<()> {
        let temp = TempDir::new()?;
        let result = tool(&temp)
            .execute(json!({"command": "touch marker && rm -rf /"}))
            .await?;

        assert!(!result.is_success());
        assert_eq!(result.error_kind(), Some(ToolErrorKind::PolicyBlocked));
        assert!(!temp.path().join("marker").exists());
        Ok(())
    }

    #[tokio::test]
    async fn runs_in_requested_directory() -> Result<()> {
        let temp = TempDir::new()?;
        std::fs::create_dir(temp.path().join("sub"))?;
        let result = tool(&temp)
            .execute(json!({"command": "pwd", "cwd": "sub"}))
            .await?;

        let content = result.content().and_then(|c| c.as_mapping()).cloned().unwrap_or_default();
        assert!(content["stdout"].as_str().is_some_and(|s| s.trim_end().ends_with("sub")));
        Ok(())
    }
}
