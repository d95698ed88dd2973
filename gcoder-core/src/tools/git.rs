//! Git tools: status, diff and commit
//!
//! Each tool refuses to run unless the target directory has a `.git` entry.

use super::error::ToolError;
use super::names;
use super::result::ToolResult;
use super::traits::{Tool, parse_args};
use super::resolve_path;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;

fn default_path() -> String {
    ".".to_string()
}

fn repository_dir(root: &Path, path: &str) -> Result<PathBuf, ToolError> {
    let dir = resolve_path(root, path);
    if dir.join(".git").exists() {
        Ok(dir)
    } else {
        Err(ToolError::Precondition(format!("Not a git repository: {path}")))
    }
}

async fn run_git(dir: &Path, args: &[&str]) -> Result<Output> {
    Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .await
        .with_context(|| format!("Failed to run git {}", args.join(" ")))
}

/// Prefers stderr, falls back to stdout (git reports "nothing to commit" there).
fn failure_text(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if stderr.trim().is_empty() {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    } else {
        stderr.trim().to_string()
    }
}

#[derive(Debug, Deserialize)]
struct StatusInput {
    #[serde(default = "default_path")]
    path: String,
}

#[derive(Clone)]
pub struct GitStatusTool {
    workspace_root: PathBuf,
}

impl GitStatusTool {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self { workspace_root }
    }
}

#[async_trait]
impl Tool for GitStatusTool {
    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let input: StatusInput = parse_args(args)?;
        let dir = match repository_dir(&self.workspace_root, &input.path) {
            Ok(dir) => dir,
            Err(err) => return Ok(ToolResult::failure(err)),
        };

        let output = run_git(&dir, &["status", "--porcelain"]).await?;
        if !output.status.success() {
            return Ok(ToolResult::failure(ToolError::ProcessFailed(failure_text(&output))));
        }

        let status = String::from_utf8_lossy(&output.stdout).into_owned();
        let clean = status.trim().is_empty();
        Ok(ToolResult::success(status)
            .with_metadata("path", input.path)
            .with_metadata("clean", clean))
    }

    fn name(&self) -> &'static str {
        names::GIT_STATUS
    }

    fn description(&self) -> &'static str {
        "Show the working tree status in porcelain format"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "default": ".", "description": "Repository directory"}
            }
        })
    }
}

#[derive(Debug, Deserialize)]
struct DiffInput {
    #[serde(default = "default_path")]
    path: String,
    #[serde(default)]
    staged: bool,
}

#[derive(Clone)]
pub struct GitDiffTool {
    workspace_root: PathBuf,
}

impl GitDiffTool {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self { workspace_root }
    }
}

#[async_trait]
impl Tool for GitDiffTool {
    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let input: DiffInput = parse_args(args)?;
        let dir = match repository_dir(&self.workspace_root, &input.path) {
            Ok(dir) => dir,
            Err(err) => return Ok(ToolResult::failure(err)),
        };

        let mut git_args = vec!["diff"];
        if input.staged {
            git_args.push("--staged");
        }
        let output = run_git(&dir, &git_args).await?;
        if !output.status.success() {
            return Ok(ToolResult::failure(ToolError::ProcessFailed(failure_text(&output))));
        }

        Ok(ToolResult::success(String::from_utf8_lossy(&output.stdout).into_owned())
            .with_metadata("path", input.path)
            .with_metadata("staged", input.staged))
    }

    fn name(&self) -> &'static str {
        names::GIT_DIFF
    }

    fn description(&self) -> &'static str {
        "Show unstaged changes, or staged changes when staged=true"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "default": ".", "description": "Repository directory"},
                "staged": {"type": "boolean", "default": false, "description": "Diff the index instead of the working tree"}
            }
        })
    }
}

#[derive(Debug, Deserialize)]
struct CommitInput {
    message: String,
    #[serde(default)]
    add_all: bool,
    #[serde(default = "default_path")]
    path: String,
}

#[derive(Clone)]
pub struct GitCommitTool {
    workspace_root: PathBuf,
}

impl GitCommitTool {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self { workspace_root }
    }
}

#[async_trait]
impl Tool for GitCommitTool {
    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let input: CommitInput = parse_args(args)?;
        let dir = match repository_dir(&self.workspace_root, &input.path) {
            Ok(dir) => dir,
            Err(err) => return Ok(ToolResult::failure(err)),
        };

        if input.add_all {
            let staged = run_git(&dir, &["add", "."]).await?;
            if !staged.status.success() {
                return Ok(ToolResult::failure(ToolError::ProcessFailed(format!(
                    "git add failed: {}",
                    failure_text(&staged)
                ))));
            }
        }

        let output = run_git(&dir, &["commit", "-m", &input.message]).await?;
        if !output.status.success() {
            return Ok(ToolResult::failure(ToolError::ProcessFailed(failure_text(&output)))
                .with_metadata("message", input.message));
        }

        Ok(ToolResult::success(String::from_utf8_lossy(&output.stdout).into_owned())
            .with_metadata("message", input.message)
            .with_metadata("add_all", input.add_all))
    }

    fn name(&self) -> &'static str {
        names::GIT_COMMIT
    }

    fn description(&self) -> &'static str {
        "Commit staged changes, optionally staging everything first"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "message": {"type": "string", "description": "Commit message"},
                "add_all": {"type": "boolean", "default": false, "description": "Run git add . before committing"},
                "path": {"type": "string", "default": ".", "description": "Repository directory"}
            },
            "required": ["message"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolErrorKind;
    use tempfile::TempDir;

    fn git_available() -> bool {
        std::process::Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    async fn init_repo(dir: &Path) -> Result<()> {
        for args in [
            vec!["init", "-q"],
            vec!["config", "user.email", "dev@example.com"],
            vec!["config", "user.name", "Dev"],
        ] {
            let output = run_git(dir, &args).await?;
            anyhow::ensure!(output.status.success(), "git {:?} failed", args);
        }
        Ok(())
    }

    #[tokio::test]
    async fn refuses_outside_repository() -> Result<()> {
        let temp = TempDir::new()?;
        let root = temp.path().to_path_buf();

        let status = GitStatusTool::new(root.clone()).execute(json!({})).await?;
        let diff = GitDiffTool::new(root.clone()).execute(json!({"staged": true})).await?;
        let commit = GitCommitTool::new(root)
            .execute(json!({"message": "x", "add_all": true}))
            .await?;

        for result in [status, diff, commit] {
            assert_eq!(result.error_kind(), Some(ToolErrorKind::PreconditionFailed));
        }
        Ok(())
    }

    #[tokio::test]
    async fn status_and_commit_round() -> Result<()> {
        if !git_available() {
            return Ok(());
        }
        let temp = TempDir::new()?;
        init_repo(temp.path()).await?;
        std::fs::write(temp.path().join("a.txt"), "hello\n")?;
        let root = temp.path().to_path_buf();

        let status = GitStatusTool::new(root.clone()).execute(json!({})).await?;
        assert!(status.content().and_then(|c| c.as_text()).is_some_and(|s| s.contains("?? a.txt")));
        assert_eq!(status.metadata_value("clean"), Some(&json!(false)));

        let committed = GitCommitTool::new(root.clone())
            .execute(json!({"message": "first", "add_all": true}))
            .await?;
        assert!(committed.is_success(), "{:?}", committed.error());

        let again = GitCommitTool::new(root)
            .execute(json!({"message": "second"}))
            .await?;
        assert!(!again.is_success());
        assert!(again.error().is_some_and(|e| e.contains("nothing")));
        Ok(())
    }
}
