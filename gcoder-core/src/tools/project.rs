//! Batch tools: multi-file edits and project scaffolding
//!
//! Both tools are fail-soft. Every item is attempted, each outcome is logged
//! as one line, and the batch succeeds when at least one item did.

use super::error::{ToolError, ToolErrorKind};
use super::file_ops::{replace_in_file, write_with_parents};
use super::names;
use super::result::ToolResult;
use super::traits::{Tool, parse_args};
use super::resolve_path;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct EditItem {
    file_path: String,
    old_text: String,
    new_text: String,
}

#[derive(Debug, Deserialize)]
struct MultiEditInput {
    edits: Vec<EditItem>,
}

#[derive(Clone)]
pub struct MultiEditTool {
    workspace_root: PathBuf,
}

impl MultiEditTool {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self { workspace_root }
    }
}

#[async_trait]
impl Tool for MultiEditTool {
    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let input: MultiEditInput = parse_args(args)?;
        let total = input.edits.len();
        let mut log = Vec::with_capacity(total);
        let mut details = Vec::new();

        // Listed order; a later edit sees the output of an earlier one on the same file.
        for edit in &input.edits {
            let path = resolve_path(&self.workspace_root, &edit.file_path);
            match replace_in_file(&path, &edit.file_path, &edit.old_text, &edit.new_text).await {
                Ok(count) => {
                    log.push(format!("✓ {}: {count} replacement(s)", edit.file_path));
                    details.push(json!({"file": edit.file_path, "replacements": count}));
                }
                Err(err) => {
                    tracing::debug!(file = %edit.file_path, error = %err, "edit skipped");
                    log.push(format!("✗ {}: {err}", edit.file_path));
                }
            }
        }

        let succeeded = details.len();
        let result = if succeeded > 0 {
            ToolResult::success(log)
        } else {
            ToolResult::failure_with(ToolErrorKind::Execution, "No edits were applied")
                .with_content(log)
        };
        Ok(result
            .with_metadata("total_edits", total)
            .with_metadata("successful_edits", succeeded)
            .with_metadata("details", details))
    }

    fn name(&self) -> &'static str {
        names::MULTI_EDIT
    }

    fn description(&self) -> &'static str {
        "Apply several text replacements across files, continuing past failures"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "edits": {
                    "type": "array",
                    "description": "Edits applied in order",
                    "items": {
                        "type": "object",
                        "properties": {
                            "file_path": {"type": "string"},
                            "old_text": {"type": "string"},
                            "new_text": {"type": "string"}
                        },
                        "required": ["file_path", "old_text", "new_text"]
                    }
                }
            },
            "required": ["edits"]
        })
    }
}

fn default_project_type() -> String {
    "python".to_string()
}

#[derive(Debug, Deserialize)]
struct ProjectFile {
    path: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct CreateProjectInput {
    project_name: String,
    files: Vec<ProjectFile>,
    #[serde(default = "default_project_type")]
    project_type: String,
}

#[derive(Clone)]
pub struct CreateProjectTool {
    workspace_root: PathBuf,
}

impl CreateProjectTool {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self { workspace_root }
    }
}

#[async_trait]
impl Tool for CreateProjectTool {
    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let input: CreateProjectInput = parse_args(args)?;
        if input.project_name.trim().is_empty() {
            return Ok(ToolResult::failure(ToolError::InvalidArguments(
                "project_name must not be empty".to_string(),
            )));
        }

        let project_root = resolve_path(&self.workspace_root, &input.project_name);
        if let Err(err) = tokio::fs::create_dir_all(&project_root).await {
            return Ok(ToolResult::failure(ToolError::Precondition(format!(
                "Failed to create project directory {}: {err}",
                input.project_name
            ))));
        }

        let mut log = vec![format!("✓ project '{}' ready", input.project_name)];
        let mut created = Vec::new();
        for file in &input.files {
            let target = project_root.join(&file.path);
            match write_with_parents(&target, &file.content).await {
                Ok(()) => {
                    log.push(format!("✓ {}", file.path));
                    created.push(format!("{}/{}", input.project_name, file.path));
                }
                Err(err) => log.push(format!("✗ {}: {err:#}", file.path)),
            }
        }

        let result = if created.is_empty() {
            ToolResult::failure_with(ToolErrorKind::Execution, "No files were created")
                .with_content(log)
        } else {
            ToolResult::success(log)
        };
        Ok(result
            .with_metadata("project_name", input.project_name)
            .with_metadata("project_type", input.project_type)
            .with_metadata("files_created", created.len())
            .with_metadata("files", created))
    }

    fn name(&self) -> &'static str {
        names::CREATE_PROJECT
    }

    fn description(&self) -> &'static str {
        "Create a project directory and write the listed files into it"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_name": {"type": "string", "description": "Project directory"},
                "project_type": {"type": "string", "default": "python"},
                "files": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "path": {"type": "string"},
                            "content": {"type": "string"}
                        },
                        "required": ["path", "content"]
                    }
                }
            },
            "required": ["project_name", "files"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn multi_edit_continues_past_missing_file() -> Result<()> {
        let temp = TempDir::new()?;
        std::fs::write(temp.path().join("b.txt"), "x x")?;
        let tool = MultiEditTool::new(temp.path().to_path_buf());

        let result = tool
            .execute(json!({"edits": [
                {"file_path": "missing.txt", "old_text": "a", "new_text": "b"},
                {"file_path": "b.txt", "old_text": "x", "new_text": "y"}
            ]}))
            .await?;

        assert!(result.is_success());
        assert_eq!(result.metadata_value("total_edits"), Some(&json!(2)));
        assert_eq!(result.metadata_value("successful_edits"), Some(&json!(1)));
        assert_eq!(
            result.metadata_value("details"),
            Some(&json!([{"file": "b.txt", "replacements": 2}]))
        );
        assert_eq!(std::fs::read_to_string(temp.path().join("b.txt"))?, "y y");
        let log = result.content().and_then(|c| c.as_sequence()).map(<[String]>::to_vec).unwrap_or_default();
        assert!(log[0].starts_with("✗ missing.txt"));
        assert_eq!(log[1], "✓ b.txt: 2 replacement(s)");
        Ok(())
    }

    #[tokio::test]
    async fn multi_edit_with_no_success_fails() -> Result<()> {
        let temp = TempDir::new()?;
        std::fs::write(temp.path().join("a.txt"), "abc")?;
        let tool = MultiEditTool::new(temp.path().to_path_buf());

        let result = tool
            .execute(json!({"edits": [{"file_path": "a.txt", "old_text": "zzz", "new_text": "y"}]}))
            .await?;

        assert!(!result.is_success());
        assert_eq!(result.error(), Some("No edits were applied"));
        assert!(result.content().is_some());
        assert_eq!(std::fs::read_to_string(temp.path().join("a.txt"))?, "abc");
        Ok(())
    }

    #[tokio::test]
    async fn create_project_is_idempotent() -> Result<()> {
        let temp = TempDir::new()?;
        let tool = CreateProjectTool::new(temp.path().to_path_buf());
        let args = json!({
            "project_name": "demo",
            "files": [
                {"path": "main.py", "content": "print('hi')\n"},
                {"path": "pkg/__init__.py", "content": ""}
            ]
        });

        let first = tool.execute(args.clone()).await?;
        let second = tool.execute(args).await?;

        for result in [&first, &second] {
            assert!(result.is_success(), "{:?}", result.error());
            assert_eq!(result.metadata_value("files_created"), Some(&json!(2)));
            assert_eq!(result.metadata_value("project_type"), Some(&json!("python")));
        }
        assert!(temp.path().join("demo/pkg/__init__.py").is_file());
        Ok(())
    }
}
