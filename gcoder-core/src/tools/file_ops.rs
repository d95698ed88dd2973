//! File tools: read, write, edit and glob

use super::error::ToolError;
use super::names;
use super::result::ToolResult;
use super::traits::{Tool, parse_args};
use super::resolve_path;
use anyhow::{Context, Result};
use async_trait::async_trait;
use glob::{MatchOptions, Pattern};
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tokio::fs;

fn default_true() -> bool {
    true
}

/// Replaces every occurrence of `old_text` in a file and returns how many
/// occurrences existed. The file is left untouched on any failure.
pub(crate) async fn replace_in_file(
    path: &Path,
    display: &str,
    old_text: &str,
    new_text: &str,
) -> Result<usize, ToolError> {
    if old_text.is_empty() {
        return Err(ToolError::InvalidArguments(
            "old_text must not be empty".to_string(),
        ));
    }
    if !path.is_file() {
        return Err(ToolError::FileNotFound(display.to_string()));
    }

    let content = fs::read_to_string(path).await?;
    let occurrences = content.matches(old_text).count();
    if occurrences == 0 {
        return Err(ToolError::Precondition(format!(
            "Text not found in {display}"
        )));
    }

    fs::write(path, content.replace(old_text, new_text)).await?;
    Ok(occurrences)
}

/// Writes `content`, creating parent directories first.
pub(crate) async fn write_with_parents(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write file: {}", path.display()))
}

#[derive(Debug, Deserialize)]
struct ReadInput {
    file_path: String,
}

/// Returns the full text of a file.
#[derive(Clone)]
pub struct ReadTool {
    workspace_root: PathBuf,
}

impl ReadTool {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self { workspace_root }
    }
}

#[async_trait]
impl Tool for ReadTool {
    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let input: ReadInput = parse_args(args)?;
        let path = resolve_path(&self.workspace_root, &input.file_path);
        if !path.is_file() {
            return Ok(ToolResult::failure(ToolError::FileNotFound(input.file_path)));
        }

        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let size = content.len();
        Ok(ToolResult::success(content)
            .with_metadata("file_path", input.file_path)
            .with_metadata("size", size))
    }

    fn name(&self) -> &'static str {
        names::READ
    }

    fn description(&self) -> &'static str {
        "Read the full contents of a file"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {"type": "string", "description": "Path of the file to read"}
            },
            "required": ["file_path"]
        })
    }
}

#[derive(Debug, Deserialize)]
struct WriteInput {
    file_path: String,
    content: String,
}

/// Creates or overwrites a file. No existence check happens here; callers
/// that must not clobber files guard before invoking it.
#[derive(Clone)]
pub struct WriteTool {
    workspace_root: PathBuf,
}

impl WriteTool {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self { workspace_root }
    }
}

#[async_trait]
impl Tool for WriteTool {
    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let input: WriteInput = parse_args(args)?;
        let path = resolve_path(&self.workspace_root, &input.file_path);
        write_with_parents(&path, &input.content).await?;

        Ok(ToolResult::success(format!("File written: {}", input.file_path))
            .with_metadata("file_path", input.file_path)
            .with_metadata("size", input.content.len()))
    }

    fn name(&self) -> &'static str {
        names::WRITE
    }

    fn description(&self) -> &'static str {
        "Write content to a file, creating parent directories and overwriting any existing file"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {"type": "string", "description": "Destination path"},
                "content": {"type": "string", "description": "Full file content"}
            },
            "required": ["file_path", "content"]
        })
    }
}

#[derive(Debug, Deserialize)]
struct EditInput {
    file_path: String,
    old_text: String,
    new_text: String,
}

/// Replaces every occurrence of a snippet inside one file.
#[derive(Clone)]
pub struct EditTool {
    workspace_root: PathBuf,
}

impl EditTool {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self { workspace_root }
    }
}

#[async_trait]
impl Tool for EditTool {
    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let input: EditInput = parse_args(args)?;
        let path = resolve_path(&self.workspace_root, &input.file_path);

        match replace_in_file(&path, &input.file_path, &input.old_text, &input.new_text).await {
            Ok(replacements) => Ok(ToolResult::success(format!(
                "Replaced {replacements} occurrence(s) in {}",
                input.file_path
            ))
            .with_metadata("file_path", input.file_path)
            .with_metadata("replacements", replacements)),
            Err(err) => Ok(ToolResult::failure(err)),
        }
    }

    fn name(&self) -> &'static str {
        names::EDIT
    }

    fn description(&self) -> &'static str {
        "Replace every occurrence of old_text with new_text in a file"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {"type": "string", "description": "File to edit"},
                "old_text": {"type": "string", "description": "Exact text to replace (non-empty)"},
                "new_text": {"type": "string", "description": "Replacement text"}
            },
            "required": ["file_path", "old_text", "new_text"]
        })
    }
}

#[derive(Debug, Deserialize)]
struct GlobInput {
    pattern: String,
    #[serde(default = "default_true")]
    recursive: bool,
}

/// Lists regular files matching a glob pattern, sorted.
#[derive(Clone)]
pub struct GlobTool {
    workspace_root: PathBuf,
}

impl GlobTool {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self { workspace_root }
    }

    fn expand(&self, pattern: &str, recursive: bool) -> Result<Vec<String>, ToolError> {
        let pattern = if recursive {
            pattern.to_string()
        } else {
            pattern.replace("**", "*")
        };
        let relative = !Path::new(&pattern).is_absolute();
        let full = if relative {
            let root = Pattern::escape(&self.workspace_root.to_string_lossy());
            format!("{}/{}", root.trim_end_matches('/'), pattern)
        } else {
            pattern.clone()
        };

        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: true,
        };
        let entries = glob::glob_with(&full, options)
            .map_err(|err| ToolError::InvalidArguments(format!("invalid glob pattern: {err}")))?;

        let mut files: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|path| path.is_file())
            .map(|path| {
                if relative {
                    path.strip_prefix(&self.workspace_root)
                        .map(|p| p.to_string_lossy().into_owned())
                        .unwrap_or_else(|_| path.to_string_lossy().into_owned())
                } else {
                    path.to_string_lossy().into_owned()
                }
            })
            .collect();
        files.sort();
        Ok(files)
    }
}

#[async_trait]
impl Tool for GlobTool {
    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let input: GlobInput = parse_args(args)?;
        match self.expand(&input.pattern, input.recursive) {
            Ok(files) => {
                let count = files.len();
                Ok(ToolResult::success(files)
                    .with_metadata("pattern", input.pattern)
                    .with_metadata("count", count)
                    .with_metadata("recursive", input.recursive))
            }
            Err(err) => Ok(ToolResult::failure(err)),
        }
    }

    fn name(&self) -> &'static str {
        names::GLOB
    }

    fn description(&self) -> &'static str {
        "Find files matching a glob pattern (supports ** when recursive)"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pattern": {"type": "string", "description": "Glob pattern, e.g. src/**/*.py"},
                "recursive": {"type": "boolean", "default": true, "description": "Allow ** to span directories"}
            },
            "required": ["pattern"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolErrorKind;
    use tempfile::TempDir;

    #[tokio::test]
    async fn read_reports_size() -> Result<()> {
        let temp = TempDir::new()?;
        std::fs::write(temp.path().join("a.txt"), "hello")?;
        let tool = ReadTool::new(temp.path().to_path_buf());

        let result = tool.execute(json!({"file_path": "a.txt"})).await?;
        assert!(result.is_success());
        assert_eq!(result.content().and_then(|c| c.as_text()), Some("hello"));
        assert_eq!(result.metadata_value("size"), Some(&json!(5)));

        let missing = tool.execute(json!({"file_path": "nope.txt"})).await?;
        assert_eq!(missing.error_kind(), Some(ToolErrorKind::NotFound));
        Ok(())
    }

    #[tokio::test]
    async fn write_creates_parents_and_overwrites() -> Result<()> {
        let temp = TempDir::new()?;
        let tool = WriteTool::new(temp.path().to_path_buf());

        tool.execute(json!({"file_path": "deep/er/out.txt", "content": "one"}))
            .await?;
        let result = tool
            .execute(json!({"file_path": "deep/er/out.txt", "content": "two"}))
            .await?;

        assert!(result.is_success());
        assert_eq!(std::fs::read_to_string(temp.path().join("deep/er/out.txt"))?, "two");
        Ok(())
    }

    #[tokio::test]
    async fn edit_replaces_all_occurrences() -> Result<()> {
        let temp = TempDir::new()?;
        let file = temp.path().join("x.py");
        std::fs::write(&file, "foo = 1\nfoo += foo\n")?;
        let tool = EditTool::new(temp.path().to_path_buf());

        let result = tool
            .execute(json!({"file_path": "x.py", "old_text": "foo", "new_text": "bar"}))
            .await?;

        let content = std::fs::read_to_string(&file)?;
        assert!(result.is_success());
        assert_eq!(content.matches("foo").count(), 0);
        assert_eq!(content.matches("bar").count(), 3);
        assert_eq!(result.metadata_value("replacements"), Some(&json!(3)));
        Ok(())
    }

    #[tokio::test]
    async fn edit_without_match_leaves_file_unchanged() -> Result<()> {
        let temp = TempDir::new()?;
        let file = temp.path().join("x.txt");
        std::fs::write(&file, b"alpha beta\n")?;
        let tool = EditTool::new(temp.path().to_path_buf());

        let result = tool
            .execute(json!({"file_path": "x.txt", "old_text": "gamma", "new_text": "delta"}))
            .await?;

        assert!(!result.is_success());
        assert_eq!(result.error_kind(), Some(ToolErrorKind::PreconditionFailed));
        assert_eq!(std::fs::read(&file)?, b"alpha beta\n");
        Ok(())
    }

    #[tokio::test]
    async fn edit_rejects_empty_old_text() -> Result<()> {
        let temp = TempDir::new()?;
        std::fs::write(temp.path().join("x.txt"), "abc")?;
        let tool = EditTool::new(temp.path().to_path_buf());

        let result = tool
            .execute(json!({"file_path": "x.txt", "old_text": "", "new_text": "z"}))
            .await?;

        assert_eq!(result.error_kind(), Some(ToolErrorKind::InvalidArguments));
        assert_eq!(std::fs::read_to_string(temp.path().join("x.txt"))?, "abc");
        Ok(())
    }

    #[tokio::test]
    async fn glob_is_sorted_and_stable() -> Result<()> {
        let temp = TempDir::new()?;
        for name in ["c.txt", "a.txt", "b.txt", "skip.md"] {
            std::fs::write(temp.path().join(name), "")?;
        }
        std::fs::create_dir(temp.path().join("dir.txt"))?;
        let tool = GlobTool::new(temp.path().to_path_buf());

        let first = tool.execute(json!({"pattern": "*.txt"})).await?;
        let second = tool.execute(json!({"pattern": "*.txt"})).await?;

        let expected = vec!["a.txt".to_string(), "b.txt".to_string(), "c.txt".to_string()];
        assert_eq!(first.content().and_then(|c| c.as_sequence()), Some(&expected[..]));
        assert_eq!(first.content(), second.content());
        assert_eq!(first.metadata_value("count"), Some(&json!(3)));
        Ok(())
    }

    #[tokio::test]
    async fn glob_recursion_is_optional() -> Result<()> {
        let temp = TempDir::new()?;
        std::fs::create_dir_all(temp.path().join("pkg/sub"))?;
        std::fs::write(temp.path().join("pkg/sub/mod.py"), "")?;
        std::fs::write(temp.path().join("top.py"), "")?;
        let tool = GlobTool::new(temp.path().to_path_buf());

        let deep = tool.execute(json!({"pattern": "**/*.py"})).await?;
        let deep_files = deep.content().and_then(|c| c.as_sequence()).map(<[String]>::to_vec);
        assert_eq!(
            deep_files,
            Some(vec!["pkg/sub/mod.py".to_string(), "top.py".to_string()])
        );

        let shallow = tool
            .execute(json!({"pattern": "**/*.py", "recursive": false}))
            .await?;
        let shallow_files = shallow.content().and_then(|c| c.as_sequence()).map(<[String]>::to_vec);
        assert_eq!(shallow_files, Some(Vec::new()));
        Ok(())
    }
}
