//! Timestamped file backups

use super::error::{ToolError, ToolErrorKind};
use super::names;
use super::result::ToolResult;
use super::traits::{Tool, parse_args};
use super::resolve_path;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

/// Sorts lexicographically in chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Copies `src` to `dst` keeping permissions and modification time.
///
/// The copy is written through a fresh handle; permissions are applied last
/// so read-only sources still get their mtime.
fn copy_preserving(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let metadata = fs::metadata(src)?;
    let mut reader =
        File::open(src).with_context(|| format!("Failed to open {}", src.display()))?;
    let mut writer =
        File::create(dst).with_context(|| format!("Failed to create {}", dst.display()))?;
    io::copy(&mut reader, &mut writer).with_context(|| format!("Failed to copy {}", src.display()))?;

    if let Ok(modified) = metadata.modified() {
        writer.set_modified(modified)?;
    }
    writer.set_permissions(metadata.permissions())?;
    Ok(())
}

/// Relative inputs keep their directory layout inside the backup; anything
/// else is stored by file name.
fn backup_name(requested: &str, src: &Path) -> PathBuf {
    let relative = Path::new(requested);
    let plain = relative.is_relative()
        && relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if plain {
        relative.components().filter(|c| !matches!(c, Component::CurDir)).collect()
    } else {
        src.file_name().map(PathBuf::from).unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct BackupInput {
    #[serde(default)]
    files: Vec<String>,
    #[serde(default)]
    backup_dir: Option<String>,
}

#[derive(Clone)]
pub struct BackupTool {
    workspace_root: PathBuf,
    default_backup_dir: String,
}

impl BackupTool {
    pub fn new(workspace_root: PathBuf, default_backup_dir: impl Into<String>) -> Self {
        Self {
            workspace_root,
            default_backup_dir: default_backup_dir.into(),
        }
    }
}

#[async_trait]
impl Tool for BackupTool {
    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let input: BackupInput = parse_args(args)?;
        if input.files.is_empty() {
            return Ok(ToolResult::failure(ToolError::InvalidArguments(
                "files must list at least one path".to_string(),
            )));
        }

        let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
        let backup_dir = input
            .backup_dir
            .unwrap_or_else(|| self.default_backup_dir.clone());
        let target_dir = resolve_path(&self.workspace_root, &backup_dir).join(&timestamp);
        if let Err(err) = tokio::fs::create_dir_all(&target_dir).await {
            return Ok(ToolResult::failure(ToolError::Precondition(format!(
                "Failed to create backup directory {}: {err}",
                target_dir.display()
            ))));
        }

        let mut log = Vec::with_capacity(input.files.len());
        let mut backed_up = 0usize;
        for file in &input.files {
            let src = resolve_path(&self.workspace_root, file);
            if !src.is_file() {
                log.push(format!("✗ {file}: not found"));
                continue;
            }
            let dst = target_dir.join(backup_name(file, &src));
            let copy_src = src.clone();
            let copy_dst = dst.clone();
            let copied = tokio::task::spawn_blocking(move || copy_preserving(&copy_src, &copy_dst))
                .await
                .context("Backup task panicked")?;
            match copied {
                Ok(()) => {
                    backed_up += 1;
                    log.push(format!("✓ {file} → {}", dst.display()));
                }
                Err(err) => log.push(format!("✗ {file}: {err:#}")),
            }
        }

        let result = if backed_up > 0 {
            ToolResult::success(log)
        } else {
            ToolResult::failure_with(ToolErrorKind::Execution, "No files were backed up")
                .with_content(log)
        };
        Ok(result
            .with_metadata("backup_dir", target_dir.to_string_lossy().into_owned())
            .with_metadata("files_backed_up", backed_up)
            .with_metadata("timestamp", timestamp))
    }

    fn name(&self) -> &'static str {
        names::BACKUP
    }

    fn description(&self) -> &'static str {
        "Copy files into a timestamped backup directory"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "files": {"type": "array", "items": {"type": "string"}, "description": "Files to back up"},
                "backup_dir": {"type": "string", "default": self.default_backup_dir}
            },
            "required": ["files"]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn copies_existing_and_skips_missing() -> Result<()> {
        let temp = TempDir::new()?;
        std::fs::create_dir(temp.path().join("src"))?;
        std::fs::write(temp.path().join("src/app.py"), "print(1)\n")?;
        let tool = BackupTool::new(temp.path().to_path_buf(), ".backups");

        let result = tool
            .execute(json!({"files": ["src/app.py", "ghost.py"]}))
            .await?;

        assert!(result.is_success());
        assert_eq!(result.metadata_value("files_backed_up"), Some(&json!(1)));
        let timestamp = result
            .metadata_value("timestamp")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        assert_eq!(timestamp.len(), 15);
        assert_eq!(timestamp.as_bytes()[8], b'_');

        let copy = temp.path().join(".backups").join(&timestamp).join("src/app.py");
        assert_eq!(std::fs::read_to_string(copy)?, "print(1)\n");
        let log = result.content().and_then(|c| c.as_sequence()).map(<[String]>::to_vec).unwrap_or_default();
        assert!(log[1].starts_with("✗ ghost.py"));
        Ok(())
    }

    #[tokio::test]
    async fn preserves_modification_time() -> Result<()> {
        let temp = TempDir::new()?;
        let src = temp.path().join("old.txt");
        std::fs::write(&src, "data")?;
        let past = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_000_000_000);
        File::options().write(true).open(&src)?.set_modified(past)?;
        let tool = BackupTool::new(temp.path().to_path_buf(), "bk");

        let result = tool.execute(json!({"files": ["old.txt"]})).await?;
        let dir = result
            .metadata_value("backup_dir")
            .and_then(Value::as_str)
            .map(PathBuf::from)
            .unwrap_or_default();

        assert_eq!(std::fs::metadata(dir.join("old.txt"))?.modified()?, past);
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn read_only_source_keeps_mode_and_mtime() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new()?;
        let src = temp.path().join("ro.txt");
        std::fs::write(&src, "locked")?;
        let past = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_200_000_000);
        File::options().write(true).open(&src)?.set_modified(past)?;
        std::fs::set_permissions(&src, std::fs::Permissions::from_mode(0o444))?;
        let tool = BackupTool::new(temp.path().to_path_buf(), ".backups");

        let result = tool.execute(json!({"files": ["ro.txt"]})).await?;

        assert!(result.is_success(), "{:?}", result.error());
        assert_eq!(result.metadata_value("files_backed_up"), Some(&json!(1)));
        let dir = result
            .metadata_value("backup_dir")
            .and_then(Value::as_str)
            .map(PathBuf::from)
            .unwrap_or_default();
        let copy = std::fs::metadata(dir.join("ro.txt"))?;
        assert_eq!(copy.permissions().mode() & 0o777, 0o444);
        assert_eq!(copy.modified()?, past);
        assert_eq!(std::fs::read_to_string(dir.join("ro.txt"))?, "locked");
        Ok(())
    }

    #[tokio::test]
    async fn nothing_to_copy_is_a_failure() -> Result<()> {
        let temp = TempDir::new()?;
        let tool = BackupTool::new(temp.path().to_path_buf(), ".backups");

        let none = tool.execute(json!({"files": ["nope"]})).await?;
        assert!(!none.is_success());
        let empty = tool.execute(json!({"files": []})).await?;
        assert!(!empty.is_success());
        Ok(())
    }
}
