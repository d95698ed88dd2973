//! # Tool System
//!
//! Every capability exposed to the model implements [`Tool`] and is held by
//! the [`ToolRegistry`]. The registry is the single place where a name is
//! resolved to behaviour and where escaped errors become data:
//!
//! ```rust,ignore
//! use gcoder_core::telemetry::NullSink;
//! use gcoder_core::tools::{ToolOptions, ToolRegistry};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let registry = ToolRegistry::with_builtin_tools(ToolOptions::new(workspace), Arc::new(NullSink));
//! let result = registry.execute_tool("read", json!({"file_path": "README.md"})).await;
//! assert!(result.is_success());
//! ```
//!
//! Builtin tools:
//!
//! - files: `read`, `write`, `edit`, `glob`
//! - shell: `bash` (timeout + denylist)
//! - git: `git_status`, `git_diff`, `git_commit`
//! - search: `grep` (ripgrep, grep, or a builtin regex walker)
//! - analysis: `analyze` (tree-sitter Python structure)
//! - compound: `multi_edit`, `create_project`, `refactor`, `backup`

pub mod analysis;
pub mod backup;
pub mod bash_tool;
pub mod error;
pub mod file_ops;
pub mod git;
pub mod project;
pub mod refactor;
pub mod registry;
pub mod result;
pub mod search;
pub mod traits;

pub use error::{ToolError, ToolErrorKind, classify_error};
pub use registry::{ToolDescriptor, ToolRegistry};
pub use result::{ToolContent, ToolResult};
pub use traits::{Tool, parse_args};

use std::path::{Path, PathBuf};

/// Builtin tool names
pub mod names {
    pub const READ: &str = "read";
    pub const WRITE: &str = "write";
    pub const EDIT: &str = "edit";
    pub const GLOB: &str = "glob";
    pub const BASH: &str = "bash";
    pub const GIT_STATUS: &str = "git_status";
    pub const GIT_DIFF: &str = "git_diff";
    pub const GIT_COMMIT: &str = "git_commit";
    pub const GREP: &str = "grep";
    pub const ANALYZE: &str = "analyze";
    pub const MULTI_EDIT: &str = "multi_edit";
    pub const CREATE_PROJECT: &str = "create_project";
    pub const REFACTOR: &str = "refactor";
    pub const BACKUP: &str = "backup";
}

pub const DEFAULT_BASH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BACKUP_DIR: &str = ".backups";

/// Settings shared by the builtin tools.
#[derive(Debug, Clone)]
pub struct ToolOptions {
    /// Relative paths in tool arguments resolve against this directory
    pub workspace_root: PathBuf,
    pub bash_timeout_secs: u64,
    pub backup_dir: String,
}

impl ToolOptions {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            bash_timeout_secs: DEFAULT_BASH_TIMEOUT_SECS,
            backup_dir: DEFAULT_BACKUP_DIR.to_string(),
        }
    }

    pub fn with_bash_timeout(mut self, secs: u64) -> Self {
        self.bash_timeout_secs = secs;
        self
    }

    pub fn with_backup_dir(mut self, dir: impl Into<String>) -> Self {
        self.backup_dir = dir.into();
        self
    }
}

pub(crate) fn resolve_path(root: &Path, path: &str) -> PathBuf {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    }
}
