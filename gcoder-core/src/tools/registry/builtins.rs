use super::ToolRegistry;
use crate::tools::ToolOptions;
use crate::tools::analysis::AnalyzeTool;
use crate::tools::backup::BackupTool;
use crate::tools::bash_tool::BashTool;
use crate::tools::file_ops::{EditTool, GlobTool, ReadTool, WriteTool};
use crate::tools::git::{GitCommitTool, GitDiffTool, GitStatusTool};
use crate::tools::project::{CreateProjectTool, MultiEditTool};
use crate::tools::refactor::RefactorTool;
use crate::tools::search::GrepTool;
use crate::tools::traits::Tool;
use std::sync::Arc;

pub(super) fn register_builtin_tools(registry: &mut ToolRegistry, options: &ToolOptions) {
    for tool in builtin_tools(options) {
        let tool_name = tool.name();
        if let Err(err) = registry.register_tool(tool) {
            tracing::warn!(tool = tool_name, error = %err, "failed to register builtin tool");
        }
    }
}

pub(super) fn builtin_tools(options: &ToolOptions) -> Vec<Arc<dyn Tool>> {
    let root = options.workspace_root.clone();
    vec![
        Arc::new(ReadTool::new(root.clone())),
        Arc::new(WriteTool::new(root.clone())),
        Arc::new(EditTool::new(root.clone())),
        Arc::new(GlobTool::new(root.clone())),
        Arc::new(BashTool::new(root.clone(), options.bash_timeout_secs)),
        Arc::new(GitStatusTool::new(root.clone())),
        Arc::new(GitDiffTool::new(root.clone())),
        Arc::new(GitCommitTool::new(root.clone())),
        Arc::new(GrepTool::new(root.clone())),
        Arc::new(AnalyzeTool::new(root.clone())),
        Arc::new(MultiEditTool::new(root.clone())),
        Arc::new(CreateProjectTool::new(root.clone())),
        Arc::new(RefactorTool::new(root.clone())),
        Arc::new(BackupTool::new(root, options.backup_dir.clone())),
    ]
}
