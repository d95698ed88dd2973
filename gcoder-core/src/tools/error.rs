use serde::{Deserialize, Serialize};
use std::io;

/// Failure taxonomy shared by every tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    NotFound,
    PreconditionFailed,
    ProcessFailed,
    Timeout,
    Parse,
    PolicyBlocked,
    InvalidArguments,
    Io,
    Execution,
}

impl ToolErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::PreconditionFailed => "precondition_failed",
            Self::ProcessFailed => "process_failed",
            Self::Timeout => "timeout",
            Self::Parse => "parse",
            Self::PolicyBlocked => "policy_blocked",
            Self::InvalidArguments => "invalid_arguments",
            Self::Io => "io",
            Self::Execution => "execution",
        }
    }
}

impl std::fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed tool failure. The `Display` text is what ends up in
/// [`ToolResult::error`](super::ToolResult::error).
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("{0}")]
    Precondition(String),

    #[error("{0}")]
    ProcessFailed(String),

    #[error("Command exceeded timeout of {0} seconds")]
    Timeout(u64),

    #[error("{0}")]
    Parse(String),

    #[error("Command blocked by safety policy (matched: '{0}')")]
    Blocked(&'static str),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ToolError {
    pub fn kind(&self) -> ToolErrorKind {
        match self {
            Self::FileNotFound(_) | Self::UnknownTool(_) => ToolErrorKind::NotFound,
            Self::Precondition(_) => ToolErrorKind::PreconditionFailed,
            Self::ProcessFailed(_) => ToolErrorKind::ProcessFailed,
            Self::Timeout(_) => ToolErrorKind::Timeout,
            Self::Parse(_) => ToolErrorKind::Parse,
            Self::Blocked(_) => ToolErrorKind::PolicyBlocked,
            Self::InvalidArguments(_) => ToolErrorKind::InvalidArguments,
            Self::Io(err) if err.kind() == io::ErrorKind::NotFound => ToolErrorKind::NotFound,
            Self::Io(_) => ToolErrorKind::Io,
        }
    }
}

/// Picks the most specific kind found anywhere in an error chain.
pub fn classify_error(error: &anyhow::Error) -> ToolErrorKind {
    for cause in error.chain() {
        if let Some(tool_error) = cause.downcast_ref::<ToolError>() {
            return tool_error.kind();
        }
        if let Some(io_error) = cause.downcast_ref::<io::Error>() {
            return match io_error.kind() {
                io::ErrorKind::NotFound => ToolErrorKind::NotFound,
                _ => ToolErrorKind::Io,
            };
        }
    }
    ToolErrorKind::Execution
}
