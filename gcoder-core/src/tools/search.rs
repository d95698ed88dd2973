//! Pattern search across files
//!
//! Delegates to ripgrep when it is installed, otherwise to `grep`, and as a
//! last resort to an in-process regex walker. All three produce the same
//! `path:line:text` sequence. Exit status 1 from either binary means "no
//! matches" and is reported as an empty success; only status 2 and above is
//! a failure.

use super::error::ToolError;
use super::names;
use super::result::ToolResult;
use super::traits::{Tool, parse_args};
use super::resolve_path;
use anyhow::Result;
use async_trait::async_trait;
use glob::Pattern;
use regex::RegexBuilder;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use walkdir::WalkDir;

const ALL_FILES: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchBackend {
    Ripgrep,
    Grep,
    Builtin,
}

impl SearchBackend {
    /// Picks the fastest backend available on this machine.
    pub fn detect() -> Self {
        if Self::probe("rg") {
            Self::Ripgrep
        } else if Self::probe("grep") {
            Self::Grep
        } else {
            Self::Builtin
        }
    }

    fn probe(binary: &str) -> bool {
        std::process::Command::new(binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ripgrep => "rg",
            Self::Grep => "grep",
            Self::Builtin => "builtin",
        }
    }
}

fn default_path() -> String {
    ".".to_string()
}

fn default_file_pattern() -> String {
    ALL_FILES.to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct GrepInput {
    pattern: String,
    #[serde(default = "default_path")]
    path: String,
    #[serde(default = "default_file_pattern")]
    file_pattern: String,
    #[serde(default)]
    ignore_case: bool,
    #[serde(default = "default_true")]
    line_numbers: bool,
}

enum SearchOutcome {
    Matches(Vec<String>),
    Failed(ToolError),
    Unavailable,
}

#[derive(Clone)]
pub struct GrepTool {
    workspace_root: PathBuf,
    backend: SearchBackend,
}

impl GrepTool {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self::with_backend(workspace_root, SearchBackend::detect())
    }

    pub fn with_backend(workspace_root: PathBuf, backend: SearchBackend) -> Self {
        Self {
            workspace_root,
            backend,
        }
    }

    pub fn backend(&self) -> SearchBackend {
        self.backend
    }

    fn external_command(&self, input: &GrepInput) -> Command {
        let filtered = input.file_pattern != ALL_FILES;
        let mut cmd = match self.backend {
            SearchBackend::Ripgrep => {
                let mut cmd = Command::new("rg");
                cmd.args(["--no-heading", "--with-filename", "--color", "never"]);
                if filtered {
                    cmd.arg("-g").arg(&input.file_pattern);
                }
                cmd
            }
            _ => {
                let mut cmd = Command::new("grep");
                cmd.args(["-r", "-E", "-H"]);
                if filtered {
                    cmd.arg(format!("--include={}", input.file_pattern));
                }
                cmd
            }
        };
        if input.ignore_case {
            cmd.arg("-i");
        }
        if input.line_numbers {
            cmd.arg("-n");
        }
        cmd.arg("-e").arg(&input.pattern).arg(&input.path);
        cmd.current_dir(&self.workspace_root);
        cmd
    }

    async fn search_external(&self, input: &GrepInput) -> Result<SearchOutcome> {
        let output = match self
            .external_command(input)
            .stdin(Stdio::null())
            .output()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                tracing::debug!(backend = self.backend.as_str(), error = %err, "search backend unavailable");
                return Ok(SearchOutcome::Unavailable);
            }
        };

        match output.status.code() {
            Some(0) => Ok(SearchOutcome::Matches(
                String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
            Some(1) => Ok(SearchOutcome::Matches(Vec::new())),
            code => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                let message = if stderr.is_empty() {
                    format!("{} exited with status {:?}", self.backend.as_str(), code)
                } else {
                    stderr
                };
                Ok(SearchOutcome::Failed(ToolError::Parse(message)))
            }
        }
    }

    fn search_builtin(&self, input: &GrepInput) -> SearchOutcome {
        let regex = match RegexBuilder::new(&input.pattern)
            .case_insensitive(input.ignore_case)
            .build()
        {
            Ok(regex) => regex,
            Err(err) => return SearchOutcome::Failed(ToolError::Parse(err.to_string())),
        };
        let file_filter = match Pattern::new(&input.file_pattern) {
            Ok(pattern) => pattern,
            Err(err) => {
                return SearchOutcome::Failed(ToolError::InvalidArguments(format!(
                    "invalid file_pattern: {err}"
                )));
            }
        };

        let base = resolve_path(&self.workspace_root, &input.path);
        let mut matches = Vec::new();
        let walker = WalkDir::new(&base)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.path()));

        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy();
            if !file_filter.matches(&file_name) {
                continue;
            }
            let Ok(content) = std::fs::read_to_string(entry.path()) else {
                continue;
            };
            let shown = display_path(&input.path, &base, entry.path());
            for (index, line) in content.lines().enumerate() {
                if regex.is_match(line) {
                    if input.line_numbers {
                        matches.push(format!("{shown}:{}:{line}", index + 1));
                    } else {
                        matches.push(format!("{shown}:{line}"));
                    }
                }
            }
        }
        SearchOutcome::Matches(matches)
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.') && name.len() > 1)
}

fn display_path(requested: &str, base: &Path, file: &Path) -> String {
    match file.strip_prefix(base) {
        Ok(rel) if rel.as_os_str().is_empty() => requested.to_string(),
        Ok(rel) => format!("{}/{}", requested.trim_end_matches('/'), rel.to_string_lossy()),
        Err(_) => file.to_string_lossy().into_owned(),
    }
}

#[async_trait]
impl Tool for GrepTool {
    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let input: GrepInput = parse_args(args)?;

        let mut backend = self.backend;
        let mut outcome = match backend {
            SearchBackend::Builtin => SearchOutcome::Unavailable,
            _ => self.search_external(&input).await?,
        };
        if matches!(outcome, SearchOutcome::Unavailable) {
            backend = SearchBackend::Builtin;
            outcome = self.search_builtin(&input);
        }

        match outcome {
            SearchOutcome::Matches(lines) => {
                let count = lines.len();
                Ok(ToolResult::success(lines)
                    .with_metadata("pattern", input.pattern)
                    .with_metadata("path", input.path)
                    .with_metadata("backend", backend.as_str())
                    .with_metadata("matches_count", count))
            }
            SearchOutcome::Failed(err) => Ok(ToolResult::failure(err)
                .with_metadata("pattern", input.pattern)
                .with_metadata("backend", backend.as_str())),
            SearchOutcome::Unavailable => Ok(ToolResult::failure(ToolError::ProcessFailed(
                "no search backend available".to_string(),
            ))),
        }
    }

    fn name(&self) -> &'static str {
        names::GREP
    }

    fn description(&self) -> &'static str {
        "Search file contents for a regular expression"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "pattern": {"type": "string", "description": "Regular expression to search for"},
                "path": {"type": "string", "default": ".", "description": "File or directory to search"},
                "file_pattern": {"type": "string", "default": "*", "description": "Only search files whose name matches this glob"},
                "ignore_case": {"type": "boolean", "default": false},
                "line_numbers": {"type": "boolean", "default": true}
            },
            "required": ["pattern"]
        })
    }
}
