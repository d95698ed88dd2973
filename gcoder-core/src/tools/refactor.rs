//! Identifier rename refactoring
//!
//! A rename is one pass over the file with a whole-word regex. Each match is
//! counted once and classified by its surroundings, so the per-context
//! numbers always add up to the total.

use super::error::ToolErrorKind;
use super::names;
use super::result::ToolResult;
use super::traits::{Tool, parse_args};
use super::resolve_path;
use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::PathBuf;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenameCounts {
    pub functions: usize,
    pub classes: usize,
    pub assignments: usize,
    pub references: usize,
}

impl RenameCounts {
    pub fn total(&self) -> usize {
        self.functions + self.classes + self.assignments + self.references
    }
}

/// ASCII letters, digits and `_`, not starting with a digit.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_ascii_alphabetic() => {
            chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        }
        _ => false,
    }
}

/// Replaces every whole-identifier occurrence of `old_name` in `source`.
pub fn rename_identifier(
    source: &str,
    old_name: &str,
    new_name: &str,
) -> Result<(String, RenameCounts)> {
    anyhow::ensure!(is_identifier(old_name), "old_name is not an identifier: '{old_name}'");
    anyhow::ensure!(is_identifier(new_name), "new_name is not an identifier: '{new_name}'");
    let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(old_name)))
        .with_context(|| format!("Invalid identifier: {old_name}"))?;

    let mut counts = RenameCounts::default();
    for found in pattern.find_iter(source) {
        let before = source[..found.start()].trim_end_matches([' ', '\t']);
        let after = source[found.end()..].trim_start_matches([' ', '\t']);
        if before.ends_with("def") && before.len() < found.start() {
            counts.functions += 1;
        } else if before.ends_with("class") && before.len() < found.start() {
            counts.classes += 1;
        } else if after.starts_with('=') && !after.starts_with("==") {
            counts.assignments += 1;
        } else {
            counts.references += 1;
        }
    }

    let renamed = pattern.replace_all(source, regex::NoExpand(new_name)).into_owned();
    Ok((renamed, counts))
}

#[derive(Debug, Deserialize)]
struct Operation {
    #[serde(rename = "type")]
    kind: String,
    file_path: String,
    #[serde(default)]
    old_name: Option<String>,
    #[serde(default)]
    new_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefactorInput {
    operations: Vec<Operation>,
}

#[derive(Clone)]
pub struct RefactorTool {
    workspace_root: PathBuf,
}

impl RefactorTool {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self { workspace_root }
    }

    async fn rename(&self, file_path: &str, old_name: &str, new_name: &str) -> Result<RenameCounts> {
        let path = resolve_path(&self.workspace_root, file_path);
        anyhow::ensure!(path.is_file(), "file not found");
        let source = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let (renamed, counts) = rename_identifier(&source, old_name, new_name)?;
        if counts.total() > 0 {
            tokio::fs::write(&path, renamed)
                .await
                .with_context(|| format!("Failed to write file: {}", path.display()))?;
        }
        Ok(counts)
    }
}

#[async_trait]
impl Tool for RefactorTool {
    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let input: RefactorInput = parse_args(args)?;
        let total = input.operations.len();
        let mut log = Vec::with_capacity(total);
        let mut succeeded = 0usize;
        let mut replacements = 0usize;

        for op in &input.operations {
            match (op.kind.as_str(), &op.old_name, &op.new_name) {
                ("rename", Some(old_name), Some(new_name)) => {
                    match self.rename(&op.file_path, old_name, new_name).await {
                        Ok(counts) if counts.total() > 0 => {
                            succeeded += 1;
                            replacements += counts.total();
                            log.push(format!(
                                "✓ {}: {old_name} → {new_name} ({} change(s): {} def, {} class, {} assignment, {} reference)",
                                op.file_path,
                                counts.total(),
                                counts.functions,
                                counts.classes,
                                counts.assignments,
                                counts.references
                            ));
                        }
                        Ok(_) => log.push(format!("✗ {}: '{old_name}' not found", op.file_path)),
                        Err(err) => log.push(format!("✗ {}: {err:#}", op.file_path)),
                    }
                }
                ("rename", _, _) => log.push(format!(
                    "✗ {}: rename requires old_name and new_name",
                    op.file_path
                )),
                ("move", _, _) => log.push(format!(
                    "✗ {}: 'move' is not implemented",
                    op.file_path
                )),
                (other, _, _) => log.push(format!(
                    "✗ {}: unknown refactoring type '{other}'",
                    op.file_path
                )),
            }
        }

        let result = if succeeded > 0 {
            ToolResult::success(log)
        } else {
            ToolResult::failure_with(ToolErrorKind::Execution, "No refactoring operations succeeded")
                .with_content(log)
        };
        Ok(result
            .with_metadata("total_operations", total)
            .with_metadata("successful_operations", succeeded)
            .with_metadata("replacements", replacements))
    }

    fn name(&self) -> &'static str {
        names::REFACTOR
    }

    fn description(&self) -> &'static str {
        "Rename identifiers across files (rename operations only)"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "operations": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "type": {"type": "string", "enum": ["rename", "move"]},
                            "file_path": {"type": "string"},
                            "old_name": {"type": "string"},
                            "new_name": {"type": "string"}
                        },
                        "required": ["type", "file_path"]
                    }
                }
            },
            "required": ["operations"]
        })
    }
}
