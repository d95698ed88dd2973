//! Prompt construction

use crate::tools::ToolDescriptor;

const ACTION_FORMATS: &str = r#"Respond with one JSON object using exactly one of these actions:

USE_TOOL - run a single tool:
{"action": "USE_TOOL", "tool": "tool_name", "parameters": {"param": "value"}, "explanation": "what this does"}

MULTI_TOOL - run several tools in order (preferred for fixes):
{"action": "MULTI_TOOL", "tools": [{"tool": "backup", "parameters": {"files": ["app.py"]}}, {"tool": "multi_edit", "parameters": {"edits": []}}], "explanation": "the plan"}

CREATE_FILE - create a file that does not exist yet:
{"action": "CREATE_FILE", "path": "path/to/file", "new_content": "...", "explanation": "why"}

EDIT_FILE - replace the full content of an existing file:
{"action": "EDIT_FILE", "path": "path/to/file", "new_content": "...", "explanation": "why"}

RUN_COMMAND - run a shell command:
{"action": "RUN_COMMAND", "command": "cargo test", "explanation": "why"}

ANSWER_QUESTION - answer without touching the project:
{"action": "ANSWER_QUESTION", "answer": "detailed answer"}"#;

const WORKFLOW_HINTS: &str = "Common workflows:
- fixing bugs: backup, analyze, multi_edit, then bash to test
- refactoring: backup, refactor, multi_edit, then bash to validate
- adding a feature: read, write or multi_edit, then bash to test
- exploring a project: glob, analyze, grep

Back up files before large modifications and run tests afterwards when possible.";

/// Renders the tool catalog as `- name: description` lines, each followed by
/// its parameter schema.
pub fn render_catalog(catalog: &[ToolDescriptor]) -> String {
    catalog
        .iter()
        .map(|tool| {
            format!(
                "- {}: {}\n  parameters: {}",
                tool.name, tool.description, tool.parameters
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_prompt(request: &str, context: &str, catalog: &[ToolDescriptor]) -> String {
    format!(
        "You are a coding assistant working directly inside the user's project. \
You can read, analyze, modify, refactor and fix code by choosing tools.\n\n\
CURRENT PROJECT CONTEXT:\n{context}\n\n\
AVAILABLE TOOLS:\n{tools}\n\n\
USER REQUEST:\n{request}\n\n\
{ACTION_FORMATS}\n\n\
{WORKFLOW_HINTS}\n\n\
Respond with JSON only, no prose and no markdown.",
        tools = render_catalog(catalog),
    )
}
