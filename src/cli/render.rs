//! Terminal rendering of tool results and dispatch outcomes

use console::style;
use gcoder_core::dispatcher::DispatchOutcome;
use gcoder_core::tools::{ToolContent, ToolResult};

pub const MAX_TEXT_CHARS: usize = 500;
pub const MAX_SEQUENCE_ITEMS: usize = 10;

pub fn render_content(content: &ToolContent) -> String {
    match content {
        ToolContent::Text(text) => truncate(text, MAX_TEXT_CHARS),
        ToolContent::Sequence(items) => {
            let mut lines: Vec<String> = items
                .iter()
                .take(MAX_SEQUENCE_ITEMS)
                .map(|item| format!("  {item}"))
                .collect();
            if items.len() > MAX_SEQUENCE_ITEMS {
                lines.push(format!("  ... and {} more", items.len() - MAX_SEQUENCE_ITEMS));
            }
            lines.join("\n")
        }
        ToolContent::Mapping(map) => {
            serde_json::to_string_pretty(map).unwrap_or_else(|_| format!("{map:?}"))
        }
    }
}

pub fn render_result(result: &ToolResult) -> String {
    if !result.is_success() {
        let message = result.error().unwrap_or("unknown error");
        let mut out = style(format!("✗ Error: {message}")).red().to_string();
        // Batch tools attach their per-item log even when everything failed.
        if let Some(content) = result.content().filter(|c| !c.is_empty()) {
            out.push('\n');
            out.push_str(&render_content(content));
        }
        return out;
    }
    match result.content().filter(|c| !c.is_empty()) {
        Some(content) => render_content(content),
        None => style("✓ Done").green().to_string(),
    }
}

pub fn render_outcome(outcome: &DispatchOutcome) -> String {
    match outcome {
        DispatchOutcome::Answered { answer } => answer.clone(),
        DispatchOutcome::ToolRan {
            tool,
            explanation,
            result,
        } => {
            let mut out = header(tool, explanation);
            out.push_str(&render_result(result));
            out
        }
        DispatchOutcome::Batch { explanation, steps } => {
            let mut out = String::new();
            if !explanation.is_empty() {
                out.push_str(&format!("{}\n", style(explanation).dim()));
            }
            let total = steps.len();
            let rendered: Vec<String> = steps
                .iter()
                .enumerate()
                .map(|(i, step)| {
                    format!(
                        "{} {}\n{}",
                        style(format!("[{}/{total}]", i + 1)).dim(),
                        style(&step.tool).cyan().bold(),
                        render_result(&step.result)
                    )
                })
                .collect();
            out.push_str(&rendered.join("\n"));
            out
        }
        DispatchOutcome::FileWritten {
            path,
            created,
            result,
        } => {
            if result.is_success() {
                let verb = if *created { "Created" } else { "Updated" };
                style(format!("✓ {verb} {path}")).green().to_string()
            } else {
                render_result(result)
            }
        }
        DispatchOutcome::Refused { action, reason } => {
            style(format!("✗ {action} refused: {reason}")).red().to_string()
        }
        DispatchOutcome::Declined { action, subject } => {
            style(format!("Cancelled {action} for {subject}")).yellow().to_string()
        }
    }
}

fn header(tool: &str, explanation: &str) -> String {
    let mut out = format!("{} {}\n", style("tool:").dim(), style(tool).cyan().bold());
    if !explanation.is_empty() {
        out.push_str(&format!("{}\n", style(explanation).dim()));
    }
    out
}

fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
