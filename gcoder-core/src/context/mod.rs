//! Project context and conversation memory
//!
//! [`ContextManager`] owns the current [`ProjectSnapshot`] and the bounded
//! conversation history. Both are persisted to the memory file after every
//! change, on a best-effort basis.

pub mod memory;
pub mod project;

pub use memory::{ConversationEntry, ConversationMemory, MemorySettings, context_hash};
pub use project::{GitInfo, ProjectSnapshot, ProjectStructure};

use crate::dispatcher::{ActionDirective, preview};
use crate::telemetry::{SharedSink, TelemetryEvent};
use anyhow::Result;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::path::Path;

const IMPORTANT_FILE_PREVIEW_CHARS: usize = 1000;
const HISTORY_PREVIEW_CHARS: usize = 100;
const HISTORY_IN_CONTEXT: usize = 3;
const TOP_EXTENSIONS: usize = 5;

pub struct ContextManager {
    memory: ConversationMemory,
    snapshot: Option<ProjectSnapshot>,
    sink: SharedSink,
}

impl ContextManager {
    /// Reads the memory file, restoring history and the last snapshot when
    /// they parse.
    pub fn new(settings: MemorySettings, sink: SharedSink) -> Self {
        let (memory, stored) = ConversationMemory::load(settings, sink.clone());
        let snapshot = if stored.is_empty() {
            None
        } else {
            serde_json::from_value(Value::Object(stored))
                .map_err(|err| tracing::debug!(error = %err, "ignoring stored context"))
                .ok()
        };
        Self {
            memory,
            snapshot,
            sink,
        }
    }

    pub async fn load_project_context(&mut self, path: &Path) -> Result<&ProjectSnapshot> {
        let snapshot = ProjectSnapshot::load(path).await?;
        self.sink.record(&TelemetryEvent::ContextLoaded {
            path: snapshot.path.clone(),
            total_files: snapshot.structure.total_files,
        });
        let snapshot = self.snapshot.insert(snapshot);
        let context = snapshot_map(Some(&*snapshot));
        self.memory.save(&context);
        Ok(&*snapshot)
    }

    pub fn snapshot(&self) -> Option<&ProjectSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn history(&self) -> &[ConversationEntry] {
        self.memory.history()
    }

    fn current_context(&self) -> Map<String, Value> {
        snapshot_map(self.snapshot.as_ref())
    }

    pub fn add_entry(&mut self, request: &str, response: &ActionDirective) {
        let context = self.current_context();
        let entry = ConversationEntry {
            timestamp: chrono::Local::now().to_rfc3339(),
            request: request.to_string(),
            response: serde_json::to_value(response).unwrap_or(Value::Null),
            context_hash: context_hash(&context),
        };
        self.memory.push(entry);
        self.memory.save(&context);
    }

    pub fn clear_history(&mut self) {
        self.memory.clear();
        self.memory.save(&self.current_context());
    }

    pub fn clear_context(&mut self) {
        self.snapshot = None;
        self.memory.save(&Map::new());
    }

    /// Text block sent to the model ahead of the request.
    pub fn render_context(&self) -> String {
        let mut parts = Vec::new();

        if let Some(snapshot) = &self.snapshot {
            parts.push("=== PROJECT CONTEXT ===".to_string());
            parts.push(format!("Path: {}", snapshot.path));
            if !snapshot.project_type.is_empty() {
                parts.push(format!("Types: {}", snapshot.project_type.join(", ")));
            }
            if let Some(git) = &snapshot.git_info {
                parts.push(format!(
                    "Git branch: {}",
                    git.current_branch.as_deref().unwrap_or("N/A")
                ));
                parts.push(format!("Status: {}", git_status_label(git)));
            }

            let structure = &snapshot.structure;
            parts.push(format!("\nFiles: {}", structure.total_files));
            let top: Vec<String> = structure
                .top_extensions(TOP_EXTENSIONS)
                .into_iter()
                .map(|(ext, count)| {
                    let ext = if ext.is_empty() { "(none)" } else { ext };
                    format!("{ext} ({count})")
                })
                .collect();
            if !top.is_empty() {
                parts.push(format!("Main file types: {}", top.join(", ")));
            }

            if !snapshot.important_files.is_empty() {
                parts.push("\n=== IMPORTANT FILES ===".to_string());
                for (name, content) in &snapshot.important_files {
                    parts.push(format!("\n--- {name} ---"));
                    parts.push(preview(content, IMPORTANT_FILE_PREVIEW_CHARS));
                }
            }
        }

        let history = self.memory.history();
        if !history.is_empty() {
            parts.push("\n=== RECENT HISTORY ===".to_string());
            let start = history.len().saturating_sub(HISTORY_IN_CONTEXT);
            for entry in &history[start..] {
                parts.push(format!("User: {}", preview(&entry.request, HISTORY_PREVIEW_CHARS)));
                parts.push(format!(
                    "AI: {}",
                    preview(entry.response_summary(), HISTORY_PREVIEW_CHARS)
                ));
            }
        }

        parts.join("\n")
    }

    /// Label/value pairs for the `context` command.
    pub fn info(&self) -> IndexMap<&'static str, String> {
        let mut info = IndexMap::new();
        if let Some(snapshot) = &self.snapshot {
            info.insert("Project", snapshot.path.clone());
            info.insert("Types", snapshot.project_type.join(", "));
            info.insert("Total files", snapshot.structure.total_files.to_string());
            info.insert("Directories", snapshot.structure.directories.len().to_string());
            if let Some(git) = &snapshot.git_info {
                info.insert(
                    "Git branch",
                    git.current_branch.clone().unwrap_or_else(|| "N/A".to_string()),
                );
                info.insert("Git status", git_status_label(git).to_string());
            }
        }
        info.insert("History", self.memory.history().len().to_string());
        info
    }
}

fn git_status_label(git: &GitInfo) -> &'static str {
    if git.has_changes { "has changes" } else { "clean" }
}

fn snapshot_map(snapshot: Option<&ProjectSnapshot>) -> Map<String, Value> {
    match snapshot.map(serde_json::to_value) {
        Some(Ok(Value::Object(map))) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::MemorySink;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn manager(dir: &TempDir, sink: Arc<MemorySink>) -> ContextManager {
        ContextManager::new(
            MemorySettings {
                file: dir.path().join(".gemini_memory.json"),
                ..MemorySettings::default()
            },
            sink,
        )
    }

    #[tokio::test]
    async fn renders_snapshot_and_history() -> Result<()> {
        let state = TempDir::new()?;
        let project = TempDir::new()?;
        std::fs::write(project.path().join("README.md"), "r".repeat(1500))?;
        std::fs::write(project.path().join("requirements.txt"), "requests\n")?;
        std::fs::write(project.path().join("app.py"), "print(1)\n")?;
        let sink = Arc::new(MemorySink::new());
        let mut context = manager(&state, sink.clone());

        context.load_project_context(project.path()).await?;
        context.add_entry(&"q".repeat(150), &ActionDirective::answer("short answer"));
        let text = context.render_context();

        assert!(text.starts_with("=== PROJECT CONTEXT ===\nPath: "));
        assert!(text.contains("Types: python"));
        assert!(text.contains("Files: 3"));
        assert!(text.contains(".py (1)"));
        assert!(text.contains(&format!("--- README.md ---\n{}...", "r".repeat(1000))));
        assert!(text.contains(&format!("User: {}...", "q".repeat(100))));
        assert!(text.contains("AI: short answer"));
        assert_eq!(sink.count("context_loaded"), 1);
        Ok(())
    }

    #[tokio::test]
    async fn state_survives_restart() -> Result<()> {
        let state = TempDir::new()?;
        let project = TempDir::new()?;
        {
            let mut context = manager(&state, Arc::new(MemorySink::new()));
            context.load_project_context(project.path()).await?;
            context.add_entry("hello", &ActionDirective::answer("hi"));
        }

        let restored = manager(&state, Arc::new(MemorySink::new()));
        assert!(restored.snapshot().is_some());
        assert_eq!(restored.history().len(), 1);
        assert_eq!(restored.history()[0].context_hash.len(), 8);
        assert_eq!(restored.info().get("History").map(String::as_str), Some("1"));
        Ok(())
    }

    #[tokio::test]
    async fn clearing_drops_state() -> Result<()> {
        let state = TempDir::new()?;
        let project = TempDir::new()?;
        let mut context = manager(&state, Arc::new(MemorySink::new()));
        context.load_project_context(project.path()).await?;
        context.add_entry("x", &ActionDirective::answer("y"));

        context.clear_history();
        assert!(context.history().is_empty());
        assert!(context.snapshot().is_some());

        context.clear_context();
        assert!(context.snapshot().is_none());
        assert_eq!(context.render_context(), "");
        Ok(())
    }
}
