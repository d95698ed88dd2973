//! Conversation memory persisted as JSON next to the project

use crate::telemetry::{SharedSink, TelemetryEvent};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_MEMORY_FILE: &str = ".gemini_memory.json";
pub const DEFAULT_MAX_HISTORY: usize = 100;
pub const DEFAULT_PERSISTED_HISTORY: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub timestamp: String,
    pub request: String,
    pub response: Value,
    pub context_hash: String,
}

impl ConversationEntry {
    /// The part of the response worth echoing back: its explanation, else its answer.
    pub fn response_summary(&self) -> &str {
        ["explanation", "answer"]
            .iter()
            .filter_map(|key| self.response.get(key).and_then(Value::as_str))
            .find(|text| !text.is_empty())
            .unwrap_or_default()
    }
}

/// On-disk layout of the memory file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryFile {
    #[serde(default)]
    pub conversation_history: Vec<ConversationEntry>,
    #[serde(default)]
    pub current_context: Map<String, Value>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// First 8 hex characters of the SHA-256 of the context's JSON text. Keys
/// are sorted, so equal contexts hash equally.
pub fn context_hash(context: &Map<String, Value>) -> String {
    let sorted: BTreeMap<&String, &Value> = context.iter().collect();
    let canonical = serde_json::to_string(&sorted).unwrap_or_default();
    let digest = Sha256::digest(canonical.as_bytes());
    digest.iter().take(4).map(|byte| format!("{byte:02x}")).collect()
}

#[derive(Debug, Clone)]
pub struct MemorySettings {
    pub file: PathBuf,
    pub max_history: usize,
    pub persisted_history: usize,
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            file: PathBuf::from(DEFAULT_MEMORY_FILE),
            max_history: DEFAULT_MAX_HISTORY,
            persisted_history: DEFAULT_PERSISTED_HISTORY,
        }
    }
}

/// Bounded history plus the saved context. Disk problems are logged and
/// reported to the sink, never returned.
pub struct ConversationMemory {
    settings: MemorySettings,
    history: Vec<ConversationEntry>,
    sink: SharedSink,
}

impl ConversationMemory {
    /// Loads `settings.file` if present. Returns the stored context alongside.
    pub fn load(settings: MemorySettings, sink: SharedSink) -> (Self, Map<String, Value>) {
        let stored = match read_memory_file(&settings.file) {
            Ok(stored) => stored.unwrap_or_default(),
            Err(err) => {
                tracing::warn!(file = %settings.file.display(), error = %err, "failed to load memory");
                sink.record(&TelemetryEvent::MemoryError {
                    operation: "load".to_string(),
                    message: format!("{err:#}"),
                });
                MemoryFile::default()
            }
        };

        let mut memory = Self {
            settings,
            history: stored.conversation_history,
            sink,
        };
        memory.enforce_cap();
        (memory, stored.current_context)
    }

    pub fn history(&self) -> &[ConversationEntry] {
        &self.history
    }

    pub fn file(&self) -> &Path {
        &self.settings.file
    }

    pub fn push(&mut self, entry: ConversationEntry) {
        self.history.push(entry);
        self.enforce_cap();
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    fn enforce_cap(&mut self) {
        let excess = self.history.len().saturating_sub(self.settings.max_history);
        self.history.drain(..excess);
    }

    /// Writes the last `persisted_history` entries and `context`.
    pub fn save(&self, context: &Map<String, Value>) {
        if let Err(err) = self.write(context) {
            tracing::warn!(file = %self.settings.file.display(), error = %err, "failed to save memory");
            self.sink.record(&TelemetryEvent::MemoryError {
                operation: "save".to_string(),
                message: format!("{err:#}"),
            });
        }
    }

    fn write(&self, context: &Map<String, Value>) -> Result<()> {
        let keep_from = self.history.len().saturating_sub(self.settings.persisted_history);
        let file = MemoryFile {
            conversation_history: self.history[keep_from..].to_vec(),
            current_context: context.clone(),
            last_updated: Some(chrono::Local::now().to_rfc3339()),
        };
        let json = serde_json::to_string_pretty(&file).context("Failed to serialize memory")?;
        std::fs::write(&self.settings.file, json)
            .with_context(|| format!("Failed to write memory file: {}", self.settings.file.display()))
    }
}

fn read_memory_file(path: &Path) -> Result<Option<MemoryFile>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read memory file: {}", path.display()))?;
    let file = serde_json::from_str(&content)
        .with_context(|| format!("Malformed memory file: {}", path.display()))?;
    Ok(Some(file))
}
