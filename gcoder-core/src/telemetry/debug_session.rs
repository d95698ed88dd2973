use super::{EventSink, SharedSink, TelemetryEvent};
use anyhow::{Context, Result};
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::json;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const DEBUG_ENV: &str = "GEMINI_DEBUG";

/// Returns true when `GEMINI_DEBUG` is set to `1`, `true` or `yes`.
pub fn debug_enabled_from_env() -> bool {
    std::env::var(DEBUG_ENV)
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Writes every event as a JSON line to a per-session file, then forwards it.
pub struct DebugSessionSink {
    inner: SharedSink,
    path: PathBuf,
    file: Mutex<File>,
}

impl DebugSessionSink {
    pub fn create(dir: impl AsRef<Path>, inner: SharedSink) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create debug directory: {}", dir.display()))?;

        let stamp = Utc::now().format("%Y%m%dT%H%M%SZ");
        let path = dir.join(format!("session_{stamp}.jsonl"));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open debug session file: {}", path.display()))?;

        Ok(Self {
            inner,
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSink for DebugSessionSink {
    fn record(&self, event: &TelemetryEvent) {
        let line = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "payload": event,
        });
        let mut file = self.file.lock();
        if let Err(err) = writeln!(file, "{line}") {
            tracing::warn!(error = %err, path = %self.path.display(), "failed to write debug event");
        }
        drop(file);
        self.inner.record(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::MemorySink;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn writes_json_lines_and_forwards() -> Result<()> {
        let temp = TempDir::new()?;
        let inner = Arc::new(MemorySink::new());
        let sink = DebugSessionSink::create(temp.path().join("debug"), inner.clone())?;

        sink.record(&TelemetryEvent::ActionDispatched {
            action: "RUN_COMMAND".to_string(),
        });

        let written = fs::read_to_string(sink.path())?;
        let first: serde_json::Value = serde_json::from_str(written.lines().next().unwrap_or(""))?;
        assert_eq!(first["payload"]["event"], "action_dispatched");
        assert_eq!(inner.events().len(), 1);
        Ok(())
    }
}
