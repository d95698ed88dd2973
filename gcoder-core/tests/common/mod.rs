#![allow(dead_code)]

use anyhow::Result;
use gcoder_core::telemetry::MemorySink;
use gcoder_core::tools::{ToolOptions, ToolRegistry};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Temporary workspace with a builtin registry rooted in it
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub sink: Arc<MemorySink>,
    pub registry: ToolRegistry,
}

impl TestEnv {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let sink = Arc::new(MemorySink::new());
        let registry =
            ToolRegistry::with_builtin_tools(ToolOptions::new(temp_dir.path()), sink.clone());
        Ok(Self {
            temp_dir,
            sink,
            registry,
        })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn create_test_file(&self, name: &str, content: &str) -> Result<PathBuf> {
        let file_path = self.temp_dir.path().join(name);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&file_path, content)?;
        Ok(file_path)
    }

    pub fn read(&self, name: &str) -> Result<String> {
        Ok(fs::read_to_string(self.temp_dir.path().join(name))?)
    }
}
