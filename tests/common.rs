#![allow(dead_code)]

use anyhow::{Result, bail};
use async_trait::async_trait;
use gcoder::cli::Session;
use gcoder_core::config::GcoderConfig;
use gcoder_core::dispatcher::AutoConfirm;
use gcoder_core::gemini::ModelClient;
use gcoder_core::telemetry::MemorySink;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Model client that replays canned replies in order.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
}

impl ScriptedModel {
    pub fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
        })
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        let next = match self.replies.lock() {
            Ok(mut replies) => replies.pop_front(),
            Err(_) => None,
        };
        match next {
            Some(reply) => Ok(reply),
            None => bail!("no scripted reply left"),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Test environment rooted in a temporary project directory
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub sink: Arc<MemorySink>,
}

impl TestEnv {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: TempDir::new()?,
            sink: Arc::new(MemorySink::new()),
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

    /// Session over this directory that approves every confirmation.
    pub fn session(&self, replies: &[&str]) -> Session {
        Session::new(
            &GcoderConfig::default(),
            ScriptedModel::new(replies),
            self.temp_dir.path().to_path_buf(),
            Box::new(AutoConfirm::accept()),
            self.sink.clone(),
        )
    }
}
