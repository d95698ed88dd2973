//! CLI argument parsing

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

/// Main CLI structure for gcoder
#[derive(Parser, Debug)]
#[command(
    name = "gcoder",
    version,
    about = "Terminal coding assistant powered by Gemini"
)]
pub struct Cli {
    /// Request to run once; omit it to start an interactive session
    pub request: Option<String>,

    /// Start an interactive session
    #[arg(short, long)]
    pub interactive: bool,

    /// Project directory used for context and tools
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write a sample gcoder.toml and exit
    #[arg(long)]
    pub create_config: bool,

    /// List the available tools and exit
    #[arg(long)]
    pub tools: bool,

    /// Log level (error, warn, info, debug, trace); overrides the config file
    #[arg(long)]
    pub log_level: Option<String>,

    /// Disable color output
    #[arg(long)]
    pub no_color: bool,

    /// Approve file writes and commands without asking
    #[arg(long)]
    pub auto_confirm: bool,
}

/// What a single invocation does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    CreateConfig,
    ListTools,
    Ask(String),
    Interactive,
}

impl Cli {
    pub fn mode(&self) -> RunMode {
        if self.create_config {
            return RunMode::CreateConfig;
        }
        if self.tools {
            return RunMode::ListTools;
        }
        match self.request.as_deref().map(str::trim) {
            Some(request) if !request.is_empty() && !self.interactive => {
                RunMode::Ask(request.to_string())
            }
            _ => RunMode::Interactive,
        }
    }

    /// Absolute project directory.
    pub fn workspace(&self) -> Result<PathBuf> {
        self.path
            .canonicalize()
            .with_context(|| format!("Project path does not exist: {}", self.path.display()))
    }
}
