//! Configuration for gcoder
//!
//! Settings live in `gcoder.toml`. Every section and field has a default, so
//! an empty file (or no file) is a valid configuration:
//!
//! ```toml
//! [api]
//! model = "gemini-1.5-flash"
//! api_key_env = "GEMINI_API_KEY"
//!
//! [tools]
//! bash_timeout_secs = 30
//! backup_dir = ".backups"
//! ```

pub mod api_keys;
pub mod loader;

pub use api_keys::{load_dotenv, resolve_api_key};
pub use loader::{CONFIG_FILE_NAME, ConfigManager};

use crate::context::memory::{DEFAULT_MAX_HISTORY, DEFAULT_MEMORY_FILE, DEFAULT_PERSISTED_HISTORY};
use crate::context::MemorySettings;
use crate::dispatcher::DEFAULT_PREVIEW_CHARS;
use crate::gemini::{ClientConfig, DEFAULT_BASE_URL};
use crate::tools::{DEFAULT_BACKUP_DIR, DEFAULT_BASH_TIMEOUT_SECS, ToolOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("No API key found. Set {env} or GOOGLE_API_KEY, or api.api_key in gcoder.toml")]
    MissingApiKey { env: String },

    #[error("Config file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}
fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_request_timeout() -> u64 {
    60
}
fn default_memory_file() -> String {
    DEFAULT_MEMORY_FILE.to_string()
}
fn default_max_history() -> usize {
    DEFAULT_MAX_HISTORY
}
fn default_persisted_history() -> usize {
    DEFAULT_PERSISTED_HISTORY
}
fn default_bash_timeout() -> u64 {
    DEFAULT_BASH_TIMEOUT_SECS
}
fn default_backup_dir() -> String {
    DEFAULT_BACKUP_DIR.to_string()
}
fn default_preview_chars() -> usize {
    DEFAULT_PREVIEW_CHARS
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_debug_dir() -> String {
    "debug".to_string()
}
fn default_true() -> bool {
    true
}

/// Model API settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Inline key, used only when no environment variable is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key_env: default_api_key_env(),
            api_key: None,
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl ApiConfig {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.base_url.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            ..ClientConfig::default()
        }
    }
}

/// Conversation memory settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MemoryConfig {
    #[serde(default = "default_memory_file")]
    pub file: String,
    #[serde(default = "default_max_history")]
    pub max_history: usize,
    #[serde(default = "default_persisted_history")]
    pub persisted_history: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            file: default_memory_file(),
            max_history: default_max_history(),
            persisted_history: default_persisted_history(),
        }
    }
}

impl MemoryConfig {
    pub fn settings(&self) -> MemorySettings {
        MemorySettings {
            file: PathBuf::from(&self.file),
            max_history: self.max_history,
            persisted_history: self.persisted_history,
        }
    }
}

/// Builtin tool settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default = "default_bash_timeout")]
    pub bash_timeout_secs: u64,
    #[serde(default = "default_backup_dir")]
    pub backup_dir: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            bash_timeout_secs: default_bash_timeout(),
            backup_dir: default_backup_dir(),
        }
    }
}

impl ToolsConfig {
    pub fn options(&self, workspace_root: &Path) -> ToolOptions {
        ToolOptions::new(workspace_root)
            .with_bash_timeout(self.bash_timeout_secs)
            .with_backup_dir(self.backup_dir.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DispatcherConfig {
    /// Approve file writes and commands without asking
    #[serde(default)]
    pub auto_confirm: bool,
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            auto_confirm: false,
            preview_chars: default_preview_chars(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_dir")]
    pub dir: String,
    #[serde(default = "default_true")]
    pub file_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: default_log_dir(),
            file_enabled: default_true(),
        }
    }
}

/// Debug session recording, also enabled by `GEMINI_DEBUG`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DebugConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_debug_dir")]
    pub dir: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: default_debug_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct GcoderConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub debug: DebugConfig,
}

impl GcoderConfig {
    /// Structural checks. The API key is checked separately by
    /// [`ConfigManager::api_key`] so key-less commands still work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.model.trim().is_empty() {
            return Err(ConfigError::Invalid("api.model must not be empty".into()));
        }
        if self.api.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "api.request_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.tools.bash_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "tools.bash_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.memory.max_history == 0 {
            return Err(ConfigError::Invalid(
                "memory.max_history must be greater than zero".into(),
            ));
        }
        if self.memory.persisted_history > self.memory.max_history {
            return Err(ConfigError::Invalid(format!(
                "memory.persisted_history ({}) exceeds memory.max_history ({})",
                self.memory.persisted_history, self.memory.max_history
            )));
        }
        Ok(())
    }
}
