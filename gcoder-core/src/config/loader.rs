use super::api_keys::resolve_api_key;
use super::{ConfigError, GcoderConfig};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "gcoder.toml";
const CONFIG_DIR_NAME: &str = ".gcoder";

/// Loaded configuration plus the file it came from.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: GcoderConfig,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Uses `explicit` when given, otherwise searches from `workspace`.
    /// The result is validated.
    pub fn load(explicit: Option<&Path>, workspace: &Path) -> Result<Self, ConfigError> {
        let manager = match explicit {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load_from_workspace(workspace)?,
        };
        manager.config.validate()?;
        Ok(manager)
    }

    fn home_dir() -> Option<PathBuf> {
        dirs::home_dir()
    }

    /// Search order: `gcoder.toml`, `.gcoder/gcoder.toml`, then
    /// `~/.gcoder/gcoder.toml`. Defaults when none exist.
    pub fn load_from_workspace(workspace: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let workspace = workspace.as_ref();
        let mut candidates = vec![
            workspace.join(CONFIG_FILE_NAME),
            workspace.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME),
        ];
        if let Some(home) = Self::home_dir() {
            candidates.push(home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
        }

        match candidates.into_iter().find(|path| path.is_file()) {
            Some(path) => Self::load_from_file(&path),
            None => {
                tracing::debug!(workspace = %workspace.display(), "no config file found, using defaults");
                Ok(Self {
                    config: GcoderConfig::default(),
                    config_path: None,
                })
            }
        }
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: GcoderConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(Self {
            config,
            config_path: Some(path.to_path_buf()),
        })
    }

    /// Writes the default configuration to `path`. Never overwrites.
    pub fn create_sample_config(path: impl AsRef<Path>) -> Result<PathBuf, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }
        let body = toml::to_string_pretty(&GcoderConfig::default())?;
        let content = format!("# gcoder configuration\n\n{body}");
        fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(path.to_path_buf())
    }

    pub fn config(&self) -> &GcoderConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut GcoderConfig {
        &mut self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn api_key(&self) -> Result<String, ConfigError> {
        resolve_api_key(&self.config.api)
    }
}
