//! API key lookup
//!
//! Environment first (including values loaded from `.env`), then the
//! `GOOGLE_API_KEY` fallback, then the inline value from the config file.

use super::{ApiConfig, ConfigError};
use std::env;

pub const FALLBACK_API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Loads `.env` from the current directory. A missing file is not an error.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded environment from .env"),
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => tracing::warn!(error = %err, "failed to load .env file"),
    }
}

pub fn resolve_api_key(api: &ApiConfig) -> Result<String, ConfigError> {
    resolve_api_key_with(api, |name| env::var(name).ok())
}

/// Same as [`resolve_api_key`] with an injectable variable lookup.
pub fn resolve_api_key_with(
    api: &ApiConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

    non_empty(lookup(&api.api_key_env))
        .or_else(|| non_empty(lookup(FALLBACK_API_KEY_ENV)))
        .or_else(|| non_empty(api.api_key.clone()))
        .ok_or_else(|| ConfigError::MissingApiKey {
            env: api.api_key_env.clone(),
        })
}
