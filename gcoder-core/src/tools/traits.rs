//! The tool contract

use super::error::ToolError;
use super::result::ToolResult;
use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A named local capability the model can invoke.
///
/// Expected failures (missing file, text not found, timeout, blocked command)
/// are returned as `Ok(ToolResult::failure(..))`. Anything else may be
/// propagated with `?`; the registry turns it into a failing result.
/// Side effects only happen inside [`Tool::execute`].
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with given arguments
    async fn execute(&self, args: Value) -> Result<ToolResult>;

    /// Unique name used for dispatch and in the model-facing catalog
    fn name(&self) -> &'static str;

    /// One-line summary shown to the model
    fn description(&self) -> &'static str;

    /// JSON schema of the accepted arguments
    fn parameters(&self) -> Value;
}

/// Deserializes tool arguments into the tool's input struct.
pub fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|err| ToolError::InvalidArguments(err.to_string()))
}
