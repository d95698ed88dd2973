mod builtins;

use super::error::{ToolError, ToolErrorKind};
use super::result::ToolResult;
use super::traits::Tool;
use super::ToolOptions;
use crate::telemetry::{SharedSink, TelemetryEvent};
use anyhow::{Result, anyhow};
use futures::FutureExt;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

/// Catalog entry describing a tool to the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

/// Insertion-ordered catalog of tools.
///
/// Read-only once startup registration is done. [`ToolRegistry::execute_tool`]
/// always answers with a [`ToolResult`].
#[derive(Clone)]
pub struct ToolRegistry {
    tools: IndexMap<&'static str, Arc<dyn Tool>>,
    sink: SharedSink,
}

impl ToolRegistry {
    /// Empty registry.
    pub fn new(sink: SharedSink) -> Self {
        Self {
            tools: IndexMap::new(),
            sink,
        }
    }

    /// Registry preloaded with every builtin tool.
    pub fn with_builtin_tools(options: ToolOptions, sink: SharedSink) -> Self {
        let mut registry = Self::new(sink);
        builtins::register_builtin_tools(&mut registry, &options);
        registry
    }

    pub fn register_tool(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name();
        if self.tools.contains_key(name) {
            return Err(anyhow!("Tool '{}' is already registered", name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    pub fn register<T: Tool + 'static>(&mut self, tool: T) -> Result<()> {
        self.register_tool(Arc::new(tool))
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn get_tool(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Tool names in registration order.
    pub fn available_tools(&self) -> Vec<String> {
        self.tools.keys().map(|name| name.to_string()).collect()
    }

    /// Model-facing catalog, rebuilt on every call.
    pub fn catalog(&self) -> Vec<ToolDescriptor> {
        self.tools
            .values()
            .map(|tool| ToolDescriptor {
                name: tool.name(),
                description: tool.description(),
                parameters: tool.parameters(),
            })
            .collect()
    }

    pub async fn execute_tool(&self, name: &str, args: Value) -> ToolResult {
        let started = Instant::now();
        let result = match self.tools.get(name) {
            Some(tool) => Self::run_guarded(tool.as_ref(), args).await,
            None => ToolResult::failure(ToolError::UnknownTool(name.to_string())),
        };

        self.sink.record(&TelemetryEvent::ToolExecuted {
            tool: name.to_string(),
            success: result.is_success(),
            duration_ms: started.elapsed().as_millis() as u64,
            error: result.error().map(str::to_string),
        });
        result
    }

    async fn run_guarded(tool: &dyn Tool, args: Value) -> ToolResult {
        match AssertUnwindSafe(tool.execute(args)).catch_unwind().await {
            Ok(Ok(result)) => result,
            Ok(Err(err)) => {
                tracing::debug!(tool = tool.name(), error = %err, "tool returned an error");
                ToolResult::from_error(&err)
            }
            Err(panic) => {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::warn!(tool = tool.name(), %detail, "tool panicked");
                ToolResult::failure_with(
                    ToolErrorKind::Execution,
                    format!("Tool '{}' panicked: {}", tool.name(), detail),
                )
            }
        }
    }
}
