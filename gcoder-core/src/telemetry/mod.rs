//! Execution telemetry
//!
//! Components that want to report what happened (tool runs, model calls,
//! declined confirmations, memory persistence problems) receive an
//! [`EventSink`] at construction time instead of reaching for a global
//! logger. The binary wires a [`TracingSink`], optionally wrapped in a
//! [`DebugSessionSink`]; tests use [`MemorySink`] to assert on events.

mod debug_session;

pub use debug_session::{DebugSessionSink, debug_enabled_from_env};

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;

/// A single observable event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TelemetryEvent {
    SessionStarted {
        model: String,
        workspace: String,
    },
    ToolExecuted {
        tool: String,
        success: bool,
        duration_ms: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    ModelRequest {
        request_chars: usize,
        context_chars: usize,
    },
    ModelResponse {
        action: String,
        duration_ms: u64,
        parsed: bool,
    },
    ModelError {
        message: String,
    },
    ActionDispatched {
        action: String,
    },
    ConfirmationDeclined {
        action: String,
        subject: String,
    },
    ContextLoaded {
        path: String,
        total_files: usize,
    },
    MemoryError {
        operation: String,
        message: String,
    },
}

impl TelemetryEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SessionStarted { .. } => "session_started",
            Self::ToolExecuted { .. } => "tool_executed",
            Self::ModelRequest { .. } => "model_request",
            Self::ModelResponse { .. } => "model_response",
            Self::ModelError { .. } => "model_error",
            Self::ActionDispatched { .. } => "action_dispatched",
            Self::ConfirmationDeclined { .. } => "confirmation_declined",
            Self::ContextLoaded { .. } => "context_loaded",
            Self::MemoryError { .. } => "memory_error",
        }
    }
}

/// Destination for telemetry events.
pub trait EventSink: Send + Sync {
    fn record(&self, event: &TelemetryEvent);
}

pub type SharedSink = Arc<dyn EventSink>;

/// Forwards events to `tracing` under the `gcoder::telemetry` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: &TelemetryEvent) {
        match event {
            TelemetryEvent::SessionStarted { model, workspace } => {
                tracing::info!(target: "gcoder::telemetry", %model, %workspace, "session started");
            }
            TelemetryEvent::ToolExecuted {
                tool,
                success,
                duration_ms,
                error,
            } => {
                if *success {
                    tracing::info!(target: "gcoder::telemetry", %tool, duration_ms, "tool executed");
                } else {
                    tracing::warn!(
                        target: "gcoder::telemetry",
                        %tool,
                        duration_ms,
                        error = error.as_deref().unwrap_or_default(),
                        "tool failed"
                    );
                }
            }
            TelemetryEvent::ModelRequest {
                request_chars,
                context_chars,
            } => {
                tracing::debug!(target: "gcoder::telemetry", request_chars, context_chars, "model request");
            }
            TelemetryEvent::ModelResponse {
                action,
                duration_ms,
                parsed,
            } => {
                tracing::info!(target: "gcoder::telemetry", %action, duration_ms, parsed, "model response");
            }
            TelemetryEvent::ModelError { message } => {
                tracing::warn!(target: "gcoder::telemetry", error = %message, "model request failed");
            }
            TelemetryEvent::ActionDispatched { action } => {
                tracing::debug!(target: "gcoder::telemetry", %action, "dispatching action");
            }
            TelemetryEvent::ConfirmationDeclined { action, subject } => {
                tracing::info!(target: "gcoder::telemetry", %action, %subject, "user declined action");
            }
            TelemetryEvent::ContextLoaded { path, total_files } => {
                tracing::debug!(target: "gcoder::telemetry", %path, total_files, "project context loaded");
            }
            TelemetryEvent::MemoryError { operation, message } => {
                tracing::warn!(target: "gcoder::telemetry", %operation, error = %message, "conversation memory error");
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&self, _event: &TelemetryEvent) {}
}

/// Keeps events in memory so callers can inspect them afterwards.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| event.name() == name)
            .count()
    }
}

impl EventSink for MemorySink {
    fn record(&self, event: &TelemetryEvent) {
        self.events.lock().push(event.clone());
    }
}
