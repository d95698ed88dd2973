//! # gcoder-core - Runtime for gcoder
//!
//! `gcoder-core` powers the gcoder terminal assistant. A user request and a
//! snapshot of the project are sent to Gemini, which answers with a JSON
//! action directive. The directive is executed locally through a registry of
//! tools.
//!
//! ## Architecture Overview
//!
//! - `tools/`: the [`Tool`](tools::Tool) trait, [`ToolResult`](tools::ToolResult),
//!   the registry and the builtin tools (files, shell, git, search, Python
//!   analysis, compound project tools).
//! - `dispatcher/`: action directive parsing and the confirm-before-mutate
//!   dispatcher.
//! - `gemini/`: the HTTP client, prompt construction and the
//!   [`Assistant`](gemini::Assistant) that turns model text into directives.
//! - `context/`: project snapshot loading and the conversation memory file.
//! - `config/`: `gcoder.toml` loading, validation and API key resolution.
//! - `telemetry/`: injected event sinks used for logging and debug sessions.
//!
//! ## Quickstart
//!
//! ```rust,ignore
//! use gcoder_core::dispatcher::{ActionDirective, ActionDispatcher, AutoConfirm};
//! use gcoder_core::telemetry::TracingSink;
//! use gcoder_core::tools::{ToolOptions, ToolRegistry};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let sink = Arc::new(TracingSink);
//!     let registry = ToolRegistry::with_builtin_tools(ToolOptions::new(std::env::current_dir()?), sink.clone());
//!     let confirmer = AutoConfirm::accept();
//!     let dispatcher = ActionDispatcher::new(&registry, &confirmer, sink);
//!
//!     let directive = ActionDirective::from_model_text(r#"{"action":"USE_TOOL","tool":"glob","parameters":{"pattern":"*.rs"}}"#);
//!     let outcome = dispatcher.dispatch(directive).await?;
//!     println!("{outcome:?}");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod context;
pub mod dispatcher;
pub mod gemini;
pub mod telemetry;
pub mod tools;

pub use config::{ConfigManager, GcoderConfig};
pub use context::ContextManager;
pub use dispatcher::{ActionDirective, ActionDispatcher, DispatchOutcome};
pub use gemini::Assistant;
pub use tools::{ToolRegistry, ToolResult};
