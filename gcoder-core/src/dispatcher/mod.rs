//! Action dispatch
//!
//! The model answers every request with one [`ActionDirective`]. The
//! dispatcher turns it into tool calls on the [`ToolRegistry`], asking the
//! [`Confirmer`] first whenever the action would write a file or run a
//! command. Tool failures are part of the returned [`DispatchOutcome`], and a
//! confirmer that cannot prompt counts as a decline.

mod action;
mod confirm;

pub use action::{ActionDirective, ToolCall, strip_code_fences};
pub use confirm::{AutoConfirm, ConfirmationRequest, Confirmer, DialoguerConfirmer, ScriptedConfirmer};

use crate::telemetry::{SharedSink, TelemetryEvent};
use crate::tools::{ToolRegistry, ToolResult, names};
use anyhow::Result;
use serde_json::json;
use std::path::{Path, PathBuf};

pub const DEFAULT_PREVIEW_CHARS: usize = 300;

/// Result of one tool inside a `MULTI_TOOL` plan.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchStep {
    pub tool: String,
    pub result: ToolResult,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Answered {
        answer: String,
    },
    ToolRan {
        tool: String,
        explanation: String,
        result: ToolResult,
    },
    Batch {
        explanation: String,
        steps: Vec<BatchStep>,
    },
    FileWritten {
        path: String,
        created: bool,
        result: ToolResult,
    },
    /// The action was rejected before anything ran.
    Refused {
        action: &'static str,
        reason: String,
    },
    /// The user said no. Nothing ran.
    Declined {
        action: &'static str,
        subject: String,
    },
}

impl DispatchOutcome {
    /// False when a tool ran and failed or the action was refused.
    pub fn is_success(&self) -> bool {
        match self {
            Self::Answered { .. } | Self::Declined { .. } => true,
            Self::ToolRan { result, .. } | Self::FileWritten { result, .. } => result.is_success(),
            Self::Batch { steps, .. } => steps.iter().all(|step| step.result.is_success()),
            Self::Refused { .. } => false,
        }
    }
}

/// First `limit` characters of `content`, with "..." when cut.
pub fn preview(content: &str, limit: usize) -> String {
    match content.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

pub struct ActionDispatcher<'a> {
    registry: &'a ToolRegistry,
    confirmer: &'a dyn Confirmer,
    sink: SharedSink,
    workspace_root: PathBuf,
    auto_confirm: bool,
    preview_chars: usize,
}

impl<'a> ActionDispatcher<'a> {
    pub fn new(registry: &'a ToolRegistry, confirmer: &'a dyn Confirmer, sink: SharedSink) -> Self {
        Self {
            registry,
            confirmer,
            sink,
            workspace_root: PathBuf::from("."),
            auto_confirm: false,
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }

    /// Directory relative `CREATE_FILE` paths are checked against. Must match
    /// the registry's tool root.
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = root.into();
        self
    }

    /// Skip the confirmer and treat every request as approved.
    pub fn with_auto_confirm(mut self, auto_confirm: bool) -> Self {
        self.auto_confirm = auto_confirm;
        self
    }

    pub fn with_preview_chars(mut self, chars: usize) -> Self {
        self.preview_chars = chars;
        self
    }

    pub async fn dispatch(&self, directive: ActionDirective) -> Result<DispatchOutcome> {
        let action = directive.action_name();
        self.sink.record(&TelemetryEvent::ActionDispatched {
            action: action.to_string(),
        });

        match directive {
            ActionDirective::AnswerQuestion { answer } => Ok(DispatchOutcome::Answered { answer }),
            ActionDirective::UseTool {
                tool,
                parameters,
                explanation,
            } => {
                let result = self.registry.execute_tool(&tool, parameters).await;
                Ok(DispatchOutcome::ToolRan {
                    tool,
                    explanation,
                    result,
                })
            }
            ActionDirective::MultiTool { tools, explanation } => {
                let mut steps = Vec::with_capacity(tools.len());
                for call in tools {
                    let result = self.registry.execute_tool(&call.tool, call.parameters).await;
                    if !result.is_success() {
                        tracing::debug!(tool = %call.tool, error = ?result.error(), "batch step failed, continuing");
                    }
                    steps.push(BatchStep {
                        tool: call.tool,
                        result,
                    });
                }
                Ok(DispatchOutcome::Batch { explanation, steps })
            }
            ActionDirective::CreateFile {
                path,
                new_content,
                explanation,
            } => {
                if path.trim().is_empty() {
                    return Ok(DispatchOutcome::Refused {
                        action,
                        reason: "No file path was given".to_string(),
                    });
                }
                if self.resolve(&path).exists() {
                    return Ok(DispatchOutcome::Refused {
                        action,
                        reason: format!("File already exists: {path}"),
                    });
                }
                let request = ConfirmationRequest {
                    title: "Create file",
                    subject: path.clone(),
                    explanation,
                    preview: Some(preview(&new_content, self.preview_chars)),
                    prompt: "Create this file?",
                };
                if !self.approve(action, &request) {
                    return Ok(DispatchOutcome::Declined { action, subject: path });
                }
                self.write_file(path, new_content, true).await
            }
            ActionDirective::EditFile {
                path,
                new_content,
                explanation,
            } => {
                if path.trim().is_empty() {
                    return Ok(DispatchOutcome::Refused {
                        action,
                        reason: "No file path was given".to_string(),
                    });
                }
                let request = ConfirmationRequest {
                    title: "Edit file",
                    subject: path.clone(),
                    explanation,
                    preview: Some(preview(&new_content, self.preview_chars)),
                    prompt: "Apply this edit?",
                };
                if !self.approve(action, &request) {
                    return Ok(DispatchOutcome::Declined { action, subject: path });
                }
                self.write_file(path, new_content, false).await
            }
            ActionDirective::RunCommand {
                command,
                explanation,
            } => {
                let request = ConfirmationRequest {
                    title: "Run command",
                    subject: command.clone(),
                    explanation: explanation.clone(),
                    preview: None,
                    prompt: "Run this command?",
                };
                if !self.approve(action, &request) {
                    return Ok(DispatchOutcome::Declined {
                        action,
                        subject: command,
                    });
                }
                let result = self
                    .registry
                    .execute_tool(names::BASH, json!({ "command": command }))
                    .await;
                Ok(DispatchOutcome::ToolRan {
                    tool: names::BASH.to_string(),
                    explanation,
                    result,
                })
            }
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.workspace_root.join(candidate)
        }
    }

    /// A prompt that cannot be shown (no terminal, closed stdin) counts as a no.
    fn approve(&self, action: &'static str, request: &ConfirmationRequest) -> bool {
        if self.auto_confirm {
            return true;
        }
        let approved = match self.confirmer.confirm(request) {
            Ok(approved) => approved,
            Err(err) => {
                tracing::warn!(
                    action,
                    subject = %request.subject,
                    error = %err,
                    "confirmation prompt failed, treating as declined"
                );
                false
            }
        };
        if !approved {
            self.sink.record(&TelemetryEvent::ConfirmationDeclined {
                action: action.to_string(),
                subject: request.subject.clone(),
            });
        }
        approved
    }

    async fn write_file(&self, path: String, content: String, created: bool) -> Result<DispatchOutcome> {
        let result = self
            .registry
            .execute_tool(names::WRITE, json!({ "file_path": path, "content": content }))
            .await;
        Ok(DispatchOutcome::FileWritten {
            path,
            created,
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::MemorySink;
    use crate::tools::ToolOptions;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Fixture {
        temp: TempDir,
        registry: ToolRegistry,
        sink: Arc<MemorySink>,
    }

    fn fixture() -> Result<Fixture> {
        let temp = TempDir::new()?;
        let sink = Arc::new(MemorySink::default());
        let registry = ToolRegistry::with_builtin_tools(ToolOptions::new(temp.path()), sink.clone());
        Ok(Fixture { temp, registry, sink })
    }

    fn dispatcher<'a>(fx: &'a Fixture, confirmer: &'a dyn Confirmer) -> ActionDispatcher<'a> {
        ActionDispatcher::new(&fx.registry, confirmer, fx.sink.clone())
            .with_workspace_root(fx.temp.path())
    }

    fn create(path: &str, content: &str) -> ActionDirective {
        ActionDirective::CreateFile {
            path: path.to_string(),
            new_content: content.to_string(),
            explanation: "new module".to_string(),
        }
    }

    #[test]
    fn preview_cuts_on_char_boundary() {
        assert_eq!(preview("héllo", 2), "hé...");
        assert_eq!(preview("short", 300), "short");
        assert_eq!(preview(&"x".repeat(301), 300).len(), 303);
    }

    #[tokio::test]
    async fn answer_passes_through() -> Result<()> {
        let fx = fixture()?;
        let confirmer = ScriptedConfirmer::default();
        let outcome = dispatcher(&fx, &confirmer)
            .dispatch(ActionDirective::answer("42"))
            .await?;
        assert_eq!(outcome, DispatchOutcome::Answered { answer: "42".to_string() });
        assert_eq!(fx.sink.count("action_dispatched"), 1);
        Ok(())
    }

    #[tokio::test]
    async fn create_file_writes_after_confirmation() -> Result<()> {
        let fx = fixture()?;
        let confirmer = ScriptedConfirmer::new([true]);
        let body = "a".repeat(400);

        let outcome = dispatcher(&fx, &confirmer).dispatch(create("pkg/new.py", &body)).await?;

        assert!(matches!(outcome, DispatchOutcome::FileWritten { created: true, .. }));
        assert!(outcome.is_success());
        assert_eq!(std::fs::read_to_string(fx.temp.path().join("pkg/new.py"))?, body);
        let seen = confirmer.requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].preview.as_deref().map(str::len), Some(303));
        Ok(())
    }

    #[tokio::test]
    async fn create_file_refuses_existing_target() -> Result<()> {
        let fx = fixture()?;
        std::fs::write(fx.temp.path().join("keep.txt"), "original")?;
        let confirmer = ScriptedConfirmer::new([true]);

        let outcome = dispatcher(&fx, &confirmer).dispatch(create("keep.txt", "clobber")).await?;

        assert!(matches!(outcome, DispatchOutcome::Refused { action: "CREATE_FILE", .. }));
        assert!(confirmer.requests().is_empty());
        assert_eq!(std::fs::read_to_string(fx.temp.path().join("keep.txt"))?, "original");
        assert_eq!(fx.sink.count("tool_executed"), 0);
        Ok(())
    }

    #[tokio::test]
    async fn create_file_refuses_empty_path() -> Result<()> {
        let fx = fixture()?;
        let confirmer = ScriptedConfirmer::new([true]);
        let outcome = dispatcher(&fx, &confirmer).dispatch(create("", "x")).await?;
        assert!(matches!(outcome, DispatchOutcome::Refused { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn declined_edit_is_a_no_op() -> Result<()> {
        let fx = fixture()?;
        std::fs::write(fx.temp.path().join("main.py"), "old")?;
        let confirmer = ScriptedConfirmer::new([false]);

        let outcome = dispatcher(&fx, &confirmer)
            .dispatch(ActionDirective::EditFile {
                path: "main.py".to_string(),
                new_content: "new".to_string(),
                explanation: String::new(),
            })
            .await?;

        assert_eq!(
            outcome,
            DispatchOutcome::Declined {
                action: "EDIT_FILE",
                subject: "main.py".to_string()
            }
        );
        assert!(outcome.is_success());
        assert_eq!(std::fs::read_to_string(fx.temp.path().join("main.py"))?, "old");
        assert_eq!(fx.sink.count("confirmation_declined"), 1);
        Ok(())
    }

    struct NoTerminal;

    impl Confirmer for NoTerminal {
        fn confirm(&self, _request: &ConfirmationRequest) -> Result<bool> {
            Err(anyhow::anyhow!("not a terminal"))
        }
    }

    #[tokio::test]
    async fn failed_prompt_counts_as_decline() -> Result<()> {
        let fx = fixture()?;
        let outcome = dispatcher(&fx, &NoTerminal).dispatch(create("new.py", "print(1)\n")).await?;
        assert!(matches!(outcome, DispatchOutcome::Declined { .. }));
        assert!(!fx.temp.path().join("new.py").exists());

        let outcome = dispatcher(&fx, &NoTerminal)
            .dispatch(ActionDirective::RunCommand {
                command: "touch ran.txt".to_string(),
                explanation: String::new(),
            })
            .await?;
        assert!(matches!(outcome, DispatchOutcome::Declined { .. }));
        assert!(!fx.temp.path().join("ran.txt").exists());
        assert_eq!(fx.sink.count("confirmation_declined"), 2);
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn run_command_uses_bash_after_approval() -> Result<()> {
        let fx = fixture()?;
        let confirmer = AutoConfirm::decline();

        let outcome = dispatcher(&fx, &confirmer)
            .with_auto_confirm(true)
            .dispatch(ActionDirective::RunCommand {
                command: "echo hi".to_string(),
                explanation: String::new(),
            })
            .await?;

        let DispatchOutcome::ToolRan { tool, result, .. } = outcome else {
            panic!("expected ToolRan");
        };
        assert_eq!(tool, "bash");
        let stdout = result.content().and_then(|c| c.as_mapping()).and_then(|m| m.get("stdout")).cloned();
        assert_eq!(stdout, Some(json!("hi\n")));
        Ok(())
    }

    #[tokio::test]
    async fn multi_tool_continues_past_failures() -> Result<()> {
        let fx = fixture()?;
        std::fs::write(fx.temp.path().join("a.txt"), "alpha")?;
        let confirmer = ScriptedConfirmer::default();

        let outcome = dispatcher(&fx, &confirmer)
            .dispatch(ActionDirective::MultiTool {
                tools: vec![
                    ToolCall { tool: "read".to_string(), parameters: json!({"file_path": "missing.txt"}) },
                    ToolCall { tool: "nope".to_string(), parameters: json!({}) },
                    ToolCall { tool: "read".to_string(), parameters: json!({"file_path": "a.txt"}) },
                ],
                explanation: "look around".to_string(),
            })
            .await?;

        let DispatchOutcome::Batch { steps, .. } = &outcome else {
            panic!("expected Batch");
        };
        let flags: Vec<bool> = steps.iter().map(|s| s.result.is_success()).collect();
        assert_eq!(flags, vec![false, false, true]);
        assert!(!outcome.is_success());
        assert_eq!(fx.sink.count("tool_executed"), 3);
        Ok(())
    }
}
