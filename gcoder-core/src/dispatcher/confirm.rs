//! Confirmation gate for actions that change the workspace

use anyhow::Result;
use console::style;
use dialoguer::Confirm;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// What the user is asked to approve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationRequest {
    /// Panel title, e.g. "Create file"
    pub title: &'static str,
    /// File path or command line
    pub subject: String,
    pub explanation: String,
    pub preview: Option<String>,
    pub prompt: &'static str,
}

pub trait Confirmer: Send + Sync {
    fn confirm(&self, request: &ConfirmationRequest) -> Result<bool>;
}

/// Interactive terminal prompt.
#[derive(Debug, Default, Clone, Copy)]
pub struct DialoguerConfirmer;

impl Confirmer for DialoguerConfirmer {
    fn confirm(&self, request: &ConfirmationRequest) -> Result<bool> {
        println!();
        println!("{}", style(request.title).yellow().bold());
        println!("  {} {}", style("Target:").yellow(), style(&request.subject).cyan());
        if !request.explanation.is_empty() {
            println!("  {} {}", style("Why:").yellow(), request.explanation);
        }
        if let Some(preview) = &request.preview {
            println!("{}", style("Preview:").dim());
            println!("{preview}");
        }
        println!();

        let confirmed = Confirm::new()
            .with_prompt(request.prompt)
            .default(false)
            .interact()?;

        if confirmed {
            println!("{}", style("✓ Approved").green());
        } else {
            println!("{}", style("✗ Cancelled").yellow());
        }
        Ok(confirmed)
    }
}

/// Answers every request the same way without prompting.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm {
    answer: bool,
}

impl AutoConfirm {
    pub fn accept() -> Self {
        Self { answer: true }
    }

    pub fn decline() -> Self {
        Self { answer: false }
    }
}

impl Confirmer for AutoConfirm {
    fn confirm(&self, _request: &ConfirmationRequest) -> Result<bool> {
        Ok(self.answer)
    }
}

/// Replays queued answers and records every request it saw. An exhausted
/// queue declines.
#[derive(Debug, Default)]
pub struct ScriptedConfirmer {
    answers: Mutex<VecDeque<bool>>,
    seen: Mutex<Vec<ConfirmationRequest>>,
}

impl ScriptedConfirmer {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ConfirmationRequest> {
        self.seen.lock().clone()
    }
}

impl Confirmer for ScriptedConfirmer {
    fn confirm(&self, request: &ConfirmationRequest) -> Result<bool> {
        self.seen.lock().push(request.clone());
        Ok(self.answers.lock().pop_front().unwrap_or(false))
    }
}
