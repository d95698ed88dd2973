use super::ask::{respond, spinner};
use super::session::Session;
use super::tools::print_catalog;
use anyhow::Result;
use console::{Term, style};
use gcoder_core::dispatcher::preview;
use std::io::{self, Write};
use std::path::PathBuf;

const PROMPT: &str = "gemini>";
const HISTORY_SHOWN: usize = 10;

/// A line typed at the interactive prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Empty,
    Exit,
    Help,
    Tools,
    Context,
    History,
    Clear,
    ClearHistory,
    Load(PathBuf),
    Request(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line.to_lowercase().as_str() {
            "" => return Self::Empty,
            "exit" | "quit" | "bye" => return Self::Exit,
            "help" => return Self::Help,
            "tools" => return Self::Tools,
            "context" => return Self::Context,
            "history" => return Self::History,
            "clear" => return Self::Clear,
            "clear history" => return Self::ClearHistory,
            "load" => return Self::Load(PathBuf::from(".")),
            _ => {}
        }
        match line.split_once(char::is_whitespace) {
            Some((head, path)) if head.eq_ignore_ascii_case("load") => {
                Self::Load(PathBuf::from(path.trim()))
            }
            _ => Self::Request(line.to_string()),
        }
    }
}

fn print_help() {
    println!("{}", style("Commands:").bold());
    for (command, description) in [
        ("help", "show this message"),
        ("tools", "list available tools"),
        ("context", "show the loaded project context"),
        ("history", "show recent requests"),
        ("load <path>", "load project context from a directory"),
        ("clear", "clear the screen"),
        ("clear history", "forget the conversation history"),
        ("exit, quit, bye", "end the session (or Ctrl-D)"),
    ] {
        println!("  {:<16} {}", style(command).cyan(), description);
    }
    println!("Anything else is sent to the model as a request.");
}

fn print_context(session: &Session) {
    println!("{}", style("Project context:").bold());
    for (label, value) in session.context().info() {
        println!("  {:<12} {}", style(format!("{label}:")).cyan(), value);
    }
}

fn print_history(session: &Session) {
    let history = session.context().history();
    if history.is_empty() {
        println!("{}", style("No history yet.").dim());
        return;
    }
    let start = history.len().saturating_sub(HISTORY_SHOWN);
    for (i, entry) in history.iter().enumerate().skip(start) {
        println!(
            "{} {}",
            style(format!("{}.", i + 1)).dim(),
            preview(&entry.request, 80)
        );
        let summary = entry.response_summary();
        if !summary.is_empty() {
            println!("   {}", style(preview(summary, 80)).dim());
        }
    }
}

/// Reads one line; `None` on end of input.
fn read_line() -> Result<Option<String>> {
    print!("{} ", style(PROMPT).cyan().bold());
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        println!();
        return Ok(None);
    }
    Ok(Some(line))
}

/// Interactive loop until `exit` or end of input.
pub async fn run_interactive(session: &mut Session) -> Result<()> {
    println!("{}", style("gcoder interactive mode").blue().bold());
    println!("Model: {}", session.model_name());
    println!("Workspace: {}", session.workspace().display());
    println!("Type 'help' for commands, 'exit' to quit.\n");

    while let Some(line) = read_line()? {
        match ReplCommand::parse(&line) {
            ReplCommand::Empty => continue,
            ReplCommand::Exit => break,
            ReplCommand::Help => print_help(),
            ReplCommand::Tools => print_catalog(&session.registry().catalog()),
            ReplCommand::Context => print_context(session),
            ReplCommand::History => print_history(session),
            ReplCommand::Clear => Term::stdout().clear_screen()?,
            ReplCommand::ClearHistory => {
                session.context_mut().clear_history();
                println!("{}", style("✓ History cleared").green());
            }
            ReplCommand::Load(path) => {
                let pb = spinner(&format!("Loading {}...", path.display()));
                let loaded = session.load_context(&path).await;
                pb.finish_and_clear();
                match loaded {
                    Ok(()) => println!("{}", style(format!("✓ Loaded context from {}", path.display())).green()),
                    Err(err) => println!("{}", style(format!("✗ Failed to load context: {err:#}")).red()),
                }
            }
            ReplCommand::Request(request) => {
                if let Err(err) = respond(session, &request).await {
                    tracing::warn!(error = %err, "request failed");
                    println!("{}", style(format!("✗ Error: {err:#}")).red());
                }
            }
        }
        println!();
    }

    println!("{}", style("Goodbye!").dim());
    Ok(())
}
