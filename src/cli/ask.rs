use super::render::render_outcome;
use super::session::Session;
use anyhow::Result;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        pb.set_style(template.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Plans with a spinner, then dispatches. The spinner is gone before any
/// confirmation prompt appears.
pub async fn respond(session: &mut Session, request: &str) -> Result<()> {
    let pb = spinner("Thinking...");
    let directive = session.plan(request).await;
    pb.finish_and_clear();

    let outcome = session.execute(directive).await?;
    println!("{}", render_outcome(&outcome));
    Ok(())
}

/// Handle a single request and exit
pub async fn run_once(session: &mut Session, request: &str) -> Result<()> {
    println!("{} {}", style("Request:").blue().bold(), request);
    println!();
    respond(session, request).await
}
