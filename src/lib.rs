//! # gcoder - Gemini terminal coding assistant
//!
//! gcoder sends a request, together with a snapshot of the current project,
//! to Gemini. The model answers with a JSON action directive (use a tool, run
//! several tools, create or edit a file, run a command, or just answer) and
//! gcoder carries it out locally, asking before anything is written or run.
//!
//! ## Quickstart
//!
//! ```bash
//! export GEMINI_API_KEY="your-key"
//!
//! # One request, then exit
//! gcoder "list the python files and summarize main.py"
//!
//! # Interactive session rooted at another directory
//! gcoder -i -p ../service
//!
//! # Write a sample gcoder.toml, or show the tool catalog
//! gcoder --create-config
//! gcoder --tools
//! ```
//!
//! The runtime (tools, dispatcher, Gemini client, memory) lives in
//! [`gcoder_core`]; this crate holds the command-line front end.

pub mod cli;
