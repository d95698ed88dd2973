//! Command-line front end
//!
//! `args` parses flags, `session` wires the core runtime together, and the
//! remaining modules drive one-shot, interactive and catalog output.

pub mod args;
pub mod ask;
pub mod chat;
pub mod logging;
pub mod render;
pub mod session;
pub mod tools;

pub use args::{Cli, RunMode};
pub use session::{Session, build_sink};
