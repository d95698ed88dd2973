//! Gemini integration
//!
//! `client` talks HTTP, `prompt` builds the request text and `assistant`
//! turns the model's reply into an action directive.

pub mod assistant;
pub mod client;
pub mod models;
pub mod prompt;

pub use assistant::Assistant;
pub use client::{ClientConfig, DEFAULT_BASE_URL, GeminiClient, ModelClient};
pub use models::{Candidate, Content, GenerateContentRequest, GenerateContentResponse, Part};
pub use prompt::{build_prompt, render_catalog};
