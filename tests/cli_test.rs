use clap::Parser;
use gcoder::cli::chat::ReplCommand;
use gcoder::cli::render::{render_content, render_outcome, render_result};
use gcoder::cli::tools::format_catalog;
use gcoder::cli::{Cli, RunMode};
use gcoder_core::dispatcher::DispatchOutcome;
use gcoder_core::telemetry::NullSink;
use gcoder_core::tools::{ToolContent, ToolErrorKind, ToolOptions, ToolRegistry, ToolResult};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

#[test]
fn run_mode_follows_flags() {
    let mode = |argv: &[&str]| Cli::parse_from(argv).mode();

    assert_eq!(mode(&["gcoder"]), RunMode::Interactive);
    assert_eq!(mode(&["gcoder", "fix the tests"]), RunMode::Ask("fix the tests".to_string()));
    assert_eq!(mode(&["gcoder", "-i", "fix the tests"]), RunMode::Interactive);
    assert_eq!(mode(&["gcoder", "   "]), RunMode::Interactive);
    assert_eq!(mode(&["gcoder", "--tools", "x"]), RunMode::ListTools);
    assert_eq!(mode(&["gcoder", "--create-config", "--tools"]), RunMode::CreateConfig);
}

#[test]
fn path_and_config_flags_parse() {
    let cli = Cli::parse_from(["gcoder", "-p", "/tmp", "-c", "custom.toml", "--auto-confirm"]);
    assert_eq!(cli.path, PathBuf::from("/tmp"));
    assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
    assert!(cli.auto_confirm);
    assert!(Cli::parse_from(["gcoder", "-p", "/definitely/not/here"]).workspace().is_err());
}

#[test]
fn repl_commands_are_recognized() {
    assert_eq!(ReplCommand::parse("  "), ReplCommand::Empty);
    assert_eq!(ReplCommand::parse("BYE"), ReplCommand::Exit);
    assert_eq!(ReplCommand::parse("clear history"), ReplCommand::ClearHistory);
    assert_eq!(ReplCommand::parse("clear"), ReplCommand::Clear);
    assert_eq!(ReplCommand::parse("load ../api"), ReplCommand::Load(PathBuf::from("../api")));
    assert_eq!(ReplCommand::parse("load"), ReplCommand::Load(PathBuf::from(".")));
    assert_eq!(
        ReplCommand::parse("loading screen is slow"),
        ReplCommand::Request("loading screen is slow".to_string())
    );
}

#[test]
fn long_content_is_shortened() {
    let text = render_content(&ToolContent::Text("x".repeat(600)));
    assert_eq!(text, format!("{}...", "x".repeat(500)));

    let items: Vec<String> = (0..13).map(|i| format!("file{i}.py")).collect();
    let listing = render_content(&ToolContent::Sequence(items));
    assert!(listing.contains("file9.py"));
    assert!(!listing.contains("file10.py"));
    assert!(listing.ends_with("... and 3 more"));

    let mut map = serde_json::Map::new();
    map.insert("classes".to_string(), json!(["Shape"]));
    assert!(render_content(&ToolContent::Mapping(map)).contains("\"classes\": ["));
}

#[test]
fn failures_render_inline() {
    let failed = ToolResult::failure_with(ToolErrorKind::NotFound, "File not found: a.py");
    assert!(render_result(&failed).contains("Error: File not found: a.py"));

    let refused = DispatchOutcome::Refused {
        action: "CREATE_FILE",
        reason: "File already exists: a.py".to_string(),
    };
    assert!(render_outcome(&refused).contains("CREATE_FILE refused: File already exists: a.py"));

    let answered = DispatchOutcome::Answered {
        answer: "It parses TOML.".to_string(),
    };
    assert_eq!(render_outcome(&answered), "It parses TOML.");
}

#[test]
fn catalog_lists_every_builtin() {
    let registry = ToolRegistry::with_builtin_tools(ToolOptions::new("."), Arc::new(NullSink));
    let catalog = registry.catalog();
    let text = format_catalog(&catalog);

    assert_eq!(catalog.len(), 14);
    for tool in &catalog {
        assert!(text.contains(tool.name), "{} missing", tool.name);
    }
    assert!(text.contains("file_path*"));
}
