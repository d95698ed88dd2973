use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use gcoder::cli::{self, Cli, RunMode, Session, build_sink};
use gcoder_core::config::{CONFIG_FILE_NAME, ConfigManager, load_dotenv};
use gcoder_core::dispatcher::DialoguerConfirmer;
use gcoder_core::gemini::GeminiClient;
use gcoder_core::telemetry::NullSink;
use gcoder_core::tools::ToolRegistry;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();
    if args.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", style("Error:").red().bold());
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Cli) -> Result<()> {
    let mode = args.mode();
    if mode == RunMode::CreateConfig {
        let path = args
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
        let written = ConfigManager::create_sample_config(&path)?;
        println!(
            "{} Created sample configuration at {}",
            style("✓").green(),
            written.display()
        );
        return Ok(());
    }

    load_dotenv();
    let workspace = args.workspace()?;
    let manager = ConfigManager::load(args.config.as_deref(), &workspace)?;
    let config = manager.config();
    let _log_guard = cli::logging::init_logging(&config.logging, args.log_level.as_deref())?;
    if let Some(path) = manager.config_path() {
        tracing::info!(path = %path.display(), "using configuration file");
    }

    if mode == RunMode::ListTools {
        let registry =
            ToolRegistry::with_builtin_tools(config.tools.options(&workspace), Arc::new(NullSink));
        cli::tools::print_catalog(&registry.catalog());
        return Ok(());
    }

    let api_key = manager.api_key()?;
    let client = GeminiClient::with_config(
        api_key,
        config.api.model.clone(),
        config.api.client_config(),
    )
    .context("Failed to create Gemini client")?;
    let sink = build_sink(&config.debug);

    let mut session = Session::new(
        config,
        Arc::new(client),
        workspace.clone(),
        Box::new(DialoguerConfirmer),
        sink,
    )
    .with_auto_confirm(args.auto_confirm);

    if let Err(err) = session.load_context(&workspace).await {
        tracing::warn!(error = %err, "failed to load project context");
        eprintln!(
            "{} could not load project context: {err:#}",
            style("Warning:").yellow().bold()
        );
    }

    match mode {
        RunMode::Ask(request) => cli::ask::run_once(&mut session, &request).await,
        _ => cli::chat::run_interactive(&mut session).await,
    }
}
