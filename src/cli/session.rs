use anyhow::Result;
use gcoder_core::config::{DebugConfig, GcoderConfig};
use gcoder_core::context::ContextManager;
use gcoder_core::dispatcher::{ActionDirective, ActionDispatcher, Confirmer, DispatchOutcome};
use gcoder_core::gemini::{Assistant, ModelClient};
use gcoder_core::telemetry::{
    DebugSessionSink, SharedSink, TelemetryEvent, TracingSink, debug_enabled_from_env,
};
use gcoder_core::tools::ToolRegistry;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Tracing sink, wrapped in a debug session recorder when `GEMINI_DEBUG` or
/// `debug.enabled` asks for one.
pub fn build_sink(debug: &DebugConfig) -> SharedSink {
    let tracing_sink: SharedSink = Arc::new(TracingSink);
    if !(debug.enabled || debug_enabled_from_env()) {
        return tracing_sink;
    }
    match DebugSessionSink::create(&debug.dir, tracing_sink.clone()) {
        Ok(sink) => {
            tracing::info!(path = %sink.path().display(), "recording debug session");
            Arc::new(sink)
        }
        Err(err) => {
            tracing::warn!(error = %err, "debug session disabled");
            tracing_sink
        }
    }
}

/// Everything one conversation needs: tools, model, memory and the prompt
/// used for confirmations.
pub struct Session {
    registry: ToolRegistry,
    assistant: Assistant,
    context: ContextManager,
    confirmer: Box<dyn Confirmer>,
    sink: SharedSink,
    workspace: PathBuf,
    auto_confirm: bool,
    preview_chars: usize,
}

impl Session {
    pub fn new(
        config: &GcoderConfig,
        client: Arc<dyn ModelClient>,
        workspace: PathBuf,
        confirmer: Box<dyn Confirmer>,
        sink: SharedSink,
    ) -> Self {
        let registry =
            ToolRegistry::with_builtin_tools(config.tools.options(&workspace), sink.clone());
        let assistant = Assistant::new(client, sink.clone());

        let mut memory = config.memory.settings();
        memory.file = workspace.join(&memory.file);
        let context = ContextManager::new(memory, sink.clone());

        sink.record(&TelemetryEvent::SessionStarted {
            model: assistant.model_name().to_string(),
            workspace: workspace.display().to_string(),
        });

        Self {
            registry,
            assistant,
            context,
            confirmer,
            sink,
            workspace,
            auto_confirm: config.dispatcher.auto_confirm,
            preview_chars: config.dispatcher.preview_chars,
        }
    }

    pub fn with_auto_confirm(mut self, auto_confirm: bool) -> Self {
        self.auto_confirm = self.auto_confirm || auto_confirm;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn context(&self) -> &ContextManager {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ContextManager {
        &mut self.context
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn model_name(&self) -> &str {
        self.assistant.model_name()
    }

    pub async fn load_context(&mut self, path: &Path) -> Result<()> {
        self.context.load_project_context(path).await?;
        Ok(())
    }

    /// Asks the model what to do and records the exchange in memory.
    pub async fn plan(&mut self, request: &str) -> ActionDirective {
        let directive = self
            .assistant
            .plan(request, &self.context.render_context(), &self.registry.catalog())
            .await;
        self.context.add_entry(request, &directive);
        directive
    }

    pub async fn execute(&self, directive: ActionDirective) -> Result<DispatchOutcome> {
        ActionDispatcher::new(&self.registry, self.confirmer.as_ref(), self.sink.clone())
            .with_workspace_root(&self.workspace)
            .with_auto_confirm(self.auto_confirm)
            .with_preview_chars(self.preview_chars)
            .dispatch(directive)
            .await
    }

    pub async fn handle_request(&mut self, request: &str) -> Result<DispatchOutcome> {
        let directive = self.plan(request).await;
        self.execute(directive).await
    }
}
