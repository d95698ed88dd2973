use super::client::ModelClient;
use super::prompt::build_prompt;
use crate::dispatcher::ActionDirective;
use crate::telemetry::{SharedSink, TelemetryEvent};
use crate::tools::ToolDescriptor;
use std::sync::Arc;
use std::time::Instant;

/// Turns a user request into an [`ActionDirective`].
///
/// The tool catalog is passed to every [`Assistant::plan`] call, so tools
/// registered later are offered to the model too.
///
/// [`Assistant::plan`] has no error path: transport failures and unparsable
/// output both come back as `ANSWER_QUESTION`.
#[derive(Clone)]
pub struct Assistant {
    client: Arc<dyn ModelClient>,
    sink: SharedSink,
}

impl Assistant {
    pub fn new(client: Arc<dyn ModelClient>, sink: SharedSink) -> Self {
        Self { client, sink }
    }

    pub fn model_name(&self) -> &str {
        self.client.model_name()
    }

    pub async fn plan(
        &self,
        request: &str,
        context: &str,
        catalog: &[ToolDescriptor],
    ) -> ActionDirective {
        let prompt = build_prompt(request, context, catalog);
        self.sink.record(&TelemetryEvent::ModelRequest {
            request_chars: request.chars().count(),
            context_chars: context.chars().count(),
        });

        let started = Instant::now();
        let text = match self.client.generate(&prompt).await {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(error = %err, model = self.client.model_name(), "model request failed");
                self.sink.record(&TelemetryEvent::ModelError {
                    message: format!("{err:#}"),
                });
                return ActionDirective::answer(format!("Error processing request: {err:#}"));
            }
        };

        let parsed = ActionDirective::parse(&text).is_ok();
        let directive = ActionDirective::from_model_text(&text);
        if !parsed {
            tracing::debug!(chars = text.len(), "model reply was not a directive, treating as answer");
        }
        self.sink.record(&TelemetryEvent::ModelResponse {
            action: directive.action_name().to_string(),
            duration_ms: started.elapsed().as_millis() as u64,
            parsed,
        });
        directive
    }
}
