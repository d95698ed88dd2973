use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn empty_parameters() -> Value {
    Value::Object(Map::new())
}

/// One entry of a `MULTI_TOOL` plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool: String,
    #[serde(default = "empty_parameters")]
    pub parameters: Value,
}

/// What the model asked for, discriminated by its `action` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionDirective {
    UseTool {
        tool: String,
        #[serde(default = "empty_parameters")]
        parameters: Value,
        #[serde(default)]
        explanation: String,
    },
    MultiTool {
        #[serde(default)]
        tools: Vec<ToolCall>,
        #[serde(default)]
        explanation: String,
    },
    CreateFile {
        #[serde(default)]
        path: String,
        #[serde(default)]
        new_content: String,
        #[serde(default)]
        explanation: String,
    },
    EditFile {
        #[serde(default)]
        path: String,
        #[serde(default)]
        new_content: String,
        #[serde(default)]
        explanation: String,
    },
    RunCommand {
        command: String,
        #[serde(default)]
        explanation: String,
    },
    AnswerQuestion {
        #[serde(default)]
        answer: String,
    },
}

/// Removes markdown code fences the model likes to wrap JSON in.
pub fn strip_code_fences(text: &str) -> String {
    text.trim().replace("```json", "").replace("```", "").trim().to_string()
}

impl ActionDirective {
    pub fn answer(text: impl Into<String>) -> Self {
        Self::AnswerQuestion {
            answer: text.into(),
        }
    }

    /// Strict parse: fenced or bare JSON matching one of the six shapes.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(&strip_code_fences(text))
    }

    /// Lenient parse used on model output. Never fails: anything that is not
    /// a recognised directive becomes an answer. A JSON object with an
    /// `answer` string keeps just that string.
    pub fn from_model_text(text: &str) -> Self {
        if let Ok(directive) = Self::parse(text) {
            return directive;
        }
        let answer = serde_json::from_str::<Value>(&strip_code_fences(text))
            .ok()
            .and_then(|value| value.get("answer").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| text.trim().to_string());
        Self::answer(answer)
    }

    /// Wire name of the action, e.g. `USE_TOOL`.
    pub fn action_name(&self) -> &'static str {
        match self {
            Self::UseTool { .. } => "USE_TOOL",
            Self::MultiTool { .. } => "MULTI_TOOL",
            Self::CreateFile { .. } => "CREATE_FILE",
            Self::EditFile { .. } => "EDIT_FILE",
            Self::RunCommand { .. } => "RUN_COMMAND",
            Self::AnswerQuestion { .. } => "ANSWER_QUESTION",
        }
    }

    /// True for the actions that change files or run commands.
    pub fn requires_confirmation(&self) -> bool {
        matches!(
            self,
            Self::CreateFile { .. } | Self::EditFile { .. } | Self::RunCommand { .. }
        )
    }
}
