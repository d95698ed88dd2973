use super::error::{ToolError, ToolErrorKind, classify_error};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Payload of a tool result. Each tool owns the shape it returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ToolContent {
    Text(String),
    Sequence(Vec<String>),
    Mapping(Map<String, Value>),
}

impl ToolContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[String]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Sequence(items) => items.is_empty(),
            Self::Mapping(map) => map.is_empty(),
        }
    }
}

impl From<String> for ToolContent {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for ToolContent {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Vec<String>> for ToolContent {
    fn from(value: Vec<String>) -> Self {
        Self::Sequence(value)
    }
}

impl From<Map<String, Value>> for ToolContent {
    fn from(value: Map<String, Value>) -> Self {
        Self::Mapping(value)
    }
}

/// Outcome of one tool invocation.
///
/// `error` (and its kind) is present exactly when `success` is false. The
/// fields are private so the only way to build a value is through
/// [`ToolResult::success`] and the failure constructors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<ToolContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<ToolErrorKind>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    metadata: IndexMap<String, Value>,
}

impl ToolResult {
    pub fn success(content: impl Into<ToolContent>) -> Self {
        Self {
            success: true,
            content: Some(content.into()),
            error: None,
            error_kind: None,
            metadata: IndexMap::new(),
        }
    }

    pub fn empty_success() -> Self {
        Self {
            success: true,
            content: None,
            error: None,
            error_kind: None,
            metadata: IndexMap::new(),
        }
    }

    pub fn failure(error: ToolError) -> Self {
        let kind = error.kind();
        Self::failure_with(kind, error.to_string())
    }

    pub fn failure_with(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        let mut message = message.into();
        if message.trim().is_empty() {
            message = format!("operation failed ({kind})");
        }
        Self {
            success: false,
            content: None,
            error: Some(message),
            error_kind: Some(kind),
            metadata: IndexMap::new(),
        }
    }

    /// Converts an error that escaped a tool into a failing result.
    pub fn from_error(error: &anyhow::Error) -> Self {
        Self::failure_with(classify_error(error), format!("{error:#}"))
    }

    pub fn with_content(mut self, content: impl Into<ToolContent>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn content(&self) -> Option<&ToolContent> {
        self.content.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn error_kind(&self) -> Option<ToolErrorKind> {
        self.error_kind
    }

    pub fn metadata(&self) -> &IndexMap<String, Value> {
        &self.metadata
    }

    pub fn metadata_value(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|err| {
            serde_json::json!({ "success": false, "error": err.to_string() })
        })
    }
}
