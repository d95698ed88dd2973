//! Structural analysis of Python source with tree-sitter
//!
//! Classes, functions and assignments are read from module level only.
//! Imports are collected anywhere in the file, including inside functions.

use super::error::ToolError;
use super::names;
use super::result::ToolResult;
use super::traits::{Tool, parse_args};
use super::resolve_path;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::PathBuf;
use tree_sitter::{Node, Parser};

/// Python analysis error
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("Only Python files (.py) are supported: {0}")]
    UnsupportedFile(String),

    #[error("Syntax error at line {line}, column {column}: {detail}")]
    Syntax {
        line: usize,
        column: usize,
        detail: String,
    },

    #[error("Parser initialization failed: {0}")]
    ParserInit(String),

    #[error("Parse error: {0}")]
    ParseFailed(String),
}

impl From<AnalysisError> for ToolError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::UnsupportedFile(_) => ToolError::InvalidArguments(err.to_string()),
            _ => ToolError::Parse(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionInfo {
    pub name: String,
    pub line: usize,
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassInfo {
    pub name: String,
    pub line: usize,
    pub bases: Vec<String>,
    pub methods: Vec<FunctionInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docstring: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    Import,
    FromImport,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportInfo {
    #[serde(rename = "type")]
    pub kind: ImportKind,
    pub module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub alias: Option<String>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableInfo {
    pub name: String,
    pub line: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PythonAnalysis {
    pub classes: Vec<ClassInfo>,
    pub functions: Vec<FunctionInfo>,
    pub imports: Vec<ImportInfo>,
    pub variables: Vec<VariableInfo>,
    pub constants: Vec<VariableInfo>,
}

/// Python's `str.isupper`: at least one cased character and none lowercase.
fn is_constant_name(name: &str) -> bool {
    let has_cased = name.chars().any(|c| c.is_uppercase() || c.is_lowercase());
    has_cased && !name.chars().any(char::is_lowercase)
}

/// Strips the shared indentation the way `inspect.cleandoc` does.
fn clean_docstring(raw: &str) -> String {
    let mut lines = raw.lines();
    let first = lines.next().unwrap_or_default().trim().to_string();
    let rest: Vec<&str> = lines.collect();
    let indent = rest
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut cleaned = vec![first];
    cleaned.extend(rest.iter().map(|line| {
        line.get(indent..)
            .unwrap_or_else(|| line.trim_start())
            .trim_end()
            .to_string()
    }));
    while cleaned.first().is_some_and(|l| l.is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().is_some_and(|l| l.is_empty()) {
        cleaned.pop();
    }
    cleaned.join("\n")
}

struct SourceWalker<'a> {
    source: &'a [u8],
    include_docstrings: bool,
}

impl<'a> SourceWalker<'a> {
    fn text(&self, node: Node) -> String {
        node.utf8_text(self.source).unwrap_or_default().to_string()
    }

    fn line(node: Node) -> usize {
        node.start_position().row + 1
    }

    fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
        let mut cursor = node.walk();
        node.named_children(&mut cursor).collect()
    }

    /// Unwraps `@decorator` wrappers.
    fn definition(node: Node) -> Node {
        if node.kind() == "decorated_definition" {
            node.child_by_field_name("definition").unwrap_or(node)
        } else {
            node
        }
    }

    fn docstring(&self, definition: Node) -> Option<String> {
        if !self.include_docstrings {
            return None;
        }
        let body = definition.child_by_field_name("body")?;
        let first = Self::named_children(body).into_iter().next()?;
        if first.kind() != "expression_statement" {
            return None;
        }
        let string = Self::named_children(first).into_iter().next()?;
        if string.kind() != "string" {
            return None;
        }
        let raw: String = Self::named_children(string)
            .into_iter()
            .filter(|part| part.kind() == "string_content")
            .map(|part| self.text(part))
            .collect();
        let cleaned = clean_docstring(&raw);
        (!cleaned.is_empty()).then_some(cleaned)
    }

    fn parameters(&self, function: Node) -> Vec<String> {
        let Some(params) = function.child_by_field_name("parameters") else {
            return Vec::new();
        };
        Self::named_children(params)
            .into_iter()
            .filter_map(|param| match param.kind() {
                "identifier" => Some(self.text(param)),
                "default_parameter" | "typed_default_parameter" => {
                    param.child_by_field_name("name").map(|n| self.text(n))
                }
                "typed_parameter" => Self::named_children(param)
                    .into_iter()
                    .find(|c| {
                        matches!(
                            c.kind(),
                            "identifier" | "list_splat_pattern" | "dictionary_splat_pattern"
                        )
                    })
                    .map(|c| self.text(c)),
                "list_splat_pattern" | "dictionary_splat_pattern" => Some(self.text(param)),
                _ => None,
            })
            .collect()
    }

    fn function(&self, node: Node) -> Option<FunctionInfo> {
        let def = Self::definition(node);
        if def.kind() != "function_definition" {
            return None;
        }
        Some(FunctionInfo {
            name: self.text(def.child_by_field_name("name")?),
            line: Self::line(def),
            args: self.parameters(def),
            docstring: self.docstring(def),
        })
    }

    fn class(&self, node: Node) -> Option<ClassInfo> {
        let def = Self::definition(node);
        if def.kind() != "class_definition" {
            return None;
        }
        let bases = def
            .child_by_field_name("superclasses")
            .map(|list| {
                Self::named_children(list)
                    .into_iter()
                    .filter(|arg| arg.kind() != "keyword_argument" && arg.kind() != "comment")
                    .map(|arg| self.text(arg))
                    .collect()
            })
            .unwrap_or_default();
        let methods = def
            .child_by_field_name("body")
            .map(|body| {
                Self::named_children(body)
                    .into_iter()
                    .filter_map(|item| self.function(item))
                    .collect()
            })
            .unwrap_or_default();

        Some(ClassInfo {
            name: self.text(def.child_by_field_name("name")?),
            line: Self::line(def),
            bases,
            methods,
            docstring: self.docstring(def),
        })
    }

    fn import_names(&self, statement: Node) -> Vec<(String, Option<String>)> {
        let mut cursor = statement.walk();
        statement
            .children_by_field_name("name", &mut cursor)
            .map(|name| {
                if name.kind() == "aliased_import" {
                    (
                        name.child_by_field_name("name")
                            .map(|n| self.text(n))
                            .unwrap_or_default(),
                        name.child_by_field_name("alias").map(|a| self.text(a)),
                    )
                } else {
                    (self.text(name), None)
                }
            })
            .collect()
    }

    fn collect_imports(&self, node: Node, out: &mut Vec<ImportInfo>) {
        match node.kind() {
            "import_statement" => {
                for (module, alias) in self.import_names(node) {
                    out.push(ImportInfo {
                        kind: ImportKind::Import,
                        module: Some(module),
                        name: None,
                        alias,
                        line: Self::line(node),
                    });
                }
                return;
            }
            "import_from_statement" | "future_import_statement" => {
                let module = if node.kind() == "future_import_statement" {
                    Some("__future__".to_string())
                } else {
                    node.child_by_field_name("module_name")
                        .map(|m| self.text(m))
                };
                let mut names = self.import_names(node);
                if Self::named_children(node)
                    .iter()
                    .any(|c| c.kind() == "wildcard_import")
                {
                    names.push(("*".to_string(), None));
                }
                for (name, alias) in names {
                    out.push(ImportInfo {
                        kind: ImportKind::FromImport,
                        module: module.clone(),
                        name: Some(name),
                        alias,
                        line: Self::line(node),
                    });
                }
                return;
            }
            _ => {}
        }
        for child in Self::named_children(node) {
            self.collect_imports(child, out);
        }
    }

    /// Module-level `name = value` targets, including chained assignments.
    fn collect_assignments(&self, node: Node, out: &mut PythonAnalysis) {
        if node.kind() != "assignment" || node.child_by_field_name("type").is_some() {
            return;
        }
        if let Some(left) = node
            .child_by_field_name("left")
            .filter(|left| left.kind() == "identifier")
        {
            let info = VariableInfo {
                name: self.text(left),
                line: Self::line(node),
            };
            if is_constant_name(&info.name) {
                out.constants.push(info);
            } else {
                out.variables.push(info);
            }
        }
        if let Some(right) = node.child_by_field_name("right") {
            self.collect_assignments(right, out);
        }
    }
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error() || child.is_missing() || child.is_error())
        .find_map(first_error)
}

const ERROR_SNIPPET_CHARS: usize = 40;

/// Names what the parser tripped over: the missing token, or the first line of
/// the unparsed text and the construct it sits in.
fn describe_error(node: Node, source: &[u8]) -> String {
    if node.is_missing() {
        return format!("missing '{}'", node.kind());
    }
    let context = node.parent().map_or("module", |parent| parent.kind());
    let text = node.utf8_text(source).unwrap_or_default();
    let line = text.lines().next().unwrap_or_default().trim();
    if line.is_empty() {
        return format!("unexpected input in {context}");
    }
    let mut snippet: String = line.chars().take(ERROR_SNIPPET_CHARS).collect();
    if line.chars().count() > ERROR_SNIPPET_CHARS {
        snippet.push_str("...");
    }
    format!("unexpected '{snippet}' in {context}")
}

/// Parses Python source and extracts its structure.
pub fn analyze_python_source(
    source: &str,
    include_docstrings: bool,
) -> Result<PythonAnalysis, AnalysisError> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .map_err(|err| AnalysisError::ParserInit(err.to_string()))?;
    let tree = parser
        .parse(source, None)
        .ok_or_else(|| AnalysisError::ParseFailed("parser returned no tree".to_string()))?;

    let root = tree.root_node();
    if root.has_error() {
        let node = first_error(root).unwrap_or(root);
        let position = node.start_position();
        return Err(AnalysisError::Syntax {
            line: position.row + 1,
            column: position.column + 1,
            detail: describe_error(node, source.as_bytes()),
        });
    }

    let walker = SourceWalker {
        source: source.as_bytes(),
        include_docstrings,
    };
    let mut analysis = PythonAnalysis::default();
    for statement in SourceWalker::named_children(root) {
        if let Some(class) = walker.class(statement) {
            analysis.classes.push(class);
        } else if let Some(function) = walker.function(statement) {
            analysis.functions.push(function);
        } else if statement.kind() == "expression_statement" {
            for expression in SourceWalker::named_children(statement) {
                walker.collect_assignments(expression, &mut analysis);
            }
        }
    }
    walker.collect_imports(root, &mut analysis.imports);
    Ok(analysis)
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct AnalyzeInput {
    file_path: String,
    #[serde(default = "default_true")]
    include_docstrings: bool,
}

#[derive(Clone)]
pub struct AnalyzeTool {
    workspace_root: PathBuf,
}

impl AnalyzeTool {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self { workspace_root }
    }
}

#[async_trait]
impl Tool for AnalyzeTool {
    async fn execute(&self, args: Value) -> Result<ToolResult> {
        let input: AnalyzeInput = parse_args(args)?;
        let path = resolve_path(&self.workspace_root, &input.file_path);
        if !path.is_file() {
            return Ok(ToolResult::failure(ToolError::FileNotFound(input.file_path)));
        }
        if path.extension().and_then(|e| e.to_str()) != Some("py") {
            return Ok(ToolResult::failure(
                AnalysisError::UnsupportedFile(input.file_path).into(),
            ));
        }

        let source = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let analysis = match analyze_python_source(&source, input.include_docstrings) {
            Ok(analysis) => analysis,
            Err(err) => return Ok(ToolResult::failure(err.into())),
        };

        let mut content = match serde_json::to_value(&analysis)? {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        content.insert("file_path".to_string(), json!(input.file_path));

        Ok(ToolResult::success(content)
            .with_metadata("file_path", input.file_path)
            .with_metadata("classes_count", analysis.classes.len())
            .with_metadata("functions_count", analysis.functions.len())
            .with_metadata("imports_count", analysis.imports.len()))
    }

    fn name(&self) -> &'static str {
        names::ANALYZE
    }

    fn description(&self) -> &'static str {
        "Extract classes, functions, imports and assignments from a Python file"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {"type": "string", "description": "Python file to analyze"},
                "include_docstrings": {"type": "boolean", "default": true, "description": "Attach docstrings to classes and functions"}
            },
            "required": ["file_path"]
        })
    }
}
