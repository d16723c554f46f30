//! Tool trait — the abstraction over model-requested capabilities.
//!
//! Tools are what the model can ask for beyond plain text: search the web,
//! generate a PDF or spreadsheet, read and write persistent notes.

use crate::error::ToolError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The three-shape tool result contract.
///
/// Every tool resolves to exactly one of these. Execution is infallible by
/// construction: a tool that hits a network error, a rendering failure, or
/// malformed arguments returns `Error(..)` as data, which flows back to the
/// model as a tool result it can react to.
///
/// Serializes as `{"result": ...}`, `{"file_path": ...}`, or `{"error": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ToolOutput {
    /// A plain text result for the model to read.
    #[serde(rename = "result")]
    Text(String),

    /// A generated file on local disk, to be delivered as an attachment
    /// and removed afterwards.
    #[serde(rename = "file_path")]
    File(PathBuf),

    /// A captured failure, reported to the model instead of raised.
    #[serde(rename = "error")]
    Error(String),
}

impl ToolOutput {
    /// The JSON payload submitted back to the model as the function response.
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            serde_json::json!({ "error": "unserializable tool output" })
        })
    }

    /// The file reference, if this output produced one.
    pub fn file_path(&self) -> Option<&Path> {
        match self {
            ToolOutput::File(path) => Some(path),
            _ => None,
        }
    }
}

/// What the model is told about a tool: name, when to use it, and the
/// JSON-schema shape of its arguments. Registered once at startup,
/// immutable afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// The core Tool trait.
///
/// Each tool (buscar_web, gerar_pdf, gerar_planilha, salvar_memoria,
/// ler_memoria) implements this trait and is registered in the
/// `ToolRegistry` at composition time.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "buscar_web").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool. Never fails at the Rust level — failures become
    /// `ToolOutput::Error`. Implementations validate the argument shape
    /// before causing any side effect.
    async fn execute(&self, arguments: serde_json::Value) -> ToolOutput;

    /// Convert this tool into a descriptor for sending to the model.
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools.
///
/// The relay loop uses this to:
/// 1. Get tool descriptors to send to the model
/// 2. Look up and execute tools when the model requests them
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Names are unique: re-registering an existing name
    /// is a startup bug, not something to paper over.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::Duplicate(name));
        }
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Get all tool descriptors (for sending to the model).
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.values().map(|t| t.descriptor()).collect()
    }

    /// Look up a tool by name and execute it with the supplied arguments.
    pub async fn dispatch(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<ToolOutput, ToolError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::Unknown(name.to_string()))?;
        Ok(tool.execute(arguments).await)
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
