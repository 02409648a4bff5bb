//! Tool trait: the abstraction over agent capabilities.
//!
//! Tools are the only vocabulary the language model may act with: list
//! exposed entities, call a platform service, create an automation, and
//! so on. A tool never raises for an expected failure; it returns a
//! [`ToolResult`] the agent loop turns into an observation.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// A request to execute a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the LLM's tool_call.id when there is one)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value
    pub arguments: serde_json::Value,
}

/// The outcome of a tool execution.
///
/// Kept as a tagged value inside the crate graph; it becomes plain text
/// only when appended to the model-facing transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ToolResult {
    /// The operation succeeded; the payload is the text to show the model.
    Ok(String),
    /// Arguments, ids, exposure or document schema were rejected before any side effect.
    ValidationError(String),
    /// The platform or document store failed while carrying out the operation.
    DispatchError(String),
}

impl ToolResult {
    pub fn ok(text: impl Into<String>) -> Self {
        Self::Ok(text.into())
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::ValidationError(detail.into())
    }

    pub fn dispatch(detail: impl Into<String>) -> Self {
        Self::DispatchError(detail.into())
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Short label used in logs and events.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ok(_) => "ok",
            Self::ValidationError(_) => "validation_error",
            Self::DispatchError(_) => "dispatch_error",
        }
    }

    /// Render the result for the model-facing transcript.
    pub fn to_observation(&self) -> String {
        match self {
            Self::Ok(text) => text.clone(),
            Self::ValidationError(detail) => format!("Validation error: {detail}"),
            Self::DispatchError(detail) => format!("Error: {detail}"),
        }
    }
}

/// Decode tool arguments into a typed struct.
///
/// A decoding failure is a validation error the model can correct.
pub fn parse_arguments<T: DeserializeOwned>(
    tool_name: &str,
    arguments: serde_json::Value,
) -> std::result::Result<T, ToolResult> {
    // Models sometimes send `null` for a tool without parameters.
    let arguments = if arguments.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        arguments
    };
    serde_json::from_value(arguments)
        .map_err(|e| ToolResult::validation(format!("Invalid arguments for {tool_name}: {e}")))
}

/// The core Tool trait.
///
/// Each capability-gateway operation is exposed as one tool, registered in
/// the [`ToolRegistry`] and made available to the agent loop.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "call_homeassistant_service").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the LLM).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(&self, arguments: serde_json::Value) -> ToolResult;

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools.
///
/// Tools keep their registration order so the catalog the model sees is
/// identical on every iteration of a conversation.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. Replaces any existing tool with the same name in place.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(index) => self.tools[index] = tool,
            None => self.tools.push(tool),
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    /// Get all tool definitions (for sending to the LLM).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.to_definition()).collect()
    }

    /// Execute a tool call.
    pub async fn execute(&self, call: &ToolCall) -> std::result::Result<ToolResult, ToolError> {
        let tool = self.get(&call.name).ok_or_else(|| ToolError::NotFound(call.name.clone()))?;
        Ok(tool.execute(call.arguments.clone()).await)
    }

    /// List all registered tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
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
