//! Action protocols: how a model family is instructed and how its replies
//! are turned into decisions.
//!
//! The protocol is chosen once, from the configured [`ModelFamily`], when an
//! executor is built. Each variant carries its own prompt text and its own
//! response parser; adding a family means adding a variant here.

use hassist_core::message::Message;
use hassist_core::provider::{ModelFamily, ToolDefinition};
use hassist_core::tool::ToolCall;
use serde_json::{Map, Value};
use tracing::warn;
use uuid::Uuid;

/// Action name that ends a structured-JSON turn.
pub const FINAL_ANSWER: &str = "Final Answer";

const STRUCTURED_SYSTEM_PROMPT: &str = r#"You have access to the following tools:

{tools}

Use a json blob to specify a tool by providing an action key (tool name) and an action_input key (tool input).

Valid "action" values: "Final Answer" or {tool_names}

Provide only ONE action per $JSON_BLOB, as shown:

```
{
  "action": $TOOL_NAME,
  "action_input": $INPUT
}
```

Follow this format:

Question: input question to answer
Thought: consider previous and subsequent steps
Action:
```
$JSON_BLOB
```
Observation: action result
... (repeat Thought/Action/Observation N times)
Thought: I know what to respond
Action:
```
{
  "action": "Final Answer",
  "action_input": "Final response to human"
}
```

Begin! Reminder to ALWAYS respond with a valid json blob of a single action. Use tools if necessary. Respond directly if appropriate. Format is Action:```$JSON_BLOB```then Observation
"#;

const STRUCTURED_HUMAN_PROMPT: &str = "{agent_scratchpad}
(reminder to respond in a JSON blob no matter what)";

/// What the model asked for in one reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// The turn is over; this text goes back to the user.
    Final(String),
    /// Invoke one tool.
    Act(ToolCall),
    /// The reply did not follow the protocol.
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Tools are described in the system prompt and the model answers with a
    /// `{"action": ..., "action_input": ...}` blob.
    StructuredJson,
    /// Tools are sent as request definitions and invoked natively.
    NativeToolCall,
}

impl From<ModelFamily> for Protocol {
    fn from(family: ModelFamily) -> Self {
        match family {
            ModelFamily::StructuredChat => Self::StructuredJson,
            ModelFamily::ToolCalling => Self::NativeToolCall,
        }
    }
}

impl Protocol {
    /// Text expanded into the `{agent_system_prompt}` slot.
    pub fn system_instructions(&self) -> &'static str {
        match self {
            Self::StructuredJson => STRUCTURED_SYSTEM_PROMPT,
            Self::NativeToolCall => "",
        }
    }

    /// Text expanded into the `{agent_human_prompt}` slot.
    pub fn human_instructions(&self) -> &'static str {
        match self {
            Self::StructuredJson => STRUCTURED_HUMAN_PROMPT,
            Self::NativeToolCall => "",
        }
    }

    /// Whether tool definitions travel in the request rather than the prompt.
    pub fn sends_tool_definitions(&self) -> bool {
        matches!(self, Self::NativeToolCall)
    }

    /// Whether the scratchpad is replayed as transcript messages.
    pub fn replays_scratchpad(&self) -> bool {
        matches!(self, Self::NativeToolCall)
    }

    pub fn stop_sequences(&self) -> Vec<String> {
        match self {
            Self::StructuredJson => vec!["\nObservation".into()],
            Self::NativeToolCall => Vec::new(),
        }
    }

    /// Observation fed back after a malformed reply.
    pub fn correction(&self, reason: &str) -> String {
        match self {
            Self::StructuredJson => format!(
                "Invalid or incomplete response: {reason}. Respond with a single JSON blob containing \"action\" and \"action_input\"."
            ),
            Self::NativeToolCall => format!(
                "Invalid or incomplete response: {reason}. Call one of the available tools or answer the user directly."
            ),
        }
    }

    /// Interpret one assistant reply.
    pub fn interpret(&self, reply: &Message) -> Decision {
        match self {
            Self::StructuredJson => interpret_structured(&reply.content),
            Self::NativeToolCall => interpret_native(reply),
        }
    }
}

/// Render tool definitions as `name: description, args: {...}` lines.
pub fn describe_tools(definitions: &[ToolDefinition]) -> String {
    definitions
        .iter()
        .map(|def| {
            let args = def
                .parameters
                .get("properties")
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new()));
            format!("{}: {}, args: {}", def.name, def.description, args)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn interpret_structured(content: &str) -> Decision {
    let actions: Vec<Map<String, Value>> = json_objects(content)
        .into_iter()
        .filter(|obj| obj.contains_key("action"))
        .collect();

    let Some(first) = actions.first() else {
        if attempts_action(content) {
            return Decision::Malformed(
                "the JSON blob could not be parsed or has no \"action\" key".into(),
            );
        }
        let text = content.trim();
        if text.is_empty() {
            return Decision::Malformed("the response was empty".into());
        }
        return Decision::Final(text.to_string());
    };

    if actions.len() > 1 {
        warn!(count = actions.len(), "Model emitted several actions, honouring the first");
    }

    let Some(action) = first.get("action").and_then(Value::as_str) else {
        return Decision::Malformed("\"action\" must be a string".into());
    };
    let input = first.get("action_input");

    if action == FINAL_ANSWER {
        return match input {
            Some(Value::String(text)) => Decision::Final(text.clone()),
            Some(Value::Null) | None => {
                Decision::Malformed("\"Final Answer\" requires an \"action_input\"".into())
            }
            Some(other) => Decision::Final(other.to_string()),
        };
    }

    Decision::Act(ToolCall {
        id: format!("call_{}", Uuid::new_v4().simple()),
        name: action.to_string(),
        arguments: normalize_input(input.cloned()),
    })
}

/// A fenced block, or a brace followed by an `action` key in any quoting,
/// means the model tried to act. Only plain prose counts as an answer.
fn attempts_action(content: &str) -> bool {
    if content.contains("```") {
        return true;
    }
    content
        .find('{')
        .is_some_and(|start| content[start..].contains("action"))
}

/// Structured models sometimes send the input as a JSON string or an empty
/// string. Objects pass through; anything else is left for the tool to reject.
fn normalize_input(input: Option<Value>) -> Value {
    match input {
        None | Some(Value::Null) => Value::Null,
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Value::Null;
            }
            match serde_json::from_str::<Value>(trimmed) {
                Ok(value @ Value::Object(_)) => value,
                _ => Value::String(text),
            }
        }
        Some(value) => value,
    }
}

fn interpret_native(reply: &Message) -> Decision {
    if let Some(first) = reply.tool_calls.first() {
        if reply.tool_calls.len() > 1 {
            warn!(
                count = reply.tool_calls.len(),
                dropped = ?reply.tool_calls[1..].iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
                "Model requested several tool calls, honouring the first"
            );
        }

        let arguments = if first.arguments.trim().is_empty() {
            Value::Object(Map::new())
        } else {
            match serde_json::from_str::<Value>(&first.arguments) {
                Ok(value @ Value::Object(_)) => value,
                Ok(_) => {
                    return Decision::Malformed(format!(
                        "arguments for {} must be a JSON object",
                        first.name
                    ));
                }
                Err(e) => {
                    return Decision::Malformed(format!(
                        "arguments for {} are not valid JSON: {e}",
                        first.name
                    ));
                }
            }
        };

        return Decision::Act(ToolCall {
            id: first.id.clone(),
            name: first.name.clone(),
            arguments,
        });
    }

    let text = reply.content.trim();
    if text.is_empty() {
        Decision::Malformed("the response had neither content nor a tool call".into())
    } else {
        Decision::Final(text.to_string())
    }
}

/// Every top-level JSON object embedded in `input`, in order.
///
/// Objects nested inside an earlier match are not reported separately.
fn json_objects(input: &str) -> Vec<Map<String, Value>> {
    let mut objects = Vec::new();
    let mut offset = 0;

    while let Some(pos) = input[offset..].find('{') {
        let start = offset + pos;
        let mut stream = serde_json::Deserializer::from_str(&input[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(Value::Object(map))) => {
                objects.push(map);
                offset = start + stream.byte_offset();
            }
            _ => offset = start + 1,
        }
    }

    objects
}
