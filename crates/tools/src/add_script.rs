//! `add_homeassistant_script`: create or replace a script by id.

use std::sync::Arc;

use async_trait::async_trait;
use hassist_capability::CapabilityGateway;
use hassist_core::tool::{Tool, ToolResult, parse_arguments};
use serde::Deserialize;

pub struct AddScriptTool {
    gateway: Arc<CapabilityGateway>,
}

impl AddScriptTool {
    pub fn new(gateway: Arc<CapabilityGateway>) -> Self {
        Self { gateway }
    }
}

#[derive(Debug, Deserialize)]
struct Args {
    script_id: String,
    #[serde(default)]
    new_script: serde_json::Value,
}

#[async_trait]
impl Tool for AddScriptTool {
    fn name(&self) -> &str {
        "add_homeassistant_script"
    }

    fn description(&self) -> &str {
        "use this tool to add an script in Home Assistant, you need to get the exact value of entity_id/area_id/device_id instead of guessing"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "script_id": {
                    "type": "string",
                    "description": "the unique id of script in homeassistant, needs to represent the meaning of the script as much as possible, and can only contain letters, numbers and underscore(_) characters."
                },
                "new_script": {
                    "type": "object",
                    "description": "the script to be added, should be valid homeassistant config item"
                }
            },
            "required": ["script_id", "new_script"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> ToolResult {
        let args: Args = match parse_arguments(self.name(), arguments) {
            Ok(args) => args,
            Err(rejected) => return rejected,
        };
        if args.new_script.is_null() {
            return ToolResult::validation("new_script is required");
        }

        self.gateway.add_script(&args.script_id, args.new_script).await
    }
}
