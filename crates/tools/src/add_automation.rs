//! `add_homeassistant_automation`: create or replace an automation.

use std::sync::Arc;

use async_trait::async_trait;
use hassist_capability::CapabilityGateway;
use hassist_core::tool::{Tool, ToolResult, parse_arguments};
use serde::Deserialize;

pub struct AddAutomationTool {
    gateway: Arc<CapabilityGateway>,
}

impl AddAutomationTool {
    pub fn new(gateway: Arc<CapabilityGateway>) -> Self {
        Self { gateway }
    }
}

#[derive(Debug, Deserialize)]
struct Args {
    #[serde(default)]
    new_automation: serde_json::Value,
    #[serde(default)]
    automation_id: Option<String>,
}

#[async_trait]
impl Tool for AddAutomationTool {
    fn name(&self) -> &str {
        "add_homeassistant_automation"
    }

    fn description(&self) -> &str {
        "use this tool to add an automation in Home Assistant, you need to get the exact value of entity_id/area_id/device_id instead of guessing"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "new_automation": {
                    "type": "object",
                    "description": "the automation to be added, should be valid Home Assistant config item"
                },
                "automation_id": {
                    "type": "string",
                    "description": "optional, id of an existing automation to replace"
                }
            },
            "required": ["new_automation"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> ToolResult {
        let args: Args = match parse_arguments(self.name(), arguments) {
            Ok(args) => args,
            Err(rejected) => return rejected,
        };
        if args.new_automation.is_null() {
            return ToolResult::validation("new_automation is required");
        }

        self.gateway
            .add_automation(args.new_automation, args.automation_id)
            .await
    }
}
