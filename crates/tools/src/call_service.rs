//! `call_homeassistant_service`: validated service dispatch.

use std::sync::Arc;

use async_trait::async_trait;
use hassist_capability::CapabilityGateway;
use hassist_core::tool::{Tool, ToolResult, parse_arguments};
use serde::Deserialize;
use tracing::debug;

pub struct CallServiceTool {
    gateway: Arc<CapabilityGateway>,
}

impl CallServiceTool {
    pub fn new(gateway: Arc<CapabilityGateway>) -> Self {
        Self { gateway }
    }
}

#[derive(Debug, Deserialize)]
struct Args {
    domain: String,
    service: String,
    #[serde(default)]
    service_data: serde_json::Map<String, serde_json::Value>,
    /// Models often put the target next to `service_data` instead of inside it.
    #[serde(default)]
    entity_id: Option<serde_json::Value>,
}

#[async_trait]
impl Tool for CallServiceTool {
    fn name(&self) -> &str {
        "call_homeassistant_service"
    }

    fn description(&self) -> &str {
        "use this tool to call homeassistant services, including scene/automation/script, you may have to figure out exposed entities before you use this tool"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "domain": {
                    "type": "string",
                    "description": "domain in Home Assistant"
                },
                "service": {
                    "type": "string",
                    "description": "service in Home Assistant"
                },
                "service_data": {
                    "type": "object",
                    "description": "service_data is a map that contains at least one of the following: area_id, device_id, entity_id. Each of these can be a list. Additional parameters can also be passed in, such as brightness when operating a light.",
                    "default": {}
                }
            },
            "required": ["domain", "service"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> ToolResult {
        let mut args: Args = match parse_arguments(self.name(), arguments) {
            Ok(args) => args,
            Err(rejected) => return rejected,
        };

        if let Some(entity_id) = args.entity_id.take() {
            debug!(%entity_id, "Merging top-level entity_id into service_data");
            args.service_data
                .entry("entity_id")
                .or_insert(entity_id);
        }

        self.gateway
            .call_service(&args.domain, &args.service, args.service_data)
            .await
    }
}
