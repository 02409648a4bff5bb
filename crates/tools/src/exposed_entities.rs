//! `get_all_exposed_entities`: CSV listing of the entities the assistant may use.

use std::sync::Arc;

use async_trait::async_trait;
use hassist_capability::CapabilityGateway;
use hassist_core::tool::{Tool, ToolResult, parse_arguments};
use serde::Deserialize;

pub struct ExposedEntitiesTool {
    gateway: Arc<CapabilityGateway>,
}

impl ExposedEntitiesTool {
    pub fn new(gateway: Arc<CapabilityGateway>) -> Self {
        Self { gateway }
    }
}

#[derive(Debug, Default, Deserialize)]
struct Args {
    #[serde(default)]
    area_id: Option<String>,
    #[serde(default)]
    domain: Option<String>,
}

#[async_trait]
impl Tool for ExposedEntitiesTool {
    fn name(&self) -> &str {
        "get_all_exposed_entities"
    }

    fn description(&self) -> &str {
        "use this tool to get all exposed entities, this tool should be called before you want to call a service of an entity, the data is csv format"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "area_id": {
                    "type": "string",
                    "description": "optional, area_id in Home Assistant, corresponding to the area where the entities you want to query is located"
                },
                "domain": {
                    "type": "string",
                    "description": "optional, domain in Home Assistant, corresponding to the entities you want to query"
                }
            }
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> ToolResult {
        let args: Args = match parse_arguments(self.name(), arguments) {
            Ok(args) => args,
            Err(rejected) => return rejected,
        };

        match self
            .gateway
            .exposed_entities_csv(args.area_id.as_deref(), args.domain.as_deref())
            .await
        {
            Ok(csv) if csv.is_empty() => ToolResult::ok("No exposed entities match."),
            Ok(csv) => ToolResult::ok(csv),
            Err(e) => ToolResult::dispatch(e.to_string()),
        }
    }
}
