//! `add_homeassistant_scene`: create or replace a scene.

use std::sync::Arc;

use async_trait::async_trait;
use hassist_capability::CapabilityGateway;
use hassist_core::tool::{Tool, ToolResult, parse_arguments};
use serde::Deserialize;

pub struct AddSceneTool {
    gateway: Arc<CapabilityGateway>,
}

impl AddSceneTool {
    pub fn new(gateway: Arc<CapabilityGateway>) -> Self {
        Self { gateway }
    }
}

#[derive(Debug, Deserialize)]
struct Args {
    #[serde(default)]
    name: String,
    #[serde(default)]
    entities: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    scene_id: Option<String>,
}

#[async_trait]
impl Tool for AddSceneTool {
    fn name(&self) -> &str {
        "add_homeassistant_scene"
    }

    fn description(&self) -> &str {
        "use this tool to add a scene in Home Assistant, you need to get the exact value of entity_id/area_id/device_id instead of guessing"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "required, the name of new scene"
                },
                "entities": {
                    "type": "object",
                    "description": "required, entities to control and their desired state, key is entity_id."
                },
                "scene_id": {
                    "type": "string",
                    "description": "optional, id of an existing scene to replace"
                }
            },
            "required": ["name", "entities"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> ToolResult {
        let args: Args = match parse_arguments(self.name(), arguments) {
            Ok(args) => args,
            Err(rejected) => return rejected,
        };

        self.gateway
            .add_scene(&args.name, args.entities, args.scene_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::gateway;
    use serde_json::json;

    #[tokio::test]
    async fn adds_scene() {
        let (gateway, platform) = gateway();
        let tool = AddSceneTool::new(gateway);
        let result = tool
            .execute(json!({"name": "Movie Night", "entities": {"light.kitchen": "off"}}))
            .await;
        assert!(result.to_observation().starts_with("Scene created with id "));
        assert_eq!(platform.reloads().await, vec!["scene"]);
    }

    #[tokio::test]
    async fn empty_scene_is_rejected() {
        let (gateway, platform) = gateway();
        let tool = AddSceneTool::new(gateway);
        let result = tool.execute(json!({})).await;
        assert_eq!(result.kind(), "validation_error");
        assert!(platform.reloads().await.is_empty());
    }
}
