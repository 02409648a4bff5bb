//! `get_domains_services`: the services a domain offers, as JSON.

use std::sync::Arc;

use async_trait::async_trait;
use hassist_capability::CapabilityGateway;
use hassist_core::tool::{Tool, ToolResult, parse_arguments};
use serde::Deserialize;

pub struct DomainServicesTool {
    gateway: Arc<CapabilityGateway>,
}

impl DomainServicesTool {
    pub fn new(gateway: Arc<CapabilityGateway>) -> Self {
        Self { gateway }
    }
}

#[derive(Debug, Deserialize)]
struct Args {
    domain: String,
}

#[async_trait]
impl Tool for DomainServicesTool {
    fn name(&self) -> &str {
        "get_domains_services"
    }

    fn description(&self) -> &str {
        "use this tool to get all available services of the given domain, when you're not sure what services a domain has or which service should be used"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "domain": {
                    "type": "string",
                    "description": "domain in Home Assistant"
                }
            },
            "required": ["domain"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> ToolResult {
        let args: Args = match parse_arguments(self.name(), arguments) {
            Ok(args) => args,
            Err(rejected) => return rejected,
        };

        match self.gateway.list_services(&args.domain).await {
            Ok(services) if services.is_empty() => {
                ToolResult::ok(format!("Domain {} has no services", args.domain))
            }
            Ok(services) => match serde_json::to_string(&services) {
                Ok(json) => ToolResult::ok(json),
                Err(e) => ToolResult::dispatch(e.to_string()),
            },
            Err(e) => ToolResult::dispatch(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::gateway;

    #[tokio::test]
    async fn returns_service_names() {
        let (gateway, _) = gateway();
        let tool = DomainServicesTool::new(gateway);
        let result = tool.execute(serde_json::json!({"domain": "Light"})).await;
        let parsed: serde_json::Value = serde_json::from_str(&result.to_observation()).unwrap();
        assert!(parsed.get("turn_on").is_some());
        assert!(parsed.get("turn_off").is_some());
    }

    #[tokio::test]
    async fn unknown_domain() {
        let (gateway, _) = gateway();
        let tool = DomainServicesTool::new(gateway);
        let result = tool.execute(serde_json::json!({"domain": "vacuum"})).await;
        assert_eq!(result, ToolResult::ok("Domain vacuum has no services"));
    }

    #[tokio::test]
    async fn missing_domain_is_validation_error() {
        let (gateway, _) = gateway();
        let tool = DomainServicesTool::new(gateway);
        let result = tool.execute(serde_json::json!({})).await;
        assert_eq!(result.kind(), "validation_error");
    }
}
