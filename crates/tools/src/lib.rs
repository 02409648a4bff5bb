//! The tool catalog for hassist.
//!
//! Each capability-gateway operation is bound to one named tool with a
//! JSON argument schema and a description the model reads. Names and
//! schemas never change during a conversation; a gateway operation that is
//! not registered here is unreachable from the model.

pub mod add_automation;
pub mod add_scene;
pub mod add_script;
pub mod call_service;
pub mod domain_services;
pub mod exposed_entities;

use std::sync::Arc;

use hassist_capability::CapabilityGateway;
use hassist_core::tool::ToolRegistry;

pub use add_automation::AddAutomationTool;
pub use add_scene::AddSceneTool;
pub use add_script::AddScriptTool;
pub use call_service::CallServiceTool;
pub use domain_services::DomainServicesTool;
pub use exposed_entities::ExposedEntitiesTool;

/// Build the full catalog over `gateway`.
pub fn catalog(gateway: Arc<CapabilityGateway>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(ExposedEntitiesTool::new(gateway.clone())));
    registry.register(Box::new(DomainServicesTool::new(gateway.clone())));
    registry.register(Box::new(CallServiceTool::new(gateway.clone())));
    registry.register(Box::new(AddAutomationTool::new(gateway.clone())));
    registry.register(Box::new(AddScriptTool::new(gateway.clone())));
    registry.register(Box::new(AddSceneTool::new(gateway)));
    registry
}
