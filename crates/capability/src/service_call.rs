//! Service calls: validated dispatch of platform services.
//!
//! Checks run in a fixed order, each with its own message:
//! 1. the service exists
//! 2. every referenced entity/area/device id resolves
//! 3. every referenced entity is exposed
//! 4. at least one target id is present
//!
//! Only then is the call dispatched. Platform failures are returned as
//! text, never raised.

use std::collections::BTreeMap;

use chrono::Utc;
use hassist_core::error::PlatformError;
use hassist_core::event::DomainEvent;
use hassist_core::platform::{ServiceInvocation, ServiceSchema};
use hassist_core::tool::ToolResult;
use serde_json::{Map, Value};
use tracing::{info, warn};
use crate::{CapabilityGateway, Rejection};

impl CapabilityGateway {
    /// Validate and dispatch `domain.service` with `service_data`.
    pub async fn call_service(
        &self,
        domain: &str,
        service: &str,
        service_data: Map<String, Value>,
    ) -> ToolResult {
        // Domains are registered lowercase
        let domain = domain.to_lowercase();
        let domain = domain.as_str();
        let invocation = ServiceInvocation {
            domain: domain.to_string(),
            service: service.to_string(),
            service_data,
        };

        if let Err(rejection) = self.check_invocation(&invocation).await {
            warn!(domain, service, ?rejection, "Service call rejected");
            return rejection.into();
        }

        let result = self.platform.call_service(&invocation).await;
        self.publish(DomainEvent::ServiceDispatched {
            domain: domain.to_string(),
            service: service.to_string(),
            success: result.is_ok(),
            timestamp: Utc::now(),
        });

        match result {
            Ok(()) => {
                info!(domain, service, "Service called");
                ToolResult::ok(format!("Service {domain}.{service} called successfully"))
            }
            Err(e) => {
                warn!(domain, service, error = %e, "Service dispatch failed");
                ToolResult::dispatch(e.to_string())
            }
        }
    }

    /// Services offered by `domain` (case-insensitive).
    pub async fn list_services(
        &self,
        domain: &str,
    ) -> Result<BTreeMap<String, ServiceSchema>, PlatformError> {
        self.platform.services(&domain.to_lowercase()).await
    }

    async fn check_invocation(&self, invocation: &ServiceInvocation) -> Result<(), Rejection> {
        let (domain, service) = (&invocation.domain, &invocation.service);
        if !self.platform.has_service(domain, service).await? {
            return Err(Rejection::Invalid(format!(
                "Service {domain}.{service} does not exist"
            )));
        }

        let data = &invocation.service_data;
        let entity_ids = target_ids(data, "entity_id")?;
        let area_ids = target_ids(data, "area_id")?;
        let device_ids = target_ids(data, "device_id")?;

        for id in &entity_ids {
            if !self.entity_resolves(id).await? {
                return Err(Rejection::Invalid(format!("Unknown entity_id: {id}")));
            }
        }
        for id in &area_ids {
            if self.platform.area_entry(id).await?.is_none() {
                return Err(Rejection::Invalid(format!("Unknown area_id: {id}")));
            }
        }
        for id in &device_ids {
            if self.platform.device_entry(id).await?.is_none() {
                return Err(Rejection::Invalid(format!("Unknown device_id: {id}")));
            }
        }

        for id in &entity_ids {
            if !self.is_entity_exposed(id).await? {
                return Err(Rejection::Invalid(format!("Unexposed entity_id: {id}")));
            }
        }

        if entity_ids.is_empty() && area_ids.is_empty() && device_ids.is_empty() {
            return Err(Rejection::Invalid(
                "service_data must contain at least one of entity_id, area_id, device_id".into(),
            ));
        }

        Ok(())
    }

    /// Check that `entity_id` names a real, exposed entity.
    pub(crate) async fn check_entity(&self, entity_id: &str) -> Result<(), Rejection> {
        if !self.entity_resolves(entity_id).await? {
            return Err(Rejection::Invalid(format!("Unknown entity_id: {entity_id}")));
        }
        if !self.is_entity_exposed(entity_id).await? {
            return Err(Rejection::Invalid(format!("Unexposed entity_id: {entity_id}")));
        }
        Ok(())
    }
}

/// Ids under `key`: absent, a string, or a list of strings.
fn target_ids(data: &Map<String, Value>, key: &str) -> Result<Vec<String>, Rejection> {
    match data.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(id)) if id.is_empty() => Ok(Vec::new()),
        Some(Value::String(id)) => Ok(vec![id.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(id) => Ok(id.clone()),
                other => Err(Rejection::Invalid(format!(
                    "{key} entries must be strings, got {other}"
                ))),
            })
            .collect(),
        Some(other) => Err(Rejection::Invalid(format!(
            "{key} must be a string or a list of strings, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{fixture, home};
    use serde_json::json;

    fn data(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn dispatches_valid_call_once() {
        let f = fixture(home());
        let result = f
            .gateway
            .call_service("light", "turn_on", data(json!({"entity_id": "light.kitchen"})))
            .await;
        assert!(result.is_ok(), "{result:?}");

        let dispatched = f.platform.dispatched().await;
        assert_eq!(dispatched.len(), 1);
        assert_eq!(dispatched[0].domain, "light");
        assert_eq!(dispatched[0].service, "turn_on");
        assert_eq!(dispatched[0].service_data, data(json!({"entity_id": "light.kitchen"})));
    }

    #[tokio::test]
    async fn unknown_entity_is_rejected_without_dispatch() {
        let f = fixture(home());
        let result = f
            .gateway
            .call_service("light", "turn_on", data(json!({"entity_id": "light.unknown"})))
            .await;
        assert_eq!(result.kind(), "validation_error");
        assert!(result.to_observation().contains("Unknown entity_id"));
        assert!(result.to_observation().contains("light.unknown"));
        assert!(f.platform.dispatched().await.is_empty());
    }

    #[tokio::test]
    async fn missing_service_is_checked_first() {
        let f = fixture(home());
        let result = f
            .gateway
            .call_service("light", "explode", data(json!({"entity_id": "light.unknown"})))
            .await;
        assert_eq!(
            result,
            ToolResult::validation("Service light.explode does not exist")
        );
    }

    #[tokio::test]
    async fn unknown_area_and_device_are_named() {
        let f = fixture(home());
        let area = f
            .gateway
            .call_service("light", "turn_on", data(json!({"area_id": "attic"})))
            .await;
        assert_eq!(area, ToolResult::validation("Unknown area_id: attic"));

        let device = f
            .gateway
            .call_service("fan", "turn_on", data(json!({"device_id": ["dev_fan", "dev_x"]})))
            .await;
        assert_eq!(device, ToolResult::validation("Unknown device_id: dev_x"));
        assert!(f.platform.dispatched().await.is_empty());
    }

    #[tokio::test]
    async fn unexposed_entities_are_refused() {
        let f = fixture(home().with_service("sensor", "update"));
        let hidden = f
            .gateway
            .call_service("sensor", "update", data(json!({"entity_id": "sensor.temp"})))
            .await;
        assert_eq!(hidden, ToolResult::validation("Unexposed entity_id: sensor.temp"));

        let locks = f
            .gateway
            .call_service(
                "light",
                "turn_off",
                data(json!({"entity_id": ["light.kitchen", "group.all_locks"]})),
            )
            .await;
        assert_eq!(locks, ToolResult::validation("Unexposed entity_id: group.all_locks"));
        assert!(f.platform.dispatched().await.is_empty());
    }

    #[tokio::test]
    async fn call_without_targets_is_rejected() {
        let f = fixture(home());
        for payload in [json!({}), json!({"brightness_pct": 50}), json!({"entity_id": []})] {
            let result = f.gateway.call_service("light", "turn_on", data(payload)).await;
            assert_eq!(result.kind(), "validation_error");
            assert!(result.to_observation().contains("at least one of"));
        }
        assert!(f.platform.dispatched().await.is_empty());
    }

    #[tokio::test]
    async fn malformed_id_types_are_rejected() {
        let f = fixture(home());
        let result = f
            .gateway
            .call_service("light", "turn_on", data(json!({"entity_id": 42})))
            .await;
        assert_eq!(result.kind(), "validation_error");
        let result = f
            .gateway
            .call_service("light", "turn_on", data(json!({"entity_id": ["light.kitchen", 7]})))
            .await;
        assert_eq!(result.kind(), "validation_error");
    }

    #[tokio::test]
    async fn area_targets_dispatch() {
        let f = fixture(home());
        let result = f
            .gateway
            .call_service("light", "turn_off", data(json!({"area_id": "kitchen"})))
            .await;
        assert!(result.is_ok());
        assert_eq!(f.platform.dispatched().await.len(), 1);
    }

    #[tokio::test]
    async fn platform_failure_becomes_dispatch_error() {
        let f = fixture(home().fail_service("light", "turn_on", "device offline"));
        let result = f
            .gateway
            .call_service("light", "turn_on", data(json!({"entity_id": "light.kitchen"})))
            .await;
        assert_eq!(result.kind(), "dispatch_error");
        assert!(result.to_observation().starts_with("Error:"));
        assert!(result.to_observation().contains("device offline"));
    }

    #[tokio::test]
    async fn call_domain_is_case_insensitive() {
        let f = fixture(home());
        let result = f
            .gateway
            .call_service("Light", "turn_on", data(json!({"entity_id": "light.kitchen"})))
            .await;
        assert_eq!(result, ToolResult::ok("Service light.turn_on called successfully"));

        let dispatched = f.platform.dispatched().await;
        assert_eq!(dispatched.len(), 1);
        assert_eq!(dispatched[0].domain, "light");
    }

    #[tokio::test]
    async fn services_lookup_is_case_insensitive() {
        let f = fixture(home());
        let services = f.gateway.list_services("LIGHT").await.unwrap();
        assert_eq!(
            services.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["turn_off", "turn_on"]
        );
        assert!(f.gateway.list_services("vacuum").await.unwrap().is_empty());
    }
}
