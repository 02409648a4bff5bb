//! Platform trait: the boundary to the host automation platform.
//!
//! The platform owns the entity/device/area registries, the live state
//! store, the exposure settings and the service dispatcher. hassist only
//! queries and calls it; every rule about what the conversational surface
//! may touch is enforced on top of this trait by the capability gateway.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::PlatformError;
use crate::store::DocumentKind;

/// Sentinel area name for entities without a resolvable area.
pub const UNKNOWN_AREA: &str = "UNKNOWN";

/// Current state of one entity, as held by the platform state store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    /// `domain.object_id`
    pub entity_id: String,
    /// Friendly name
    #[serde(default)]
    pub name: String,
    /// Current state value ("on", "off", "21.5", ...)
    pub state: String,
}

impl EntityState {
    pub fn domain(&self) -> &str {
        domain_of(&self.entity_id)
    }
}

/// An entity-registry entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityEntry {
    pub entity_id: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub area_id: Option<String>,
    #[serde(default)]
    pub device_id: Option<String>,
}

/// A device-registry entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub area_id: Option<String>,
}

/// An area-registry entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Description of one service offered by a domain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceSchema {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Field name -> field description/selector, passed through verbatim.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// A validated request to run a platform service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInvocation {
    pub domain: String,
    pub service: String,
    /// May contain `entity_id` (string or list), `area_id`, `device_id`
    /// and any service-specific parameters.
    #[serde(default)]
    pub service_data: serde_json::Map<String, serde_json::Value>,
}

/// An entity the conversational surface is allowed to see.
///
/// Derived fresh on every query; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposedEntity {
    pub entity_id: String,
    pub domain: String,
    pub display_name: String,
    pub current_state: String,
    pub aliases: Vec<String>,
    pub area_id: Option<String>,
    pub area_name: String,
    pub area_aliases: Vec<String>,
}

/// An area that contains at least one exposed entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposedArea {
    pub area_id: String,
    pub name: String,
    pub aliases: Vec<String>,
}

/// The domain part of an entity id (`light` for `light.kitchen`).
pub fn domain_of(entity_id: &str) -> &str {
    entity_id.split_once('.').map(|(d, _)| d).unwrap_or(entity_id)
}

/// The host automation platform.
#[async_trait]
pub trait Platform: Send + Sync {
    /// All current entity states.
    async fn states(&self) -> Result<Vec<EntityState>, PlatformError>;

    /// Current state of one entity.
    async fn state(&self, entity_id: &str) -> Result<Option<EntityState>, PlatformError> {
        Ok(self
            .states()
            .await?
            .into_iter()
            .find(|s| s.entity_id == entity_id))
    }

    async fn entity_entry(&self, entity_id: &str) -> Result<Option<EntityEntry>, PlatformError>;

    async fn device_entry(&self, device_id: &str) -> Result<Option<DeviceEntry>, PlatformError>;

    async fn area_entry(&self, area_id: &str) -> Result<Option<AreaEntry>, PlatformError>;

    /// The platform's per-entity exposure flag for the conversation surface.
    async fn is_exposed(&self, entity_id: &str) -> Result<bool, PlatformError>;

    async fn has_service(&self, domain: &str, service: &str) -> Result<bool, PlatformError>;

    /// Services offered by `domain`, keyed by service name.
    async fn services(&self, domain: &str) -> Result<BTreeMap<String, ServiceSchema>, PlatformError>;

    /// Dispatch a service call.
    async fn call_service(&self, invocation: &ServiceInvocation) -> Result<(), PlatformError>;

    /// Reload the automation/script/scene subsystem of `domain`.
    async fn reload(&self, domain: &str) -> Result<(), PlatformError>;

    /// Validate a document against the platform's own schema for `kind`.
    ///
    /// The default accepts everything; structural checks are applied by the
    /// capability gateway regardless.
    async fn validate_config(
        &self,
        _kind: DocumentKind,
        _document: &serde_yaml::Value,
    ) -> Result<(), PlatformError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_of_entity_id() {
        assert_eq!(domain_of("light.kitchen"), "light");
        assert_eq!(domain_of("sensor.outdoor.temp"), "sensor");
        assert_eq!(domain_of("nodot"), "nodot");
    }

    #[test]
    fn entity_entry_defaults() {
        let entry: EntityEntry =
            serde_json::from_value(serde_json::json!({"entity_id": "light.kitchen"})).unwrap();
        assert!(entry.aliases.is_empty());
        assert!(entry.area_id.is_none());
        assert!(entry.device_id.is_none());
    }
}
