//! Snapshot platform: an in-process `Platform` loaded from a YAML file.
//!
//! Holds registries, states, services and exposure flags in memory,
//! records every dispatched service call and reload, and applies the
//! obvious state changes for `turn_on`, `turn_off` and `toggle`.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use async_trait::async_trait;
use hassist_core::error::PlatformError;
use hassist_core::platform::{
    AreaEntry, DeviceEntry, EntityEntry, EntityState, Platform, ServiceInvocation, ServiceSchema,
};
use hassist_core::store::DocumentKind;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Serialized form of a platform snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub states: Vec<EntityState>,
    #[serde(default)]
    pub entities: Vec<EntityEntry>,
    #[serde(default)]
    pub devices: Vec<DeviceEntry>,
    #[serde(default)]
    pub areas: Vec<AreaEntry>,
    /// domain -> service -> schema
    #[serde(default)]
    pub services: BTreeMap<String, BTreeMap<String, ServiceSchema>>,
    /// Per-entity exposure flags.
    #[serde(default)]
    pub exposed: BTreeMap<String, bool>,
    /// Exposure of entities missing from `exposed`.
    #[serde(default)]
    pub expose_by_default: bool,
}

pub struct SnapshotPlatform {
    snapshot: RwLock<Snapshot>,
    dispatched: Mutex<Vec<ServiceInvocation>>,
    reloads: Mutex<Vec<String>>,
    failing_services: HashMap<(String, String), String>,
    rejected_configs: HashMap<DocumentKind, String>,
}

impl SnapshotPlatform {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
            dispatched: Mutex::new(Vec::new()),
            reloads: Mutex::new(Vec::new()),
            failing_services: HashMap::new(),
            rejected_configs: HashMap::new(),
        }
    }

    /// An empty home.
    pub fn empty() -> Self {
        Self::new(Snapshot::default())
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, PlatformError> {
        let snapshot: Snapshot = serde_yaml::from_str(content)
            .map_err(|e| PlatformError::Unavailable(format!("Invalid snapshot: {e}")))?;
        Ok(Self::new(snapshot))
    }

    /// Load a snapshot file.
    pub async fn load(path: &Path) -> Result<Self, PlatformError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            PlatformError::Unavailable(format!("Failed to read snapshot {}: {e}", path.display()))
        })?;
        let platform = Self::from_yaml_str(&content)?;
        {
            let snapshot = platform.snapshot.read().await;
            info!(
                path = %path.display(),
                states = snapshot.states.len(),
                areas = snapshot.areas.len(),
                "Platform snapshot loaded"
            );
        }
        Ok(platform)
    }

    // --- Builder helpers ---

    pub fn with_area(mut self, id: &str, name: &str, aliases: &[&str]) -> Self {
        self.snapshot.get_mut().areas.push(AreaEntry {
            id: id.into(),
            name: name.into(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        });
        self
    }

    pub fn with_device(mut self, id: &str, name: &str, area_id: Option<&str>) -> Self {
        self.snapshot.get_mut().devices.push(DeviceEntry {
            id: id.into(),
            name: name.into(),
            area_id: area_id.map(String::from),
        });
        self
    }

    /// Add an entity with a registry entry, a state and an exposure flag.
    pub fn with_entity(
        mut self,
        entity_id: &str,
        name: &str,
        state: &str,
        area_id: Option<&str>,
        exposed: bool,
    ) -> Self {
        let snapshot = self.snapshot.get_mut();
        snapshot.entities.push(EntityEntry {
            entity_id: entity_id.into(),
            aliases: Vec::new(),
            area_id: area_id.map(String::from),
            device_id: None,
        });
        snapshot.states.push(EntityState {
            entity_id: entity_id.into(),
            name: name.into(),
            state: state.into(),
        });
        snapshot.exposed.insert(entity_id.into(), exposed);
        self
    }

    /// Replace (or add) the registry entry of an entity.
    pub fn with_entity_entry(mut self, entry: EntityEntry) -> Self {
        let entities = &mut self.snapshot.get_mut().entities;
        entities.retain(|e| e.entity_id != entry.entity_id);
        entities.push(entry);
        self
    }

    pub fn with_service(mut self, domain: &str, service: &str) -> Self {
        self.snapshot
            .get_mut()
            .services
            .entry(domain.into())
            .or_default()
            .insert(service.into(), ServiceSchema::default());
        self
    }

    /// Make dispatches of `domain.service` fail with `reason`.
    pub fn fail_service(mut self, domain: &str, service: &str, reason: &str) -> Self {
        self.failing_services
            .insert((domain.into(), service.into()), reason.into());
        self
    }

    /// Make `validate_config` reject every `kind` document with `reason`.
    pub fn reject_config(mut self, kind: DocumentKind, reason: &str) -> Self {
        self.rejected_configs.insert(kind, reason.into());
        self
    }

    // --- Recorded activity ---

    pub async fn dispatched(&self) -> Vec<ServiceInvocation> {
        self.dispatched.lock().await.clone()
    }

    pub async fn reloads(&self) -> Vec<String> {
        self.reloads.lock().await.clone()
    }

    fn target_ids(data: &serde_json::Map<String, serde_json::Value>) -> Vec<String> {
        match data.get("entity_id") {
            Some(serde_json::Value::String(id)) => vec![id.clone()],
            Some(serde_json::Value::Array(ids)) => ids
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[async_trait]
impl Platform for SnapshotPlatform {
    async fn states(&self) -> Result<Vec<EntityState>, PlatformError> {
        Ok(self.snapshot.read().await.states.clone())
    }

    async fn entity_entry(&self, entity_id: &str) -> Result<Option<EntityEntry>, PlatformError> {
        let snapshot = self.snapshot.read().await;
        Ok(snapshot
            .entities
            .iter()
            .find(|e| e.entity_id == entity_id)
            .cloned())
    }

    async fn device_entry(&self, device_id: &str) -> Result<Option<DeviceEntry>, PlatformError> {
        let snapshot = self.snapshot.read().await;
        Ok(snapshot.devices.iter().find(|d| d.id == device_id).cloned())
    }

    async fn area_entry(&self, area_id: &str) -> Result<Option<AreaEntry>, PlatformError> {
        let snapshot = self.snapshot.read().await;
        Ok(snapshot.areas.iter().find(|a| a.id == area_id).cloned())
    }

    async fn is_exposed(&self, entity_id: &str) -> Result<bool, PlatformError> {
        let snapshot = self.snapshot.read().await;
        Ok(snapshot
            .exposed
            .get(entity_id)
            .copied()
            .unwrap_or(snapshot.expose_by_default))
    }

    async fn has_service(&self, domain: &str, service: &str) -> Result<bool, PlatformError> {
        let snapshot = self.snapshot.read().await;
        Ok(snapshot
            .services
            .get(domain)
            .is_some_and(|s| s.contains_key(service)))
    }

    async fn services(&self, domain: &str) -> Result<BTreeMap<String, ServiceSchema>, PlatformError> {
        let snapshot = self.snapshot.read().await;
        Ok(snapshot.services.get(domain).cloned().unwrap_or_default())
    }

    async fn call_service(&self, invocation: &ServiceInvocation) -> Result<(), PlatformError> {
        let key = (invocation.domain.clone(), invocation.service.clone());
        if let Some(reason) = self.failing_services.get(&key) {
            return Err(PlatformError::ServiceFailed {
                domain: invocation.domain.clone(),
                service: invocation.service.clone(),
                reason: reason.clone(),
            });
        }

        self.dispatched.lock().await.push(invocation.clone());

        let targets = Self::target_ids(&invocation.service_data);
        let mut snapshot = self.snapshot.write().await;
        for state in snapshot
            .states
            .iter_mut()
            .filter(|s| targets.contains(&s.entity_id))
        {
            let next = match (invocation.service.as_str(), state.state.as_str()) {
                ("turn_on", _) | ("toggle", "off") => "on",
                ("turn_off", _) | ("toggle", "on") => "off",
                _ => continue,
            };
            state.state = next.into();
        }

        debug!(domain = %invocation.domain, service = %invocation.service, "Service dispatched");
        Ok(())
    }

    async fn reload(&self, domain: &str) -> Result<(), PlatformError> {
        self.reloads.lock().await.push(domain.to_string());
        Ok(())
    }

    async fn validate_config(
        &self,
        kind: DocumentKind,
        _document: &serde_yaml::Value,
    ) -> Result<(), PlatformError> {
        match self.rejected_configs.get(&kind) {
            Some(reason) => Err(PlatformError::InvalidConfig {
                kind: kind.to_string(),
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}
