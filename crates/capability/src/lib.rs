//! The capability gateway: the only path from the conversation layer to
//! the host platform.
//!
//! Every operation either reads platform state or performs a validated
//! mutation. Expected failures (unknown ids, unexposed entities, rejected
//! documents, dispatch failures) come back as [`ToolResult`] values so the
//! model can read them and try again; nothing here panics or propagates
//! them as errors.

pub mod documents;
pub mod exposure;
pub mod schema;
pub mod service_call;

use std::sync::Arc;

use hassist_core::error::PlatformError;
use hassist_core::event::{DomainEvent, EventBus};
use hassist_core::platform::Platform;
use hassist_core::store::DocumentStore;
use hassist_core::tool::ToolResult;
use tokio::sync::Mutex;

pub use exposure::{NEVER_EXPOSED_ENTITIES, areas_csv, entities_csv};

/// Validation and execution of platform operations.
pub struct CapabilityGateway {
    platform: Arc<dyn Platform>,
    store: Arc<dyn DocumentStore>,
    /// Serializes read-modify-write of the automation/script/scene files.
    mutation_lock: Arc<Mutex<()>>,
    event_bus: Option<Arc<EventBus>>,
}

impl CapabilityGateway {
    pub fn new(platform: Arc<dyn Platform>, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            platform,
            store,
            mutation_lock: Arc::new(Mutex::new(())),
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn platform(&self) -> &Arc<dyn Platform> {
        &self.platform
    }

    fn publish(&self, event: DomainEvent) {
        if let Some(bus) = &self.event_bus {
            bus.publish(event);
        }
    }
}

/// Why a request was refused before reaching the platform.
#[derive(Debug)]
pub(crate) enum Rejection {
    /// The request itself is wrong; the detail is shown to the model.
    Invalid(String),
    /// A platform query failed while checking the request.
    Platform(PlatformError),
}

impl From<PlatformError> for Rejection {
    fn from(e: PlatformError) -> Self {
        Self::Platform(e)
    }
}

impl From<Rejection> for ToolResult {
    fn from(r: Rejection) -> Self {
        match r {
            Rejection::Invalid(detail) => ToolResult::validation(detail),
            Rejection::Platform(e) => ToolResult::dispatch(e.to_string()),
        }
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use hassist_memory::InMemoryDocumentStore;
    use hassist_platform::SnapshotPlatform;

    /// Kitchen light (exposed), temperature sensor (hidden), a fan whose
    /// area comes from its device, and the never-exposed lock group.
    pub fn home() -> SnapshotPlatform {
        SnapshotPlatform::empty()
            .with_area("kitchen", "Kitchen", &["cookhouse"])
            .with_area("living_room", "Living Room", &[])
            .with_device("dev_fan", "Ceiling Fan", Some("living_room"))
            .with_entity("light.kitchen", "Kitchen Light", "off", Some("kitchen"), true)
            .with_entity("sensor.temp", "Temperature", "21.5", None, false)
            .with_entity("fan.ceiling", "Ceiling Fan", "off", None, true)
            .with_entity_entry(hassist_core::platform::EntityEntry {
                entity_id: "fan.ceiling".into(),
                aliases: vec!["big fan".into(), "breeze".into()],
                area_id: None,
                device_id: Some("dev_fan".into()),
            })
            .with_entity("group.all_locks", "All Locks", "locked", None, true)
            .with_service("light", "turn_on")
            .with_service("light", "turn_off")
            .with_service("fan", "turn_on")
    }

    pub struct Fixture {
        pub gateway: CapabilityGateway,
        pub platform: Arc<SnapshotPlatform>,
        pub store: Arc<InMemoryDocumentStore>,
    }

    pub fn fixture(platform: SnapshotPlatform) -> Fixture {
        let platform = Arc::new(platform);
        let store = Arc::new(InMemoryDocumentStore::new());
        let gateway = CapabilityGateway::new(platform.clone(), store.clone());
        Fixture {
            gateway,
            platform,
            store,
        }
    }
}
