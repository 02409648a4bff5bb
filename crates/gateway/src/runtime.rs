//! Wiring of the running system from configuration.
//!
//! Shared by the HTTP server and the CLI: every subsystem is built once and
//! handed around behind `Arc`.

use std::sync::Arc;

use hassist_agent::{AgentExecutor, SessionManager};
use hassist_capability::CapabilityGateway;
use hassist_config::AppConfig;
use hassist_core::error::Error;
use hassist_core::event::EventBus;
use hassist_memory::YamlDocumentStore;
use hassist_platform::SnapshotPlatform;
use tracing::info;

/// Load the platform snapshot and open the document store.
pub async fn capability_gateway(
    config: &AppConfig,
    event_bus: Arc<EventBus>,
) -> Result<Arc<CapabilityGateway>, Error> {
    let platform = SnapshotPlatform::load(&config.platform.snapshot_path).await?;
    let store = YamlDocumentStore::new(config.platform.config_dir.clone());
    info!(
        snapshot = %config.platform.snapshot_path.display(),
        documents = %config.platform.config_dir.display(),
        "Platform loaded"
    );
    Ok(Arc::new(
        CapabilityGateway::new(Arc::new(platform), Arc::new(store)).with_event_bus(event_bus),
    ))
}

/// Build the model binding, the executor and the session manager.
pub async fn session_manager(config: &AppConfig) -> Result<Arc<SessionManager>, Error> {
    let event_bus = Arc::new(EventBus::default());
    let gateway = capability_gateway(config, event_bus.clone()).await?;
    let binding = hassist_providers::build_from_config(config)?;
    info!(
        provider = binding.provider.name(),
        model = %binding.model,
        family = %binding.family,
        "Model configured"
    );

    let executor = AgentExecutor::from_config(config, binding, gateway).with_event_bus(event_bus);
    Ok(Arc::new(SessionManager::new(
        Arc::new(executor),
        config.agent.memory_window,
        config.gateway.max_sessions,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hassist_config::ProviderKind;
    use hassist_platform::SAMPLE_SNAPSHOT;

    fn config(dir: &std::path::Path) -> AppConfig {
        let mut config = AppConfig::default();
        config.platform.snapshot_path = dir.join("snapshot.yaml");
        config.platform.config_dir = dir.join("platform");
        config
    }

    #[tokio::test]
    async fn missing_snapshot_is_a_platform_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = capability_gateway(&config(dir.path()), Arc::new(EventBus::default())).await;
        assert!(matches!(result, Err(Error::Platform(_))));
    }

    #[tokio::test]
    async fn builds_from_sample_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("snapshot.yaml"), SAMPLE_SNAPSHOT).unwrap();
        let mut config = config(dir.path());
        config.model.provider = ProviderKind::Custom;
        config.model.base_url = Some("http://localhost:11434/v1".into());

        let sessions = session_manager(&config).await.unwrap();
        assert_eq!(sessions.executor().tools().len(), 6);
        let areas = sessions.executor().gateway().exposed_areas().await.unwrap();
        assert!(areas.iter().any(|a| a.area_id == "kitchen"));
    }

    #[tokio::test]
    async fn missing_api_key_is_a_provider_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("snapshot.yaml"), SAMPLE_SNAPSHOT).unwrap();
        let mut config = config(dir.path());
        config.model.api_key = None;

        let result = session_manager(&config).await;
        assert!(matches!(result, Err(Error::Provider(_))));
    }
}
