//! `hassist services`: Print the services a domain offers.

use std::path::Path;
use std::sync::Arc;

use hassist_core::event::EventBus;

pub async fn run(config_path: Option<&Path>, domain: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let gateway =
        hassist_gateway::runtime::capability_gateway(&config, Arc::new(EventBus::default())).await?;

    let services = gateway.list_services(domain).await?;
    if services.is_empty() {
        eprintln!("Domain {domain} has no services");
        return Ok(());
    }
    println!("{}", serde_json::to_string_pretty(&services)?);

    Ok(())
}
