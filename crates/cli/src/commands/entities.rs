//! `hassist entities`: Print the exposed entities as CSV.

use std::path::Path;
use std::sync::Arc;

use hassist_core::event::EventBus;

pub async fn run(
    config_path: Option<&Path>,
    area: Option<String>,
    domain: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let gateway =
        hassist_gateway::runtime::capability_gateway(&config, Arc::new(EventBus::default())).await?;

    let csv = gateway
        .exposed_entities_csv(area.as_deref(), domain.as_deref())
        .await?;
    if csv.is_empty() {
        eprintln!("No exposed entities match.");
    } else {
        print!("{csv}");
    }

    Ok(())
}
