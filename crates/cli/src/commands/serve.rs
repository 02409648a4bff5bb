//! `hassist serve`: Start the HTTP front door.

use std::path::Path;

pub async fn run(config_path: Option<&Path>, port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path)?;

    if let Some(port) = port {
        config.gateway.port = port;
    }

    println!("hassist gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Model:     {} ({})", config.model.model_name(), config.model.family());

    hassist_gateway::start(config).await?;

    Ok(())
}
