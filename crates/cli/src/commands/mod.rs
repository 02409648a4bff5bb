pub mod chat;
pub mod entities;
pub mod init;
pub mod serve;
pub mod services;

use std::path::Path;

use hassist_config::AppConfig;

/// Load configuration from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    AppConfig::load_with(path).map_err(|e| format!("Failed to load config: {e}").into())
}
