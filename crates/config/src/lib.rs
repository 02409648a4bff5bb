//! Configuration loading, validation, and management for hassist.
//!
//! Loads configuration from `~/.hassist/config.toml` with environment
//! variable overrides. Validates all settings at startup.

pub mod prompts;

use hassist_core::ModelFamily;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use prompts::{DEFAULT_HUMAN_PROMPT, DEFAULT_PLATFORM_NAME, DEFAULT_SYSTEM_PROMPT};

/// The root configuration structure.
///
/// Maps directly to `~/.hassist/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Language model backend
    #[serde(default)]
    pub model: ModelConfig,

    /// Agent loop and prompt settings
    #[serde(default)]
    pub agent: AgentConfig,

    /// Host platform settings
    #[serde(default)]
    pub platform: PlatformConfig,

    /// HTTP front door
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Known OpenAI-compatible vendors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    /// Alibaba DashScope (Qwen) through its OpenAI-compatible mode
    Tongyi,
    /// Any other OpenAI-compatible endpoint; `base_url` is required
    Custom,
}

impl ProviderKind {
    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi | Self::Custom => "gpt-3.5-turbo",
            Self::Tongyi => "qwen-plus",
        }
    }

    pub fn default_base_url(self) -> Option<&'static str> {
        match self {
            Self::OpenAi => Some("https://api.openai.com/v1"),
            Self::Tongyi => Some("https://dashscope.aliyuncs.com/compatible-mode/v1"),
            Self::Custom => None,
        }
    }

    pub fn default_family(self) -> ModelFamily {
        match self {
            Self::Tongyi => ModelFamily::StructuredChat,
            Self::OpenAi | Self::Custom => ModelFamily::ToolCalling,
        }
    }

    pub fn default_top_p(self) -> Option<f32> {
        match self {
            Self::Tongyi => Some(0.8),
            Self::OpenAi | Self::Custom => None,
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi => write!(f, "openai"),
            Self::Tongyi => write!(f, "tongyi"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub provider: ProviderKind,

    /// Action protocol; defaults per provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<ModelFamily>,

    /// Model name; defaults per provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Endpoint base URL; defaults per provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Nucleus sampling; defaults per provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Per model call
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,
}

fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    150
}
fn default_model_timeout() -> u64 {
    60
}

impl ModelConfig {
    pub fn family(&self) -> ModelFamily {
        self.family.unwrap_or_else(|| self.provider.default_family())
    }

    pub fn model_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.provider.default_model().to_string())
    }

    pub fn base_url(&self) -> Option<String> {
        self.base_url
            .clone()
            .or_else(|| self.provider.default_base_url().map(String::from))
    }

    pub fn top_p(&self) -> Option<f32> {
        self.top_p.or_else(|| self.provider.default_top_p())
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            family: None,
            name: None,
            api_key: None,
            base_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: None,
            timeout_secs: default_model_timeout(),
        }
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("provider", &self.provider)
            .field("family", &self.family)
            .field("name", &self.name)
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("top_p", &self.top_p)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Tool-call / retry cycles per turn
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Exchanges kept in conversation memory
    #[serde(default = "default_memory_window")]
    pub memory_window: usize,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    #[serde(default = "default_human_prompt")]
    pub human_prompt: String,

    #[serde(default = "default_platform_name")]
    pub platform_name: String,

    /// Per tool execution (platform dispatch included)
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_secs: u64,
}

fn default_max_iterations() -> u32 {
    5
}
fn default_memory_window() -> usize {
    5
}
fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.into()
}
fn default_human_prompt() -> String {
    DEFAULT_HUMAN_PROMPT.into()
}
fn default_platform_name() -> String {
    DEFAULT_PLATFORM_NAME.into()
}
fn default_tool_timeout() -> u64 {
    30
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            memory_window: default_memory_window(),
            system_prompt: default_system_prompt(),
            human_prompt: default_human_prompt(),
            platform_name: default_platform_name(),
            tool_timeout_secs: default_tool_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// YAML snapshot of states, registries, services and exposure settings
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,

    /// Directory holding automations.yaml, scripts.yaml and scenes.yaml
    #[serde(default = "default_config_dir")]
    pub config_dir: PathBuf,
}

fn default_snapshot_path() -> PathBuf {
    AppConfig::config_dir().join("snapshot.yaml")
}
fn default_config_dir() -> PathBuf {
    AppConfig::config_dir().join("platform")
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            config_dir: default_config_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Live conversations kept before the least recently used is dropped
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_port() -> u16 {
    8124
}
fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_max_sessions() -> usize {
    1_000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.hassist/config.toml).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(None)
    }

    /// Load configuration from `path` (or the default path) and apply
    /// environment overrides:
    /// - `HASSIST_API_KEY`, then `OPENAI_API_KEY` / `DASHSCOPE_API_KEY`
    ///   (only when the file has no key)
    /// - `HASSIST_MODEL`
    /// - `HASSIST_BASE_URL`
    pub fn load_with(path: Option<&Path>) -> Result<Self, ConfigError> {
        let default_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(path.unwrap_or(&default_path))?;

        if config.model.api_key.is_none() {
            let vendor_var = match config.model.provider {
                ProviderKind::Tongyi => "DASHSCOPE_API_KEY",
                ProviderKind::OpenAi | ProviderKind::Custom => "OPENAI_API_KEY",
            };
            config.model.api_key = std::env::var("HASSIST_API_KEY")
                .ok()
                .or_else(|| std::env::var(vendor_var).ok());
        }

        if let Ok(model) = std::env::var("HASSIST_MODEL") {
            config.model.name = Some(model);
        }

        if let Ok(url) = std::env::var("HASSIST_BASE_URL") {
            config.model.base_url = Some(url);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".hassist")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ConfigError::ValidationError(
                "model.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if let Some(top_p) = self.model.top_p {
            if top_p <= 0.0 || top_p > 1.0 {
                return Err(ConfigError::ValidationError(
                    "model.top_p must be in (0.0, 1.0]".into(),
                ));
            }
        }

        if self.model.provider == ProviderKind::Custom && self.model.base_url.is_none() {
            return Err(ConfigError::ValidationError(
                "model.base_url is required when model.provider = \"custom\"".into(),
            ));
        }

        if self.model.timeout_secs == 0 || self.agent.tool_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "timeouts must be at least one second".into(),
            ));
        }

        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }

        if self.gateway.max_sessions == 0 {
            return Err(ConfigError::ValidationError(
                "gateway.max_sessions must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.model.api_key.is_some()
    }

    /// Generate a default config TOML string (for `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.model.provider, ProviderKind::OpenAi);
        assert_eq!(config.agent.max_iterations, 5);
        assert_eq!(config.agent.memory_window, 5);
        assert_eq!(config.gateway.port, 8124);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model.provider, config.model.provider);
        assert_eq!(parsed.agent.system_prompt, config.agent.system_prompt);
        assert_eq!(parsed.gateway.port, config.gateway.port);
    }

    #[test]
    fn provider_presets_fill_defaults() {
        let tongyi = ModelConfig {
            provider: ProviderKind::Tongyi,
            ..ModelConfig::default()
        };
        assert_eq!(tongyi.model_name(), "qwen-plus");
        assert_eq!(tongyi.family(), ModelFamily::StructuredChat);
        assert_eq!(tongyi.top_p(), Some(0.8));
        assert!(tongyi.base_url().unwrap().contains("dashscope"));

        let openai = ModelConfig::default();
        assert_eq!(openai.model_name(), "gpt-3.5-turbo");
        assert_eq!(openai.family(), ModelFamily::ToolCalling);
        assert_eq!(openai.top_p(), None);
    }

    #[test]
    fn explicit_values_override_presets() {
        let config: AppConfig = toml::from_str(
            r#"
            [model]
            provider = "tongyi"
            family = "tool_calling"
            name = "qwen-max"
            top_p = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(config.model.family(), ModelFamily::ToolCalling);
        assert_eq!(config.model.model_name(), "qwen-max");
        assert_eq!(config.model.top_p(), Some(0.5));
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.model.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn invalid_top_p_rejected() {
        let mut config = AppConfig::default();
        config.model.top_p = Some(0.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_iterations_rejected() {
        let mut config = AppConfig::default();
        config.agent.max_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn custom_provider_requires_base_url() {
        let mut config = AppConfig::default();
        config.model.provider = ProviderKind::Custom;
        assert!(config.validate().is_err());
        config.model.base_url = Some("http://localhost:11434/v1".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.agent.max_iterations, 5);
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[agent]\nmax_iterations = 3\nmemory_window = 2\n\n[gateway]\nport = 9000\n",
        )
        .unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.agent.max_iterations, 3);
        assert_eq!(config.agent.memory_window, 2);
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.agent.platform_name, "Home Assistant");
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[agent\nmax_iterations = ").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn debug_redacts_api_key() {
        let mut config = AppConfig::default();
        config.model.api_key = Some("sk-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("[agent]"));
        assert!(toml_str.contains("max_iterations"));
    }
}
