//! Provider construction from configuration.
//!
//! Every supported vendor speaks the OpenAI chat-completions dialect, so
//! the router only resolves presets (endpoint, model, sampling defaults)
//! and hands back a ready [`ModelBinding`].

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use hassist_config::{AppConfig, ProviderKind};
use hassist_core::error::ProviderError;
use hassist_core::provider::{ModelFamily, Provider};
use crate::openai_compat::OpenAiCompatProvider;

/// A configured provider plus the request parameters the agent sends it.
#[derive(Clone)]
pub struct ModelBinding {
    pub provider: Arc<dyn Provider>,
    pub family: ModelFamily,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub timeout: Duration,
}

impl std::fmt::Debug for ModelBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBinding")
            .field("provider", &self.provider.name())
            .field("family", &self.family)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("top_p", &self.top_p)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Build the provider described by `config.model`.
pub fn build_from_config(config: &AppConfig) -> Result<ModelBinding, ProviderError> {
    let model = &config.model;

    let base_url = model.base_url().ok_or_else(|| {
        ProviderError::NotConfigured(format!("{} provider needs model.base_url", model.provider))
    })?;

    let api_key = match (model.provider, model.api_key.clone()) {
        (_, Some(key)) => key,
        // Self-hosted compatible endpoints often run without auth
        (ProviderKind::Custom, None) => String::new(),
        (kind, None) => {
            return Err(ProviderError::NotConfigured(format!(
                "no API key for {kind}; set model.api_key or HASSIST_API_KEY"
            )));
        }
    };

    let timeout = Duration::from_secs(model.timeout_secs);
    let provider = OpenAiCompatProvider::with_timeout(
        model.provider.to_string(),
        base_url,
        api_key,
        timeout,
    );
    debug!(
        provider = provider.name(),
        endpoint = provider.base_url(),
        family = ?model.family(),
        "Model provider configured"
    );

    Ok(ModelBinding {
        provider: Arc::new(provider),
        family: model.family(),
        model: model.model_name(),
        temperature: model.temperature,
        max_tokens: Some(model.max_tokens),
        top_p: model.top_p(),
        timeout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_preset() {
        let mut config = AppConfig::default();
        config.model.api_key = Some("sk-test".into());
        let binding = build_from_config(&config).unwrap();
        assert_eq!(binding.provider.name(), "openai");
        assert_eq!(binding.family, ModelFamily::ToolCalling);
        assert_eq!(binding.model, "gpt-3.5-turbo");
        assert_eq!(binding.max_tokens, Some(150));
        assert_eq!(binding.top_p, None);
    }

    #[test]
    fn tongyi_preset() {
        let mut config = AppConfig::default();
        config.model.provider = ProviderKind::Tongyi;
        config.model.api_key = Some("sk-test".into());
        let binding = build_from_config(&config).unwrap();
        assert_eq!(binding.provider.name(), "tongyi");
        assert_eq!(binding.family, ModelFamily::StructuredChat);
        assert_eq!(binding.model, "qwen-plus");
        assert_eq!(binding.top_p, Some(0.8));
    }

    #[test]
    fn missing_key_is_not_configured() {
        let config = AppConfig::default();
        let err = build_from_config(&config).unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[test]
    fn custom_endpoint_without_key() {
        let mut config = AppConfig::default();
        config.model.provider = ProviderKind::Custom;
        config.model.base_url = Some("http://localhost:11434/v1".into());
        let binding = build_from_config(&config).unwrap();
        assert_eq!(binding.provider.name(), "custom");
    }

    #[test]
    fn custom_endpoint_requires_base_url() {
        let mut config = AppConfig::default();
        config.model.provider = ProviderKind::Custom;
        assert!(build_from_config(&config).is_err());
    }
}
