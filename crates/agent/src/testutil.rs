//! Shared test helpers: a scripted provider and a small home.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hassist_capability::CapabilityGateway;
use hassist_config::{DEFAULT_HUMAN_PROMPT, DEFAULT_PLATFORM_NAME, DEFAULT_SYSTEM_PROMPT};
use hassist_core::error::ProviderError;
use hassist_core::message::{Message, MessageToolCall};
use hassist_core::provider::{ModelFamily, Provider, ProviderRequest, ProviderResponse, Usage};
use hassist_memory::InMemoryDocumentStore;
use hassist_platform::SnapshotPlatform;
use hassist_providers::ModelBinding;

use crate::loop_runner::AgentExecutor;
use crate::prompt::PromptAssembler;
use crate::protocol::Protocol;

/// A provider that replays a queue of responses and records every request.
///
/// Panics when asked for more responses than were scripted.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<ProviderResponse>>,
    requests: Mutex<Vec<ProviderRequest>>,
    fail: Option<ProviderError>,
    hang: bool,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            fail: None,
            hang: false,
        }
    }

    /// One plain-text reply per entry.
    pub fn texts(texts: Vec<String>) -> Self {
        Self::new(texts.iter().map(|t| make_text_response(t)).collect())
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            fail: Some(error),
            ..Self::new(Vec::new())
        }
    }

    /// Never answers.
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.requests.lock().unwrap().push(request);
        if let Some(error) = &self.fail {
            return Err(error.clone());
        }
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(response) => Ok(response),
            None => panic!("ScriptedProvider: no more responses (call #{})", self.call_count()),
        }
    }
}

pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

pub fn make_tool_call_response(tool_calls: Vec<MessageToolCall>, thought: &str) -> ProviderResponse {
    let mut response = make_text_response(thought);
    response.message.tool_calls = tool_calls;
    response
}

pub fn make_tool_call(name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{name}"),
        name: name.to_string(),
        arguments: args.to_string(),
    }
}

/// One exposed kitchen light, one hidden sensor, light services.
pub fn home() -> SnapshotPlatform {
    SnapshotPlatform::empty()
        .with_area("kitchen", "Kitchen", &[])
        .with_entity("light.kitchen", "Kitchen Light", "off", Some("kitchen"), true)
        .with_entity("sensor.temp", "Temperature", "21.5", None, false)
        .with_service("light", "turn_on")
        .with_service("light", "turn_off")
}

pub fn gateway(platform: SnapshotPlatform) -> (Arc<CapabilityGateway>, Arc<SnapshotPlatform>) {
    let platform = Arc::new(platform);
    let store = Arc::new(InMemoryDocumentStore::new());
    (Arc::new(CapabilityGateway::new(platform.clone(), store)), platform)
}

pub fn binding(provider: Arc<dyn Provider>, family: ModelFamily, timeout: Duration) -> ModelBinding {
    ModelBinding {
        provider,
        family,
        model: "mock-model".into(),
        temperature: 0.7,
        max_tokens: Some(150),
        top_p: None,
        timeout,
    }
}

pub fn prompts(family: ModelFamily) -> PromptAssembler {
    PromptAssembler::new(
        DEFAULT_SYSTEM_PROMPT,
        DEFAULT_HUMAN_PROMPT,
        DEFAULT_PLATFORM_NAME,
        Protocol::from(family),
    )
}

pub fn executor(
    provider: Arc<dyn Provider>,
    family: ModelFamily,
    platform: SnapshotPlatform,
) -> (AgentExecutor, Arc<SnapshotPlatform>) {
    let (gateway, platform) = gateway(platform);
    let tools = Arc::new(hassist_tools::catalog(gateway.clone()));
    let exec = AgentExecutor::new(
        binding(provider, family, Duration::from_secs(60)),
        tools,
        gateway,
        prompts(family),
    );
    (exec, platform)
}
