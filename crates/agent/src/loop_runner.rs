//! The agent executor: one bounded reasoning/acting cycle per utterance.
//!
//! Each thinking cycle sends the transcript to the model and interprets the
//! reply through the configured [`Protocol`]:
//!
//! 1. **Final answer**: the turn ends and the text is returned.
//! 2. **Tool call**: the tool runs through the catalog and its observation
//!    is appended to the scratchpad.
//! 3. **Malformed reply**: a corrective observation is appended instead.
//!
//! Both 2 and 3 consume one iteration. When the budget runs out the turn
//! ends with a normal "could not complete" answer. Model failures and
//! timeouts are returned as errors; nothing is kept from a failed turn.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use hassist_capability::CapabilityGateway;
use hassist_config::AppConfig;
use hassist_core::error::{Error, ProviderError, ToolError};
use hassist_core::event::{DomainEvent, EventBus};
use hassist_core::message::Message;
use hassist_core::provider::{ProviderRequest, ProviderResponse, ToolDefinition};
use hassist_core::tool::{ToolCall, ToolRegistry};
use hassist_providers::ModelBinding;
use tracing::{debug, info, warn};

use crate::prompt::{LiveContext, PromptAssembler};
use crate::protocol::{Decision, Protocol};
use crate::scratchpad::{LoopState, Step};

/// Answer given when the iteration budget runs out.
pub const ITERATION_CAP_RESPONSE: &str =
    "Sorry, I could not finish that request within the allowed number of steps. Please try rephrasing it.";

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Answered,
    IterationCap,
}

impl TurnOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Answered => "answered",
            Self::IterationCap => "iteration_cap",
        }
    }
}

/// The result of a completed turn.
#[derive(Debug, Clone)]
pub struct TurnOutput {
    pub text: String,
    pub outcome: TurnOutcome,
    /// Thinking cycles consumed.
    pub iterations: usize,
}

pub struct AgentExecutor {
    binding: ModelBinding,
    tools: Arc<ToolRegistry>,
    gateway: Arc<CapabilityGateway>,
    prompts: PromptAssembler,
    max_iterations: u32,
    tool_timeout: Duration,
    event_bus: Arc<EventBus>,
}

impl AgentExecutor {
    pub fn new(
        binding: ModelBinding,
        tools: Arc<ToolRegistry>,
        gateway: Arc<CapabilityGateway>,
        prompts: PromptAssembler,
    ) -> Self {
        Self {
            binding,
            tools,
            gateway,
            prompts,
            max_iterations: 5,
            tool_timeout: Duration::from_secs(30),
            event_bus: Arc::new(EventBus::default()),
        }
    }

    /// Build an executor over the full tool catalog from configuration.
    pub fn from_config(
        config: &AppConfig,
        binding: ModelBinding,
        gateway: Arc<CapabilityGateway>,
    ) -> Self {
        let prompts = PromptAssembler::from_config(&config.agent, binding.family);
        let tools = Arc::new(hassist_tools::catalog(gateway.clone()));
        Self::new(binding, tools, gateway, prompts)
            .with_max_iterations(config.agent.max_iterations)
            .with_tool_timeout(Duration::from_secs(config.agent.tool_timeout_secs))
    }

    /// Set the maximum number of thinking cycles per turn.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = bus;
        self
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    pub fn gateway(&self) -> &Arc<CapabilityGateway> {
        &self.gateway
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    pub fn protocol(&self) -> Protocol {
        self.prompts.protocol()
    }

    /// Run one turn for `input` with `history` as prior exchanges.
    pub async fn run(&self, input: &str, history: &[Message]) -> Result<TurnOutput, Error> {
        let result = self.run_inner(input, history).await;

        let (outcome, iterations) = match &result {
            Ok(output) => (output.outcome.as_str(), output.iterations),
            Err(_) => ("failed", 0),
        };
        self.event_bus.publish(DomainEvent::TurnFinished {
            outcome: outcome.into(),
            iterations,
            timestamp: Utc::now(),
        });

        result
    }

    async fn run_inner(&self, input: &str, history: &[Message]) -> Result<TurnOutput, Error> {
        let protocol = self.prompts.protocol();
        let areas = self.gateway.exposed_areas().await?;
        let definitions = self.tools.definitions();
        let mut state = LoopState::new(self.max_iterations);

        info!(
            protocol = ?protocol,
            history = history.len(),
            max_iterations = self.max_iterations,
            "Starting turn"
        );

        while state.begin_iteration() {
            debug!(iteration = state.iterations(), "Agent loop iteration");

            let scratchpad = if protocol.replays_scratchpad() {
                String::new()
            } else {
                state.scratchpad.render_text()
            };
            let prompt = self.prompts.render(&LiveContext {
                areas: &areas,
                tools: &definitions,
                input,
                scratchpad: &scratchpad,
            });

            let mut messages = Vec::with_capacity(history.len() + 2);
            messages.push(Message::system(prompt.system));
            messages.extend(history.iter().cloned());
            messages.push(Message::user(prompt.human));
            if protocol.replays_scratchpad() {
                messages.extend(state.scratchpad.to_messages());
            }

            let response = self.complete(protocol, messages, &definitions).await?;
            let reply = response.message;

            match protocol.interpret(&reply) {
                Decision::Final(text) => {
                    info!(iterations = state.iterations(), "Turn answered");
                    return Ok(TurnOutput {
                        text,
                        outcome: TurnOutcome::Answered,
                        iterations: state.iterations(),
                    });
                }
                Decision::Act(call) => {
                    let observation = self.execute_tool(&call).await?;
                    state.scratchpad.push(Step {
                        output: reply.content,
                        call: Some(call),
                        observation,
                    });
                }
                Decision::Malformed(reason) => {
                    warn!(%reason, "Malformed model output, asking for a correction");
                    state.scratchpad.push(Step {
                        output: reply.content,
                        call: None,
                        observation: protocol.correction(&reason),
                    });
                }
            }
        }

        warn!(iterations = state.iterations(), "Iteration cap reached without a final answer");
        Ok(TurnOutput {
            text: ITERATION_CAP_RESPONSE.into(),
            outcome: TurnOutcome::IterationCap,
            iterations: state.iterations(),
        })
    }

    async fn complete(
        &self,
        protocol: Protocol,
        messages: Vec<Message>,
        definitions: &[ToolDefinition],
    ) -> Result<ProviderResponse, Error> {
        let binding = &self.binding;
        let request = ProviderRequest {
            model: binding.model.clone(),
            messages,
            temperature: binding.temperature,
            max_tokens: binding.max_tokens,
            top_p: binding.top_p,
            tools: if protocol.sends_tool_definitions() {
                definitions.to_vec()
            } else {
                Vec::new()
            },
            stop: protocol.stop_sequences(),
        };

        let response = tokio::time::timeout(binding.timeout, binding.provider.complete(request))
            .await
            .map_err(|_| {
                ProviderError::Timeout(format!(
                    "{} did not answer within {}s",
                    binding.provider.name(),
                    binding.timeout.as_secs()
                ))
            })??;

        if let Some(usage) = &response.usage {
            self.event_bus.publish(DomainEvent::ResponseGenerated {
                model: response.model.clone(),
                tokens_used: usage.total_tokens,
                timestamp: Utc::now(),
            });
        }

        Ok(response)
    }

    /// Run one tool call and return its observation text.
    async fn execute_tool(&self, call: &ToolCall) -> Result<String, Error> {
        debug!(tool = %call.name, arguments = %call.arguments, "Executing tool");
        let start = Instant::now();

        let executed = tokio::time::timeout(self.tool_timeout, self.tools.execute(call))
            .await
            .map_err(|_| ToolError::Timeout {
                tool_name: call.name.clone(),
                timeout_secs: self.tool_timeout.as_secs(),
            })?;

        let (outcome, observation) = match executed {
            Ok(result) => (result.kind(), result.to_observation()),
            Err(ToolError::NotFound(name)) => {
                warn!(tool = %name, "Model asked for an unknown tool");
                (
                    "unknown_tool",
                    format!(
                        "{name} is not a valid tool, try one of [{}].",
                        self.tools.names().join(", ")
                    ),
                )
            }
            Err(e) => return Err(e.into()),
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        if outcome != "ok" {
            warn!(tool = %call.name, outcome, "Tool did not succeed");
        }
        self.event_bus.publish(DomainEvent::ToolExecuted {
            tool_name: call.name.clone(),
            outcome: outcome.into(),
            duration_ms,
            timestamp: Utc::now(),
        });

        Ok(observation)
    }
}
