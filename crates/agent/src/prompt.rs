//! Prompt assembly.
//!
//! Rendering is a pure function of the raw templates, the protocol and the
//! live context of one iteration. Protocol text is expanded into the
//! `{agent_system_prompt}` / `{agent_human_prompt}` slots first, then the
//! live values are substituted in one pass.

use hassist_capability::areas_csv;
use hassist_config::AgentConfig;
use hassist_core::platform::ExposedArea;
use hassist_core::provider::{ModelFamily, ToolDefinition};

use crate::protocol::{Protocol, describe_tools};
use crate::template::render;

/// Live values injected on every iteration.
#[derive(Debug, Clone, Copy)]
pub struct LiveContext<'a> {
    pub areas: &'a [ExposedArea],
    pub tools: &'a [ToolDefinition],
    pub input: &'a str,
    pub scratchpad: &'a str,
}

/// The rendered system and human turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: String,
    pub human: String,
}

#[derive(Debug, Clone)]
pub struct PromptAssembler {
    system_template: String,
    human_template: String,
    platform_name: String,
    protocol: Protocol,
}

impl PromptAssembler {
    pub fn new(
        system_template: impl Into<String>,
        human_template: impl Into<String>,
        platform_name: impl Into<String>,
        protocol: Protocol,
    ) -> Self {
        Self {
            system_template: system_template.into(),
            human_template: human_template.into(),
            platform_name: platform_name.into(),
            protocol,
        }
    }

    pub fn from_config(agent: &AgentConfig, family: ModelFamily) -> Self {
        Self::new(
            agent.system_prompt.clone(),
            agent.human_prompt.clone(),
            agent.platform_name.clone(),
            Protocol::from(family),
        )
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn render(&self, ctx: &LiveContext<'_>) -> RenderedPrompt {
        let areas = areas_csv(ctx.areas);
        let tools = describe_tools(ctx.tools);
        let tool_names = ctx
            .tools
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        let system = render(
            &self.system_template,
            &[("agent_system_prompt", self.protocol.system_instructions())],
        );
        let system = render(
            &system,
            &[
                ("platform_name", self.platform_name.as_str()),
                ("exposed_areas", areas.as_str()),
                ("tools", tools.as_str()),
                ("tool_names", tool_names.as_str()),
            ],
        );

        let human = render(
            &self.human_template,
            &[("agent_human_prompt", self.protocol.human_instructions())],
        );
        let human = render(
            &human,
            &[("input", ctx.input), ("agent_scratchpad", ctx.scratchpad)],
        );

        RenderedPrompt { system, human }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hassist_config::{DEFAULT_HUMAN_PROMPT, DEFAULT_SYSTEM_PROMPT};
    use serde_json::json;

    fn areas() -> Vec<ExposedArea> {
        vec![
            ExposedArea {
                area_id: "kitchen".into(),
                name: "Kitchen".into(),
                aliases: vec!["cookhouse".into(), "galley".into()],
            },
            ExposedArea {
                area_id: "bedroom".into(),
                name: "Bedroom".into(),
                aliases: vec![],
            },
        ]
    }

    fn tools() -> Vec<ToolDefinition> {
        vec![ToolDefinition {
            name: "get_domains_services".into(),
            description: "list the services of a domain".into(),
            parameters: json!({"type": "object", "properties": {"domain": {"type": "string"}}}),
        }]
    }

    fn assembler(protocol: Protocol) -> PromptAssembler {
        PromptAssembler::new(DEFAULT_SYSTEM_PROMPT, DEFAULT_HUMAN_PROMPT, "Home Assistant", protocol)
    }

    #[test]
    fn structured_prompt_lists_tools_and_areas() {
        let areas = areas();
        let tools = tools();
        let prompt = assembler(Protocol::StructuredJson).render(&LiveContext {
            areas: &areas,
            tools: &tools,
            input: "Turn on the kitchen light",
            scratchpad: "",
        });

        assert!(prompt.system.contains("controlled by Home Assistant"));
        assert!(prompt.system.contains("kitchen,Kitchen,cookhouse/galley\nbedroom,Bedroom,"));
        assert!(prompt.system.contains("get_domains_services: list the services of a domain, args:"));
        assert!(prompt.system.contains("Valid \"action\" values: \"Final Answer\" or get_domains_services"));
        assert!(prompt.system.contains("\"action\": $TOOL_NAME"));
        assert!(!prompt.system.contains("{agent_system_prompt}"));

        assert!(prompt.human.starts_with("Turn on the kitchen light\n"));
        assert!(prompt.human.contains("(reminder to respond in a JSON blob no matter what)"));
    }

    #[test]
    fn native_prompt_has_no_protocol_text() {
        let areas = areas();
        let tools = tools();
        let prompt = assembler(Protocol::NativeToolCall).render(&LiveContext {
            areas: &areas,
            tools: &tools,
            input: "hello",
            scratchpad: "ignored",
        });
        assert!(!prompt.system.contains("json blob"));
        assert!(!prompt.system.contains("get_domains_services"));
        assert_eq!(prompt.human, "hello\n\n");
    }

    #[test]
    fn scratchpad_lands_in_human_turn() {
        let prompt = assembler(Protocol::StructuredJson).render(&LiveContext {
            areas: &[],
            tools: &[],
            input: "hi",
            scratchpad: "step one\nObservation: ok\nThought: ",
        });
        assert!(prompt.human.contains("hi\nstep one\nObservation: ok\nThought: \n(reminder"));
    }

    #[test]
    fn user_input_is_not_template_expanded() {
        let prompt = assembler(Protocol::StructuredJson).render(&LiveContext {
            areas: &[],
            tools: &[],
            input: "what is {agent_scratchpad}?",
            scratchpad: "SCRATCH",
        });
        assert!(prompt.human.starts_with("what is {agent_scratchpad}?\n"));
    }
}
