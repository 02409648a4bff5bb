//! Per-turn loop state: the iteration budget and the (action, observation)
//! steps taken so far. Created fresh for every utterance.

use hassist_core::message::{Message, MessageToolCall};
use hassist_core::tool::ToolCall;

/// One reasoning step.
#[derive(Debug, Clone)]
pub struct Step {
    /// Raw model output for the step.
    pub output: String,
    /// The tool invoked, if the output parsed into an action.
    pub call: Option<ToolCall>,
    /// Tool result or corrective instruction.
    pub observation: String,
}

#[derive(Debug, Clone, Default)]
pub struct Scratchpad {
    steps: Vec<Step>,
}

impl Scratchpad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Text form for prompt-embedded protocols.
    pub fn render_text(&self) -> String {
        self.steps
            .iter()
            .map(|step| format!("{}\nObservation: {}\nThought: ", step.output, step.observation))
            .collect()
    }

    /// Message form for native tool calling.
    ///
    /// Steps with a tool call replay as an assistant tool-call message and
    /// its tool result; malformed steps replay as the assistant text followed
    /// by the correction as a user turn.
    pub fn to_messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.steps.len() * 2);
        for step in &self.steps {
            match &step.call {
                Some(call) => {
                    messages.push(Message::assistant_tool_call(
                        step.output.clone(),
                        MessageToolCall {
                            id: call.id.clone(),
                            name: call.name.clone(),
                            arguments: call.arguments.to_string(),
                        },
                    ));
                    messages.push(Message::tool_result(&call.id, &step.observation));
                }
                None => {
                    if !step.output.trim().is_empty() {
                        messages.push(Message::assistant(step.output.clone()));
                    }
                    messages.push(Message::user(step.observation.clone()));
                }
            }
        }
        messages
    }
}

/// Budget and scratchpad for one turn.
#[derive(Debug, Clone)]
pub struct LoopState {
    remaining: u32,
    iterations: usize,
    pub scratchpad: Scratchpad,
}

impl LoopState {
    pub fn new(max_iterations: u32) -> Self {
        Self {
            remaining: max_iterations,
            iterations: 0,
            scratchpad: Scratchpad::new(),
        }
    }

    /// Start a thinking cycle. Returns `false` once the budget is spent.
    pub fn begin_iteration(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        self.iterations += 1;
        true
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Thinking cycles started so far.
    pub fn iterations(&self) -> usize {
        self.iterations
    }
}
