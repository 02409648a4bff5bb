//! The hassist agent: prompt assembly, action protocols and the bounded
//! reasoning/acting loop that turns an utterance into platform actions.
//!
//! A turn follows a **Think → Act → Observe** cycle:
//!
//! 1. **Assemble** the system and human prompts with the live exposed areas
//! 2. **Think**: send the transcript (plus memory) to the model
//! 3. **Act**: if the reply names a tool, run it through the catalog
//! 4. **Observe**: append the result to the scratchpad and think again
//!
//! The cycle ends on a final answer, on a spent iteration budget, or on a
//! fatal model/timeout error.

pub mod loop_runner;
pub mod prompt;
pub mod protocol;
pub mod scratchpad;
pub mod session;
pub mod template;

#[cfg(test)]
pub(crate) mod testutil;

pub use loop_runner::{AgentExecutor, ITERATION_CAP_RESPONSE, TurnOutcome, TurnOutput};
pub use prompt::{LiveContext, PromptAssembler, RenderedPrompt};
pub use protocol::{Decision, Protocol};
pub use scratchpad::{LoopState, Scratchpad, Step};
pub use session::{
    AgentSession, ConversationResponse, ErrorCode, GENERIC_ERROR_SPEECH, ResponseType,
    SessionManager,
};
