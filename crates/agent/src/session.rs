//! Conversation sessions.
//!
//! An [`AgentSession`] owns the memory window of one conversation and
//! borrows the shared executor for each turn. The [`SessionManager`] maps
//! conversation ids to sessions: turns within one conversation run one at a
//! time, different conversations run concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use hassist_core::event::DomainEvent;
use hassist_core::message::ConversationId;
use hassist_memory::ConversationMemory;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::loop_runner::AgentExecutor;

/// Spoken to the user when a turn fails. Internal detail stays in the logs.
pub const GENERIC_ERROR_SPEECH: &str = "Sorry, something went wrong while handling your request.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    ActionDone,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unknown,
}

/// What the conversational front door sends back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationResponse {
    pub conversation_id: String,
    pub language: String,
    pub speech: String,
    pub response_type: ResponseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
}

impl ConversationResponse {
    pub fn is_error(&self) -> bool {
        self.response_type == ResponseType::Error
    }
}

pub struct AgentSession {
    id: ConversationId,
    memory: ConversationMemory,
    executor: Arc<AgentExecutor>,
}

impl AgentSession {
    pub fn new(id: ConversationId, executor: Arc<AgentExecutor>, memory_window: usize) -> Self {
        Self {
            id,
            memory: ConversationMemory::new(memory_window),
            executor,
        }
    }

    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    /// Handle one utterance.
    ///
    /// The exchange is remembered only when the turn completes; a failed
    /// turn leaves memory untouched and yields a generic error response.
    pub async fn process(&mut self, text: &str, language: &str) -> ConversationResponse {
        info!(conversation_id = %self.id, language, "Processing utterance");
        self.executor.event_bus().publish(DomainEvent::UtteranceReceived {
            conversation_id: self.id.to_string(),
            language: language.to_string(),
            content_preview: text.chars().take(50).collect(),
            timestamp: Utc::now(),
        });

        let history = self.memory.messages();
        match self.executor.run(text, &history).await {
            Ok(output) => {
                self.memory.push(text, output.text.as_str());
                ConversationResponse {
                    conversation_id: self.id.to_string(),
                    language: language.to_string(),
                    speech: output.text,
                    response_type: ResponseType::ActionDone,
                    error_code: None,
                }
            }
            Err(e) => {
                error!(conversation_id = %self.id, error = %e, "Turn failed");
                ConversationResponse {
                    conversation_id: self.id.to_string(),
                    language: language.to_string(),
                    speech: GENERIC_ERROR_SPEECH.into(),
                    response_type: ResponseType::Error,
                    error_code: Some(ErrorCode::Unknown),
                }
            }
        }
    }
}

struct SessionSlot {
    session: Arc<Mutex<AgentSession>>,
    last_used: u64,
}

/// Routes utterances to per-conversation sessions.
pub struct SessionManager {
    executor: Arc<AgentExecutor>,
    memory_window: usize,
    max_sessions: usize,
    slots: Mutex<Sessions>,
}

#[derive(Default)]
struct Sessions {
    by_id: HashMap<String, SessionSlot>,
    clock: u64,
}

impl SessionManager {
    pub fn new(executor: Arc<AgentExecutor>, memory_window: usize, max_sessions: usize) -> Self {
        Self {
            executor,
            memory_window,
            max_sessions: max_sessions.max(1),
            slots: Mutex::new(Sessions::default()),
        }
    }

    pub fn executor(&self) -> &Arc<AgentExecutor> {
        &self.executor
    }

    /// Process `text` in the conversation `conversation_id`, starting a new
    /// conversation when the id is absent or unknown.
    pub async fn process(
        &self,
        conversation_id: Option<&str>,
        text: &str,
        language: &str,
    ) -> ConversationResponse {
        let session = self.session(conversation_id).await;
        let mut session = session.lock().await;
        session.process(text, language).await
    }

    /// Fetch or create the session for `conversation_id`.
    pub async fn session(&self, conversation_id: Option<&str>) -> Arc<Mutex<AgentSession>> {
        let id = match conversation_id.filter(|id| !id.is_empty()) {
            Some(id) => ConversationId::from(id),
            None => ConversationId::new(),
        };

        let mut sessions = self.slots.lock().await;
        sessions.clock += 1;
        let now = sessions.clock;

        if let Some(slot) = sessions.by_id.get_mut(&id.0) {
            slot.last_used = now;
            return slot.session.clone();
        }

        if sessions.by_id.len() >= self.max_sessions {
            let oldest = sessions
                .by_id
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                debug!(conversation_id = %oldest, "Evicting least recently used session");
                sessions.by_id.remove(&oldest);
            }
        }

        let session = Arc::new(Mutex::new(AgentSession::new(
            id.clone(),
            self.executor.clone(),
            self.memory_window,
        )));
        sessions.by_id.insert(
            id.0,
            SessionSlot {
                session: session.clone(),
                last_used: now,
            },
        );
        session
    }

    pub async fn len(&self) -> usize {
        self.slots.lock().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Forget a conversation. Returns whether it existed.
    pub async fn remove(&self, conversation_id: &str) -> bool {
        self.slots.lock().await.by_id.remove(conversation_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{ScriptedProvider, executor, home};
    use hassist_core::error::ProviderError;
    use hassist_core::provider::ModelFamily;

    fn manager(provider: Arc<ScriptedProvider>, window: usize, max: usize) -> SessionManager {
        let (exec, _) = executor(provider, ModelFamily::ToolCalling, home());
        SessionManager::new(Arc::new(exec), window, max)
    }

    #[tokio::test]
    async fn answer_is_remembered() {
        let provider = Arc::new(ScriptedProvider::texts(vec!["Hi there.".into(), "You said hello.".into()]));
        let manager = manager(provider.clone(), 5, 10);

        let first = manager.process(Some("conv-1"), "hello", "en").await;
        assert_eq!(first.speech, "Hi there.");
        assert_eq!(first.response_type, ResponseType::ActionDone);
        assert_eq!(first.conversation_id, "conv-1");

        manager.process(Some("conv-1"), "what did I say?", "en").await;
        let requests = provider.requests();
        let second = &requests[1].messages;
        assert_eq!(second[1].content, "hello");
        assert_eq!(second[2].content, "Hi there.");
    }

    #[tokio::test]
    async fn failure_is_generic_and_not_remembered() {
        let provider = Arc::new(ScriptedProvider::failing(ProviderError::Network(
            "connection refused on 10.0.0.7".into(),
        )));
        let manager = manager(provider, 5, 10);

        let response = manager.process(Some("conv-err"), "hello", "de").await;
        assert!(response.is_error());
        assert_eq!(response.error_code, Some(ErrorCode::Unknown));
        assert_eq!(response.speech, GENERIC_ERROR_SPEECH);
        assert_eq!(response.language, "de");
        assert!(!response.speech.contains("10.0.0.7"));

        let session = manager.session(Some("conv-err")).await;
        assert!(session.lock().await.memory().is_empty());
    }

    #[tokio::test]
    async fn memory_window_slides() {
        let replies: Vec<String> = (0..3).map(|i| format!("answer {i}")).collect();
        let provider = Arc::new(ScriptedProvider::texts(replies));
        let manager = manager(provider, 2, 10);

        for i in 0..3 {
            manager.process(Some("c"), &format!("question {i}"), "en").await;
        }
        let session = manager.session(Some("c")).await;
        let session = session.lock().await;
        let kept: Vec<_> = session.memory().exchanges().map(|e| e.user.clone()).collect();
        assert_eq!(kept, vec!["question 1", "question 2"]);
    }

    #[tokio::test]
    async fn new_conversation_without_id() {
        let provider = Arc::new(ScriptedProvider::texts(vec!["a".into(), "b".into()]));
        let manager = manager(provider, 5, 10);

        let a = manager.process(None, "x", "en").await;
        let b = manager.process(Some(""), "y", "en").await;
        assert_ne!(a.conversation_id, b.conversation_id);
        assert_eq!(manager.len().await, 2);
    }

    #[tokio::test]
    async fn least_recently_used_is_evicted() {
        let provider = Arc::new(ScriptedProvider::texts(Vec::new()));
        let manager = manager(provider, 5, 2);

        manager.session(Some("a")).await;
        manager.session(Some("b")).await;
        manager.session(Some("a")).await;
        manager.session(Some("c")).await;

        assert_eq!(manager.len().await, 2);
        assert!(!manager.remove("b").await);
        assert!(manager.remove("a").await);
        assert!(manager.remove("c").await);
    }

    #[test]
    fn response_serializes_snake_case() {
        let response = ConversationResponse {
            conversation_id: "c".into(),
            language: "en".into(),
            speech: "oops".into(),
            response_type: ResponseType::Error,
            error_code: Some(ErrorCode::Unknown),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["response_type"], "error");
        assert_eq!(json["error_code"], "unknown");
    }
}
