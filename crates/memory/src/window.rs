//! Sliding conversation window.
//!
//! Holds the last K (user, assistant) exchanges of one conversation. The
//! oldest exchange is evicted first once the window is full. Nothing here
//! is persisted.

use std::collections::VecDeque;

use hassist_core::message::Message;
use serde::{Deserialize, Serialize};

/// One (user, assistant) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub user: String,
    pub assistant: String,
}

/// Bounded FIFO of exchanges.
#[derive(Debug, Clone)]
pub struct ConversationMemory {
    window: usize,
    exchanges: VecDeque<Exchange>,
}

impl ConversationMemory {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            exchanges: VecDeque::with_capacity(window),
        }
    }

    /// Record a completed exchange, evicting the oldest past capacity.
    pub fn push(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        if self.window == 0 {
            return;
        }
        while self.exchanges.len() >= self.window {
            self.exchanges.pop_front();
        }
        self.exchanges.push_back(Exchange {
            user: user.into(),
            assistant: assistant.into(),
        });
    }

    /// History as alternating user/assistant messages, oldest first.
    pub fn messages(&self) -> Vec<Message> {
        self.exchanges
            .iter()
            .flat_map(|e| [Message::user(&e.user), Message::assistant(&e.assistant)])
            .collect()
    }

    pub fn exchanges(&self) -> impl Iterator<Item = &Exchange> {
        self.exchanges.iter()
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    pub fn clear(&mut self) {
        self.exchanges.clear();
    }
}

impl Default for ConversationMemory {
    fn default() -> Self {
        Self::new(5)
    }
}
