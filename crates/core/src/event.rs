//! Domain event system: decoupled observation of what the agent does.
//!
//! Events are published when something interesting happens in the system.
//! Other components can subscribe to react without tight coupling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A user utterance entered the agent
    UtteranceReceived {
        conversation_id: String,
        language: String,
        content_preview: String,
        timestamp: DateTime<Utc>,
    },

    /// The model produced a response
    ResponseGenerated {
        model: String,
        tokens_used: u32,
        timestamp: DateTime<Utc>,
    },

    /// A tool was executed
    ToolExecuted {
        tool_name: String,
        outcome: String, // "ok", "validation_error", "dispatch_error", "unknown_tool"
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A service call was dispatched to the platform
    ServiceDispatched {
        domain: String,
        service: String,
        success: bool,
        timestamp: DateTime<Utc>,
    },

    /// An automation, script or scene document was written
    DocumentUpserted {
        kind: String,
        id: String,
        timestamp: DateTime<Utc>,
    },

    /// A turn ended
    TurnFinished {
        outcome: String, // "answered", "iteration_cap", "failed"
        iterations: usize,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent {
    /// Stable snake_case name, used as the SSE event type.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UtteranceReceived { .. } => "utterance_received",
            Self::ResponseGenerated { .. } => "response_generated",
            Self::ToolExecuted { .. } => "tool_executed",
            Self::ServiceDispatched { .. } => "service_dispatched",
            Self::DocumentUpserted { .. } => "document_upserted",
            Self::TurnFinished { .. } => "turn_finished",
        }
    }
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
/// Components can subscribe to receive all events and filter for what they care about.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // Ignore send errors (no subscribers = that's fine)
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_bus_publish_subscribe() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(DomainEvent::ToolExecuted {
            tool_name: "call_homeassistant_service".into(),
            outcome: "ok".into(),
            duration_ms: 42,
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::ToolExecuted { tool_name, outcome, .. } => {
                assert_eq!(tool_name, "call_homeassistant_service");
                assert_eq!(outcome, "ok");
            }
            _ => panic!("Expected ToolExecuted event"),
        }
    }

    #[test]
    fn event_kinds() {
        let event = DomainEvent::DocumentUpserted {
            kind: "automation".into(),
            id: "1700000000000".into(),
            timestamp: Utc::now(),
        };
        assert_eq!(event.kind(), "document_upserted");
    }

    #[test]
    fn event_bus_no_subscribers_doesnt_panic() {
        let bus = EventBus::new(16);
        bus.publish(DomainEvent::TurnFinished {
            outcome: "failed".into(),
            iterations: 0,
            timestamp: Utc::now(),
        });
    }
}
