//! Conversation memory and document stores for hassist.

pub mod in_memory_store;
pub mod window;
pub mod yaml_store;

pub use in_memory_store::InMemoryDocumentStore;
pub use window::{ConversationMemory, Exchange};
pub use yaml_store::YamlDocumentStore;
