//! # hassist Core
//!
//! Domain types, traits, and error definitions for the hassist
//! conversational control layer. This crate has **zero framework
//! dependencies**: it defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here:
//! - [`Provider`]: the language-model backend
//! - [`Platform`]: the host automation platform (registries, states, services)
//! - [`DocumentStore`]: persisted automation/script/scene collections
//!
//! Implementations live in their respective crates, so the agent loop and
//! the capability gateway can be exercised against in-process stand-ins.

pub mod error;
pub mod event;
pub mod message;
pub mod platform;
pub mod provider;
pub mod store;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use event::{DomainEvent, EventBus};
pub use message::{ConversationId, Message, MessageToolCall, Role};
pub use platform::{
    AreaEntry, DeviceEntry, EntityEntry, EntityState, ExposedArea, ExposedEntity, Platform,
    ServiceInvocation, ServiceSchema,
};
pub use provider::{ModelFamily, Provider, ProviderRequest, ProviderResponse, ToolDefinition};
pub use store::{DocumentKind, DocumentStore};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
