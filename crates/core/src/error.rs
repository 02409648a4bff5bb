//! Error types for the hassist domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.
//!
//! Only faults that end a turn travel through these types. Expected
//! failures of a tool (bad ids, unexposed entities, rejected documents,
//! platform dispatch errors) are carried as [`crate::tool::ToolResult`]
//! values instead, so the model can read them and retry.

use thiserror::Error;

/// The top-level error type for all hassist operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Platform errors ---
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    // --- Document store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },
}

/// Failures reported by the host automation platform.
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    #[error("Service {domain}.{service} failed: {reason}")]
    ServiceFailed {
        domain: String,
        service: String,
        reason: String,
    },

    #[error("Invalid {kind} config: {reason}")]
    InvalidConfig { kind: String, reason: String },

    #[error("Platform unavailable: {0}")]
    Unavailable(String),
}

/// Failures of the persisted-document store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to write {path}: {reason}")]
    Write { path: String, reason: String },

    #[error("Malformed document {path}: {reason}")]
    Malformed { path: String, reason: String },
}
