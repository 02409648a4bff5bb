//! Document store trait: persisted automation/script/scene collections.
//!
//! The store only knows how to read a whole document and atomically
//! replace it. Read-modify-write sequencing is the caller's concern.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::StoreError;

/// The three persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Ordered sequence of automation documents.
    Automations,
    /// Mapping of script id to script document.
    Scripts,
    /// Ordered sequence of scene documents.
    Scenes,
}

impl DocumentKind {
    /// File name of the collection inside the platform config directory.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Automations => "automations.yaml",
            Self::Scripts => "scripts.yaml",
            Self::Scenes => "scenes.yaml",
        }
    }

    /// Platform domain reloaded after the collection changes.
    pub fn domain(self) -> &'static str {
        match self {
            Self::Automations => "automation",
            Self::Scripts => "script",
            Self::Scenes => "scene",
        }
    }

    /// Empty collection of the right shape.
    pub fn empty(self) -> serde_yaml::Value {
        match self {
            Self::Scripts => serde_yaml::Value::Mapping(serde_yaml::Mapping::new()),
            Self::Automations | Self::Scenes => serde_yaml::Value::Sequence(Vec::new()),
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.domain())
    }
}

/// Whole-document persistence for the three collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read the collection. `None` when it does not exist yet or is empty.
    async fn read(&self, kind: DocumentKind) -> Result<Option<serde_yaml::Value>, StoreError>;

    /// Atomically replace the collection.
    async fn write(&self, kind: DocumentKind, document: &serde_yaml::Value) -> Result<(), StoreError>;
}
