//! YAML document store: one file per collection in the platform config dir.
//!
//! Storage location: `<config_dir>/automations.yaml`, `scripts.yaml`,
//! `scenes.yaml`.
//!
//! Writes serialize the whole document first, then write a sibling temp
//! file and rename it over the target, so a reader never sees a partial
//! file.

use async_trait::async_trait;
use hassist_core::error::StoreError;
use hassist_core::store::{DocumentKind, DocumentStore};
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

pub struct YamlDocumentStore {
    dir: PathBuf,
}

impl YamlDocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, kind: DocumentKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }
}

#[async_trait]
impl DocumentStore for YamlDocumentStore {
    async fn read(&self, kind: DocumentKind) -> Result<Option<serde_yaml::Value>, StoreError> {
        let path = self.path(kind);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Read {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        let value: serde_yaml::Value =
            serde_yaml::from_str(&content).map_err(|e| StoreError::Malformed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        Ok(match value {
            serde_yaml::Value::Null => None,
            other => Some(other),
        })
    }

    async fn write(&self, kind: DocumentKind, document: &serde_yaml::Value) -> Result<(), StoreError> {
        let path = self.path(kind);
        let write_err = |reason: String| StoreError::Write {
            path: path.display().to_string(),
            reason,
        };

        let content = serde_yaml::to_string(document).map_err(|e| write_err(e.to_string()))?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| write_err(format!("Failed to create config directory: {e}")))?;

        let tmp = self
            .dir
            .join(format!(".{}.{}.tmp", kind.file_name(), Uuid::new_v4().simple()));
        if let Err(e) = tokio::fs::write(&tmp, &content).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(write_err(e.to_string()));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(write_err(e.to_string()));
        }

        debug!(path = %path.display(), bytes = content.len(), "Document written");
        Ok(())
    }
}
