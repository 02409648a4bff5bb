//! Automation, script and scene upserts.
//!
//! Each write follows the same path: validate the document, take the
//! mutation lock, read the current collection, upsert, write it back,
//! release the lock, then ask the platform to reload the domain.
//!
//! Everything from taking the lock to the reload runs on its own task, so a
//! caller that stops waiting (a tool timeout) cannot leave a written file
//! behind without its reload.
//!
//! Upsert keys:
//! - automations and scenes: the caller-supplied id, else the document's
//!   own `id`, else a fresh 32-hex id
//! - scripts: the caller-supplied `script_id`

use std::sync::Arc;

use chrono::Utc;
use hassist_core::error::PlatformError;
use hassist_core::event::{DomainEvent, EventBus};
use hassist_core::platform::Platform;
use hassist_core::store::{DocumentKind, DocumentStore};
use hassist_core::tool::ToolResult;
use serde_yaml::{Mapping, Value};
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;
use crate::{CapabilityGateway, Rejection, schema};

/// Keys written first in an automation record, after `id`.
const AUTOMATION_KEY_ORDER: &[&str] = &["alias", "description", "trigger", "condition", "action"];

/// Keys written first in a scene record, after `id`.
const SCENE_KEY_ORDER: &[&str] = &["name", "entities"];

impl CapabilityGateway {
    /// Create or replace an automation.
    pub async fn add_automation(
        &self,
        document: serde_json::Value,
        id: Option<String>,
    ) -> ToolResult {
        let prepared = async {
            let doc = to_yaml(&document)?;
            schema::check_automation(&doc).map_err(Rejection::Invalid)?;
            self.platform_validate(DocumentKind::Automations, &doc).await?;
            Ok::<_, Rejection>(doc)
        }
        .await;

        let doc = match prepared {
            Ok(doc) => doc,
            Err(rejection) => {
                warn!(?rejection, "Automation rejected");
                return rejection.into();
            }
        };

        let id = record_id(id, &doc);
        let record = canonical_record(&id, &doc, AUTOMATION_KEY_ORDER);
        self.upsert_record(DocumentKind::Automations, id, record, "Automation")
            .await
    }

    /// Create or replace the script stored under `script_id`.
    pub async fn add_script(&self, script_id: &str, document: serde_json::Value) -> ToolResult {
        let prepared = async {
            schema::check_script_id(script_id).map_err(Rejection::Invalid)?;
            let doc = to_yaml(&document)?;
            schema::check_script(&doc).map_err(Rejection::Invalid)?;
            self.platform_validate(DocumentKind::Scripts, &doc).await?;
            Ok::<_, Rejection>(doc)
        }
        .await;

        let doc = match prepared {
            Ok(doc) => doc,
            Err(rejection) => {
                warn!(script_id, ?rejection, "Script rejected");
                return rejection.into();
            }
        };

        let kind = DocumentKind::Scripts;
        let key = Value::String(script_id.to_string());
        let committed = self
            .writer()
            .commit(kind, script_id.to_string(), move |current| match current {
                Value::Mapping(mut scripts) => {
                    let updated = scripts.insert(key, doc).is_some();
                    Ok((Value::Mapping(scripts), updated))
                }
                _ => Err(format!("{} is not a mapping", kind.file_name())),
            })
            .await;

        match committed {
            Ok(_) => ToolResult::ok(format!("Script {script_id} saved")),
            Err(e) => e,
        }
    }

    /// Create or replace a scene setting each entity to the given state.
    pub async fn add_scene(
        &self,
        name: &str,
        entities: serde_json::Map<String, serde_json::Value>,
        id: Option<String>,
    ) -> ToolResult {
        let prepared = async {
            if name.trim().is_empty() {
                return Err(Rejection::Invalid("Scene name must not be empty".into()));
            }
            if entities.is_empty() {
                return Err(Rejection::Invalid("Scene entities must not be empty".into()));
            }
            for entity_id in entities.keys() {
                self.check_entity(entity_id).await?;
            }

            let doc = to_yaml(&serde_json::json!({ "name": name, "entities": entities }))?;
            schema::check_scene(&doc).map_err(Rejection::Invalid)?;
            self.platform_validate(DocumentKind::Scenes, &doc).await?;
            Ok::<_, Rejection>(doc)
        }
        .await;

        let doc = match prepared {
            Ok(doc) => doc,
            Err(rejection) => {
                warn!(name, ?rejection, "Scene rejected");
                return rejection.into();
            }
        };

        let id = record_id(id, &doc);
        let record = canonical_record(&id, &doc, SCENE_KEY_ORDER);
        self.upsert_record(DocumentKind::Scenes, id, record, "Scene").await
    }

    /// Platform schema check; an invalid document is the model's mistake,
    /// anything else is a platform fault.
    async fn platform_validate(&self, kind: DocumentKind, doc: &Value) -> Result<(), Rejection> {
        self.platform
            .validate_config(kind, doc)
            .await
            .map_err(|e| match e {
                PlatformError::InvalidConfig { .. } => Rejection::Invalid(e.to_string()),
                other => Rejection::Platform(other),
            })
    }

    /// Upsert `record` by id into a list collection, then reload.
    async fn upsert_record(
        &self,
        kind: DocumentKind,
        id: String,
        record: Value,
        label: &str,
    ) -> ToolResult {
        let key = id.clone();
        let committed = self
            .writer()
            .commit(kind, id.clone(), move |current| match current {
                Value::Sequence(mut records) => {
                    let updated = upsert_by_id(&mut records, &key, record);
                    Ok((Value::Sequence(records), updated))
                }
                _ => Err(format!("{} is not a list", kind.file_name())),
            })
            .await;

        match committed {
            Ok(updated) => {
                let verb = if updated { "updated" } else { "created" };
                ToolResult::ok(format!("{label} {verb} with id {id}"))
            }
            Err(e) => e,
        }
    }

    fn writer(&self) -> DocumentWriter {
        DocumentWriter {
            platform: self.platform.clone(),
            store: self.store.clone(),
            lock: self.mutation_lock.clone(),
            event_bus: self.event_bus.clone(),
        }
    }
}

/// Owned handles for one detached read-modify-write.
struct DocumentWriter {
    platform: Arc<dyn Platform>,
    store: Arc<dyn DocumentStore>,
    lock: Arc<Mutex<()>>,
    event_bus: Option<Arc<EventBus>>,
}

impl DocumentWriter {
    /// Lock, read, apply `mutate`, write, unlock; then reload.
    ///
    /// `mutate` returns the new collection and whether an existing entry was
    /// replaced, or a reason the current file cannot be updated.
    async fn commit<F>(self, kind: DocumentKind, id: String, mutate: F) -> Result<bool, ToolResult>
    where
        F: FnOnce(Value) -> Result<(Value, bool), String> + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let updated = {
                let _guard = self.lock.lock().await;
                let current = self.read_collection(kind).await?;
                let (next, updated) = mutate(current).map_err(ToolResult::dispatch)?;
                if let Err(e) = self.store.write(kind, &next).await {
                    warn!(error = %e, "Failed to write {}", kind.file_name());
                    return Err(ToolResult::dispatch(e.to_string()));
                }
                updated
            };
            self.finish_write(kind, &id).await;
            Ok::<_, ToolResult>(updated)
        });

        match task.await {
            Ok(result) => result,
            Err(e) => {
                error!(kind = %kind, error = %e, "Document write task failed");
                Err(ToolResult::dispatch(format!("document write failed: {e}")))
            }
        }
    }

    /// Current collection, or an empty one of the right shape.
    async fn read_collection(&self, kind: DocumentKind) -> Result<Value, ToolResult> {
        match self.store.read(kind).await {
            Ok(Some(doc)) => Ok(doc),
            Ok(None) => Ok(kind.empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read {}", kind.file_name());
                Err(ToolResult::dispatch(e.to_string()))
            }
        }
    }

    /// Post-write bookkeeping outside the lock. Reload failures are only logged.
    async fn finish_write(&self, kind: DocumentKind, id: &str) {
        info!(kind = %kind, id, "Document saved");
        if let Some(bus) = &self.event_bus {
            bus.publish(DomainEvent::DocumentUpserted {
                kind: kind.to_string(),
                id: id.to_string(),
                timestamp: Utc::now(),
            });
        }
        if let Err(e) = self.platform.reload(kind.domain()).await {
            warn!(domain = kind.domain(), error = %e, "Reload failed");
        }
    }
}

fn to_yaml(document: &serde_json::Value) -> Result<Value, Rejection> {
    serde_yaml::to_value(document)
        .map_err(|e| Rejection::Invalid(format!("document is not representable as YAML: {e}")))
}

fn new_record_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// A record id as text; ids written by hand are sometimes numbers.
fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn record_id(explicit: Option<String>, doc: &Value) -> String {
    explicit
        .filter(|id| !id.is_empty())
        .or_else(|| doc.get("id").and_then(id_text))
        .unwrap_or_else(new_record_id)
}

/// `id` first, then `key_order`, then the remaining keys as given.
fn canonical_record(id: &str, doc: &Value, key_order: &[&str]) -> Value {
    let mut record = Mapping::new();
    record.insert(Value::from("id"), Value::from(id));

    if let Some(fields) = doc.as_mapping() {
        for key in key_order {
            if let Some(value) = fields.get(*key) {
                record.insert(Value::from(*key), value.clone());
            }
        }
        for (key, value) in fields {
            if key.as_str() == Some("id") || record.contains_key(key) {
                continue;
            }
            record.insert(key.clone(), value.clone());
        }
    }
    Value::Mapping(record)
}

/// Replace the record with `id` in place, or append it.
///
/// Existing records without an id are given one. Returns whether an
/// existing record was replaced.
fn upsert_by_id(records: &mut Vec<Value>, id: &str, record: Value) -> bool {
    let mut updated = false;
    for entry in records.iter_mut() {
        match entry.get("id").and_then(id_text) {
            None => {
                if let Some(fields) = entry.as_mapping_mut() {
                    fields.insert(Value::from("id"), Value::from(new_record_id()));
                }
            }
            Some(existing) if !updated && existing == id => {
                *entry = record.clone();
                updated = true;
            }
            Some(_) => {}
        }
    }
    if !updated {
        records.push(record);
    }
    updated
}
