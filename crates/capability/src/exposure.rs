//! Exposure policy: which entities the conversation surface may see.
//!
//! Rules:
//! - Entities in [`NEVER_EXPOSED_ENTITIES`] are always hidden
//! - Otherwise the platform's per-entity exposure flag decides
//!
//! Listings are recomputed from live platform state on every call.

use std::borrow::Cow;

use hassist_core::error::PlatformError;
use hassist_core::platform::{ExposedArea, ExposedEntity, UNKNOWN_AREA};
use crate::CapabilityGateway;

/// Platform-level entities that must never be reachable from a conversation.
pub const NEVER_EXPOSED_ENTITIES: &[&str] = &["group.all_locks"];

impl CapabilityGateway {
    /// The exposure predicate.
    pub async fn is_entity_exposed(&self, entity_id: &str) -> Result<bool, PlatformError> {
        if NEVER_EXPOSED_ENTITIES.contains(&entity_id) {
            return Ok(false);
        }
        self.platform.is_exposed(entity_id).await
    }

    /// Whether `entity_id` names a real entity (registry entry or live state).
    pub(crate) async fn entity_resolves(&self, entity_id: &str) -> Result<bool, PlatformError> {
        if self.platform.entity_entry(entity_id).await?.is_some() {
            return Ok(true);
        }
        Ok(self.platform.state(entity_id).await?.is_some())
    }

    /// Every exposed entity, optionally narrowed to one area and/or domain.
    ///
    /// Empty filter strings are ignored.
    pub async fn list_exposed_entities(
        &self,
        area_filter: Option<&str>,
        domain_filter: Option<&str>,
    ) -> Result<Vec<ExposedEntity>, PlatformError> {
        let area_filter = area_filter.filter(|a| !a.is_empty());
        let domain_filter = domain_filter.filter(|d| !d.is_empty());

        let mut exposed = Vec::new();
        for state in self.platform.states().await? {
            if let Some(domain) = domain_filter {
                if !state.domain().eq_ignore_ascii_case(domain) {
                    continue;
                }
            }
            if !self.is_entity_exposed(&state.entity_id).await? {
                continue;
            }

            let entry = self.platform.entity_entry(&state.entity_id).await?;
            let device = match entry.as_ref().and_then(|e| e.device_id.as_deref()) {
                Some(device_id) => self.platform.device_entry(device_id).await?,
                None => None,
            };

            let area_id = entry
                .as_ref()
                .and_then(|e| e.area_id.clone())
                .or_else(|| device.and_then(|d| d.area_id));

            if let Some(wanted) = area_filter {
                if area_id.as_deref() != Some(wanted) {
                    continue;
                }
            }

            let area = match area_id.as_deref() {
                Some(id) => self.platform.area_entry(id).await?,
                None => None,
            };
            let (area_name, area_aliases) = match area {
                Some(a) => (a.name, a.aliases),
                None => (UNKNOWN_AREA.to_string(), Vec::new()),
            };

            exposed.push(ExposedEntity {
                domain: state.domain().to_string(),
                entity_id: state.entity_id,
                display_name: state.name,
                current_state: state.state,
                aliases: entry.map(|e| e.aliases).unwrap_or_default(),
                area_id,
                area_name,
                area_aliases,
            });
        }
        Ok(exposed)
    }

    /// Areas holding at least one exposed entity, in first-seen order.
    pub async fn exposed_areas(&self) -> Result<Vec<ExposedArea>, PlatformError> {
        let mut areas: Vec<ExposedArea> = Vec::new();
        for entity in self.list_exposed_entities(None, None).await? {
            let Some(area_id) = entity.area_id else {
                continue;
            };
            if entity.area_name == UNKNOWN_AREA || areas.iter().any(|a| a.area_id == area_id) {
                continue;
            }
            areas.push(ExposedArea {
                area_id,
                name: entity.area_name,
                aliases: entity.area_aliases,
            });
        }
        Ok(areas)
    }

    /// [`Self::list_exposed_entities`] rendered as CSV.
    pub async fn exposed_entities_csv(
        &self,
        area_filter: Option<&str>,
        domain_filter: Option<&str>,
    ) -> Result<String, PlatformError> {
        let entities = self.list_exposed_entities(area_filter, domain_filter).await?;
        Ok(entities_csv(&entities))
    }
}

/// CSV with header `entity_id,name,state,aliases,area_id,area_name`.
///
/// An empty list renders as the empty string.
pub fn entities_csv(entities: &[ExposedEntity]) -> String {
    if entities.is_empty() {
        return String::new();
    }

    let mut out = String::from("entity_id,name,state,aliases,area_id,area_name\n");
    for e in entities {
        let aliases = e.aliases.join("/");
        let row = [
            csv_field(&e.entity_id),
            csv_field(&e.display_name),
            csv_field(&e.current_state),
            csv_field(&aliases),
            csv_field(e.area_id.as_deref().unwrap_or("")),
            csv_field(&e.area_name),
        ];
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// CSV rows `area_id,area_name,area_aliases` without a header line.
pub fn areas_csv(areas: &[ExposedArea]) -> String {
    areas
        .iter()
        .map(|a| {
            [
                csv_field(&a.area_id),
                csv_field(&a.name),
                csv_field(&a.aliases.join("/")),
            ]
            .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}
