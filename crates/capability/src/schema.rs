//! Structural checks for automation, script and scene documents.
//!
//! These run before the platform's own validator and catch the shapes a
//! model most often gets wrong.

use serde_yaml::Value;

fn has_value(doc: &Value, keys: &[&str]) -> bool {
    keys.iter()
        .any(|k| doc.get(*k).is_some_and(|v| !v.is_null()))
}

pub fn check_automation(doc: &Value) -> Result<(), String> {
    if !doc.is_mapping() {
        return Err("automation must be a mapping".into());
    }
    if !has_value(doc, &["trigger", "triggers"]) {
        return Err("automation requires a trigger".into());
    }
    if !has_value(doc, &["action", "actions"]) {
        return Err("automation requires an action".into());
    }
    Ok(())
}

pub fn check_script(doc: &Value) -> Result<(), String> {
    if !doc.is_mapping() {
        return Err("script must be a mapping".into());
    }
    match doc.get("sequence") {
        Some(Value::Sequence(steps)) if !steps.is_empty() => Ok(()),
        Some(Value::Mapping(_)) => Ok(()),
        _ => Err("script requires a non-empty sequence".into()),
    }
}

pub fn check_scene(doc: &Value) -> Result<(), String> {
    match doc.get("name").and_then(Value::as_str) {
        Some(name) if !name.trim().is_empty() => {}
        _ => return Err("scene requires a non-empty name".into()),
    }
    match doc.get("entities") {
        Some(Value::Mapping(entities)) if !entities.is_empty() => Ok(()),
        _ => Err("scene requires a non-empty entities mapping".into()),
    }
}

/// Script ids may only hold ASCII letters, digits and underscores.
pub fn check_script_id(script_id: &str) -> Result<(), String> {
    if script_id.is_empty() {
        return Err("script_id must not be empty".into());
    }
    if !script_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(format!(
            "script_id '{script_id}' may only contain letters, numbers and underscores"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn automation_shapes() {
        assert!(check_automation(&yaml("trigger: []\naction: []")).is_ok());
        assert!(check_automation(&yaml("triggers: [{trigger: sun}]\nactions: []")).is_ok());
        assert!(check_automation(&yaml("action: []")).unwrap_err().contains("trigger"));
        assert!(check_automation(&yaml("trigger: []")).unwrap_err().contains("action"));
        assert!(check_automation(&yaml("- a\n- b")).is_err());
    }

    #[test]
    fn script_shapes() {
        assert!(check_script(&yaml("sequence:\n  - action: light.turn_on")).is_ok());
        assert!(check_script(&yaml("alias: nothing")).is_err());
        assert!(check_script(&yaml("sequence: []")).is_err());
    }

    #[test]
    fn scene_shapes() {
        assert!(check_scene(&yaml("name: Movie\nentities:\n  light.kitchen: 'off'")).is_ok());
        assert!(check_scene(&yaml("name: ''\nentities:\n  light.kitchen: 'off'")).is_err());
        assert!(check_scene(&yaml("name: Movie\nentities: {}")).is_err());
    }

    #[test]
    fn script_ids() {
        assert!(check_script_id("movie_time_2").is_ok());
        assert!(check_script_id("").is_err());
        assert!(check_script_id("movie-time").is_err());
        assert!(check_script_id("café").is_err());
    }
}
