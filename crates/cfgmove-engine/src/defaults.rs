//! Default-pointer repair
//!
//! After a rename, a layer's `defaults` map may still point at the old
//! identifier, either exactly or through a child (`"a.child"` under rename
//! `a` → `x` becomes `"x.child"`). Repair is best-effort and must never
//! abort a rename.

use cfgmove_path::ProfileId;
use cfgmove_store::{ConfigLayer, StoreError};
use indexmap::IndexMap;
use serde_json::Value;

/// Repair default-profile pointers for one rename (pure)
///
/// For every `profile_type -> value` entry: an exact match of the original
/// key is replaced with the new key; a value starting with the original key
/// plus a dot has that prefix replaced, preserving the child suffix.
/// Non-string and non-matching values are left untouched. An empty map is a
/// no-op, not an error.
#[must_use]
pub fn repair(
    defaults: &IndexMap<String, Value>,
    original: &ProfileId,
    renamed: &ProfileId,
) -> IndexMap<String, Value> {
    let from = original.to_string();
    let to = renamed.to_string();
    let child_prefix = format!("{from}.");

    defaults
        .iter()
        .map(|(profile_type, value)| {
            let repaired = match value.as_str() {
                Some(s) if s == from => Value::String(to.clone()),
                Some(s) if s.starts_with(&child_prefix) => {
                    Value::String(format!("{to}{}", &s[from.len()..]))
                }
                _ => value.clone(),
            };
            (profile_type.clone(), repaired)
        })
        .collect()
}

/// Repair a layer's defaults and hand the result to a persistence callback
///
/// The callback runs only when the repair changed anything. Callback
/// failures are logged and swallowed: defaults repair never propagates an
/// error to the rename that triggered it.
///
/// Batch orchestration inlines [`repair`] instead and persists with each
/// rename step; this variant is for repairing a layer's defaults outside a
/// batch, where the caller owns persistence.
pub fn repair_with<F>(layer: &mut ConfigLayer, original: &ProfileId, renamed: &ProfileId, persist: F)
where
    F: FnOnce(&ConfigLayer) -> Result<(), StoreError>,
{
    let repaired = repair(&layer.defaults, original, renamed);
    if repaired == layer.defaults {
        return;
    }
    layer.defaults = repaired;
    if let Err(err) = persist(layer) {
        tracing::warn!(
            config_path = %layer.config_path,
            original = %original,
            renamed = %renamed,
            error = %err,
            "failed to persist repaired defaults; continuing"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn id(s: &str) -> ProfileId {
        s.parse().unwrap()
    }

    fn defaults(entries: &[(&str, Value)]) -> IndexMap<String, Value> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn repair_exact_match() {
        let input = defaults(&[("zosmf", json!("a"))]);
        let repaired = repair(&input, &id("a"), &id("x"));
        assert_eq!(repaired.get("zosmf"), Some(&json!("x")));
    }

    #[test]
    fn repair_child_reference_keeps_suffix() {
        let input = defaults(&[("zosmf", json!("a.child"))]);
        let repaired = repair(&input, &id("a"), &id("x"));
        assert_eq!(repaired.get("zosmf"), Some(&json!("x.child")));
    }

    #[test]
    fn repair_leaves_non_matching_values() {
        let input = defaults(&[("zosmf", json!("other")), ("tso", json!("ax.b"))]);
        let repaired = repair(&input, &id("a"), &id("x"));
        assert_eq!(repaired, input);
    }

    #[test]
    fn repair_leaves_non_string_values() {
        let input = defaults(&[("zosmf", json!(42)), ("tso", json!(null))]);
        let repaired = repair(&input, &id("a"), &id("x"));
        assert_eq!(repaired, input);
    }

    #[test]
    fn repair_empty_map_is_noop() {
        let repaired = repair(&IndexMap::new(), &id("a"), &id("x"));
        assert!(repaired.is_empty());
    }

    #[test]
    fn repair_with_persists_only_on_change() {
        let mut layer = ConfigLayer::new("/cfg/config.json");
        layer.defaults = defaults(&[("zosmf", json!("a"))]);

        let mut persisted = false;
        repair_with(&mut layer, &id("a"), &id("x"), |_| {
            persisted = true;
            Ok(())
        });
        assert!(persisted);
        assert_eq!(layer.defaults.get("zosmf"), Some(&json!("x")));

        let mut persisted_again = false;
        repair_with(&mut layer, &id("a"), &id("x"), |_| {
            persisted_again = true;
            Ok(())
        });
        assert!(!persisted_again);
    }

    #[test]
    fn repair_with_swallows_persist_failures() {
        let mut layer = ConfigLayer::new("/cfg/config.json");
        layer.defaults = defaults(&[("zosmf", json!("a"))]);

        repair_with(&mut layer, &id("a"), &id("x"), |_| {
            Err(StoreError::PersistFailed {
                config_path: "/cfg/config.json".into(),
                reason: "disk full".into(),
            })
        });
        // Repair still applied in memory
        assert_eq!(layer.defaults.get("zosmf"), Some(&json!("x")));
    }
}
