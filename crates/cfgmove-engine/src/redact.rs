//! Secret redaction
//!
//! Masks secret values in a merged-properties result before it leaves the
//! trust boundary. Redaction operates on a copy; the input is never mutated.

use cfgmove_store::ConfigLayer;
use serde_json::{Map, Value};

/// Replacement for secret values
pub const REDACTION_MARKER: &str = "REDACTED";

/// Return a copy of `value` with every secret value masked
///
/// Walks objects and arrays recursively. An object carrying `secure: true`
/// has the content of its `value` and `argValue` fields replaced with
/// [`REDACTION_MARKER`]; every other field is untouched. Scalars pass
/// through unchanged.
#[must_use]
pub fn redact(value: &Value) -> Value {
    match value {
        Value::Object(object) => {
            let secure = object.get("secure") == Some(&Value::Bool(true));
            let mut redacted = Map::with_capacity(object.len());
            for (key, entry) in object {
                let masked = if secure && (key == "value" || key == "argValue") {
                    Value::String(REDACTION_MARKER.to_string())
                } else {
                    redact(entry)
                };
                redacted.insert(key.clone(), masked);
            }
            Value::Object(redacted)
        }
        Value::Array(entries) => Value::Array(entries.iter().map(redact).collect()),
        other => other.clone(),
    }
}

/// Render a layer as a tree of `{ value, secure }` property entries, masked
///
/// Each profile's properties are annotated with whether the node's secret
/// list names them, then passed through [`redact`], so the result is safe to
/// hand to a display surface. Structure (`type`, nested `profiles`) is
/// preserved; `secure` lists themselves are dropped in favor of the
/// per-property annotation.
#[must_use]
pub fn redacted_view(layer: &ConfigLayer) -> Value {
    let mut profiles = Map::with_capacity(layer.profiles.len());
    for (name, node) in &layer.profiles {
        profiles.insert(name.clone(), annotate(node));
    }
    let mut root = Map::new();
    if !layer.defaults.is_empty() {
        root.insert(
            "defaults".to_string(),
            Value::Object(layer.defaults.clone().into_iter().collect()),
        );
    }
    root.insert("profiles".to_string(), Value::Object(profiles));
    redact(&Value::Object(root))
}

fn annotate(node: &cfgmove_store::ProfileNode) -> Value {
    let mut object = Map::new();
    if let Some(profile_type) = &node.profile_type {
        object.insert("type".to_string(), Value::String(profile_type.clone()));
    }

    let mut properties = Map::with_capacity(node.properties.len());
    for (name, value) in &node.properties {
        let secure = node.secure.iter().any(|entry| entry == name);
        let mut annotated = Map::new();
        annotated.insert("value".to_string(), value.clone());
        annotated.insert("secure".to_string(), Value::Bool(secure));
        properties.insert(name.clone(), Value::Object(annotated));
    }
    object.insert("properties".to_string(), Value::Object(properties));

    if !node.profiles.is_empty() {
        let mut children = Map::with_capacity(node.profiles.len());
        for (name, child) in &node.profiles {
            children.insert(name.clone(), annotate(child));
        }
        object.insert("profiles".to_string(), Value::Object(children));
    }
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn secure_value_is_masked() {
        let input = json!({ "password": { "secure": true, "value": "s3cr3t" } });
        assert_eq!(
            redact(&input),
            json!({ "password": { "secure": true, "value": "REDACTED" } })
        );
    }

    #[test]
    fn arg_value_is_masked_too() {
        let input = json!({ "secure": true, "argValue": "s3cr3t", "argName": "password" });
        assert_eq!(
            redact(&input),
            json!({ "secure": true, "argValue": "REDACTED", "argName": "password" })
        );
    }

    #[test]
    fn non_secure_siblings_are_untouched() {
        let input = json!({
            "password": { "secure": true, "value": "s3cr3t" },
            "host": { "secure": false, "value": "example.com" },
            "port": { "value": 443 }
        });
        let redacted = redact(&input);
        assert_eq!(redacted["host"]["value"], json!("example.com"));
        assert_eq!(redacted["port"]["value"], json!(443));
        assert_eq!(redacted["password"]["value"], json!("REDACTED"));
    }

    #[test]
    fn redaction_recurses_into_arrays() {
        let input = json!([
            { "secure": true, "value": "one" },
            { "secure": false, "value": "two" },
            [{ "secure": true, "argValue": "three" }]
        ]);
        let redacted = redact(&input);
        assert_eq!(redacted[0]["value"], json!("REDACTED"));
        assert_eq!(redacted[1]["value"], json!("two"));
        assert_eq!(redacted[2][0]["argValue"], json!("REDACTED"));
    }

    #[test]
    fn deep_nesting_is_handled() {
        let input = json!({
            "outer": { "inner": { "leaf": { "secure": true, "value": "x" } } }
        });
        assert_eq!(
            redact(&input)["outer"]["inner"]["leaf"]["value"],
            json!("REDACTED")
        );
    }

    #[test]
    fn scalars_pass_through() {
        assert_eq!(redact(&json!("plain")), json!("plain"));
        assert_eq!(redact(&json!(42)), json!(42));
        assert_eq!(redact(&json!(null)), json!(null));
    }

    #[test]
    fn input_is_not_mutated() {
        let input = json!({ "password": { "secure": true, "value": "s3cr3t" } });
        let before = input.clone();
        let _ = redact(&input);
        assert_eq!(input, before);
    }

    #[test]
    fn layer_view_annotates_and_masks() {
        let layer = ConfigLayer::from_value(
            "/cfg/config.json",
            &json!({
                "profiles": {
                    "a": {
                        "type": "t",
                        "properties": { "host": "h", "password": "s3cr3t" },
                        "secure": ["password"],
                        "profiles": {
                            "child": { "properties": { "token": "tok" }, "secure": ["token"] }
                        }
                    }
                }
            }),
        )
        .unwrap();

        let view = redacted_view(&layer);
        let a = &view["profiles"]["a"];
        assert_eq!(a["type"], json!("t"));
        assert_eq!(a["properties"]["host"]["value"], json!("h"));
        assert_eq!(a["properties"]["password"]["value"], json!("REDACTED"));
        assert_eq!(a["properties"]["password"]["secure"], json!(true));
        assert_eq!(
            a["profiles"]["child"]["properties"]["token"]["value"],
            json!("REDACTED")
        );
    }
}
