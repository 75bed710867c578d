//! Module-identity injection for flow documents.
//!
//! A flow export is a JSON array of nodes; the top-level "tab" entries are
//! what users see as flows. Tagging every tab's `env` with the module name
//! and version makes an otherwise opaque export identifiable and versionable
//! once deployed. Everything that is not a tab passes through untouched.

use serde_json::{json, Value};

use crate::core::nodered::flow::{is_tab, MODULE_NAME_KEY, MODULE_VERSION_KEY};

/// Injects `MODULE_NAME`/`MODULE_VERSION` env entries into every tab of
/// `document`, returning the rewritten document and the number of tabs
/// touched.
///
/// Entries already present are updated in place, so repeated installs never
/// grow a tab's `env`; tabs without them get the two entries appended, with
/// the `env` array created when absent. Non-array input is returned
/// unchanged with a count of 0; the caller decides whether that is worth a
/// warning.
pub fn inject_module_identity(document: &Value, name: &str, version: &str) -> (Value, usize) {
    let mut tagged = document.clone();
    let mut count = 0;

    let Some(nodes) = tagged.as_array_mut() else {
        return (tagged, 0);
    };

    for node in nodes.iter_mut() {
        let tab = node
            .get("type")
            .and_then(Value::as_str)
            .map(is_tab)
            .unwrap_or(false);
        if !tab {
            continue;
        }
        let Some(fields) = node.as_object_mut() else {
            continue;
        };
        let env = fields
            .entry("env")
            .or_insert_with(|| Value::Array(Vec::new()));
        // A tab whose env is not an array is left alone rather than clobbered.
        let Some(entries) = env.as_array_mut() else {
            continue;
        };
        upsert_env(entries, MODULE_NAME_KEY, name);
        upsert_env(entries, MODULE_VERSION_KEY, version);
        count += 1;
    }

    (tagged, count)
}

/// Replaces the value of the entry named `key`, or appends a new string
/// entry when no entry carries that name yet.
fn upsert_env(entries: &mut Vec<Value>, key: &str, value: &str) {
    for entry in entries.iter_mut() {
        if entry.get("name").and_then(Value::as_str) == Some(key) {
            if let Some(fields) = entry.as_object_mut() {
                fields.insert("value".to_string(), Value::String(value.to_string()));
            }
            return;
        }
    }
    entries.push(json!({ "name": key, "value": value, "type": "str" }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_every_tab_and_reports_count() {
        let document = json!([
            { "id": "t1", "type": "tab", "label": "One" },
            { "id": "n1", "type": "http in", "z": "t1" },
            { "id": "t2", "type": "tab", "label": "Two", "env": [] }
        ]);
        let (tagged, count) = inject_module_identity(&document, "conveyor", "2.1.0");
        assert_eq!(count, 2);
        let env = tagged[0]["env"].as_array().unwrap();
        assert_eq!(env.len(), 2);
        assert_eq!(env[0]["name"], "MODULE_NAME");
        assert_eq!(env[0]["value"], "conveyor");
        assert_eq!(env[0]["type"], "str");
        assert_eq!(env[1]["name"], "MODULE_VERSION");
        assert_eq!(env[1]["value"], "2.1.0");
    }

    #[test]
    fn injected_entries_serialize_in_wire_order() {
        let document: Value =
            serde_json::from_str(r#"[{"type":"tab","env":[]},{"type":"subflow"}]"#).unwrap();
        let (tagged, count) = inject_module_identity(&document, "svc-a", "0.1.0");
        assert_eq!(count, 1);
        assert_eq!(
            serde_json::to_string(&tagged).unwrap(),
            r#"[{"type":"tab","env":[{"name":"MODULE_NAME","value":"svc-a","type":"str"},{"name":"MODULE_VERSION","value":"0.1.0","type":"str"}]},{"type":"subflow"}]"#
        );
    }

    #[test]
    fn transforming_twice_is_stable() {
        let document = json!([{ "id": "t1", "type": "tab", "env": [] }]);
        let (once, _) = inject_module_identity(&document, "svc", "1.0.0");
        let (twice, count) = inject_module_identity(&once, "svc", "1.1.0");
        assert_eq!(count, 1);
        let env = twice[0]["env"].as_array().unwrap();
        assert_eq!(env.len(), 2);
        assert_eq!(env[0]["value"], "svc");
        assert_eq!(env[1]["value"], "1.1.0");
    }

    #[test]
    fn tagged_tabs_read_back_their_identity() {
        use crate::core::nodered::flow::Flow;

        let document = json!([{ "id": "t1", "type": "tab", "label": "L" }]);
        let (tagged, _) = inject_module_identity(&document, "foo", "1.2.3");
        let flow: Flow = serde_json::from_value(tagged[0].clone()).unwrap();
        assert_eq!(flow.name(), "foo");
        assert_eq!(flow.version(), "1.2.3");
    }

    #[test]
    fn non_tab_entries_are_preserved_verbatim() {
        let document = json!([
            { "id": "t1", "type": "tab", "env": [] },
            { "id": "n1", "type": "subflow", "wires": [["n2"]], "env": [] }
        ]);
        let (tagged, _) = inject_module_identity(&document, "m", "1");
        assert_eq!(tagged[1], document[1]);
    }

    #[test]
    fn existing_identity_entries_are_replaced_not_duplicated() {
        let document = json!([
            { "id": "t1", "type": "tab", "env": [
                { "name": "MODULE_NAME", "value": "old", "type": "str" },
                { "name": "MODULE_VERSION", "value": "0.9", "type": "str" },
                { "name": "OTHER", "value": "keep", "type": "str" }
            ]}
        ]);
        let (tagged, count) = inject_module_identity(&document, "new", "1.0");
        assert_eq!(count, 1);
        let env = tagged[0]["env"].as_array().unwrap();
        assert_eq!(env.len(), 3);
        assert_eq!(env[0]["value"], "new");
        assert_eq!(env[1]["value"], "1.0");
        assert_eq!(env[2]["value"], "keep");
    }

    #[test]
    fn unrelated_env_entries_survive() {
        let document = json!([
            { "id": "t1", "type": "tab", "env": [
                { "name": "THRESHOLD", "value": "42", "type": "num" }
            ]}
        ]);
        let (tagged, _) = inject_module_identity(&document, "m", "1");
        let env = tagged[0]["env"].as_array().unwrap();
        assert_eq!(env.len(), 3);
        assert_eq!(env[0]["name"], "THRESHOLD");
        assert_eq!(env[0]["value"], "42");
    }

    #[test]
    fn empty_array_counts_zero_tabs() {
        let (tagged, count) = inject_module_identity(&json!([]), "m", "1");
        assert_eq!(count, 0);
        assert_eq!(tagged, json!([]));
    }

    #[test]
    fn non_array_document_is_returned_unchanged() {
        let document = json!({ "flows": [] });
        let (tagged, count) = inject_module_identity(&document, "m", "1");
        assert_eq!(count, 0);
        assert_eq!(tagged, document);
    }

    #[test]
    fn tab_with_malformed_env_is_skipped() {
        let document = json!([
            { "id": "t1", "type": "tab", "env": "bogus" },
            { "id": "t2", "type": "tab" }
        ]);
        let (tagged, count) = inject_module_identity(&document, "m", "1");
        assert_eq!(count, 1);
        assert_eq!(tagged[0]["env"], "bogus");
        assert!(tagged[1]["env"].is_array());
    }

    #[test]
    fn field_order_of_untouched_content_is_stable() {
        let raw = r#"[{"zz":"first","id":"n1","type":"inject","aa":"last"}]"#;
        let document: Value = serde_json::from_str(raw).unwrap();
        let (tagged, _) = inject_module_identity(&document, "m", "1");
        assert_eq!(serde_json::to_string(&tagged).unwrap(), raw);
    }
}
