//! SHA-256 digests and canonical JSON.
//!
//! The diagram cache is keyed on [`circuit_hash`], so the same circuit must
//! hash identically no matter how the client ordered its object keys.

use std::collections::BTreeMap;

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::circuit::CircuitJson;

/// Compute a SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

/// Serialize a JSON value with object keys sorted recursively and no
/// insignificant whitespace. Array order is preserved.
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", parts.join(","))
        }
        Value::Object(map) => {
            let sorted: BTreeMap<&String, &Value> = map.iter().collect();
            let parts: Vec<String> = sorted
                .into_iter()
                .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), canonical_json(v)))
                .collect();
            format!("{{{}}}", parts.join(","))
        }
        // Scalars already have a single textual form.
        other => other.to_string(),
    }
}

/// Cache key for a circuit: the digest of its components and connections.
///
/// The title is presentation only and does not change the rendered wiring,
/// so it is left out of the key.
pub fn circuit_hash(circuit: &CircuitJson) -> String {
    let structural = serde_json::json!({
        "components": circuit.components,
        "connections": circuit.connections,
    });
    sha256_hex(canonical_json(&structural).as_bytes())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn circuit(value: Value) -> CircuitJson {
        CircuitJson::parse(&value).expect("valid circuit")
    }

    #[test]
    fn empty_input_produces_known_hash() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn canonical_json_sorts_nested_keys() {
        let value = json!({"b": 1, "a": {"d": [3, {"z": true, "y": null}], "c": "x"}});
        assert_eq!(
            canonical_json(&value),
            r#"{"a":{"c":"x","d":[3,{"y":null,"z":true}]},"b":1}"#
        );
    }

    #[test]
    fn canonical_json_escapes_strings() {
        let value = json!({"quote\"key": "line\nbreak"});
        assert_eq!(canonical_json(&value), r#"{"quote\"key":"line\nbreak"}"#);
    }

    #[test]
    fn key_order_does_not_change_circuit_hash() {
        let a = circuit(json!({
            "components": [{"id": "u1", "type": "arduino-uno"}, {"id": "d1", "type": "led"}],
            "connections": [{"from": "u1.D13", "to": "d1.anode", "color": "red"}]
        }));
        let b = circuit(json!({
            "connections": [{"color": "red", "to": "d1.anode", "from": "u1.D13"}],
            "components": [{"type": "arduino-uno", "id": "u1"}, {"type": "led", "id": "d1"}]
        }));
        assert_eq!(circuit_hash(&a), circuit_hash(&b));
    }

    #[test]
    fn title_is_not_part_of_hash() {
        let a = circuit(json!({
            "title": "Blinky",
            "components": [{"id": "u1", "type": "arduino-uno"}]
        }));
        let b = circuit(json!({
            "title": "Something else",
            "components": [{"id": "u1", "type": "arduino-uno"}]
        }));
        assert_eq!(circuit_hash(&a), circuit_hash(&b));
    }

    #[test]
    fn different_wiring_changes_hash() {
        let a = circuit(json!({
            "components": [{"id": "u1", "type": "arduino-uno"}, {"id": "d1", "type": "led"}],
            "connections": [{"from": "u1.D13", "to": "d1"}]
        }));
        let b = circuit(json!({
            "components": [{"id": "u1", "type": "arduino-uno"}, {"id": "d1", "type": "led"}],
            "connections": [{"from": "u1.D12", "to": "d1"}]
        }));
        assert_ne!(circuit_hash(&a), circuit_hash(&b));
        assert_eq!(circuit_hash(&a).len(), 64);
    }
}
