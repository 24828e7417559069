//! Circuit JSON: the structured description of components and wiring that
//! drives diagram generation.
//!
//! Parsing is split in two steps. [`CircuitJson::parse`] checks the shape
//! (is it an object, do the fields have the right types) and
//! [`CircuitJson::check`] applies the content rules. Both report
//! [`FieldError`]s keyed by wire path so handlers can return them as-is.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::error::FieldError;

/// Wire name of the circuit payload in request bodies.
pub const CIRCUIT_FIELD: &str = "circuitJson";

/// Separator between a component id and a pin name in connection endpoints.
pub const PIN_SEPARATOR: char = '.';

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A complete circuit: the parts on the board and the wires between them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CircuitJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[validate(
        length(min = 1, message = "must contain at least one component"),
        nested
    )]
    pub components: Vec<CircuitComponent>,
    #[serde(default)]
    #[validate(nested)]
    pub connections: Vec<CircuitConnection>,
}

/// One physical part (microcontroller, sensor, resistor, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CircuitComponent {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub id: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "must not be empty"))]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Rated value, e.g. `220Ω` or `10uF`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pins: Vec<String>,
}

/// A wire between two endpoints, each written `component` or `component.pin`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CircuitConnection {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub from: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl CircuitComponent {
    /// Human-facing name: the label when present, otherwise the type.
    pub fn display_name(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.kind)
    }
}

/// Component id referenced by a connection endpoint.
pub fn endpoint_component(endpoint: &str) -> &str {
    endpoint
        .split_once(PIN_SEPARATOR)
        .map_or(endpoint, |(component, _)| component)
}

// ---------------------------------------------------------------------------
// Parsing and validation
// ---------------------------------------------------------------------------

impl CircuitJson {
    /// Decode a request value into a circuit.
    ///
    /// Accepts either a JSON object or a string holding JSON text, since some
    /// clients send the circuit double-encoded.
    pub fn parse(value: &Value) -> Result<Self, Vec<FieldError>> {
        let decoded;
        let value = match value {
            Value::Null => return Err(vec![FieldError::new(CIRCUIT_FIELD, "is required")]),
            Value::String(raw) => {
                decoded = serde_json::from_str::<Value>(raw).map_err(|e| {
                    vec![FieldError::new(
                        CIRCUIT_FIELD,
                        format!("is not valid JSON: {e}"),
                    )]
                })?;
                &decoded
            }
            other => other,
        };

        if !value.is_object() {
            return Err(vec![FieldError::new(CIRCUIT_FIELD, "must be a JSON object")]);
        }

        Self::deserialize(value)
            .map_err(|e| vec![FieldError::new(CIRCUIT_FIELD, e.to_string())])
    }

    /// Apply the content rules, collecting every failure.
    pub fn check(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if let Err(validation) = self.validate() {
            flatten_validation_errors(CIRCUIT_FIELD, &validation, &mut errors);
        }

        let mut seen = HashSet::new();
        for (idx, component) in self.components.iter().enumerate() {
            if !component.id.is_empty() && !seen.insert(component.id.as_str()) {
                errors.push(FieldError::new(
                    format!("{CIRCUIT_FIELD}.components[{idx}].id"),
                    format!("duplicate component id '{}'", component.id),
                ));
            }
        }

        for (idx, connection) in self.connections.iter().enumerate() {
            for (side, endpoint) in [("from", &connection.from), ("to", &connection.to)] {
                if endpoint.is_empty() {
                    continue;
                }
                let component = endpoint_component(endpoint);
                if !seen.contains(component) {
                    errors.push(FieldError::new(
                        format!("{CIRCUIT_FIELD}.connections[{idx}].{side}"),
                        format!("references unknown component '{component}'"),
                    ));
                }
            }
            if !connection.from.is_empty() && connection.from == connection.to {
                errors.push(FieldError::new(
                    format!("{CIRCUIT_FIELD}.connections[{idx}]"),
                    "connects an endpoint to itself",
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// [`parse`](Self::parse) followed by [`check`](Self::check).
    pub fn parse_checked(value: &Value) -> Result<Self, Vec<FieldError>> {
        let circuit = Self::parse(value)?;
        circuit.check()?;
        Ok(circuit)
    }

    /// Look up a component by id.
    pub fn component(&self, id: &str) -> Option<&CircuitComponent> {
        self.components.iter().find(|c| c.id == id)
    }
}

/// Map Rust field names to their JSON names where they differ.
fn wire_name(field: &str) -> &str {
    match field {
        "kind" => "type",
        other => other,
    }
}

/// Walk a `validator` error tree and emit one [`FieldError`] per failure,
/// sorted by path so responses are stable.
fn flatten_validation_errors(prefix: &str, errors: &ValidationErrors, out: &mut Vec<FieldError>) {
    let mut collected = Vec::new();
    collect(prefix, errors, &mut collected);
    collected.sort_by(|a, b| a.field.cmp(&b.field));
    out.extend(collected);

    fn collect(prefix: &str, errors: &ValidationErrors, out: &mut Vec<FieldError>) {
        for (field, kind) in errors.errors() {
            let path = format!("{prefix}.{}", wire_name(field));
            match kind {
                ValidationErrorsKind::Field(list) => {
                    for err in list {
                        let message = err
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| err.code.to_string());
                        out.push(FieldError::new(path.clone(), message));
                    }
                }
                ValidationErrorsKind::Struct(inner) => collect(&path, inner, out),
                ValidationErrorsKind::List(items) => {
                    for (idx, inner) in items {
                        collect(&format!("{path}[{idx}]"), inner, out);
                    }
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
