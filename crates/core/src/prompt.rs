//! Text-to-image prompt construction for circuit diagrams.

use std::fmt::Write;

use crate::circuit::{endpoint_component, CircuitJson, PIN_SEPARATOR};

/// Upper bound on prompt length accepted by the image endpoint.
pub const MAX_PROMPT_CHARS: usize = 4000;

/// Things the renderer should stay away from.
pub const NEGATIVE_PROMPT: &str = "photograph, blurry, 3d render, schematic symbols, \
     handwriting, watermark, illegible labels, tangled wires, extra components";

const STYLE_PREAMBLE: &str = "Clean Fritzing-style breadboard wiring diagram on a white \
     background. Flat vector illustration, top-down view, every part clearly labelled, \
     wires drawn as smooth coloured lines between the named pins.";

/// Build the generation prompt for a circuit.
///
/// Output is deterministic for a given circuit, so two identical circuits
/// send identical requests.
pub fn build_diagram_prompt(circuit: &CircuitJson) -> String {
    let mut prompt = String::from(STYLE_PREAMBLE);

    if let Some(title) = circuit.title.as_deref().filter(|t| !t.trim().is_empty()) {
        let _ = write!(prompt, "\nProject: {}.", title.trim());
    }

    prompt.push_str("\nComponents:");
    for component in &circuit.components {
        let _ = write!(prompt, "\n- {} ({})", component.display_name(), component.id);
        if component.label.is_some() {
            let _ = write!(prompt, ", {}", component.kind);
        }
        if let Some(value) = &component.value {
            let _ = write!(prompt, ", {value}");
        }
    }

    if !circuit.connections.is_empty() {
        prompt.push_str("\nConnections:");
        for connection in &circuit.connections {
            let _ = write!(
                prompt,
                "\n- {} to {}",
                describe_endpoint(circuit, &connection.from),
                describe_endpoint(circuit, &connection.to)
            );
            if let Some(color) = &connection.color {
                let _ = write!(prompt, " ({color} wire)");
            }
            if let Some(label) = &connection.label {
                let _ = write!(prompt, " [{label}]");
            }
        }
    }

    truncate_chars(prompt, MAX_PROMPT_CHARS)
}

/// Render `u1.D13` as `Arduino Uno pin D13`.
fn describe_endpoint(circuit: &CircuitJson, endpoint: &str) -> String {
    let id = endpoint_component(endpoint);
    let name = circuit.component(id).map_or(id, |c| c.display_name());
    match endpoint.split_once(PIN_SEPARATOR) {
        Some((_, pin)) => format!("{name} pin {pin}"),
        None => name.to_string(),
    }
}

fn truncate_chars(mut text: String, max: usize) -> String {
    if let Some((byte_idx, _)) = text.char_indices().nth(max) {
        text.truncate(byte_idx);
    }
    text
}
