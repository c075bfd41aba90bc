use serde_json::Value;

use super::openai;

/// Mistral wraps each chat chunk in `{ "data": ... }` and spells some fields
/// in camelCase; the unwrapped chunks fold like OpenAI chat chunks.
pub fn chat(events: &[Value]) -> Value {
    let chunks: Vec<Value> = events
        .iter()
        .filter_map(|event| event.get("data"))
        .filter(|data| data.is_object())
        .cloned()
        .collect();
    openai::chat(&chunks)
}
