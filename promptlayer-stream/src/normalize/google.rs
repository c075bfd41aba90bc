use serde_json::{json, Value};

use promptlayer_core::json::non_null;

use super::{child_object, last_present};

/// Merges `generateContent` chunks into the last chunk: thought text, answer
/// text and function calls are collected across all chunks into a single
/// candidate's parts.
pub fn generate_content(events: &[Value]) -> Value {
    let Some(last) = events.last() else {
        return json!({ "candidates": [] });
    };

    let mut thought = String::new();
    let mut signature: Option<Value> = None;
    let mut text = String::new();
    let mut calls: Vec<Value> = Vec::new();

    for event in events {
        let parts = event
            .pointer("/candidates/0/content/parts")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        for part in parts {
            match part.get("text").and_then(Value::as_str) {
                Some(fragment) if !fragment.is_empty() => {
                    if part.get("thought").and_then(Value::as_bool) == Some(true) {
                        thought.push_str(fragment);
                        if let Some(value) = non_null(part, "thoughtSignature") {
                            signature = Some(value.clone());
                        }
                    } else {
                        text.push_str(fragment);
                    }
                }
                _ => {
                    if let Some(call) = non_null(part, "functionCall") {
                        calls.push(call.clone());
                    }
                }
            }
        }
    }

    let mut parts = Vec::new();
    if !thought.is_empty() {
        let mut part = json!({ "text": thought, "thought": true });
        if let Some(signature) = signature {
            part["thoughtSignature"] = signature;
        }
        parts.push(part);
    }
    if !text.is_empty() {
        parts.push(json!({ "text": text }));
    }
    parts.extend(calls.into_iter().map(|call| json!({ "functionCall": call })));

    let mut response = if last.is_object() { last.clone() } else { json!({}) };
    let finish_reason = last_present(events, &["/candidates/0/finishReason"]);
    if !parts.is_empty() || !finish_reason.is_null() {
        if let Some(candidate) = first_candidate(&mut response) {
            if !finish_reason.is_null() {
                candidate["finishReason"] = finish_reason;
            }
            if !parts.is_empty() {
                if let Some(content) = child_object(candidate, "content") {
                    content.entry("role").or_insert_with(|| json!("model"));
                    content.insert("parts".to_string(), Value::Array(parts));
                }
            }
        }
    }

    let usage = last_present(events, &["/usageMetadata"]);
    if !usage.is_null() {
        response["usageMetadata"] = usage;
    }
    response
}

/// `response.candidates[0]`, created when the last chunk carries none.
fn first_candidate(response: &mut Value) -> Option<&mut Value> {
    let candidates = response
        .as_object_mut()?
        .entry("candidates")
        .or_insert_with(|| json!([]));
    if !candidates.is_array() {
        *candidates = json!([]);
    }
    let list = candidates.as_array_mut()?;
    if list.is_empty() {
        list.push(json!({}));
    }
    let first = list.first_mut()?;
    if !first.is_object() {
        *first = json!({});
    }
    Some(first)
}
